//! SQLite persistence for prechecks, quotes and catalog overrides.

pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{seeded_catalog, DemoSeedDataset, SeedSummary};
pub use repositories::{
    CachedPriceCatalog, PrecheckRecord, QuoteRecord, RepositoryError, SqlPrecheckRepository,
    SqlPriceConfigRepository, SqlQuoteRepository,
};
