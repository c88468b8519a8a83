use thiserror::Error;

pub mod precheck;
pub mod price_config;
pub mod quote;

pub use precheck::{PrecheckRecord, SqlPrecheckRepository};
pub use price_config::{CachedPriceCatalog, SqlPriceConfigRepository};
pub use quote::{QuoteRecord, SqlQuoteRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] pvquote_core::DomainError),
    #[error("not found: {0}")]
    NotFound(String),
}
