//! Pricing and quotation core for PV installations.
//!
//! Everything in this crate is synchronous and deterministic: a pricing
//! computation reads one immutable catalog snapshot and produces a value,
//! with no retained state and no I/O.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod input;
pub mod package;
pub mod pricing;
pub mod quote;
pub mod rules;
pub mod tiers;
pub mod travel;

pub use catalog::{CatalogEntry, CatalogOverrides, PriceCatalog, PriceKey, PriceKind};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use errors::{DomainError, InputError};
pub use input::{
    BuildingType, FlexBool, FlexDecimal, GridType, PricingInput, PricingRequest, WallboxMount,
    WallboxPower, WallboxRequest,
};
pub use package::PackageTier;
pub use pricing::{calculate_pricing, quantize, vat_rate, PricingBreakdown};
pub use quote::{
    materialize_lines, quote_number, totals_from_lines, validity_deadline, verify_line_totals,
    QuoteLine, QuoteStatus, QuoteTotals, QUOTE_VALIDITY_DAYS,
};
pub use travel::TravelZone;
