use thiserror::Error;

use crate::quote::QuoteStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid quote transition from {from:?} to {to:?}")]
    InvalidQuoteTransition { from: QuoteStatus, to: QuoteStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Client-input failures detected while normalizing the wire request into a
/// canonical `PricingInput`. These are validation errors, not defects; the
/// interface layer maps them to a 4xx response before the orchestrator runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("field `{field}` is not a valid decimal: `{value}`")]
    MalformedDecimal { field: &'static str, value: String },
    #[error("field `{field}` is not a valid integer: `{value}`")]
    MalformedInteger { field: &'static str, value: String },
    #[error("field `{field}` has unsupported value `{value}`")]
    UnknownVariant { field: &'static str, value: String },
}
