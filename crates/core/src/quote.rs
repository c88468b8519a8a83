//! Quote lifecycle and the translation from a pricing breakdown into
//! persisted line items.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::DomainError;
use crate::pricing::{quantize, vat_rate, PricingBreakdown};

/// Quotes stay valid for 30 days from creation.
pub const QUOTE_VALIDITY_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Review,
    Approved,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }

    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Review)
                | (Self::Review, Self::Approved)
                | (Self::Review, Self::Rejected)
                | (Self::Approved, Self::Sent)
                | (Self::Sent, Self::Accepted)
                | (Self::Sent, Self::Rejected)
                | (Self::Review, Self::Expired)
                | (Self::Approved, Self::Expired)
                | (Self::Sent, Self::Expired)
        )
    }

    pub fn transition_to(&mut self, next: QuoteStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            *self = next;
            return Ok(());
        }
        Err(DomainError::InvalidQuoteTransition { from: *self, to: next })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown quote status `{0}`")]
pub struct UnknownQuoteStatus(pub String);

impl FromStr for QuoteStatus {
    type Err = UnknownQuoteStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "review" => Ok(Self::Review),
            "approved" => Ok(Self::Approved),
            "sent" => Ok(Self::Sent),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownQuoteStatus(other.to_string())),
        }
    }
}

/// Human-readable sequential number, scoped per calendar year.
pub fn quote_number(year: i32, sequence: u32) -> String {
    format!("PV-{year}-{sequence:04}")
}

pub fn validity_deadline(created: NaiveDate) -> NaiveDate {
    created + chrono::Duration::days(QUOTE_VALIDITY_DAYS)
}

/// One itemized quote position. `line_total` is always
/// `quantity * unit_price`, quantized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub position: u32,
    pub label: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl QuoteLine {
    fn new(position: u32, label: &str, unit_price: Decimal) -> Self {
        Self {
            position,
            label: label.to_string(),
            quantity: Decimal::ONE,
            unit_price,
            line_total: quantize(unit_price),
        }
    }
}

/// Derived totals, always recomputed from the lines themselves. Persisted
/// totals are never trusted from the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

pub fn totals_from_lines(lines: &[QuoteLine]) -> QuoteTotals {
    let subtotal: Decimal = lines.iter().map(|line| line.line_total).sum();
    let subtotal = quantize(subtotal);
    let vat_amount = quantize(subtotal * vat_rate());
    QuoteTotals { subtotal, vat_amount, total: subtotal + vat_amount }
}

/// One line per non-zero breakdown component ("hide empty rows"); the
/// discount is stored as a negative unit price.
pub fn materialize_lines(breakdown: &PricingBreakdown) -> Vec<QuoteLine> {
    let mut lines = Vec::new();
    let mut push = |label: &str, amount: Decimal| {
        if amount != Decimal::ZERO {
            let position = lines.len() as u32 + 1;
            lines.push(QuoteLine::new(position, label, amount));
        }
    };

    push("Anfahrtskosten", breakdown.travel_cost);
    push("Gebäudezuschlag", breakdown.building_surcharge);
    push("Netzform-Zuschlag", breakdown.grid_surcharge);
    push("Selektive Vorsicherung", breakdown.fuse_surcharge);
    push("Kabelweg Wechselrichter", breakdown.wr_cable_cost);
    push("Installation & Komponenten Wechselrichter", breakdown.inverter_cost);
    push("Speicherinstallation", breakdown.storage_cost);
    push("AC-Verkabelung und Anschluss", breakdown.ac_wiring_cost);
    push("Überspannungsschutz AC", breakdown.spd_cost);
    push("Zählerplatz-Ertüchtigung", breakdown.meter_upgrade_cost);
    push("Wallbox", breakdown.wallbox_base_cost);
    push("Wallbox-Zuleitung", breakdown.wallbox_cable_cost);
    push("Wallbox-Zubehör", breakdown.wallbox_extra_cost);
    push("Komplett-Kit Rabatt", -breakdown.discount);

    lines
}

/// Re-verifies that the materialized lines reproduce the breakdown's net
/// total exactly. Persisting lines that disagree with the computation they
/// came from would silently corrupt the quote.
pub fn verify_line_totals(
    lines: &[QuoteLine],
    breakdown: &PricingBreakdown,
) -> Result<(), DomainError> {
    let totals = totals_from_lines(lines);
    if totals.subtotal != breakdown.net_total {
        return Err(DomainError::InvariantViolation(format!(
            "line totals sum to {} but the breakdown net is {}",
            totals.subtotal, breakdown.net_total
        )));
    }
    Ok(())
}
