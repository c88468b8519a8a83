use rust_decimal::Decimal;

use crate::catalog::{PriceCatalog, PriceKey};

/// Ordered `(upper_bound, key)` pairs, ascending. The first pair whose bound
/// is `>= value` wins; values beyond the last bound saturate to the last
/// tier instead of erroring.
pub type TierTable = [(u32, PriceKey)];

pub const INVERTER_TIERS: &TierTable = &[
    (3, PriceKey::InverterTier3),
    (5, PriceKey::InverterTier5),
    (10, PriceKey::InverterTier10),
    (20, PriceKey::InverterTier20),
    (30, PriceKey::InverterTier30),
];

pub const STORAGE_TIERS: &TierTable = &[
    (3, PriceKey::StorageTier3),
    (5, PriceKey::StorageTier5),
    (10, PriceKey::StorageTier10),
];

/// Per-meter rates for the inverter cable run, bracketed by desired power.
pub const WR_CABLE_TIERS: &TierTable = &[
    (10, PriceKey::WrCablePmLt10),
    (20, PriceKey::WrCablePmLt20),
    (30, PriceKey::WrCablePmLt30),
];

/// Catalog value for the bracket `value` falls into.
pub fn resolve(catalog: &PriceCatalog, value: Decimal, tiers: &TierTable) -> Decimal {
    for (bound, key) in tiers {
        if value <= Decimal::from(*bound) {
            return catalog.value(*key);
        }
    }
    let (_, last) = tiers[tiers.len() - 1];
    catalog.value(last)
}

/// Tier price for a requested quantity. A zero or negative quantity means
/// "not requested" and short-circuits to zero without any tier lookup, so no
/// zero-value line item can appear downstream.
pub fn price_for_quantity(catalog: &PriceCatalog, quantity: Decimal, tiers: &TierTable) -> Decimal {
    if quantity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    resolve(catalog, quantity, tiers)
}
