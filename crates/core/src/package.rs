use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::PriceKey;
use crate::input::PricingInput;

/// Historic installation-complexity label. Classification is informational
/// in the catalog-driven pricing path: it labels the quote and selects the
/// advertised base price, but never gates which surcharges apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Basis,
    Plus,
    Pro,
}

impl PackageTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basis => "basis",
            Self::Plus => "plus",
            Self::Pro => "pro",
        }
    }

    /// Customer-facing quote label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Basis => "Basis-Paket",
            Self::Plus => "Plus-Paket",
            Self::Pro => "Pro-Paket",
        }
    }

    pub fn price_key(self) -> PriceKey {
        match self {
            Self::Basis => PriceKey::PackageBasis,
            Self::Plus => PriceKey::PackagePlus,
            Self::Pro => PriceKey::PackagePro,
        }
    }

    pub fn includes_meter_upgrade(self) -> bool {
        matches!(self, Self::Plus | Self::Pro)
    }
}

/// Strongest trigger wins: storage demands pro; more than 3 kW or a
/// single-phase connection demands plus; everything else is basis. The old
/// "high-power inverter bracket" trigger is subsumed by the power threshold.
pub fn classify(input: &PricingInput) -> PackageTier {
    if input.storage_kwh > Decimal::ZERO {
        return PackageTier::Pro;
    }
    if input.desired_power_kw > Decimal::from(3) || input.grid_type.is_single_phase() {
        return PackageTier::Plus;
    }
    PackageTier::Basis
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{classify, PackageTier};
    use crate::input::{GridType, PricingInput};

    #[test]
    fn storage_always_classifies_as_pro() {
        let input = PricingInput {
            storage_kwh: Decimal::new(5, 1),
            desired_power_kw: Decimal::from(2),
            ..PricingInput::default()
        };
        assert_eq!(classify(&input), PackageTier::Pro);
    }

    #[test]
    fn high_power_or_single_phase_classifies_as_plus() {
        let input = PricingInput {
            desired_power_kw: Decimal::new(31, 1),
            ..PricingInput::default()
        };
        assert_eq!(classify(&input), PackageTier::Plus);

        let input = PricingInput { grid_type: GridType::SinglePhase, ..PricingInput::default() };
        assert_eq!(classify(&input), PackageTier::Plus);
    }

    #[test]
    fn small_three_phase_systems_are_basis() {
        let input = PricingInput {
            desired_power_kw: Decimal::from(3),
            ..PricingInput::default()
        };
        assert_eq!(classify(&input), PackageTier::Basis);
    }
}
