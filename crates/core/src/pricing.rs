//! The pricing orchestrator: one canonical, deterministic computation from
//! a normalized [`PricingInput`] and a catalog snapshot to an itemized
//! [`PricingBreakdown`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::catalog::PriceCatalog;
use crate::input::PricingInput;
use crate::package::{self, PackageTier};
use crate::rules;
use crate::travel;

/// Fixed German VAT.
pub fn vat_rate() -> Decimal {
    Decimal::new(19, 2)
}

/// Two decimal places, round half up. Applied to every component before
/// summation so the totals are reproducible independent of summation order.
pub fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Itemized result of one pricing computation. Every component is already
/// quantized to cents; `net_total` is the sum of the components minus the
/// discount, and `gross_total == net_total + vat_amount` always holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub package: PackageTier,
    /// Advertised package price. Informational: the itemized components
    /// subsume it, so it is not part of `net_total`.
    pub base_price: Decimal,
    pub travel_cost: Decimal,
    pub building_surcharge: Decimal,
    pub grid_surcharge: Decimal,
    pub fuse_surcharge: Decimal,
    pub wr_cable_cost: Decimal,
    pub inverter_cost: Decimal,
    pub storage_cost: Decimal,
    pub ac_wiring_cost: Decimal,
    pub spd_cost: Decimal,
    pub meter_upgrade_cost: Decimal,
    pub wallbox_base_cost: Decimal,
    pub wallbox_cable_cost: Decimal,
    pub wallbox_extra_cost: Decimal,
    pub discount: Decimal,
    pub net_total: Decimal,
    pub vat_amount: Decimal,
    pub gross_total: Decimal,
}

impl PricingBreakdown {
    /// Building, grid, fuse and cable-run positions combined, as reported
    /// by the preview API.
    pub fn surcharge_total(&self) -> Decimal {
        self.building_surcharge + self.grid_surcharge + self.fuse_surcharge + self.wr_cable_cost
    }

    pub fn wallbox_total(&self) -> Decimal {
        self.wallbox_base_cost + self.wallbox_cable_cost + self.wallbox_extra_cost
    }

    /// Flat material positions (AC wiring, SPD, meter upgrade).
    pub fn material_total(&self) -> Decimal {
        self.ac_wiring_cost + self.spd_cost + self.meter_upgrade_cost
    }
}

/// Computes the full breakdown. Pure and synchronous: the same input and
/// the same catalog snapshot always produce an identical result.
pub fn calculate_pricing(input: &PricingInput, catalog: &PriceCatalog) -> PricingBreakdown {
    let input = input.clone().clamped();

    let package = package::classify(&input);
    let base_price = quantize(catalog.value(package.price_key()));

    let zone = travel::classify(&input.site_address);
    let travel_cost = quantize(catalog.value(zone.price_key()));

    let building_surcharge = quantize(rules::building_surcharge(&input, catalog));
    let grid_surcharge = quantize(rules::grid_surcharge(&input, catalog));
    let fuse_surcharge = quantize(rules::fuse_surcharge(&input, catalog));
    let wr_cable_cost = quantize(rules::wr_cable_cost(&input, catalog));

    let inverter_cost = quantize(rules::inverter_cost(&input, catalog));
    let storage_cost = quantize(rules::storage_cost(&input, catalog));
    let material = rules::fixed_material_costs(&input, package, catalog);
    let ac_wiring_cost = quantize(material.ac_wiring);
    let spd_cost = quantize(material.spd);
    let meter_upgrade_cost = quantize(material.meter_upgrade);

    let wallbox = rules::wallbox_costs(&input, catalog);
    let wallbox_base_cost = quantize(wallbox.base);
    let wallbox_cable_cost = quantize(wallbox.cable);
    let wallbox_extra_cost = quantize(wallbox.extras);

    let discount = quantize(rules::complete_kit_discount(&input, base_price, catalog));

    let net_total = travel_cost
        + building_surcharge
        + grid_surcharge
        + fuse_surcharge
        + wr_cable_cost
        + inverter_cost
        + storage_cost
        + ac_wiring_cost
        + spd_cost
        + meter_upgrade_cost
        + wallbox_base_cost
        + wallbox_cable_cost
        + wallbox_extra_cost
        - discount;
    let net_total = quantize(net_total);
    let vat_amount = quantize(net_total * vat_rate());
    let gross_total = net_total + vat_amount;

    PricingBreakdown {
        package,
        base_price,
        travel_cost,
        building_surcharge,
        grid_surcharge,
        fuse_surcharge,
        wr_cable_cost,
        inverter_cost,
        storage_cost,
        ac_wiring_cost,
        spd_cost,
        meter_upgrade_cost,
        wallbox_base_cost,
        wallbox_cable_cost,
        wallbox_extra_cost,
        discount,
        net_total,
        vat_amount,
        gross_total,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{calculate_pricing, quantize, vat_rate};
    use crate::catalog::{CatalogEntry, CatalogOverrides, PriceCatalog, PriceKey, PriceKind};
    use crate::input::{
        BuildingType, GridType, PricingInput, WallboxMount, WallboxPower, WallboxRequest,
    };
    use crate::package::PackageTier;

    fn overrides(entries: &[(PriceKey, &str)]) -> CatalogOverrides {
        let mut map = CatalogOverrides::new();
        for (key, value) in entries {
            map.insert(
                *key,
                CatalogEntry {
                    value: value.parse().expect("decimal literal"),
                    kind: PriceKind::Absolute,
                },
            );
        }
        map
    }

    fn scenario_a_input() -> PricingInput {
        PricingInput {
            building_type: BuildingType::Mfh,
            grid_type: GridType::SinglePhase,
            distance_meter: Decimal::from(12),
            desired_power_kw: Decimal::from(6),
            storage_kwh: Decimal::from(4),
            ..PricingInput::default()
        }
    }

    fn scenario_a_catalog() -> PriceCatalog {
        PriceCatalog::new(overrides(&[
            (PriceKey::BuildingMfh, "100.00"),
            (PriceKey::Grid1p, "100.00"),
            (PriceKey::InverterTier10, "1500.00"),
            (PriceKey::StorageTier5, "1300.00"),
            (PriceKey::WrCablePmLt10, "5.00"),
        ]))
    }

    #[test]
    fn scenario_a_reference_totals() {
        let breakdown = calculate_pricing(&scenario_a_input(), &scenario_a_catalog());

        assert_eq!(breakdown.package, PackageTier::Pro);
        assert_eq!(breakdown.building_surcharge, Decimal::new(10000, 2));
        assert_eq!(breakdown.grid_surcharge, Decimal::new(10000, 2));
        assert_eq!(breakdown.inverter_cost, Decimal::new(150_000, 2));
        assert_eq!(breakdown.storage_cost, Decimal::new(130_000, 2));
        assert_eq!(breakdown.wr_cable_cost, Decimal::new(6000, 2));
        assert_eq!(breakdown.net_total, Decimal::new(306_000, 2));
        assert_eq!(breakdown.vat_amount, Decimal::new(58140, 2));
        assert_eq!(breakdown.gross_total, Decimal::new(364_140, 2));
    }

    #[test]
    fn scenario_b_wallbox_and_raised_brackets() {
        let input = PricingInput {
            distance_meter: Decimal::from(20),
            desired_power_kw: Decimal::from(15),
            wallbox: Some(WallboxRequest {
                power: Some(WallboxPower::Kw11),
                mount: WallboxMount::Stand,
                cable_installed: false,
                cable_length_m: Decimal::from(10),
                pv_surplus: true,
            }),
            ..scenario_a_input()
        };
        let catalog = PriceCatalog::new(overrides(&[
            (PriceKey::BuildingMfh, "100.00"),
            (PriceKey::Grid1p, "100.00"),
            (PriceKey::InverterTier20, "2000.00"),
            (PriceKey::StorageTier5, "1300.00"),
            (PriceKey::WrCablePmLt20, "15.00"),
            (PriceKey::WallboxBase11kw, "500.00"),
            (PriceKey::WallboxCablePmLt20, "14.00"),
            (PriceKey::WallboxMountStand, "200.00"),
            (PriceKey::WallboxPvSurplus, "200.00"),
        ]));

        let breakdown = calculate_pricing(&input, &catalog);

        assert_eq!(breakdown.wr_cable_cost, Decimal::new(30000, 2));
        assert_eq!(breakdown.inverter_cost, Decimal::new(200_000, 2));
        assert_eq!(breakdown.wallbox_base_cost, Decimal::new(50000, 2));
        assert_eq!(breakdown.wallbox_cable_cost, Decimal::new(14000, 2));
        assert_eq!(breakdown.wallbox_extra_cost, Decimal::new(40000, 2));
    }

    #[test]
    fn scenario_c_percentage_discount_on_base_price() {
        let mut map = CatalogOverrides::new();
        map.insert(
            PriceKey::PackageBasis,
            CatalogEntry { value: Decimal::new(123_400, 2), kind: PriceKind::Absolute },
        );
        map.insert(
            PriceKey::DiscountCompleteKit,
            CatalogEntry { value: Decimal::new(1000, 2), kind: PriceKind::Percentage },
        );
        let catalog = PriceCatalog::new(map);

        let breakdown = calculate_pricing(&PricingInput::default(), &catalog);

        assert_eq!(breakdown.package, PackageTier::Basis);
        assert_eq!(breakdown.base_price, Decimal::new(123_400, 2));
        assert_eq!(breakdown.discount, Decimal::new(12340, 2));
    }

    #[test]
    fn vat_identity_holds_for_arbitrary_inputs() {
        let samples = [
            PricingInput::default(),
            scenario_a_input(),
            PricingInput {
                main_fuse_ampere: 63,
                desired_power_kw: Decimal::new(99, 1),
                site_address: "Pinneberg".to_string(),
                ..PricingInput::default()
            },
        ];
        let catalog = PriceCatalog::with_defaults();

        for input in &samples {
            let breakdown = calculate_pricing(input, &catalog);
            assert_eq!(breakdown.gross_total, breakdown.net_total + breakdown.vat_amount);
            assert_eq!(breakdown.vat_amount, quantize(breakdown.net_total * vat_rate()));
        }
    }

    #[test]
    fn components_are_quantized_before_summation() {
        // 12.345 m at 5.00/m is 61.725; quantized per component, the cable
        // position must enter the sum as 61.73 (round half up), so the net
        // is the sum of rounded components, not the rounded sum.
        let catalog = scenario_a_catalog();
        let input = PricingInput {
            distance_meter: Decimal::new(12345, 3),
            ..scenario_a_input()
        };

        let breakdown = calculate_pricing(&input, &catalog);

        assert_eq!(breakdown.wr_cable_cost, Decimal::new(6173, 2));
        let component_sum = breakdown.travel_cost
            + breakdown.surcharge_total()
            + breakdown.inverter_cost
            + breakdown.storage_cost
            + breakdown.material_total()
            + breakdown.wallbox_total()
            - breakdown.discount;
        assert_eq!(breakdown.net_total, component_sum);
    }

    #[test]
    fn inverter_cost_is_monotonic_in_power() {
        let catalog = PriceCatalog::with_defaults();
        let mut previous = Decimal::ZERO;
        for kw in 0..40 {
            let input = PricingInput {
                desired_power_kw: Decimal::from(kw),
                ..PricingInput::default()
            };
            let cost = calculate_pricing(&input, &catalog).inverter_cost;
            assert!(cost >= previous, "inverter cost dropped at {kw} kW");
            previous = cost;
        }
    }

    #[test]
    fn zero_storage_never_produces_a_storage_cost() {
        let catalog = PriceCatalog::with_defaults();
        let input = PricingInput {
            desired_power_kw: Decimal::from(20),
            grid_type: GridType::SinglePhase,
            ..PricingInput::default()
        };

        let breakdown = calculate_pricing(&input, &catalog);
        assert_eq!(breakdown.storage_cost, Decimal::ZERO);
    }

    #[test]
    fn own_components_zero_out_hardware_and_discount() {
        let catalog = PriceCatalog::new(overrides(&[(PriceKey::DiscountCompleteKit, "15.00")]));
        let input = PricingInput {
            own_components: true,
            desired_power_kw: Decimal::from(9),
            storage_kwh: Decimal::from(8),
            ..PricingInput::default()
        };

        let breakdown = calculate_pricing(&input, &catalog);

        assert_eq!(breakdown.inverter_cost, Decimal::ZERO);
        assert_eq!(breakdown.storage_cost, Decimal::ZERO);
        assert_eq!(breakdown.discount, Decimal::ZERO);
    }

    #[test]
    fn absent_wallbox_costs_nothing_even_with_cable_length() {
        let catalog = PriceCatalog::with_defaults();
        let input = PricingInput {
            desired_power_kw: Decimal::from(5),
            ..PricingInput::default()
        };

        let breakdown = calculate_pricing(&input, &catalog);
        assert_eq!(breakdown.wallbox_total(), Decimal::ZERO);
    }

    #[test]
    fn identical_input_and_snapshot_yield_identical_output() {
        let catalog = scenario_a_catalog();
        let input = scenario_a_input();

        let first = calculate_pricing(&input, &catalog);
        let second = calculate_pricing(&input, &catalog);

        assert_eq!(first, second);
    }

    #[test]
    fn package_classification_does_not_gate_surcharges() {
        // A basis-class system still pays building and cable surcharges.
        let catalog = PriceCatalog::with_defaults();
        let input = PricingInput {
            building_type: BuildingType::Commercial,
            desired_power_kw: Decimal::from(2),
            distance_meter: Decimal::from(4),
            ..PricingInput::default()
        };

        let breakdown = calculate_pricing(&input, &catalog);
        assert_eq!(breakdown.package, PackageTier::Basis);
        assert_eq!(breakdown.building_surcharge, Decimal::new(5000, 2));
        assert_eq!(breakdown.wr_cable_cost, Decimal::new(2000, 2));
    }

    #[test]
    fn round_half_up_is_used_for_vat() {
        // Net 10.50 at 19% is 1.995, which must round up to 2.00.
        let catalog = PriceCatalog::new(overrides(&[(PriceKey::BuildingMfh, "10.50")]));
        let input = PricingInput {
            building_type: BuildingType::Mfh,
            own_components: true,
            ..PricingInput::default()
        };

        let breakdown = calculate_pricing(&input, &catalog);
        assert_eq!(breakdown.net_total, Decimal::new(1050, 2));
        assert_eq!(breakdown.vat_amount, Decimal::new(200, 2));
    }
}
