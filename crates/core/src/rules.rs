//! Surcharge and discount rules.
//!
//! Each rule is a pure function of the input and a catalog snapshot,
//! evaluated independently of the others. A rule whose condition does not
//! apply contributes exactly zero; none of them can fail on missing input.

use rust_decimal::Decimal;

use crate::catalog::{PriceCatalog, PriceKey, PriceKind};
use crate::input::{BuildingType, PricingInput, WallboxPower};
use crate::package::PackageTier;
use crate::tiers;

/// Main fuse ratings above this need a selective upstream fuse.
pub const SELECTIVE_FUSE_THRESHOLD_AMPERE: u32 = 35;

pub fn building_surcharge(input: &PricingInput, catalog: &PriceCatalog) -> Decimal {
    let key = match input.building_type {
        BuildingType::Efh => PriceKey::BuildingEfh,
        BuildingType::Mfh => PriceKey::BuildingMfh,
        BuildingType::Commercial => PriceKey::BuildingCommercial,
    };
    catalog.value(key)
}

pub fn grid_surcharge(input: &PricingInput, catalog: &PriceCatalog) -> Decimal {
    if input.grid_type.is_single_phase() {
        catalog.value(PriceKey::Grid1p)
    } else {
        catalog.value(PriceKey::Grid3p)
    }
}

pub fn fuse_surcharge(input: &PricingInput, catalog: &PriceCatalog) -> Decimal {
    if input.main_fuse_ampere > SELECTIVE_FUSE_THRESHOLD_AMPERE {
        catalog.value(PriceKey::SurchargeSelectiveFuse)
    } else {
        Decimal::ZERO
    }
}

/// Cable run from the house connection to the inverter: full distance times
/// the per-meter rate bracketed by desired power.
pub fn wr_cable_cost(input: &PricingInput, catalog: &PriceCatalog) -> Decimal {
    if input.distance_meter <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let rate = tiers::resolve(
        catalog,
        input.desired_power_kw.max(Decimal::ZERO),
        tiers::WR_CABLE_TIERS,
    );
    input.distance_meter * rate
}

/// Inverter hardware and installation. Customers bringing their own
/// components are not charged for it.
pub fn inverter_cost(input: &PricingInput, catalog: &PriceCatalog) -> Decimal {
    if input.own_components {
        return Decimal::ZERO;
    }
    tiers::price_for_quantity(catalog, input.desired_power_kw, tiers::INVERTER_TIERS)
}

pub fn storage_cost(input: &PricingInput, catalog: &PriceCatalog) -> Decimal {
    if input.own_components {
        return Decimal::ZERO;
    }
    tiers::price_for_quantity(catalog, input.storage_kwh, tiers::STORAGE_TIERS)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterialCosts {
    pub ac_wiring: Decimal,
    pub spd: Decimal,
    pub meter_upgrade: Decimal,
}

/// Flat material positions carried over from the legacy package contents.
/// AC wiring applies to every supplied installation; SPD and the meter
/// upgrade only to plus/pro. The defaults are zero, so these only show up
/// when operations overrides the keys.
pub fn fixed_material_costs(
    input: &PricingInput,
    package: PackageTier,
    catalog: &PriceCatalog,
) -> MaterialCosts {
    if input.own_components {
        return MaterialCosts::default();
    }
    let mut costs = MaterialCosts {
        ac_wiring: catalog.value(PriceKey::MaterialAcWiring),
        ..MaterialCosts::default()
    };
    if package.includes_meter_upgrade() {
        costs.spd = catalog.value(PriceKey::MaterialSpd);
        costs.meter_upgrade = catalog.value(PriceKey::MaterialMeterUpgrade);
    }
    costs
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallboxCosts {
    pub base: Decimal,
    pub cable: Decimal,
    pub extras: Decimal,
}

impl WallboxCosts {
    pub fn total(&self) -> Decimal {
        self.base + self.cable + self.extras
    }
}

pub fn wallbox_costs(input: &PricingInput, catalog: &PriceCatalog) -> WallboxCosts {
    let Some(wallbox) = input.wallbox.as_ref() else {
        return WallboxCosts::default();
    };

    let base = match wallbox.power {
        Some(WallboxPower::Kw4) => catalog.value(PriceKey::WallboxBase4kw),
        Some(WallboxPower::Kw11) => catalog.value(PriceKey::WallboxBase11kw),
        Some(WallboxPower::Kw22) => catalog.value(PriceKey::WallboxBase22kw),
        None => Decimal::ZERO,
    };

    // Cable is only charged when it is not already in the wall.
    let mut cable = Decimal::ZERO;
    if !wallbox.cable_installed && wallbox.cable_length_m > Decimal::ZERO {
        let rate = match wallbox.power {
            Some(WallboxPower::Kw4) => catalog.value(PriceKey::WallboxCablePmLt11),
            _ => catalog.value(PriceKey::WallboxCablePmLt20),
        };
        cable = wallbox.cable_length_m * rate;
    }

    let mut extras = Decimal::ZERO;
    if wallbox.mount == crate::input::WallboxMount::Stand {
        extras += catalog.value(PriceKey::WallboxMountStand);
    }
    if wallbox.pv_surplus {
        extras += catalog.value(PriceKey::WallboxPvSurplus);
    }

    WallboxCosts { base, cable, extras }
}

/// Complete-kit discount when we supply all components. The catalog entry
/// is the single source of truth: a percentage entry discounts the package
/// base price, an absolute entry is taken as-is.
pub fn complete_kit_discount(
    input: &PricingInput,
    base_price: Decimal,
    catalog: &PriceCatalog,
) -> Decimal {
    if input.own_components {
        return Decimal::ZERO;
    }
    let entry = catalog.entry(PriceKey::DiscountCompleteKit);
    match entry.kind {
        PriceKind::Percentage => base_price * entry.value / Decimal::ONE_HUNDRED,
        PriceKind::Absolute => entry.value,
    }
}
