use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distinguishes a plain currency amount from a percentage of some base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    Absolute,
    Percentage,
}

/// Every price the orchestrator can look up. The enum is closed on purpose:
/// a key without a compiled-in default cannot exist, so "unknown catalog key"
/// is unrepresentable instead of a runtime failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKey {
    BuildingEfh,
    BuildingMfh,
    BuildingCommercial,
    Grid1p,
    Grid3p,
    SurchargeSelectiveFuse,
    InverterTier3,
    InverterTier5,
    InverterTier10,
    InverterTier20,
    InverterTier30,
    StorageTier3,
    StorageTier5,
    StorageTier10,
    WrCablePmLt10,
    WrCablePmLt20,
    WrCablePmLt30,
    WallboxCablePmLt11,
    WallboxCablePmLt20,
    WallboxBase4kw,
    WallboxBase11kw,
    WallboxBase22kw,
    WallboxMountStand,
    WallboxPvSurplus,
    PackageBasis,
    PackagePlus,
    PackagePro,
    TravelZoneLocal,
    TravelZoneNear,
    TravelZoneFar,
    MaterialAcWiring,
    MaterialSpd,
    MaterialMeterUpgrade,
    DiscountCompleteKit,
}

impl PriceKey {
    pub const ALL: &'static [PriceKey] = &[
        PriceKey::BuildingEfh,
        PriceKey::BuildingMfh,
        PriceKey::BuildingCommercial,
        PriceKey::Grid1p,
        PriceKey::Grid3p,
        PriceKey::SurchargeSelectiveFuse,
        PriceKey::InverterTier3,
        PriceKey::InverterTier5,
        PriceKey::InverterTier10,
        PriceKey::InverterTier20,
        PriceKey::InverterTier30,
        PriceKey::StorageTier3,
        PriceKey::StorageTier5,
        PriceKey::StorageTier10,
        PriceKey::WrCablePmLt10,
        PriceKey::WrCablePmLt20,
        PriceKey::WrCablePmLt30,
        PriceKey::WallboxCablePmLt11,
        PriceKey::WallboxCablePmLt20,
        PriceKey::WallboxBase4kw,
        PriceKey::WallboxBase11kw,
        PriceKey::WallboxBase22kw,
        PriceKey::WallboxMountStand,
        PriceKey::WallboxPvSurplus,
        PriceKey::PackageBasis,
        PriceKey::PackagePlus,
        PriceKey::PackagePro,
        PriceKey::TravelZoneLocal,
        PriceKey::TravelZoneNear,
        PriceKey::TravelZoneFar,
        PriceKey::MaterialAcWiring,
        PriceKey::MaterialSpd,
        PriceKey::MaterialMeterUpgrade,
        PriceKey::DiscountCompleteKit,
    ];

    /// Wire name used by the `price_config` table and override seeds.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuildingEfh => "building_efh",
            Self::BuildingMfh => "building_mfh",
            Self::BuildingCommercial => "building_commercial",
            Self::Grid1p => "grid_1p",
            Self::Grid3p => "grid_3p",
            Self::SurchargeSelectiveFuse => "surcharge_selective_fuse",
            Self::InverterTier3 => "inverter_tier_3",
            Self::InverterTier5 => "inverter_tier_5",
            Self::InverterTier10 => "inverter_tier_10",
            Self::InverterTier20 => "inverter_tier_20",
            Self::InverterTier30 => "inverter_tier_30",
            Self::StorageTier3 => "storage_tier_3",
            Self::StorageTier5 => "storage_tier_5",
            Self::StorageTier10 => "storage_tier_10",
            Self::WrCablePmLt10 => "wr_cable_pm_lt10",
            Self::WrCablePmLt20 => "wr_cable_pm_lt20",
            Self::WrCablePmLt30 => "wr_cable_pm_lt30",
            Self::WallboxCablePmLt11 => "wallbox_cable_pm_lt11",
            Self::WallboxCablePmLt20 => "wallbox_cable_pm_lt20",
            Self::WallboxBase4kw => "wallbox_base_4kw",
            Self::WallboxBase11kw => "wallbox_base_11kw",
            Self::WallboxBase22kw => "wallbox_base_22kw",
            Self::WallboxMountStand => "wallbox_mount_stand",
            Self::WallboxPvSurplus => "wallbox_pv_surplus",
            Self::PackageBasis => "package_basis",
            Self::PackagePlus => "package_plus",
            Self::PackagePro => "package_pro",
            Self::TravelZoneLocal => "travel_zone_local",
            Self::TravelZoneNear => "travel_zone_near",
            Self::TravelZoneFar => "travel_zone_far",
            Self::MaterialAcWiring => "material_ac_wiring",
            Self::MaterialSpd => "material_spd",
            Self::MaterialMeterUpgrade => "material_meter_upgrade",
            Self::DiscountCompleteKit => "discount_complete_kit",
        }
    }

    /// Compiled-in default value in EUR net (or percent for percentage keys).
    pub fn default_value(self) -> Decimal {
        match self {
            Self::BuildingEfh => Decimal::ZERO,
            Self::BuildingMfh => Decimal::new(10000, 2),
            Self::BuildingCommercial => Decimal::new(5000, 2),
            Self::Grid1p => Decimal::new(10000, 2),
            Self::Grid3p => Decimal::ZERO,
            Self::SurchargeSelectiveFuse => Decimal::new(22000, 2),
            Self::InverterTier3 => Decimal::new(70000, 2),
            Self::InverterTier5 => Decimal::new(100_000, 2),
            Self::InverterTier10 => Decimal::new(150_000, 2),
            Self::InverterTier20 => Decimal::new(200_000, 2),
            Self::InverterTier30 => Decimal::new(220_000, 2),
            Self::StorageTier3 => Decimal::new(100_000, 2),
            Self::StorageTier5 => Decimal::new(130_000, 2),
            Self::StorageTier10 => Decimal::new(200_000, 2),
            Self::WrCablePmLt10 => Decimal::new(500, 2),
            Self::WrCablePmLt20 => Decimal::new(1500, 2),
            Self::WrCablePmLt30 => Decimal::new(2200, 2),
            Self::WallboxCablePmLt11 => Decimal::new(700, 2),
            Self::WallboxCablePmLt20 => Decimal::new(1400, 2),
            Self::WallboxBase4kw => Decimal::new(30000, 2),
            Self::WallboxBase11kw => Decimal::new(50000, 2),
            Self::WallboxBase22kw => Decimal::new(80000, 2),
            Self::WallboxMountStand => Decimal::new(20000, 2),
            // Zero until operations decides to charge for surplus charging.
            Self::WallboxPvSurplus => Decimal::ZERO,
            Self::PackageBasis => Decimal::new(89000, 2),
            Self::PackagePlus => Decimal::new(149_000, 2),
            Self::PackagePro => Decimal::new(229_000, 2),
            Self::TravelZoneLocal => Decimal::ZERO,
            Self::TravelZoneNear => Decimal::new(5000, 2),
            Self::TravelZoneFar => Decimal::new(9500, 2),
            // Subsumed by the itemized catalog path; override to re-enable.
            Self::MaterialAcWiring => Decimal::ZERO,
            Self::MaterialSpd => Decimal::ZERO,
            Self::MaterialMeterUpgrade => Decimal::ZERO,
            Self::DiscountCompleteKit => Decimal::ZERO,
        }
    }

    pub fn default_kind(self) -> PriceKind {
        match self {
            Self::DiscountCompleteKit => PriceKind::Percentage,
            _ => PriceKind::Absolute,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown price key `{0}`")]
pub struct UnknownPriceKey(pub String);

impl FromStr for PriceKey {
    type Err = UnknownPriceKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownPriceKey(s.to_string()))
    }
}

/// One resolved catalog value together with its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub value: Decimal,
    pub kind: PriceKind,
}

pub type CatalogOverrides = HashMap<PriceKey, CatalogEntry>;

/// Immutable price snapshot for one pricing computation.
///
/// Overrides come from the mutable `price_config` store; anything not
/// overridden falls back to the compiled-in default. A computation holds a
/// single `PriceCatalog` value for its whole duration, so it can never see
/// two different values for the same key (snapshot-read semantics).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceCatalog {
    overrides: CatalogOverrides,
}

impl PriceCatalog {
    pub fn new(overrides: CatalogOverrides) -> Self {
        Self { overrides }
    }

    /// Catalog with no overrides; every key resolves to its default.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn entry(&self, key: PriceKey) -> CatalogEntry {
        self.overrides.get(&key).copied().unwrap_or(CatalogEntry {
            value: key.default_value(),
            kind: key.default_kind(),
        })
    }

    pub fn value(&self, key: PriceKey) -> Decimal {
        self.entry(key).value
    }

    pub fn kind(&self, key: PriceKey) -> PriceKind {
        self.entry(key).kind
    }
}
