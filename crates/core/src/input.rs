//! Canonical pricing input plus the lenient wire DTO.
//!
//! The legacy form/API boundary delivered booleans as "1"/"true"/"on"/"yes"
//! strings and decimals as either numbers or strings. All of that coercion
//! happens exactly once here, at the edge; everything behind
//! [`PricingInput`] works with real types.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::InputError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    /// Einfamilienhaus, the baseline type with no surcharge.
    #[default]
    Efh,
    /// Mehrfamilienhaus.
    Mfh,
    Commercial,
}

impl BuildingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Efh => "efh",
            Self::Mfh => "mfh",
            Self::Commercial => "commercial",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridType {
    /// Single-phase connection ("1p"), the less favorable case.
    #[serde(rename = "1p")]
    SinglePhase,
    #[default]
    #[serde(rename = "3p")]
    ThreePhase,
}

impl GridType {
    pub fn is_single_phase(self) -> bool {
        matches!(self, Self::SinglePhase)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SinglePhase => "1p",
            Self::ThreePhase => "3p",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallboxPower {
    #[serde(rename = "4kw")]
    Kw4,
    #[serde(rename = "11kw")]
    Kw11,
    #[serde(rename = "22kw")]
    Kw22,
}

impl WallboxPower {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kw4 => "4kw",
            Self::Kw11 => "11kw",
            Self::Kw22 => "22kw",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallboxMount {
    #[default]
    Wall,
    Stand,
}

impl WallboxMount {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Stand => "stand",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WallboxRequest {
    /// Absent power class is tolerated: the base price rule contributes zero.
    pub power: Option<WallboxPower>,
    pub mount: WallboxMount,
    pub cable_installed: bool,
    pub cable_length_m: Decimal,
    pub pv_surplus: bool,
}

/// One normalized pricing request. Constructed fresh per computation; all
/// decimal quantities are non-negative after [`PricingInput::clamped`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
    pub building_type: BuildingType,
    pub site_address: String,
    pub main_fuse_ampere: u32,
    pub grid_type: GridType,
    pub distance_meter: Decimal,
    pub desired_power_kw: Decimal,
    pub storage_kwh: Decimal,
    pub own_components: bool,
    pub wallbox: Option<WallboxRequest>,
}

impl PricingInput {
    /// Upstream validation should already prevent negative quantities; if one
    /// slips through it is clamped to zero, never propagated as a negative
    /// charge.
    pub fn clamped(mut self) -> Self {
        self.distance_meter = self.distance_meter.max(Decimal::ZERO);
        self.desired_power_kw = self.desired_power_kw.max(Decimal::ZERO);
        self.storage_kwh = self.storage_kwh.max(Decimal::ZERO);
        if let Some(wallbox) = self.wallbox.as_mut() {
            wallbox.cable_length_m = wallbox.cable_length_m.max(Decimal::ZERO);
        }
        self
    }
}

/// Boolean as delivered by the legacy form layer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlexBool {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl FlexBool {
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(value) => *value == 1,
            Self::Text(value) => {
                matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "on" | "yes")
            }
        }
    }
}

fn truthy(flag: &Option<FlexBool>) -> bool {
    flag.as_ref().is_some_and(FlexBool::truthy)
}

/// Decimal as delivered by the legacy form layer: number, numeric string, or
/// empty string meaning "not provided".
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlexDecimal {
    Number(f64),
    Text(String),
}

impl FlexDecimal {
    fn is_empty(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(value) => value.trim().is_empty(),
        }
    }

    fn parse(&self, field: &'static str) -> Result<Decimal, InputError> {
        match self {
            Self::Number(value) => Decimal::try_from(*value)
                .map_err(|_| InputError::MalformedDecimal { field, value: value.to_string() }),
            Self::Text(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Ok(Decimal::ZERO);
                }
                trimmed.parse::<Decimal>().map_err(|_| InputError::MalformedDecimal {
                    field,
                    value: value.clone(),
                })
            }
        }
    }
}

fn decimal_or_zero(field: &'static str, value: &Option<FlexDecimal>) -> Result<Decimal, InputError> {
    match value {
        Some(raw) => raw.parse(field),
        None => Ok(Decimal::ZERO),
    }
}

fn fuse_ampere(value: &Option<FlexDecimal>) -> Result<u32, InputError> {
    const FIELD: &str = "main_fuse_ampere";
    let decimal = decimal_or_zero(FIELD, value)?;
    if decimal < Decimal::ZERO {
        return Ok(0);
    }
    decimal.trunc().to_u32().ok_or_else(|| InputError::MalformedInteger {
        field: FIELD,
        value: decimal.to_string(),
    })
}

/// Wire shape of a pricing request as submitted by the precheck form, the
/// internal preview UI, and the workflow integration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PricingRequest {
    pub building_type: Option<String>,
    pub site_address: Option<String>,
    pub main_fuse_ampere: Option<FlexDecimal>,
    pub grid_type: Option<String>,
    pub distance_meter_to_inverter: Option<FlexDecimal>,
    pub distance_meter_to_hak: Option<FlexDecimal>,
    pub desired_power_kw: Option<FlexDecimal>,
    pub storage_kwh: Option<FlexDecimal>,
    pub own_components: Option<FlexBool>,
    pub has_wallbox: Option<FlexBool>,
    pub wallbox_power: Option<String>,
    pub wallbox_mount: Option<String>,
    pub wallbox_cable_installed: Option<FlexBool>,
    pub wallbox_cable_length: Option<FlexDecimal>,
    pub wallbox_pv_surplus: Option<FlexBool>,
}

impl PricingRequest {
    /// Validates and normalizes the raw request. Missing optionals become
    /// zero / "not requested"; malformed numerics and unsupported variants
    /// are rejected here so the orchestrator never sees them.
    pub fn try_into_input(self) -> Result<PricingInput, InputError> {
        let building_type = parse_building_type(self.building_type.as_deref())?;
        let grid_type = parse_grid_type(self.grid_type.as_deref())?;

        // Two historic field names carry the cable distance; the first
        // non-empty one wins.
        let distance_field = match (&self.distance_meter_to_inverter, &self.distance_meter_to_hak) {
            (Some(inverter), _) if !inverter.is_empty() => Some(inverter.clone()),
            (_, Some(hak)) => Some(hak.clone()),
            (Some(inverter), None) => Some(inverter.clone()),
            (None, None) => None,
        };

        let wallbox = if truthy(&self.has_wallbox) {
            Some(WallboxRequest {
                power: parse_wallbox_power(self.wallbox_power.as_deref())?,
                mount: parse_wallbox_mount(self.wallbox_mount.as_deref())?,
                cable_installed: truthy(&self.wallbox_cable_installed),
                cable_length_m: decimal_or_zero("wallbox_cable_length", &self.wallbox_cable_length)?,
                pv_surplus: truthy(&self.wallbox_pv_surplus),
            })
        } else {
            None
        };

        Ok(PricingInput {
            building_type,
            site_address: self.site_address.unwrap_or_default(),
            main_fuse_ampere: fuse_ampere(&self.main_fuse_ampere)?,
            grid_type,
            distance_meter: decimal_or_zero("distance_meter_to_inverter", &distance_field)?,
            desired_power_kw: decimal_or_zero("desired_power_kw", &self.desired_power_kw)?,
            storage_kwh: decimal_or_zero("storage_kwh", &self.storage_kwh)?,
            own_components: truthy(&self.own_components),
            wallbox,
        }
        .clamped())
    }
}

fn parse_building_type(raw: Option<&str>) -> Result<BuildingType, InputError> {
    match raw.map(|value| value.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("efh") => Ok(BuildingType::Efh),
        Some("mfh") => Ok(BuildingType::Mfh),
        Some("commercial") => Ok(BuildingType::Commercial),
        Some(other) => {
            Err(InputError::UnknownVariant { field: "building_type", value: other.to_string() })
        }
    }
}

fn parse_grid_type(raw: Option<&str>) -> Result<GridType, InputError> {
    match raw.map(|value| value.trim().to_lowercase()).as_deref() {
        Some("1p") => Ok(GridType::SinglePhase),
        None | Some("") | Some("3p") => Ok(GridType::ThreePhase),
        Some(other) => {
            Err(InputError::UnknownVariant { field: "grid_type", value: other.to_string() })
        }
    }
}

fn parse_wallbox_power(raw: Option<&str>) -> Result<Option<WallboxPower>, InputError> {
    match raw.map(|value| value.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(None),
        Some("4kw") => Ok(Some(WallboxPower::Kw4)),
        Some("11kw") => Ok(Some(WallboxPower::Kw11)),
        Some("22kw") => Ok(Some(WallboxPower::Kw22)),
        Some(other) => {
            Err(InputError::UnknownVariant { field: "wallbox_power", value: other.to_string() })
        }
    }
}

fn parse_wallbox_mount(raw: Option<&str>) -> Result<WallboxMount, InputError> {
    match raw.map(|value| value.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("wall") => Ok(WallboxMount::Wall),
        Some("stand") => Ok(WallboxMount::Stand),
        Some(other) => {
            Err(InputError::UnknownVariant { field: "wallbox_mount", value: other.to_string() })
        }
    }
}
