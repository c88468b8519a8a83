//! Coarse address-to-travel-zone classification.
//!
//! This is a substring heuristic over the handful of city names the install
//! teams actually drive to, not geocoding. It is allowed to misclassify
//! addresses it has not special-cased; a future geocoding integration
//! replaces [`classify`] without touching the orchestrator contract.

use serde::{Deserialize, Serialize};

use crate::catalog::PriceKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelZone {
    /// Hamburg city, no travel charge.
    Local,
    /// Surrounding towns up to ~30 km.
    Near,
    /// Everything else, up to the ~60 km service limit.
    Far,
}

impl TravelZone {
    pub fn price_key(self) -> PriceKey {
        match self {
            Self::Local => PriceKey::TravelZoneLocal,
            Self::Near => PriceKey::TravelZoneNear,
            Self::Far => PriceKey::TravelZoneFar,
        }
    }
}

const NEAR_TOWNS: &[&str] = &["norderstedt", "ahrensburg", "pinneberg"];

/// An empty address means "no site given yet" (typical for previews) and is
/// treated as local so the preview carries no travel charge.
pub fn classify(address: &str) -> TravelZone {
    let address = address.trim().to_lowercase();
    if address.is_empty() || address.contains("hamburg") {
        return TravelZone::Local;
    }
    if NEAR_TOWNS.iter().any(|town| address.contains(town)) {
        return TravelZone::Near;
    }
    TravelZone::Far
}
