// Data model for the live transit map: modes, routes, the user's selection,
// and the entities drawn on the map (stops and vehicles).

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Transit Modes
// ============================================================================

/// The four transit categories a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitMode {
    LightRail,
    HeavyRail,
    CommuterRail,
    Bus,
}

impl TransitMode {
    pub const ALL: [TransitMode; 4] = [
        TransitMode::LightRail,
        TransitMode::HeavyRail,
        TransitMode::CommuterRail,
        TransitMode::Bus,
    ];

    /// Numeric route type used by the provider's `filter[type]` parameter.
    pub fn route_type(self) -> u8 {
        match self {
            TransitMode::LightRail => 0,
            TransitMode::HeavyRail => 1,
            TransitMode::CommuterRail => 2,
            TransitMode::Bus => 3,
        }
    }

    pub fn from_route_type(route_type: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.route_type() == route_type)
    }

    pub fn label(self) -> &'static str {
        match self {
            TransitMode::LightRail => "Subway Light Rail",
            TransitMode::HeavyRail => "Subway Heavy Rail",
            TransitMode::CommuterRail => "Commuter Rail",
            TransitMode::Bus => "Bus",
        }
    }
}

impl fmt::Display for TransitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Provider Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub display_name: String,
}

/// Raw provider coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// True when the point is inside the projector's input contract.
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && self.longitude.abs() <= 180.0
            && self.latitude.abs() <= 90.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePosition {
    pub id: String,
    pub location: GeoPoint,
}

/// Anything that ends up as a point marker on the map.
pub trait Located {
    fn id(&self) -> &str;
    fn location(&self) -> GeoPoint;
}

impl Located for Stop {
    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> GeoPoint {
        self.location
    }
}

impl Located for VehiclePosition {
    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> GeoPoint {
        self.location
    }
}

// ============================================================================
// Selection State
// ============================================================================

/// What the user has picked. `route_id` is only meaningful while `mode` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub mode: Option<TransitMode>,
    pub route_id: Option<String>,
}

impl Selection {
    pub fn set_mode(&mut self, mode: Option<TransitMode>) {
        self.mode = mode;
        self.route_id = None;
    }

    /// The (mode, route) pair when both are chosen.
    pub fn active_pair(&self) -> Option<(TransitMode, &str)> {
        match (self.mode, self.route_id.as_deref()) {
            (Some(mode), Some(route_id)) => Some((mode, route_id)),
            _ => None,
        }
    }
}

/// Tag for one activation of a selection. Never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}
