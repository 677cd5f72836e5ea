use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use geojson::Feature;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DEPARTURE_SECONDS;

/// Travel modes reported for every destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Transit,
    Walking,
    Cycling,
    Driving,
}

impl TravelMode {
    /// Order in which modes are requested from the routing service. A mode's
    /// position is its result sequence.
    pub const ROUTING_ORDER: [TravelMode; 4] = [
        TravelMode::Transit,
        TravelMode::Walking,
        TravelMode::Cycling,
        TravelMode::Driving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Transit => "transit",
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
            TravelMode::Driving => "driving",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scenario and departure settings for one accessibility calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibilityConfig {
    /// Weekday transit scenario. Nothing is computed without it.
    pub transit_scenario: Option<String>,
    /// Empty scenario used to emulate walking, cycling and driving isochrones.
    pub simple_modes_scenario: Option<String>,
    pub departure_seconds_since_midnight: u32,
    /// Defaults to the current date.
    pub departure_date: Option<NaiveDate>,
}

impl Default for AccessibilityConfig {
    fn default() -> Self {
        Self {
            transit_scenario: None,
            simple_modes_scenario: None,
            departure_seconds_since_midnight: DEFAULT_DEPARTURE_SECONDS,
            departure_date: None,
        }
    }
}

/// Isochrone polygons bound to the nominal 15, 30 and 45 minute buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBuckets {
    pub duration15_minutes: Option<Feature>,
    pub duration30_minutes: Option<Feature>,
    pub duration45_minutes: Option<Feature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityMapsByMode {
    pub walking: Option<DurationBuckets>,
    pub cycling: Option<DurationBuckets>,
    pub driving: Option<DurationBuckets>,
    pub transit: Option<DurationBuckets>,
}

/// Travel time and distance for one mode. Unresolved modes keep only their
/// identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeTimeDistance {
    #[serde(rename = "_uuid")]
    pub uuid: String,
    #[serde(rename = "_sequence", default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_time_seconds: Option<f64>,
}

impl ModeTimeDistance {
    pub fn unresolved(mode: TravelMode) -> Self {
        Self {
            uuid: mode.as_str().to_string(),
            sequence: None,
            distance_meters: None,
            travel_time_seconds: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.travel_time_seconds.is_some()
    }
}

/// Per-mode results; all four modes are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsByMode {
    pub walking: ModeTimeDistance,
    pub cycling: ModeTimeDistance,
    pub driving: ModeTimeDistance,
    pub transit: ModeTimeDistance,
}

impl Default for ResultsByMode {
    fn default() -> Self {
        Self {
            walking: ModeTimeDistance::unresolved(TravelMode::Walking),
            cycling: ModeTimeDistance::unresolved(TravelMode::Cycling),
            driving: ModeTimeDistance::unresolved(TravelMode::Driving),
            transit: ModeTimeDistance::unresolved(TravelMode::Transit),
        }
    }
}

impl ResultsByMode {
    pub fn get(&self, mode: TravelMode) -> &ModeTimeDistance {
        match mode {
            TravelMode::Walking => &self.walking,
            TravelMode::Cycling => &self.cycling,
            TravelMode::Driving => &self.driving,
            TravelMode::Transit => &self.transit,
        }
    }

    pub fn get_mut(&mut self, mode: TravelMode) -> &mut ModeTimeDistance {
        match mode {
            TravelMode::Walking => &mut self.walking,
            TravelMode::Cycling => &mut self.cycling,
            TravelMode::Driving => &mut self.driving,
            TravelMode::Transit => &mut self.transit,
        }
    }
}

/// Routing from an address to one declared destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingResult {
    #[serde(rename = "_uuid")]
    pub uuid: String,
    #[serde(rename = "_sequence")]
    pub sequence: u32,
    pub results_by_mode: ResultsByMode,
}

/// Destination uuid to its routing result, `None` when it could not be computed.
pub type RoutingTimeDistances = BTreeMap<String, Option<RoutingResult>>;

/// Both accessibility outputs of an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityOutcome {
    pub accessibility_maps_by_mode: Option<AccessibilityMapsByMode>,
    pub routing_time_distances: Option<RoutingTimeDistances>,
}
