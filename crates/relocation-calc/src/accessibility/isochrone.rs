//! Isochrone requests per travel mode.
//!
//! The routing service only computes transit isochrones. Walking, cycling and
//! driving reuse it on an empty scenario where the whole trip is access/egress
//! walking: the ceiling is multiplied by the mode's speed relative to walking
//! and the returned polygons are mapped back onto the nominal buckets.

use geojson::{Feature, FeatureCollection};

use super::domain::{DurationBuckets, TravelMode};
use super::gateway::AccessibilityMapRequest;

pub const NOMINAL_MINUTES: [u32; 3] = [15, 30, 45];
pub const NUMBER_OF_POLYGONS: u32 = 3;

const WALKING_SPEED_KMH: u32 = 5;
const CYCLING_SPEED_KMH: u32 = 15;
const DRIVING_SPEED_KMH: u32 = 40;

const DURATION_TOLERANCE_SECONDS: f64 = 0.5;

/// Which configured scenario a profile runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Transit,
    SimpleModes,
}

/// Request parameters for one mode's isochrones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsochroneProfile {
    pub mode: TravelMode,
    pub scenario: ScenarioKind,
    /// Speed relative to walking.
    pub timing_factor: u32,
    pub walking_speed_km_per_hour: Option<f64>,
    /// Simple modes are pure access/egress trips.
    pub access_egress_only: bool,
}

impl IsochroneProfile {
    pub const TRANSIT: IsochroneProfile = IsochroneProfile {
        mode: TravelMode::Transit,
        scenario: ScenarioKind::Transit,
        timing_factor: 1,
        walking_speed_km_per_hour: None,
        access_egress_only: false,
    };

    pub const WALKING: IsochroneProfile = IsochroneProfile {
        mode: TravelMode::Walking,
        scenario: ScenarioKind::SimpleModes,
        timing_factor: 1,
        walking_speed_km_per_hour: Some(WALKING_SPEED_KMH as f64),
        access_egress_only: true,
    };

    pub const CYCLING: IsochroneProfile = IsochroneProfile {
        mode: TravelMode::Cycling,
        scenario: ScenarioKind::SimpleModes,
        timing_factor: CYCLING_SPEED_KMH / WALKING_SPEED_KMH,
        walking_speed_km_per_hour: None,
        access_egress_only: true,
    };

    pub const DRIVING: IsochroneProfile = IsochroneProfile {
        mode: TravelMode::Driving,
        scenario: ScenarioKind::SimpleModes,
        timing_factor: DRIVING_SPEED_KMH / WALKING_SPEED_KMH,
        walking_speed_km_per_hour: None,
        access_egress_only: true,
    };

    /// Requested minutes standing for the nominal 15, 30 and 45 minute buckets.
    pub fn thresholds_minutes(&self) -> [u32; 3] {
        NOMINAL_MINUTES.map(|minutes| minutes * self.timing_factor)
    }

    pub fn request(
        &self,
        point: Feature,
        scenario: &str,
        departure_seconds_since_midnight: u32,
    ) -> AccessibilityMapRequest {
        let ceiling = self.thresholds_minutes()[2];
        AccessibilityMapRequest {
            point,
            transit_scenario: scenario.to_string(),
            number_of_polygons: NUMBER_OF_POLYGONS,
            calculate_pois: true,
            max_total_travel_time_minutes: ceiling,
            departure_seconds_since_midnight,
            max_access_egress_travel_time_minutes: self.access_egress_only.then_some(ceiling),
            walking_speed_km_per_hour: self.walking_speed_km_per_hour,
        }
    }

    /// Binds returned polygons to buckets by their `durationSeconds`; buckets
    /// without a matching polygon stay empty.
    pub fn bind(&self, polygons: &FeatureCollection) -> DurationBuckets {
        let [first, second, third] = self
            .thresholds_minutes()
            .map(|minutes| polygon_with_duration(polygons, f64::from(minutes) * 60.0));
        DurationBuckets {
            duration15_minutes: first,
            duration30_minutes: second,
            duration45_minutes: third,
        }
    }
}

fn polygon_with_duration(polygons: &FeatureCollection, seconds: f64) -> Option<Feature> {
    polygons
        .features
        .iter()
        .find(|feature| {
            feature
                .property("durationSeconds")
                .and_then(|value| value.as_f64())
                .is_some_and(|duration| (duration - seconds).abs() < DURATION_TOLERANCE_SECONDS)
        })
        .cloned()
}
