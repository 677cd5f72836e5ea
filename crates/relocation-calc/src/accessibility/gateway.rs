use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};

use super::domain::TravelMode;

/// Isochrone request for one origin. Simple modes are emulated on an empty
/// transit scenario by stretching the access/egress walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityMapRequest {
    pub point: Feature,
    pub transit_scenario: String,
    pub number_of_polygons: u32,
    pub calculate_pois: bool,
    pub max_total_travel_time_minutes: u32,
    pub departure_seconds_since_midnight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_access_egress_travel_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walking_speed_km_per_hour: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AccessibilityMapResponse {
    /// Polygons carry `durationSeconds` and `areaSqM` properties.
    Success { polygons: FeatureCollection },
    Error {
        #[serde(default)]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDistanceRequest {
    pub origin: Feature,
    pub destination: Feature,
    pub modes: Vec<TravelMode>,
    pub departure_seconds_since_midnight: u32,
    #[serde(rename = "departureDateString")]
    pub departure_date: NaiveDate,
    pub transit_scenario: String,
}

/// Outcome for one mode. Only `success` carries distance and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRouting {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_time_s: Option<f64>,
}

impl ModeRouting {
    pub const SUCCESS: &'static str = "success";

    pub fn success(distance_m: f64, travel_time_s: f64) -> Self {
        Self {
            status: Self::SUCCESS.to_string(),
            distance_m: Some(distance_m),
            travel_time_s: Some(travel_time_s),
        }
    }

    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            distance_m: None,
            travel_time_s: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }
}

pub type TimeDistanceResponse = BTreeMap<TravelMode, ModeRouting>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("routing service unreachable: {0}")]
    Transport(String),
    #[error("routing service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected routing service response: {0}")]
    Decode(String),
}

/// External routing and isochrone service.
#[async_trait]
pub trait RoutingGateway: Send + Sync {
    async fn accessibility_map(
        &self,
        request: AccessibilityMapRequest,
    ) -> Result<AccessibilityMapResponse, GatewayError>;

    async fn time_distance_by_mode(
        &self,
        request: TimeDistanceRequest,
    ) -> Result<TimeDistanceResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessibility_response_is_tagged_by_status() {
        let success: AccessibilityMapResponse = serde_json::from_value(json!({
            "status": "success",
            "polygons": { "type": "FeatureCollection", "features": [] }
        }))
        .expect("success parses");
        assert!(matches!(success, AccessibilityMapResponse::Success { .. }));

        let error: AccessibilityMapResponse =
            serde_json::from_value(json!({ "status": "error" })).expect("error parses");
        assert_eq!(error, AccessibilityMapResponse::Error { error: None });
    }

    #[test]
    fn time_distance_response_is_keyed_by_mode() {
        let response: TimeDistanceResponse = serde_json::from_value(json!({
            "walking": { "status": "success", "distanceM": 800.0, "travelTimeS": 600.0 },
            "transit": { "status": "noRoutingFound" }
        }))
        .expect("response parses");
        assert!(response[&TravelMode::Walking].is_success());
        assert!(!response[&TravelMode::Transit].is_success());
        assert_eq!(response[&TravelMode::Walking].distance_m, Some(800.0));
    }
}
