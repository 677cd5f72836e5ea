#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use geojson::{Feature, FeatureCollection};
use relocation_calc::accessibility::{
    AccessibilityConfig, AccessibilityMapRequest, AccessibilityMapResponse, GatewayError,
    ModeRouting, RoutingGateway, TimeDistanceRequest, TimeDistanceResponse, TravelMode,
};
use relocation_calc::calculations::vehicles::{
    OwnershipPredictor, OwnershipQuery, PredictionError,
};
use relocation_calc::calculations::{Address, Interview};
use serde_json::json;

pub const TRANSIT_SCENARIO: &str = "weekday-transit";
pub const SIMPLE_MODES_SCENARIO: &str = "empty-network";

/// Routing gateway that records requests and answers from the request itself.
///
/// Destinations whose feature carries a `behavior` property of `fail` or
/// `panic` make routing to them error out or panic. Scenarios listed in
/// `failing_scenarios` answer isochrone requests with an error status.
#[derive(Default)]
pub struct RecordingGateway {
    pub failing_scenarios: Vec<String>,
    map_requests: Mutex<Vec<AccessibilityMapRequest>>,
    route_requests: Mutex<Vec<TimeDistanceRequest>>,
}

impl RecordingGateway {
    pub fn failing_scenario(scenario: &str) -> Self {
        Self {
            failing_scenarios: vec![scenario.to_string()],
            ..Self::default()
        }
    }

    pub fn map_requests(&self) -> Vec<AccessibilityMapRequest> {
        self.map_requests.lock().expect("gateway mutex poisoned").clone()
    }

    pub fn route_requests(&self) -> Vec<TimeDistanceRequest> {
        self.route_requests.lock().expect("gateway mutex poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.map_requests().len() + self.route_requests().len()
    }
}

#[async_trait]
impl RoutingGateway for RecordingGateway {
    async fn accessibility_map(
        &self,
        request: AccessibilityMapRequest,
    ) -> Result<AccessibilityMapResponse, GatewayError> {
        self.map_requests
            .lock()
            .expect("gateway mutex poisoned")
            .push(request.clone());

        if self.failing_scenarios.contains(&request.transit_scenario) {
            return Ok(AccessibilityMapResponse::Error {
                error: Some("scenario not found".to_string()),
            });
        }

        let ceiling = request.max_total_travel_time_minutes;
        let durations = [ceiling / 3, 2 * ceiling / 3, ceiling].map(|minutes| f64::from(minutes) * 60.0);
        Ok(AccessibilityMapResponse::Success {
            polygons: polygons(&durations),
        })
    }

    async fn time_distance_by_mode(
        &self,
        request: TimeDistanceRequest,
    ) -> Result<TimeDistanceResponse, GatewayError> {
        self.route_requests
            .lock()
            .expect("gateway mutex poisoned")
            .push(request.clone());

        match request
            .destination
            .property("behavior")
            .and_then(|value| value.as_str())
        {
            Some("fail") => return Err(GatewayError::Transport("connection reset".to_string())),
            Some("panic") => panic!("routing engine crashed"),
            _ => {}
        }

        Ok(request
            .modes
            .iter()
            .enumerate()
            .map(|(index, mode)| {
                let routing = match mode {
                    TravelMode::Driving => ModeRouting::failed("noRoutingFound"),
                    _ => ModeRouting::success(1_000.0 * (index as f64 + 1.0), 600.0 * (index as f64 + 1.0)),
                };
                (*mode, routing)
            })
            .collect())
    }
}

/// Predictor with a fixed answer.
pub struct FixedPredictor(pub u32);

#[async_trait]
impl OwnershipPredictor for FixedPredictor {
    async fn predict(&self, _query: &OwnershipQuery) -> Result<u32, PredictionError> {
        Ok(self.0)
    }
}

pub fn polygons(durations: &[f64]) -> FeatureCollection {
    let features: Vec<_> = durations
        .iter()
        .map(|seconds| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                },
                "properties": { "durationSeconds": seconds, "areaSqM": 1_000_000.0 }
            })
        })
        .collect();
    serde_json::from_value(json!({ "type": "FeatureCollection", "features": features }))
        .expect("collection parses")
}

pub fn point_feature(lon: f64, lat: f64, properties: serde_json::Value) -> Feature {
    serde_json::from_value(json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [lon, lat] },
        "properties": properties
    }))
    .expect("point feature")
}

pub fn config() -> AccessibilityConfig {
    AccessibilityConfig {
        transit_scenario: Some(TRANSIT_SCENARIO.to_string()),
        simple_modes_scenario: Some(SIMPLE_MODES_SCENARIO.to_string()),
        departure_seconds_since_midnight: 28_800,
        departure_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1),
    }
}

/// Household of two with one car, one rented candidate address and the given
/// destinations as `(uuid, behavior)`.
pub fn interview(destinations: &[(&str, &str)]) -> Interview {
    let destinations: serde_json::Map<String, serde_json::Value> = destinations
        .iter()
        .enumerate()
        .map(|(index, (uuid, behavior))| {
            (
                uuid.to_string(),
                json!({
                    "_sequence": index + 1,
                    "_uuid": uuid,
                    "name": format!("destination {}", index + 1),
                    "geography": {
                        "type": "Feature",
                        "geometry": { "type": "Point", "coordinates": [-73.57 + index as f64 * 0.01, 45.50] },
                        "properties": { "behavior": behavior }
                    }
                }),
            )
        })
        .collect();

    serde_json::from_value(json!({
        "household": {
            "income": "060000_069999",
            "persons": {
                "p1": { "_sequence": 1, "_uuid": "p1", "drivingLicenseOwnership": "yes" },
                "p2": { "_sequence": 2, "_uuid": "p2", "drivingLicenseOwnership": "no" }
            }
        },
        "cars": {
            "car-1": { "_sequence": 1, "_uuid": "car-1", "category": "passengerCar", "engineType": "gas" }
        },
        "destinations": destinations,
        "addresses": {
            "home-1": {
                "_sequence": 1,
                "_uuid": "home-1",
                "ownership": "rent",
                "rentMonthly": 1500,
                "areUtilitiesIncluded": true,
                "geography": {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-73.6, 45.5] },
                    "properties": {}
                }
            }
        }
    }))
    .expect("interview parses")
}

pub fn address(interview: &Interview, uuid: &str) -> Address {
    interview.addresses.get(uuid).cloned().expect("address exists")
}
