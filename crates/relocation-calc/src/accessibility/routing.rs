use chrono::NaiveDate;
use geojson::Feature;

use super::domain::{ModeTimeDistance, ResultsByMode, RoutingResult, TravelMode};
use super::gateway::{GatewayError, TimeDistanceRequest, TimeDistanceResponse};
use crate::calculations::domain::{Address, Destination};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("address has no geography")]
    MissingOrigin,
    #[error("destination has no geography")]
    MissingDestination,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Time/distance request covering every mode, in routing order.
pub fn time_distance_request(
    address: &Address,
    destination: &Destination,
    scenario: &str,
    departure_seconds_since_midnight: u32,
    departure_date: NaiveDate,
) -> Result<TimeDistanceRequest, RoutingError> {
    let origin: Feature = address.geography.clone().ok_or(RoutingError::MissingOrigin)?;
    let target: Feature = destination
        .geography
        .clone()
        .ok_or(RoutingError::MissingDestination)?;

    Ok(TimeDistanceRequest {
        origin,
        destination: target,
        modes: TravelMode::ROUTING_ORDER.to_vec(),
        departure_seconds_since_midnight,
        departure_date,
        transit_scenario: scenario.to_string(),
    })
}

/// Builds the per-mode result. Modes without a successful route keep only
/// their identity so all four keys are always present.
pub fn routing_result(destination: &Destination, response: &TimeDistanceResponse) -> RoutingResult {
    let mut results = ResultsByMode::default();
    for (sequence, mode) in TravelMode::ROUTING_ORDER.into_iter().enumerate() {
        match response.get(&mode) {
            Some(routing) if routing.is_success() => {
                *results.get_mut(mode) = ModeTimeDistance {
                    uuid: mode.as_str().to_string(),
                    sequence: Some(sequence as u32),
                    distance_meters: routing.distance_m,
                    travel_time_seconds: routing.travel_time_s,
                };
            }
            Some(routing) => {
                tracing::info!(
                    destination_id = %destination.uuid,
                    %mode,
                    status = %routing.status,
                    "no route found for mode"
                );
            }
            None => {
                tracing::warn!(destination_id = %destination.uuid, %mode, "mode missing from routing response");
            }
        }
    }

    RoutingResult {
        uuid: destination.uuid.clone(),
        sequence: destination.sequence,
        results_by_mode: results,
    }
}
