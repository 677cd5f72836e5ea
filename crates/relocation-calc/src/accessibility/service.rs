use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use futures::FutureExt;

use super::domain::{
    AccessibilityConfig, AccessibilityMapsByMode, AccessibilityOutcome, DurationBuckets,
    RoutingResult, RoutingTimeDistances,
};
use super::gateway::{AccessibilityMapResponse, RoutingGateway};
use super::isochrone::{IsochroneProfile, ScenarioKind};
use super::routing::{routing_result, time_distance_request, RoutingError};
use crate::calculations::domain::{Address, Destination, Interview};

/// Isochrones and per-destination travel times for candidate addresses.
///
/// Every request of one calculation runs concurrently; a failing request only
/// empties its own slot of the outcome.
pub struct AccessibilityService<G> {
    gateway: Arc<G>,
}

impl<G> AccessibilityService<G>
where
    G: RoutingGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn calculate(
        &self,
        address: &Address,
        interview: &Interview,
        config: &AccessibilityConfig,
    ) -> AccessibilityOutcome {
        let Some(scenario) = config.transit_scenario.as_deref() else {
            tracing::error!(
                address_id = %address.uuid,
                "no transit scenario configured for routing and accessibility"
            );
            return AccessibilityOutcome::default();
        };

        let departure_date = departure_date(config);
        let destinations = interview.destinations();
        let routes = destinations.iter().map(|destination| {
            self.route_or_none(address, destination, scenario, config, departure_date)
        });

        let (transit, (walking, cycling, driving), routes) = tokio::join!(
            self.transit_map(address, config),
            self.simple_mode_maps(address, config),
            join_all(routes),
        );

        let routing_time_distances: RoutingTimeDistances = destinations
            .iter()
            .zip(routes)
            .map(|(destination, route)| (destination.uuid.clone(), route))
            .collect();

        AccessibilityOutcome {
            accessibility_maps_by_mode: Some(AccessibilityMapsByMode {
                walking,
                cycling,
                driving,
                transit,
            }),
            routing_time_distances: Some(routing_time_distances),
        }
    }

    pub async fn transit_map(
        &self,
        address: &Address,
        config: &AccessibilityConfig,
    ) -> Option<DurationBuckets> {
        self.isochrones(address, config, IsochroneProfile::TRANSIT).await
    }

    /// Walking, cycling and driving isochrones, requested concurrently.
    pub async fn simple_mode_maps(
        &self,
        address: &Address,
        config: &AccessibilityConfig,
    ) -> (
        Option<DurationBuckets>,
        Option<DurationBuckets>,
        Option<DurationBuckets>,
    ) {
        tokio::join!(
            self.isochrones(address, config, IsochroneProfile::WALKING),
            self.isochrones(address, config, IsochroneProfile::CYCLING),
            self.isochrones(address, config, IsochroneProfile::DRIVING),
        )
    }

    /// Routing to one destination, `None` on any failure.
    pub async fn route(
        &self,
        address: &Address,
        destination: &Destination,
        config: &AccessibilityConfig,
    ) -> Option<RoutingResult> {
        let Some(scenario) = config.transit_scenario.as_deref() else {
            tracing::error!(
                destination_id = %destination.uuid,
                "no transit scenario configured for routing"
            );
            return None;
        };
        self.route_or_none(address, destination, scenario, config, departure_date(config))
            .await
    }

    async fn isochrones(
        &self,
        address: &Address,
        config: &AccessibilityConfig,
        profile: IsochroneProfile,
    ) -> Option<DurationBuckets> {
        let mode = profile.mode;
        let Some(point) = address.geography.clone() else {
            tracing::error!(address_id = %address.uuid, %mode, "no geography for accessibility map");
            return None;
        };
        let scenario = match profile.scenario {
            ScenarioKind::Transit => config.transit_scenario.as_deref(),
            ScenarioKind::SimpleModes => config.simple_modes_scenario.as_deref(),
        };
        let Some(scenario) = scenario else {
            tracing::error!(address_id = %address.uuid, %mode, "no scenario configured for accessibility map");
            return None;
        };

        let request = profile.request(point, scenario, config.departure_seconds_since_midnight);
        match self.gateway.accessibility_map(request).await {
            Ok(AccessibilityMapResponse::Success { polygons }) => Some(profile.bind(&polygons)),
            Ok(AccessibilityMapResponse::Error { error }) => {
                tracing::warn!(
                    address_id = %address.uuid,
                    %mode,
                    error = error.as_deref().unwrap_or("unspecified"),
                    "accessibility map calculation failed"
                );
                None
            }
            Err(error) => {
                tracing::error!(address_id = %address.uuid, %mode, %error, "accessibility map request failed");
                None
            }
        }
    }

    async fn route_or_none(
        &self,
        address: &Address,
        destination: &Destination,
        scenario: &str,
        config: &AccessibilityConfig,
        departure_date: NaiveDate,
    ) -> Option<RoutingResult> {
        let attempt = self.try_route(
            address,
            destination,
            scenario,
            config.departure_seconds_since_midnight,
            departure_date,
        );
        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(Ok(result)) => Some(result),
            Ok(Err(error)) => {
                tracing::error!(
                    address_id = %address.uuid,
                    destination_id = %destination.uuid,
                    %error,
                    "error getting routing from address to destination"
                );
                None
            }
            Err(_) => {
                tracing::error!(
                    address_id = %address.uuid,
                    destination_id = %destination.uuid,
                    "routing to destination panicked"
                );
                None
            }
        }
    }

    async fn try_route(
        &self,
        address: &Address,
        destination: &Destination,
        scenario: &str,
        departure_seconds_since_midnight: u32,
        departure_date: NaiveDate,
    ) -> Result<RoutingResult, RoutingError> {
        let request = time_distance_request(
            address,
            destination,
            scenario,
            departure_seconds_since_midnight,
            departure_date,
        )?;
        let response = self.gateway.time_distance_by_mode(request).await?;
        Ok(routing_result(destination, &response))
    }
}

fn departure_date(config: &AccessibilityConfig) -> NaiveDate {
    config
        .departure_date
        .unwrap_or_else(|| chrono::Local::now().date_naive())
}
