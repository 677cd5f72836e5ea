use async_trait::async_trait;
use geo::Point;
use metrics_exporter_prometheus::PrometheusHandle;
use relocation_calc::accessibility::{
    AccessibilityConfig, AccessibilityMapRequest, AccessibilityMapResponse, AccessibilityService,
    GatewayError, RoutingGateway, TimeDistanceRequest, TimeDistanceResponse,
};
use relocation_calc::adapters::{GeoJsonZoneIndex, HttpModelLoader, HttpRoutingGateway};
use relocation_calc::calculations::vehicles::{
    CarOwnershipPredictor, InferenceError, InferenceSession, ModelHandle, ModelLoader,
    OwnershipPredictor, VehicleCostTable, ZoneLookup, ZoneLookupError, ZoneRecord,
};
use relocation_calc::calculations::MonthlyCostService;
use relocation_calc::config::AppConfig;
use relocation_calc::error::AppError;
use relocation_calc::survey::{AddressUpdate, DeferredOperations, ResultsSectionUpdater};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::routes::ApiState;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) model: Arc<ModelHandle>,
}

/// Zone lookup used by the service; without a zones file every lookup fails.
pub(crate) enum ZoneSource {
    Index(GeoJsonZoneIndex),
    Missing,
}

#[async_trait]
impl ZoneLookup for ZoneSource {
    async fn zones_containing(&self, point: Point<f64>) -> Result<Vec<ZoneRecord>, ZoneLookupError> {
        match self {
            ZoneSource::Index(index) => index.zones_containing(point).await,
            ZoneSource::Missing => Err(ZoneLookupError::Unavailable(
                "ZONES_GEOJSON_PATH is not configured".to_string(),
            )),
        }
    }
}

/// Routing gateway used by the service; without a URL every call fails.
pub(crate) enum RoutingBackend {
    Http(HttpRoutingGateway),
    Unconfigured,
}

#[async_trait]
impl RoutingGateway for RoutingBackend {
    async fn accessibility_map(
        &self,
        request: AccessibilityMapRequest,
    ) -> Result<AccessibilityMapResponse, GatewayError> {
        match self {
            RoutingBackend::Http(gateway) => gateway.accessibility_map(request).await,
            RoutingBackend::Unconfigured => Err(unconfigured_routing()),
        }
    }

    async fn time_distance_by_mode(
        &self,
        request: TimeDistanceRequest,
    ) -> Result<TimeDistanceResponse, GatewayError> {
        match self {
            RoutingBackend::Http(gateway) => gateway.time_distance_by_mode(request).await,
            RoutingBackend::Unconfigured => Err(unconfigured_routing()),
        }
    }
}

fn unconfigured_routing() -> GatewayError {
    GatewayError::Transport("ROUTING_SERVICE_URL is not configured".to_string())
}

/// Loader reporting that no inference endpoint is configured.
pub(crate) struct UnconfiguredModelLoader;

#[async_trait]
impl ModelLoader for UnconfiguredModelLoader {
    async fn load(&self, model: &str) -> Result<Arc<dyn InferenceSession>, InferenceError> {
        Err(InferenceError::Load {
            model: model.to_string(),
            reason: "INFERENCE_SERVICE_URL is not configured".to_string(),
        })
    }
}

pub(crate) type Predictor = CarOwnershipPredictor<ZoneSource>;
pub(crate) type Services = ApiState<Predictor, RoutingBackend>;

/// Wires the adapters named by the configuration into the calculation services.
pub(crate) fn build_services(
    config: &AppConfig,
) -> Result<(Services, Arc<ModelHandle>), AppError> {
    let costs = match &config.data.vehicle_cost_table {
        Some(path) => VehicleCostTable::from_path(path)?,
        None => VehicleCostTable::builtin(),
    };

    let zones = match &config.data.zones_geojson {
        Some(path) => ZoneSource::Index(GeoJsonZoneIndex::from_path(path)?),
        None => {
            tracing::warn!("no zones file configured, car ownership cannot be predicted");
            ZoneSource::Missing
        }
    };

    let loader: Arc<dyn ModelLoader> = match &config.model.inference_url {
        Some(url) => Arc::new(HttpModelLoader::new(url.as_str())?),
        None => {
            tracing::warn!("no inference service configured, car ownership cannot be predicted");
            Arc::new(UnconfiguredModelLoader)
        }
    };
    let model = Arc::new(ModelHandle::new(config.model.model_name(), loader));

    let gateway = match &config.routing.service_url {
        Some(url) => RoutingBackend::Http(HttpRoutingGateway::new(url.as_str())?),
        None => {
            tracing::warn!("no routing service configured, accessibility will be unavailable");
            RoutingBackend::Unconfigured
        }
    };

    let predictor = Arc::new(CarOwnershipPredictor::new(Arc::new(zones), model.clone()));
    let services = assemble(
        predictor,
        Arc::new(costs),
        Arc::new(gateway),
        config.routing.accessibility(),
    );
    Ok((services, model))
}

pub(crate) fn assemble<P, G>(
    predictor: Arc<P>,
    costs: Arc<VehicleCostTable>,
    gateway: Arc<G>,
    accessibility_config: AccessibilityConfig,
) -> ApiState<P, G>
where
    P: OwnershipPredictor + 'static,
    G: RoutingGateway + 'static,
{
    let costs = Arc::new(MonthlyCostService::new(predictor, costs));
    let accessibility = Arc::new(AccessibilityService::new(gateway));
    let operations: Arc<DeferredOperations<AddressUpdate>> = Arc::new(DeferredOperations::new());
    let updater = ResultsSectionUpdater::new(
        costs.clone(),
        accessibility.clone(),
        accessibility_config.clone(),
    )
    .with_operations(operations.clone());

    ApiState {
        costs,
        accessibility,
        updater: Arc::new(updater),
        operations,
        accessibility_config,
    }
}
