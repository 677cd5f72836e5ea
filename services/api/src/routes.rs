use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use relocation_calc::accessibility::{
    AccessibilityConfig, AccessibilityOutcome, AccessibilityService, RoutingGateway,
};
use relocation_calc::calculations::vehicles::OwnershipPredictor;
use relocation_calc::calculations::{Address, CalculationResult, Interview, MonthlyCostService};
use relocation_calc::error::AppError;
use relocation_calc::survey::{
    AddressUpdate, DeferredOperations, OperationStatus, ResultsSectionUpdater, SectionAction,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Calculation services shared by the handlers.
pub(crate) struct ApiState<P, G> {
    pub(crate) costs: Arc<MonthlyCostService<P>>,
    pub(crate) accessibility: Arc<AccessibilityService<G>>,
    pub(crate) updater: Arc<ResultsSectionUpdater<P, G>>,
    pub(crate) operations: Arc<DeferredOperations<AddressUpdate>>,
    pub(crate) accessibility_config: AccessibilityConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddressRequest {
    pub(crate) address: Address,
    #[serde(default)]
    pub(crate) interview: Interview,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultsRequest {
    pub(crate) interview: Interview,
    #[serde(default)]
    pub(crate) actions: Vec<SectionAction>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultsResponse {
    pub(crate) updates: BTreeMap<String, Value>,
    pub(crate) scheduled: Vec<String>,
}

pub(crate) fn calculation_router<P, G>(state: Arc<ApiState<P, G>>) -> Router
where
    P: OwnershipPredictor + 'static,
    G: RoutingGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/addresses/monthly-cost",
            post(monthly_cost_handler::<P, G>),
        )
        .route(
            "/api/v1/addresses/accessibility",
            post(accessibility_handler::<P, G>),
        )
        .route("/api/v1/interviews/results", post(results_handler::<P, G>))
        .route("/api/v1/operations/:name", get(operation_handler::<P, G>))
        .with_state(state)
}

pub(crate) fn with_calculation_routes<P, G>(state: Arc<ApiState<P, G>>) -> Router
where
    P: OwnershipPredictor + 'static,
    G: RoutingGateway + 'static,
{
    calculation_router(state)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = json!({
        "status": if ready { "ready" } else { "initializing" },
        "model": state.model.model(),
        "model_state": state.model.state(),
    });

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn monthly_cost_handler<P, G>(
    State(state): State<Arc<ApiState<P, G>>>,
    Json(request): Json<AddressRequest>,
) -> Json<CalculationResult>
where
    P: OwnershipPredictor + 'static,
    G: RoutingGateway + 'static,
{
    Json(
        state
            .costs
            .calculate(&request.address, &request.interview)
            .await,
    )
}

pub(crate) async fn accessibility_handler<P, G>(
    State(state): State<Arc<ApiState<P, G>>>,
    Json(request): Json<AddressRequest>,
) -> Json<AccessibilityOutcome>
where
    P: OwnershipPredictor + 'static,
    G: RoutingGateway + 'static,
{
    Json(
        state
            .accessibility
            .calculate(
                &request.address,
                &request.interview,
                &state.accessibility_config,
            )
            .await,
    )
}

pub(crate) async fn results_handler<P, G>(
    State(state): State<Arc<ApiState<P, G>>>,
    Json(request): Json<ResultsRequest>,
) -> Json<ResultsResponse>
where
    P: OwnershipPredictor + 'static,
    G: RoutingGateway + 'static,
{
    let update = state
        .updater
        .on_section_actions(&request.interview, &request.actions)
        .await;
    Json(ResultsResponse {
        updates: update.field_updates(),
        scheduled: update.scheduled,
    })
}

pub(crate) async fn operation_handler<P, G>(
    State(state): State<Arc<ApiState<P, G>>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError>
where
    P: OwnershipPredictor + 'static,
    G: RoutingGateway + 'static,
{
    let payload = match state.operations.status(&name) {
        OperationStatus::Unknown => {
            return Err(AppError::NotFound(format!("operation '{name}'")));
        }
        OperationStatus::Pending => json!({ "status": "pending" }),
        OperationStatus::Completed(update) => {
            let updates: BTreeMap<String, Value> = update.field_updates().into_iter().collect();
            json!({ "status": "completed", "updates": updates })
        }
        OperationStatus::Failed(reason) => json!({ "status": "failed", "error": reason }),
    };
    Ok(Json(payload))
}
