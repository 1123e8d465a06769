use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::errors::ControlError;
use super::schemas::{
    CapacityRequest, CapacityResponse, ClearQuery, ClearResponse, EntryListResponse,
    EntryResponse, HealthResponse, IntervalRequest, IntervalResponse, ListQuery,
    MonitoringResponse, PinResponse, StatusResponse,
};
use super::service::ControlService;
use super::HistoryControl;

type ApiResult<T> = Result<Json<T>, ControlError>;

/// Loopback HTTP API over a [`ControlService`].
pub fn router(service: ControlService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/entries", get(list_entries).delete(clear_entries))
        .route("/entries/{id}", get(get_entry).delete(delete_entry))
        .route("/entries/{id}/pin", post(pin_entry))
        .route("/entries/{id}/unpin", post(unpin_entry))
        .route("/entries/{id}/toggle-pin", post(toggle_pin_entry))
        .route("/entries/{id}/copy", post(copy_entry))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/settings/capacity", put(set_capacity))
        .route("/settings/interval", put(set_interval))
        .route("/show", post(show))
        .layer(CorsLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::current())
}

async fn status(State(service): State<ControlService>) -> ApiResult<StatusResponse> {
    service.status().await.map(Json)
}

async fn list_entries(
    State(service): State<ControlService>,
    Query(query): Query<ListQuery>,
) -> ApiResult<EntryListResponse> {
    service.list(query).await.map(Json)
}

async fn clear_entries(
    State(service): State<ControlService>,
    Query(query): Query<ClearQuery>,
) -> ApiResult<ClearResponse> {
    service.clear(query.all).await.map(Json)
}

async fn get_entry(
    State(service): State<ControlService>,
    Path(id): Path<String>,
) -> ApiResult<EntryResponse> {
    service.get(&id).await.map(Json)
}

async fn delete_entry(
    State(service): State<ControlService>,
    Path(id): Path<String>,
) -> ApiResult<EntryResponse> {
    service.delete(&id).await.map(Json)
}

async fn pin_entry(
    State(service): State<ControlService>,
    Path(id): Path<String>,
) -> ApiResult<PinResponse> {
    service.pin(&id).await.map(Json)
}

async fn unpin_entry(
    State(service): State<ControlService>,
    Path(id): Path<String>,
) -> ApiResult<PinResponse> {
    service.unpin(&id).await.map(Json)
}

async fn toggle_pin_entry(
    State(service): State<ControlService>,
    Path(id): Path<String>,
) -> ApiResult<PinResponse> {
    service.toggle_pin(&id).await.map(Json)
}

async fn copy_entry(
    State(service): State<ControlService>,
    Path(id): Path<String>,
) -> ApiResult<EntryResponse> {
    service.copy(&id).await.map(Json)
}

async fn pause(State(service): State<ControlService>) -> ApiResult<MonitoringResponse> {
    service.set_paused(true).await.map(Json)
}

async fn resume(State(service): State<ControlService>) -> ApiResult<MonitoringResponse> {
    service.set_paused(false).await.map(Json)
}

async fn set_capacity(
    State(service): State<ControlService>,
    Json(request): Json<CapacityRequest>,
) -> ApiResult<CapacityResponse> {
    service.set_capacity(request.capacity).await.map(Json)
}

async fn set_interval(
    State(service): State<ControlService>,
    Json(request): Json<IntervalRequest>,
) -> ApiResult<IntervalResponse> {
    service.set_interval(request.interval_ms).await.map(Json)
}

async fn show(State(service): State<ControlService>) -> Result<StatusCode, ControlError> {
    service.show().await?;
    Ok(StatusCode::NO_CONTENT)
}
