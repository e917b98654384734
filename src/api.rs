//! HTTP API handlers for Aquifer.
//!
//! A thin façade over one [`AcquisitionController`]. Every handler maps to a
//! single controller operation; none of them holds state of its own.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::controller::{AcquisitionController, AcquisitionSnapshot, FetchStatus};
use crate::error::FetchError;
use crate::model::{ParameterUpdate, QueryParameters, StationRecord, StationRef, TrainingReport};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: AcquisitionController,
}

/// Body of `GET /connection`.
#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub connected: bool,
}

/// Body of `POST /fetch`.
#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub status: FetchStatus,
    pub snapshot: AcquisitionSnapshot,
}

/// All routes, bound to `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/params", patch(patch_params))
        .route("/fetch", post(post_fetch))
        .route("/reset", post(post_reset))
        .route("/stations", get(get_stations))
        .route("/stations/:code", get(get_station_records))
        .route("/connection", get(get_connection))
        .route("/train-model", post(post_train_model))
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /snapshot - Current phase, query, outcome and statistics.
#[instrument(skip(state))]
pub async fn get_snapshot(State(state): State<AppState>) -> Json<AcquisitionSnapshot> {
    Json(state.controller.snapshot())
}

/// PATCH /params - Merge a partial query. Does not fetch.
///
/// # Request Body
///
/// ```json
/// {
///     "region": "Odisha",
///     "sub_region": null,
///     "start_date": "2024-01-01"
/// }
/// ```
///
/// Omitted fields are left as they are; `"sub_region": null` clears it.
#[instrument(skip(state))]
pub async fn patch_params(
    State(state): State<AppState>,
    Json(update): Json<ParameterUpdate>,
) -> Json<QueryParameters> {
    state.controller.update_parameters(update);
    let params = state.controller.parameters();
    info!(region = %params.region, start = %params.start_date, end = %params.end_date, "Parameters updated");
    Json(params)
}

/// POST /fetch - Fetch with the current query and return the resulting snapshot.
///
/// Always answers 200: invalid queries show up as a `failure` outcome and
/// unreachable upstreams as a `degraded` one.
#[instrument(skip(state))]
pub async fn post_fetch(State(state): State<AppState>) -> Json<FetchResponse> {
    let status = state.controller.fetch().await;
    let snapshot = state.controller.snapshot();

    if let Some(error) = snapshot.error() {
        warn!(status = ?status, error = %error, "Fetch completed with error");
    } else {
        info!(status = ?status, records = snapshot.records().len(), "Fetch completed");
    }

    Json(FetchResponse { status, snapshot })
}

/// POST /reset - Back to idle; any fetch in flight is superseded.
#[instrument(skip(state))]
pub async fn post_reset(State(state): State<AppState>) -> Json<AcquisitionSnapshot> {
    state.controller.reset();
    info!("Controller reset");
    Json(state.controller.snapshot())
}

/// GET /stations - Distinct stations in the current records.
#[instrument(skip(state))]
pub async fn get_stations(State(state): State<AppState>) -> Json<Vec<StationRef>> {
    Json(state.controller.stations())
}

/// GET /stations/:code - Current records for one station.
#[instrument(skip(state))]
pub async fn get_station_records(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<StationRecord>>, StatusCode> {
    let records = state.controller.filter_by_station(&code);
    if records.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(records))
}

/// GET /connection - Probe the enrichment backend.
#[instrument(skip(state))]
pub async fn get_connection(State(state): State<AppState>) -> Json<ConnectionResponse> {
    let connected = state.controller.test_connection().await;
    info!(connected, "Connection tested");
    Json(ConnectionResponse { connected })
}

/// POST /train-model - Ask the enrichment backend to retrain.
///
/// Returns `503` when no backend is configured and `502` when the backend
/// could not be reached or answered badly.
#[instrument(skip(state))]
pub async fn post_train_model(
    State(state): State<AppState>,
) -> Result<Json<TrainingReport>, StatusCode> {
    match state.controller.train_model().await {
        Ok(report) => Ok(Json(report)),
        Err(FetchError::EnrichmentUnavailable) => Err(StatusCode::SERVICE_UNAVAILABLE),
        Err(_) => Err(StatusCode::BAD_GATEWAY),
    }
}
