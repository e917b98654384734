//! Enrichment backend client types.
//!
//! The enrichment backend fetches upstream readings on our behalf and
//! attaches predicted levels in the same round trip. It also exposes a
//! health probe and an administrative training trigger.
//!
//! # Endpoints
//!
//! - `POST /api/fetch-groundwater-data` with `{state, district, start_date, end_date}`
//! - `GET /api/status`
//! - `POST /api/train-model`

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::{QueryParameters, StationRecord, TrainingReport};
use crate::transport::PreparedRequest;

const FETCH_PATH: &str = "/api/fetch-groundwater-data";
const STATUS_PATH: &str = "/api/status";
const TRAIN_PATH: &str = "/api/train-model";

/// JSON body of a fetch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentRequest {
    pub state: String,
    pub district: String,
    pub start_date: String,
    pub end_date: String,
}

impl From<&QueryParameters> for EnrichmentRequest {
    fn from(params: &QueryParameters) -> Self {
        Self {
            state: params.region.clone(),
            district: params.sub_region_name().unwrap_or_default().to_string(),
            start_date: params.start_date.clone(),
            end_date: params.end_date.clone(),
        }
    }
}

/// Response of the fetch endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResponse {
    /// Base upstream records, in upstream order.
    pub wrs_data: Vec<StationRecord>,

    #[serde(default)]
    pub ml_predictions: Option<Predictions>,

    #[serde(default)]
    pub metadata: Option<EnrichmentMetadata>,
}

/// Predicted levels, positionally aligned with `wrs_data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Predictions {
    #[serde(default)]
    pub predictions: Vec<f64>,

    /// One confidence value for the whole batch.
    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub model_type: Option<String>,

    /// Set when the backend could not predict (e.g. model not trained).
    #[serde(default)]
    pub error: Option<String>,
}

/// Provenance reported by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentMetadata {
    /// `wrs_api`, `fallback_simulation` or `error_fallback`.
    #[serde(default)]
    pub data_source: Option<String>,

    #[serde(default)]
    pub records_count: Option<usize>,
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Request for a fetch through the backend.
pub fn fetch_request(base_url: &str, params: &QueryParameters) -> PreparedRequest {
    let request = EnrichmentRequest::from(params);
    PreparedRequest::post(endpoint(base_url, FETCH_PATH)).with_json(serde_json::json!({
        "state": request.state,
        "district": request.district,
        "start_date": request.start_date,
        "end_date": request.end_date,
    }))
}

/// Health probe request.
pub fn status_request(base_url: &str) -> PreparedRequest {
    PreparedRequest::get(endpoint(base_url, STATUS_PATH))
}

/// Training trigger request.
pub fn train_request(base_url: &str) -> PreparedRequest {
    PreparedRequest::post(endpoint(base_url, TRAIN_PATH))
}

/// Parse a fetch response body.
pub fn parse_response(body: &str) -> Result<EnrichmentResponse, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))
}

/// Parse a training response body.
pub fn parse_training(body: &str) -> Result<TrainingReport, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))
}
