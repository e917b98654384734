//! India-WRIS groundwater level endpoint.
//!
//! The public hydrology API serves station readings through a single
//! `POST` endpoint that takes every parameter in the query string and
//! answers with an envelope:
//!
//! ```json
//! { "statusCode": 200, "message": "Data fetched successfully", "data": [ ... ] }
//! ```
//!
//! A `200` HTTP status does not mean the query succeeded; the envelope's
//! `statusCode` and `message` carry the business outcome.
//!
//! Browsers cannot call the endpoint directly (no CORS headers), so the same
//! request can be routed through a relay prefix. Relays keep the request and
//! response contract unchanged.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::{QueryParameters, StationRecord};
use crate::transport::PreparedRequest;

/// Base URL of the groundwater level dataset.
pub const WRIS_API_BASE: &str = "https://indiawris.gov.in/Dataset/Ground%20Water%20Level";

/// Message the upstream sends alongside a successful `statusCode`.
pub const SUCCESS_MESSAGE: &str = "Data fetched successfully";

/// Envelope returned by the dataset endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrisResponse {
    #[serde(default, rename = "statusCode")]
    pub status_code: i64,

    #[serde(default)]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<StationRecord>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<StationRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<StationRecord>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl WrisResponse {
    /// Whether the envelope reports a successful query.
    pub fn is_success(&self) -> bool {
        self.status_code == 200 && self.message == SUCCESS_MESSAGE
    }
}

/// Query-string pairs in the order the upstream documents them.
///
/// `districtName` is only sent when a non-blank sub-region is set.
pub fn query_pairs(params: &QueryParameters) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("stateName", params.region.clone()),
        ("startdate", params.start_date.clone()),
        ("enddate", params.end_date.clone()),
        ("agencyName", params.agency.clone()),
        ("download", "false".to_string()),
        ("page", params.page.to_string()),
        ("size", params.size.to_string()),
    ];

    if let Some(district) = params.sub_region_name() {
        pairs.push(("districtName", district.to_string()));
    }

    pairs
}

/// Full target URL with an encoded query string.
pub fn target_url(base_url: &str, params: &QueryParameters) -> String {
    let query = query_pairs(params)
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base_url, separator, query)
}

/// Request for a direct call to the upstream.
pub fn direct_request(base_url: &str, params: &QueryParameters) -> PreparedRequest {
    PreparedRequest::post(target_url(base_url, params))
}

/// Wrap a target URL behind a relay prefix.
///
/// Prefixes that end in `=` take the target as a query parameter value and
/// get it percent-encoded (`https://api.allorigins.win/raw?url=`). Other
/// prefixes take it verbatim (`https://corsproxy.io/?`,
/// `https://cors-anywhere.herokuapp.com/`).
pub fn relay_url(prefix: &str, target: &str) -> String {
    if prefix.ends_with('=') {
        format!("{}{}", prefix, urlencoding::encode(target))
    } else {
        format!("{}{}", prefix, target)
    }
}

/// Parse a dataset envelope, rejecting business-level failures.
pub fn parse_response(body: &str) -> Result<Vec<StationRecord>, ApiError> {
    let response: WrisResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;

    if !response.is_success() {
        return Err(ApiError::Business {
            status_code: response.status_code,
            message: response.message,
        });
    }

    Ok(response.data)
}
