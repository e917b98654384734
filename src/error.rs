//! Error taxonomy for the acquisition layer.
//!
//! Only [`ValidationError`] is fatal to a fetch. Transport and API errors
//! are retried and escalated along the strategy chain, and exhaustion of
//! the chain resolves into a degraded outcome rather than a hard failure.

use std::time::Duration;

/// A query rejected before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("region name is required and cannot be empty")]
    MissingRegion,

    #[error("{field} is required")]
    MissingDate { field: &'static str },

    #[error("{field} '{value}' is not a YYYY-MM-DD date")]
    InvalidDate { field: &'static str, value: String },

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: String, end: String },
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// `after` is the limit that fired, when the caller knows it.
    #[error("request timed out{}", elapsed(.after))]
    Timeout { after: Option<Duration> },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

fn elapsed(after: &Option<Duration>) -> String {
    after
        .map(|after| format!(" after {}ms", after.as_millis()))
        .unwrap_or_default()
}

/// A response arrived but signalled failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("API error: {message} (status {status_code})")]
    Business { status_code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Any error the acquisition layer can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("all {strategies} strategies failed after {attempts} attempts; last error: {last}")]
    Exhausted {
        strategies: usize,
        attempts: u32,
        last: Box<FetchError>,
    },

    #[error("enrichment backend is not configured")]
    EnrichmentUnavailable,
}

impl FetchError {
    /// Whether another attempt (or another strategy) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Api(_))
    }
}
