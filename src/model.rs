//! Data models for Aquifer.
//!
//! These are the value types that flow between the acquisition layer and its
//! collaborators: the query a screen submits, the canonical station record,
//! the tagged outcome of one fetch, and the statistics derived from it.
//!
//! Records are immutable value objects. Two records describe the same
//! observation when their `(station_code, data_time)` pairs match; nothing
//! in this crate relies on identity.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Agency used when a query does not name one.
pub const DEFAULT_AGENCY: &str = "CGWB";

/// Page size used when a query does not name one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A query for station readings.
///
/// A fetch takes a snapshot of the parameters when it starts; later updates
/// never reach a request that is already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    /// Region (state) name. Required.
    pub region: String,

    /// Optional sub-region (district) name.
    #[serde(default)]
    pub sub_region: Option<String>,

    /// Agency responsible for the stations.
    #[serde(default = "default_agency")]
    pub agency: String,

    /// First day of the range, `YYYY-MM-DD`.
    pub start_date: String,

    /// Last day of the range, `YYYY-MM-DD`.
    pub end_date: String,

    /// Zero-based page index.
    #[serde(default)]
    pub page: u32,

    /// Records per page.
    #[serde(default = "default_page_size")]
    pub size: u32,
}

fn default_agency() -> String {
    DEFAULT_AGENCY.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl QueryParameters {
    /// Create parameters for a region and date range with default agency and paging.
    pub fn new(region: &str, start_date: &str, end_date: &str) -> Self {
        Self {
            region: region.to_string(),
            sub_region: None,
            agency: default_agency(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the sub-region.
    pub fn with_sub_region(mut self, sub_region: &str) -> Self {
        self.sub_region = Some(sub_region.to_string());
        self
    }

    /// Set the page index and size.
    pub fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    /// The sub-region if it is present and not blank.
    pub fn sub_region_name(&self) -> Option<&str> {
        self.sub_region
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Apply a partial update, leaving unspecified fields untouched.
    pub fn merge(&mut self, update: ParameterUpdate) {
        if let Some(region) = update.region {
            self.region = region;
        }
        if let Some(sub_region) = update.sub_region {
            self.sub_region = sub_region;
        }
        if let Some(agency) = update.agency {
            self.agency = agency;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        if let Some(page) = update.page {
            self.page = page;
        }
        if let Some(size) = update.size {
            self.size = size;
        }
    }
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

/// A partial set of query parameters.
///
/// `sub_region` is doubly optional so a caller can clear it with
/// `Some(None)` (JSON `null`) as well as leave it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParameterUpdate {
    pub region: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub sub_region: Option<Option<String>>,
    pub agency: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// A single groundwater reading at a monitoring station.
///
/// Field names on the wire follow the upstream hydrology API. The
/// enrichment fields are absent on live and substitute data and are only
/// filled in by the normalizer when the enrichment backend served the fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    #[serde(default, rename = "stationCode", deserialize_with = "null_as_default")]
    pub station_code: String,

    #[serde(default, rename = "stationName", deserialize_with = "null_as_default")]
    pub station_name: String,

    #[serde(default, rename = "stationType", deserialize_with = "null_as_default")]
    pub station_type: String,

    /// Opaque pass-through coordinate.
    #[serde(default, deserialize_with = "null_as_default")]
    pub latitude: f64,

    /// Opaque pass-through coordinate.
    #[serde(default, deserialize_with = "null_as_default")]
    pub longitude: f64,

    #[serde(default, rename = "agencyName", deserialize_with = "null_as_default")]
    pub agency: String,

    #[serde(default, rename = "state", deserialize_with = "null_as_default")]
    pub region: String,

    #[serde(default, rename = "district", deserialize_with = "null_as_default")]
    pub sub_region: String,

    /// Reading in meters; negative means below the reference surface.
    #[serde(default, rename = "dataValue", deserialize_with = "null_as_default")]
    pub data_value: f64,

    /// Observation timestamp as reported (ISO 8601).
    #[serde(default, rename = "dataTime", deserialize_with = "null_as_default")]
    pub data_time: String,

    #[serde(default, rename = "wellType", deserialize_with = "null_as_default")]
    pub well_type: String,

    #[serde(default, rename = "wellDepth", deserialize_with = "null_as_default")]
    pub well_depth: f64,

    #[serde(default, rename = "wellAquiferType", deserialize_with = "null_as_default")]
    pub well_aquifer_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Predicted reading attached by the enrichment backend.
    #[serde(default, rename = "ml_prediction", skip_serializing_if = "Option::is_none")]
    pub prediction: Option<f64>,

    /// Confidence of `prediction`, in `0.0..=1.0`.
    #[serde(
        default,
        rename = "prediction_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<f64>,
}

/// The upstream sends `null` for metadata it does not have.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl StationRecord {
    /// Whether the enrichment backend attached a prediction to this record.
    pub fn is_enriched(&self) -> bool {
        self.prediction.is_some()
    }
}

/// Where a successful dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Plain upstream records (direct or through a relay).
    Live,
    /// At least one record carries a prediction.
    Enriched,
}

/// Result of one `acquire` call. Exactly one variant per fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FetchOutcome {
    /// A live strategy answered.
    Success {
        records: Vec<StationRecord>,
        source: DataSource,
        /// Name of the strategy that answered.
        strategy: String,
        /// `metadata.data_source` reported by the enrichment backend, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        backend_source: Option<String>,
    },

    /// Every strategy failed; `records` are substitute data.
    Degraded {
        records: Vec<StationRecord>,
        #[serde(serialize_with = "display")]
        reason: FetchError,
    },

    /// The query was rejected before any network activity.
    Failure {
        #[serde(serialize_with = "display")]
        error: FetchError,
    },
}

fn display<S>(error: &FetchError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}

impl FetchOutcome {
    /// Records carried by the outcome; empty for `Failure`.
    pub fn records(&self) -> &[StationRecord] {
        match self {
            FetchOutcome::Success { records, .. } | FetchOutcome::Degraded { records, .. } => {
                records
            }
            FetchOutcome::Failure { .. } => &[],
        }
    }

    /// Whether the records are substitute data.
    pub fn is_degraded(&self) -> bool {
        matches!(self, FetchOutcome::Degraded { .. })
    }

    /// The error attached to the outcome, if any.
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Degraded { reason, .. } => Some(reason),
            FetchOutcome::Failure { error } => Some(error),
        }
    }
}

/// Observed span of observation timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Summary metrics derived from one record set.
///
/// Always recomputed from the records it describes; never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub total_records: usize,
    pub unique_stations: usize,
    /// Mean reading, two decimals. Zero for an empty set.
    pub average_level: f64,
    /// Lowest reading, two decimals.
    pub min_level: Option<f64>,
    /// Highest reading, two decimals.
    pub max_level: Option<f64>,
    pub date_range: Option<DateRange>,
    /// Distinct station names, sorted.
    pub stations: Vec<String>,
    /// Number of records carrying a prediction.
    pub predicted_records: usize,
    pub predictions_available: bool,
}

/// A station's code and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationRef {
    pub code: String,
    pub name: String,
}

/// Outcome of a training request sent to the enrichment backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingReport {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}
