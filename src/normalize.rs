//! Mapping of upstream payloads onto the canonical record list.

use crate::data_sources::EnrichmentResponse;
use crate::model::{DataSource, StationRecord};

/// A parsed response, before normalization.
#[derive(Debug, Clone)]
pub enum UpstreamPayload {
    /// Records from the dataset endpoint, direct or relayed.
    Direct(Vec<StationRecord>),
    /// Records plus predictions from the enrichment backend.
    Enrichment(EnrichmentResponse),
}

/// Canonical records with their source tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub records: Vec<StationRecord>,
    pub source: DataSource,
    pub backend_source: Option<String>,
}

/// Shape a payload into canonical records and tag its source.
///
/// Predictions are zipped onto records by position. Surplus predictions are
/// dropped and records past the end of the prediction list stay
/// unenriched. The source is [`DataSource::Enriched`] exactly when at least
/// one record ends up carrying a prediction.
pub fn normalize(payload: UpstreamPayload) -> Normalized {
    let (records, backend_source) = match payload {
        UpstreamPayload::Direct(records) => (records, None),
        UpstreamPayload::Enrichment(response) => {
            let backend_source = response.metadata.and_then(|m| m.data_source);
            let mut records = response.wrs_data;

            if let Some(predictions) = response.ml_predictions {
                for (record, predicted) in records.iter_mut().zip(predictions.predictions) {
                    record.prediction = Some(predicted);
                    record.confidence = predictions.confidence;
                }
            }

            (records, backend_source)
        }
    };

    let source = if records.iter().any(StationRecord::is_enriched) {
        DataSource::Enriched
    } else {
        DataSource::Live
    };

    Normalized {
        records,
        source,
        backend_source,
    }
}
