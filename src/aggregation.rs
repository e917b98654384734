//! Statistics over a record set.
//!
//! [`summarize`] is pure and total: it never fails, and an empty input
//! yields zero counts with no bounds and no date range. Summaries are never
//! cached by this crate; the controller recomputes one each time it
//! publishes a new record set.

use std::collections::{BTreeSet, HashSet};

use crate::model::{DateRange, StationRecord, StatisticsSummary};

/// Compute the summary for a record set.
///
/// Average, min and max are rounded to two decimals. Rounding is monotone,
/// so `min <= average <= max` still holds afterwards. The date range is the
/// lexicographically smallest and largest observation timestamp, which for
/// ISO 8601 strings in one format is chronological order.
pub fn summarize(records: &[StationRecord]) -> StatisticsSummary {
    let predicted_records = records.iter().filter(|r| r.is_enriched()).count();

    let Some(first) = records.first() else {
        return StatisticsSummary {
            total_records: 0,
            unique_stations: 0,
            average_level: 0.0,
            min_level: None,
            max_level: None,
            date_range: None,
            stations: Vec::new(),
            predicted_records: 0,
            predictions_available: false,
        };
    };

    let unique_stations = records
        .iter()
        .map(|r| r.station_code.as_str())
        .collect::<HashSet<_>>()
        .len();

    let stations = records
        .iter()
        .map(|r| r.station_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let sum: f64 = records.iter().map(|r| r.data_value).sum();
    let average = sum / records.len() as f64;
    let min = records
        .iter()
        .map(|r| r.data_value)
        .fold(f64::INFINITY, f64::min);
    let max = records
        .iter()
        .map(|r| r.data_value)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut earliest = first.data_time.as_str();
    let mut latest = first.data_time.as_str();
    for record in records {
        earliest = earliest.min(record.data_time.as_str());
        latest = latest.max(record.data_time.as_str());
    }

    StatisticsSummary {
        total_records: records.len(),
        unique_stations,
        average_level: round2(average),
        min_level: Some(round2(min)),
        max_level: Some(round2(max)),
        date_range: Some(DateRange {
            start: earliest.to_string(),
            end: latest.to_string(),
        }),
        stations,
        predicted_records,
        predictions_available: predicted_records > 0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
