//! Query validation.
//!
//! Runs synchronously before any strategy is attempted and has no side
//! effects, so a rejected query never reaches the network.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::model::QueryParameters;

/// Date format expected by every upstream.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Check that a query is well formed.
///
/// Rules: the region is not blank, both dates are present and parse as
/// `YYYY-MM-DD`, and the start date is not after the end date. The query is
/// returned with surrounding whitespace removed from the region and dates.
pub fn validate(mut params: QueryParameters) -> Result<QueryParameters, ValidationError> {
    if params.region.trim().is_empty() {
        return Err(ValidationError::MissingRegion);
    }

    let start = parse_date("start date", &params.start_date)?;
    let end = parse_date("end date", &params.end_date)?;

    if start > end {
        return Err(ValidationError::InvertedRange {
            start: params.start_date.clone(),
            end: params.end_date.clone(),
        });
    }

    params.region = params.region.trim().to_string();
    params.start_date = params.start_date.trim().to_string();
    params.end_date = params.end_date.trim().to_string();

    Ok(params)
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingDate { field });
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
