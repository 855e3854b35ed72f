//! Tool execution functions for the chat assistant.
//!
//! Each function implements one of the tools that the assistant can
//! invoke. They run over the in-memory store and return typed results.

use chrono::NaiveDate;
use crime_radar_incident_models::{CrimeDataQuery, IncidentSummary};

use crate::{IncidentError, IncidentStore};

/// Parses a date string like `"2024-01-01"` into a calendar day.
///
/// Full ISO 8601 timestamps are accepted as well; only their date part is
/// used, since date filters always cover whole days.
fn parse_date(s: &str) -> Result<NaiveDate, IncidentError> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| IncidentError::InvalidDate {
        value: s.to_string(),
        message: format!("{e}. Expected format: YYYY-MM-DD"),
    })
}

/// Returns the incidents matching every supplied filter.
///
/// String filters compare case-insensitively. Date filters are inclusive:
/// `startDate` from the start of that day, `endDate` through the end of
/// that day, with days split by the store's day boundary.
///
/// # Errors
///
/// Returns [`IncidentError::InvalidDate`] if a date filter cannot be
/// parsed.
pub fn get_crime_data(
    store: &IncidentStore,
    params: &CrimeDataQuery,
) -> Result<Vec<IncidentSummary>, IncidentError> {
    let start = params.start_date.as_deref().map(parse_date).transpose()?;
    let end = params.end_date.as_deref().map(parse_date).transpose()?;
    let crime_type = params.crime_type.as_deref().map(str::trim);
    let station = params.police_station.as_deref().map(str::trim);

    let matches: Vec<IncidentSummary> = store
        .records()
        .iter()
        .filter(|record| crime_type.is_none_or(|t| record.crime_type.eq_ignore_case(t)))
        .filter(|record| station.is_none_or(|s| record.police_station.eq_ignore_ascii_case(s)))
        .filter(|record| start.is_none_or(|d| store.day_of(record) >= d))
        .filter(|record| end.is_none_or(|d| store.day_of(record) <= d))
        .map(IncidentSummary::from)
        .collect();

    log::debug!("get_crime_data {params:?} matched {} incidents", matches.len());

    Ok(matches)
}
