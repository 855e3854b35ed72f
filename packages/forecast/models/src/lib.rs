#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Forecast filter, time-series, and oracle contract types.
//!
//! These types describe a dashboard forecast request, the combined
//! historical/predicted daily series returned for the chart, and the
//! strongly-typed request/response contract of the forecast oracle.

use chrono::NaiveDate;
use crime_radar_incident_models::{ALL_STATIONS, CrimeType, Position, RiskLevel};
use serde::{Deserialize, Deserializer, Serialize};

/// Parses a calendar day from either `YYYY-MM-DD` or a full ISO 8601
/// timestamp (in which case the timestamp's own date is used).
#[must_use]
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

fn deserialize_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid date '{raw}': expected YYYY-MM-DD or an ISO 8601 timestamp"
        ))
    })
}

fn default_station() -> String {
    ALL_STATIONS.to_string()
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// First day of the range.
    #[serde(deserialize_with = "deserialize_day")]
    pub start_date: NaiveDate,
    /// Last day of the range.
    #[serde(deserialize_with = "deserialize_day")]
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Whether the range contains no days (end before start).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end_date < self.start_date
    }

    /// Every calendar day in the range, in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date
            .iter_days()
            .take_while(move |day| *day <= end)
    }
}

/// Dashboard forecast request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeFilter {
    /// Days to cover.
    pub date_range: DateRange,
    /// Station name, or `"all"`.
    #[serde(default = "default_station")]
    pub police_station: String,
    /// Crime types to include. An empty list yields no forecast.
    #[serde(default)]
    pub crime_types: Vec<CrimeType>,
}

impl DateRangeFilter {
    /// Requested crime types in request order, without duplicates.
    #[must_use]
    pub fn requested_types(&self) -> Vec<CrimeType> {
        let mut types: Vec<CrimeType> = Vec::with_capacity(self.crime_types.len());
        for crime_type in &self.crime_types {
            if !types.contains(crime_type) {
                types.push(crime_type.clone());
            }
        }
        types
    }

    /// Whether the filter names enough to produce a forecast.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.crime_types.is_empty() && !self.date_range.is_empty()
    }
}

/// Observed incident count for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    /// The day.
    pub date: NaiveDate,
    /// Number of matching incidents.
    pub count: u32,
}

/// One day of the combined chart series.
///
/// A point is either a historical observation (`historical_count` set,
/// possibly zero) or a future prediction (`predicted_count` set), never
/// both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCountPoint {
    /// The day (`YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Observed count, `None` for future days.
    pub historical_count: Option<u32>,
    /// Predicted count, `None` for past days.
    pub predicted_count: Option<u32>,
}

impl DailyCountPoint {
    /// A historical observation.
    #[must_use]
    pub const fn historical(date: NaiveDate, count: u32) -> Self {
        Self {
            date,
            historical_count: Some(count),
            predicted_count: None,
        }
    }

    /// A future prediction.
    #[must_use]
    pub const fn predicted(date: NaiveDate, count: u32) -> Self {
        Self {
            date,
            historical_count: None,
            predicted_count: Some(count),
        }
    }
}

impl From<DailyCount> for DailyCountPoint {
    fn from(value: DailyCount) -> Self {
        Self::historical(value.date, value.count)
    }
}

/// Count of incidents of a single crime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeTypeCount {
    /// The crime type.
    pub crime_type: CrimeType,
    /// Number of incidents.
    pub count: u32,
}

/// A geo-located hotspot predicted by the forecast oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedHotspot {
    /// Where the hotspot is.
    pub position: Position,
    /// How risky the oracle rates it.
    pub risk_level: RiskLevel,
    /// Why the oracle flagged it.
    pub reason: String,
    /// The crime type expected there.
    pub predicted_crime_type: CrimeType,
    /// Human-readable place name.
    pub location_name: String,
}

/// Result of a forecast run, as rendered by the dashboard chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    /// One point per day of the requested range, in date order.
    pub daily_data: Vec<DailyCountPoint>,
    /// Predicted counts per requested crime type (empty when nothing was
    /// predicted).
    pub predicted_crime_type_breakdown: Vec<CrimeTypeCount>,
    /// Observed counts per requested crime type.
    pub historical_crime_type_breakdown: Vec<CrimeTypeCount>,
    /// Hotspots supplied by the oracle, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicted_hotspots: Vec<PredictedHotspot>,
}

impl ForecastResult {
    /// A forecast with no data, returned for incomplete filters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Request sent to the forecast oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest {
    /// Plain-language summary of the historical period.
    pub historical_summary: String,
    /// Days to predict, in order.
    pub future_dates: Vec<NaiveDate>,
    /// Crime types to predict.
    pub crime_types: Vec<CrimeType>,
    /// Station name, or `"all"`.
    pub police_station: String,
}

/// Predicted count for one day, as returned by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPrediction {
    /// The day.
    pub date: NaiveDate,
    /// Predicted count; `None` is treated as zero.
    pub predicted_count: Option<u32>,
}

/// Response from the forecast oracle.
///
/// Completeness is not guaranteed: the oracle may omit dates or crime
/// types, which the combiner fills in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleResponse {
    /// Per-day predictions.
    pub daily_predictions: Vec<DailyPrediction>,
    /// Predicted breakdown by crime type.
    pub predicted_breakdown: Vec<CrimeTypeCount>,
    /// Optional geo-located hotspots.
    #[serde(default)]
    pub predicted_hotspots: Option<Vec<PredictedHotspot>>,
}
