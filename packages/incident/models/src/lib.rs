#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record and crime type definitions.
//!
//! This crate defines the shape of the incident records held by the
//! in-memory store, the crime type taxonomy shared by every other crate,
//! and the parameter/result types for the `get_crime_data` tool that the
//! chat assistant can invoke.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset as _, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Station filter value that matches every police station.
pub const ALL_STATIONS: &str = "all";

/// Returns `true` if `station` passes the given station filter.
///
/// The filter is either the [`ALL_STATIONS`] sentinel or an exact station
/// name.
#[must_use]
pub fn station_matches(filter: &str, station: &str) -> bool {
    filter == ALL_STATIONS || filter == station
}

/// Time zone whose midnight separates one calendar day from the next.
///
/// Incidents are stored as UTC instants; dashboards reason in whole days,
/// so every day bucket and the notion of "today" go through this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayBoundary {
    /// The host's local time zone.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl DayBoundary {
    /// Days split at UTC midnight.
    #[must_use]
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Calendar day `instant` falls on.
    #[must_use]
    pub fn day_of(self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&chrono::Local).date_naive(),
            Self::Fixed(offset) => instant.with_timezone(&offset).date_naive(),
        }
    }

    /// The current calendar day.
    #[must_use]
    pub fn today(self) -> NaiveDate {
        self.day_of(Utc::now())
    }
}

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Type of a reported incident.
///
/// The three built-in types are the ones the mock dataset generates. Any
/// other name is carried through as [`CrimeType::Other`] so that filters
/// and model output can name types this build doesn't know about.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CrimeType {
    /// Theft, pickpocketing, snatching
    Theft,
    /// Road and traffic accidents
    Accident,
    /// Harassment and stalking
    Harassment,
    /// Any other named type
    Other(String),
}

impl CrimeType {
    /// Returns the built-in crime types.
    #[must_use]
    pub const fn known() -> [Self; 3] {
        [Self::Theft, Self::Accident, Self::Harassment]
    }

    /// Returns the display name of this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Theft => "Theft",
            Self::Accident => "Accident",
            Self::Harassment => "Harassment",
            Self::Other(name) => name,
        }
    }

    /// Compares this type's name against `name`, ignoring ASCII case.
    #[must_use]
    pub fn eq_ignore_case(&self, name: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(name.trim())
    }
}

impl std::fmt::Display for CrimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CrimeType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(Self::known()
            .into_iter()
            .find(|known| known.eq_ignore_case(trimmed))
            .unwrap_or_else(|| Self::Other(trimmed.to_string())))
    }
}

impl From<String> for CrimeType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(crime_type) => crime_type,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for CrimeType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<CrimeType> for String {
    fn from(value: CrimeType) -> Self {
        match value {
            CrimeType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Risk rating attached to predicted hotspots and safety alerts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum RiskLevel {
    /// Immediate attention
    High,
    /// Elevated
    Medium,
    /// Watch only
    Low,
}

impl RiskLevel {
    /// Returns all variants, most severe first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::High, Self::Medium, Self::Low]
    }
}

/// A single reported incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Unique incident ID (e.g. `FIR1042`).
    pub id: String,
    /// Where the incident happened.
    pub position: Position,
    /// Type of the incident.
    pub crime_type: CrimeType,
    /// When the incident happened.
    pub date: DateTime<Utc>,
    /// Police station the incident was reported to.
    pub police_station: String,
}

/// A police station option as listed to the dashboard filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliceStation {
    /// Filter value (station name, or [`ALL_STATIONS`]).
    pub value: String,
    /// Human-readable label.
    pub label: String,
}

/// Parameters for the `get_crime_data` tool.
///
/// Every field is optional; an omitted field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeDataQuery {
    /// Crime type name (case-insensitive).
    pub crime_type: Option<String>,
    /// Police station name (case-insensitive).
    pub police_station: Option<String>,
    /// Inclusive start date (`YYYY-MM-DD`), from the start of that day.
    pub start_date: Option<String>,
    /// Inclusive end date (`YYYY-MM-DD`), through the end of that day.
    pub end_date: Option<String>,
}

/// An incident as returned by the `get_crime_data` tool.
///
/// Position is omitted to keep tool results small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSummary {
    /// Unique incident ID.
    pub id: String,
    /// Type of the incident.
    pub crime_type: CrimeType,
    /// When the incident happened (ISO 8601).
    pub date: DateTime<Utc>,
    /// Police station the incident was reported to.
    pub police_station: String,
}

impl From<&IncidentRecord> for IncidentSummary {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            id: record.id.clone(),
            crime_type: record.crime_type.clone(),
            date: record.date,
            police_station: record.police_station.clone(),
        }
    }
}

/// A predictive women's safety alert raised from recent incidents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAlert {
    /// Unique alert ID (e.g. `alert-1`).
    pub id: String,
    /// Short headline, e.g. `High Risk: Karol Bagh Market Area`.
    pub title: String,
    /// Why the alert was raised.
    pub reason: String,
    /// How urgent the alert is.
    pub severity: RiskLevel,
    /// General location or police station.
    pub location: String,
}

/// Enumeration of the tools the chat assistant can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Look up incidents with optional filters.
    GetCrimeData,
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetCrimeData => write!(f, "get_crime_data"),
        }
    }
}

/// Returns the JSON Schema definitions for all available tools.
///
/// These are used in the LLM tool-use protocol to describe what
/// tools the assistant can invoke.
#[must_use]
pub fn tool_definitions() -> Vec<serde_json::Value> {
    vec![serde_json::json!({
        "name": ToolName::GetCrimeData.to_string(),
        "description": "Retrieves a list of crime incidents based on the provided filters. Use this to answer questions about crime statistics, trends, and specific incidents. Infer the date range and filters from the user's question.",
        "parameters": {
            "type": "object",
            "properties": {
                "crimeType": { "type": "string", "description": "The type of crime to filter by (e.g., \"Theft\", \"Accident\"). Omit when the user asks about all crimes." },
                "policeStation": { "type": "string", "description": "The police station to filter by (e.g., \"Connaught Place\"). Omit when the user asks about all stations." },
                "startDate": { "type": "string", "description": "Start of the date range in YYYY-MM-DD format. Use for queries like \"last month\" or \"since August\"." },
                "endDate": { "type": "string", "description": "End of the date range in YYYY-MM-DD format. Use with startDate to define a period." }
            },
            "required": []
        }
    })]
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn day_boundary_follows_the_offset() {
        // 20:00 UTC on Sep 10 is 01:30 on Sep 11 at UTC+05:30
        let instant = Utc.with_ymd_and_hms(2024, 9, 10, 20, 0, 0).unwrap();
        let ist = DayBoundary::Fixed(FixedOffset::east_opt(5 * 3600 + 1800).unwrap());

        assert_eq!(ist.day_of(instant), NaiveDate::from_ymd_opt(2024, 9, 11).unwrap());
        assert_eq!(
            DayBoundary::utc().day_of(instant),
            NaiveDate::from_ymd_opt(2024, 9, 10).unwrap()
        );
        assert_eq!(
            DayBoundary::Local.day_of(instant),
            instant.with_timezone(&chrono::Local).date_naive()
        );
    }

    #[test]
    fn crime_type_parses_known_names_ignoring_case() {
        assert_eq!("theft".parse::<CrimeType>().unwrap(), CrimeType::Theft);
        assert_eq!(" ACCIDENT ".parse::<CrimeType>().unwrap(), CrimeType::Accident);
        assert_eq!(
            "Burglary".parse::<CrimeType>().unwrap(),
            CrimeType::Other("Burglary".to_string())
        );
    }

    #[test]
    fn crime_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&vec![
            CrimeType::Harassment,
            CrimeType::Other("Burglary".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"["Harassment","Burglary"]"#);

        let back: Vec<CrimeType> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], CrimeType::Harassment);
    }

    #[test]
    fn station_filter_matches_sentinel_and_exact_name() {
        assert!(station_matches(ALL_STATIONS, "Karol Bagh"));
        assert!(station_matches("Karol Bagh", "Karol Bagh"));
        assert!(!station_matches("karol bagh", "Karol Bagh"));
    }

    #[test]
    fn risk_level_round_trips_through_strum() {
        for level in RiskLevel::all() {
            let parsed: RiskLevel = level.to_string().to_lowercase().parse().unwrap();
            assert_eq!(parsed, *level);
        }
    }

    #[test]
    fn tool_definitions_name_every_tool() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0]["name"], "get_crime_data");
    }
}
