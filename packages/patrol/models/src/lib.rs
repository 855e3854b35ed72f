#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hotspot and patrol route types.

use crime_radar_incident_models::{CrimeType, Position, RiskLevel};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A location chosen for patrol, before route ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotCandidate {
    /// Stable identifier of the source (incident ID or oracle index).
    pub source_id: String,
    /// Where to go.
    pub position: Position,
    /// Short label, prefixed with the stop number in the final route.
    pub label: String,
    /// Longer free-text description.
    pub description: String,
    /// Risk rating, when known.
    pub risk_level: Option<RiskLevel>,
    /// Expected crime type, when known.
    pub predicted_crime_type: Option<CrimeType>,
}

/// One stop of a patrol route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Unique within a route.
    pub id: String,
    /// Display name, e.g. `1. Theft Hotspot`.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Where the stop is.
    pub position: Position,
    /// 1-based visiting order.
    pub order: u32,
    /// Risk rating, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    /// Expected crime type, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_crime_type: Option<CrimeType>,
}

/// An ordered patrol route with a distance and time summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolRoute {
    /// Stops in ascending `order`.
    pub hotspots: Vec<Hotspot>,
    /// Total distance, e.g. `12.3 km`.
    pub total_distance: String,
    /// Estimated patrol time, e.g. `37 min`.
    pub estimated_time: String,
}

impl PatrolRoute {
    /// A route with no stops.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            hotspots: vec![],
            total_distance: "0.0 km".to_string(),
            estimated_time: "0 min".to_string(),
        }
    }
}

/// How route stops are ordered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum RouteOrdering {
    /// South to north by latitude.
    #[default]
    Latitude,
    /// Greedy nearest neighbour from the southernmost stop.
    NearestNeighbor,
}
