#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime radar server.
//!
//! Forecast and route bodies reuse the domain types directly; the types
//! here cover the envelopes that only exist at the HTTP boundary.

use crime_radar_forecast_models::ForecastResult;
use crime_radar_incident_models::{ALL_STATIONS, CrimeType, PoliceStation, SafetyAlert};
use serde::{Deserialize, Serialize};

fn default_station() -> String {
    ALL_STATIONS.to_string()
}

/// Body of `POST /generate-route`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRouteRequest {
    /// Forecast previously returned by `POST /predict-crime`.
    #[serde(default)]
    pub predicted_data: ForecastResult,
    /// Station the route is planned for.
    #[serde(default = "default_station")]
    pub police_station: String,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's natural-language question.
    pub question: String,
}

/// Response of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's answer.
    pub answer: String,
}

/// Response of `POST /womens-safety-alerts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsResponse {
    /// Alerts raised from recent incidents, possibly empty.
    pub alerts: Vec<SafetyAlert>,
}

/// Response of `GET /stations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsResponse {
    /// Station filter options, "all" first.
    pub stations: Vec<PoliceStation>,
}

/// Response of `GET /crime-types`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeTypesResponse {
    /// Crime types present in the dataset.
    pub crime_types: Vec<CrimeType>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
