#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime forecast pipeline.
//!
//! Splits the requested date range into past and future days, aggregates
//! the past days from the incident store, asks a [`ForecastOracle`] for
//! the future days, and combines both into one gap-free daily series.
//! Oracle failures never reach the caller: the pipeline falls back to the
//! historical data with zero-filled predictions.

pub mod aggregator;
pub mod combiner;
pub mod pipeline;

use crime_radar_forecast_models::{OracleRequest, OracleResponse};
use thiserror::Error;

pub use pipeline::{ForecastConfig, Forecaster};

/// Ways a forecast oracle call can fail.
///
/// Every variant is recoverable: the pipeline treats them all as "no
/// predictions available".
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle could not be reached or produced no usable output.
    #[error("Forecast oracle unavailable: {message}")]
    Unavailable {
        /// Description of what went wrong.
        message: String,
    },

    /// The oracle answered, but not in the expected shape.
    #[error("Forecast oracle returned a malformed response: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },

    /// The oracle did not answer within the configured timeout.
    #[error("Forecast oracle timed out after {seconds}s")]
    TimedOut {
        /// The configured timeout.
        seconds: u64,
    },
}

/// External service that predicts future crime counts.
#[async_trait::async_trait]
pub trait ForecastOracle: Send + Sync {
    /// Predicts daily counts, a crime type breakdown, and optionally
    /// hotspots for the requested future dates.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if the prediction cannot be produced.
    async fn forecast(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError>;
}

/// Oracle that never predicts anything.
///
/// Used for offline runs; every forecast falls back to zero-filled
/// predictions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

#[async_trait::async_trait]
impl ForecastOracle for OfflineOracle {
    async fn forecast(&self, _request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        Err(OracleError::Unavailable {
            message: "running offline".to_string(),
        })
    }
}
