#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM-backed features of the crime radar dashboard.
//!
//! Supports Google Gemini, Anthropic Claude, `OpenAI`, and any
//! `OpenAI`-compatible local/self-hosted server via the `AI_BASE_URL`
//! environment variable. On top of the provider abstraction this crate
//! implements the forecast oracle used by the forecast pipeline, the chat
//! assistant's tool-use loop over the incident store, and the women's
//! safety alert generator.

pub mod agent;
pub mod alerts;
pub mod oracle;
pub mod providers;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use oracle::LlmForecastOracle;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query tool execution failed.
    #[error("Tool execution error: {0}")]
    ToolExecution(#[from] crime_radar_incident::IncidentError),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Agent loop exceeded maximum iterations.
    #[error("Agent loop exceeded maximum of {max_iterations} iterations")]
    MaxIterations {
        /// The configured maximum.
        max_iterations: u32,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// The model answered with no text at all.
    #[error("The model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for AiError {
    /// Request URLs may carry credentials, so they are dropped from the
    /// error.
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value.without_url())
    }
}

/// Parses a JSON object out of a model reply.
///
/// Models often wrap JSON in a Markdown code fence or add a sentence
/// around it, so everything outside the outermost `{ ... }` is ignored.
///
/// # Errors
///
/// * [`AiError::EmptyResponse`] if the reply is blank
/// * [`AiError::Json`] if the JSON does not match `T`
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, AiError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(AiError::EmptyResponse);
    }

    let json = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };

    Ok(serde_json::from_str(json)?)
}
