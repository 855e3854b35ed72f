//! Forecast oracle backed by an LLM provider.

use std::sync::Arc;

use crime_radar_forecast::{ForecastOracle, OracleError};
use crime_radar_forecast_models::{OracleRequest, OracleResponse};

use crate::{
    AiError, parse_json_reply,
    providers::{LlmProvider, Message},
};

const SYSTEM_PROMPT: &str = "You are an AI crime analyst. You predict crime trends from \
     historical summaries and always answer with a single JSON object and nothing else.";

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn build_prompt(request: &OracleRequest) -> String {
    format!(
        r#"Based on the historical summary, predict crime trends for the upcoming dates.

Historical Summary:
{summary}

Your task is to predict the daily crime counts for the following future dates: {dates}.

Also, provide a plausible breakdown of the total predicted crimes for these future dates across the following crime types: {types}.

Optionally, list up to 7 locations within the area of police station '{station}' where these crimes are most likely, with a risk level of High, Medium, or Low.

Respond with JSON of exactly this shape:
{{
  "dailyPredictions": [{{ "date": "YYYY-MM-DD", "predictedCount": 0 }}],
  "predictedBreakdown": [{{ "crimeType": "Theft", "count": 0 }}],
  "predictedHotspots": [{{
    "position": {{ "lat": 0.0, "lng": 0.0 }},
    "riskLevel": "High",
    "reason": "why this location",
    "predictedCrimeType": "Theft",
    "locationName": "place name"
  }}]
}}

Ensure that you provide a prediction for every future date requested. The predicted counts should be whole numbers, reasonable given the historical average."#,
        summary = request.historical_summary,
        dates = join(&request.future_dates),
        types = join(&request.crime_types),
        station = request.police_station,
    )
}

/// [`ForecastOracle`] that asks an LLM for the prediction.
pub struct LlmForecastOracle {
    provider: Arc<dyn LlmProvider>,
}

impl LlmForecastOracle {
    /// Creates an oracle using `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

impl From<AiError> for OracleError {
    fn from(value: AiError) -> Self {
        match value {
            AiError::Json(e) => Self::Malformed {
                message: e.to_string(),
            },
            other => Self::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

#[async_trait::async_trait]
impl ForecastOracle for LlmForecastOracle {
    async fn forecast(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        log::info!(
            "Requesting forecast for {} future dates ({})",
            request.future_dates.len(),
            request.police_station,
        );

        let messages = [Message::user(build_prompt(request))];
        let response = self
            .provider
            .chat(SYSTEM_PROMPT, &messages, &[])
            .await
            .map_err(OracleError::from)?;

        Ok(parse_json_reply(&response.text())?)
    }
}
