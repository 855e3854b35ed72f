//! Predictive women's safety alerts.

use chrono::{DateTime, Days, Utc};
use crime_radar_incident::IncidentStore;
use crime_radar_incident_models::{CrimeType, IncidentSummary, SafetyAlert};
use serde::Deserialize;

use crate::{
    AiError, parse_json_reply,
    providers::{LlmProvider, Message},
};

/// How far back incidents are considered.
pub const LOOKBACK_DAYS: u64 = 14;

const SYSTEM_PROMPT: &str = "You are a crime analyst AI for a police department. You always \
     answer with a single JSON object and nothing else.";

#[derive(Deserialize)]
struct AlertsReply {
    #[serde(default)]
    alerts: Vec<SafetyAlert>,
}

/// Crime types that disproportionately affect women's safety.
#[must_use]
pub const fn relevant_crime_types() -> [CrimeType; 3] {
    [CrimeType::Harassment, CrimeType::Theft, CrimeType::Accident]
}

/// Incidents of the relevant types reported in the last
/// [`LOOKBACK_DAYS`] days up to `now`.
#[must_use]
pub fn recent_incidents(store: &IncidentStore, now: DateTime<Utc>) -> Vec<IncidentSummary> {
    let since = now - Days::new(LOOKBACK_DAYS);
    let types = relevant_crime_types();
    store
        .records()
        .iter()
        .filter(|record| record.date >= since && record.date <= now)
        .filter(|record| types.contains(&record.crime_type))
        .map(IncidentSummary::from)
        .collect()
}

fn build_prompt(incidents: &[IncidentSummary]) -> Result<String, AiError> {
    let data = serde_json::to_string(incidents)?;
    Ok(format!(
        r#"Your task is to analyze recent crime data related to women's safety and generate predictive alerts for areas that show emerging risk patterns.

Recent Crime Data:
{data}

Instructions:
1. Analyze the provided crime data, looking for clusters of incidents (3 or more) in specific locations (police stations) or at certain times.
2. Focus on crimes like Harassment, Theft, and Accidents that disproportionately affect women's safety.
3. If you identify a pattern or a significant cluster, generate a predictive alert.
4. Assign a 'severity' (High, Medium, Low) based on the number of incidents and the nature of the crimes.
5. Provide a concise 'title' and a 'reason' for each alert.
6. If no significant patterns are found, return an empty 'alerts' array.

Respond with JSON of exactly this shape:
{{ "alerts": [{{ "id": "alert-1", "title": "High Risk: Karol Bagh Market Area", "reason": "...", "severity": "High", "location": "Karol Bagh" }}] }}"#
    ))
}

/// Asks the model for safety alerts based on recent incidents.
///
/// A reply with no text yields no alerts.
///
/// # Errors
///
/// * [`AiError::Json`] if the reply does not match the alert schema
/// * any provider error from [`LlmProvider::chat`]
pub async fn generate_safety_alerts(
    provider: &dyn LlmProvider,
    store: &IncidentStore,
    now: DateTime<Utc>,
) -> Result<Vec<SafetyAlert>, AiError> {
    let incidents = recent_incidents(store, now);
    log::info!(
        "Generating safety alerts from {} incidents in the last {LOOKBACK_DAYS} days",
        incidents.len()
    );

    let messages = [Message::user(build_prompt(&incidents)?)];
    let response = provider.chat(SYSTEM_PROMPT, &messages, &[]).await?;

    match parse_json_reply::<AlertsReply>(&response.text()) {
        Ok(reply) => Ok(reply.alerts),
        Err(AiError::EmptyResponse) => {
            log::warn!("Model returned no alerts output");
            Ok(vec![])
        }
        Err(e) => Err(e),
    }
}
