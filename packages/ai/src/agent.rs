//! Chat assistant loop.
//!
//! Implements the tool-use loop: user question -> LLM decides tools ->
//! execute tools against the incident store -> feed results back ->
//! repeat until a final answer.

use chrono::NaiveDate;
use crime_radar_incident::{IncidentStore, tools};
use crime_radar_incident_models::{CrimeDataQuery, ToolName, tool_definitions};

use crate::AiError;
use crate::providers::{
    ContentBlock, LlmProvider, Message, MessageContent, StopReason, extract_text,
};

/// Maximum number of agent loop iterations to prevent infinite loops.
pub const MAX_ITERATIONS: u32 = 10;

/// Answer returned when the model produces no usable text.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I was unable to process that request.";

/// Maximum size of a tool result JSON string before truncation.
const MAX_TOOL_RESULT_BYTES: usize = 8000;

fn build_system_prompt(store: &IncidentStore, today: NaiveDate) -> String {
    let stations = store
        .stations()
        .iter()
        .filter(|s| s.value != crime_radar_incident_models::ALL_STATIONS)
        .map(|s| s.label.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let crime_types = store
        .crime_types()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are a helpful assistant that answers questions about crime data for a police analytics dashboard.

## Available Data
- Police stations: {stations}
- Crime types: {crime_types}
- Total incidents on record: {total}

## Instructions
1. Use the {tool} tool to answer the user's question as accurately as possible. Do NOT make up statistics.
2. Synthesize the data returned by the tool into a clear, natural language answer.
3. If the tool returns no data, state that you couldn't find any information for that query.
4. Today's date is {today}. Interpret relative dates ("last week", "this month") relative to today and pass dates as YYYY-MM-DD.

Be concise. Always cite the actual numbers from tool results."#,
        total = store.len(),
        tool = ToolName::GetCrimeData,
    )
}

/// Answers a question about the incident data.
///
/// The model may call the `get_crime_data` tool any number of times
/// within [`MAX_ITERATIONS`] rounds. Tool failures (bad arguments, bad
/// dates) are reported back to the model rather than aborting the loop.
/// An empty final answer is replaced with [`FALLBACK_ANSWER`].
///
/// # Errors
///
/// * [`AiError::MaxIterations`] if the model keeps calling tools
/// * any provider error from [`LlmProvider::chat`]
pub async fn ask_question(
    provider: &dyn LlmProvider,
    store: &IncidentStore,
    question: &str,
    today: NaiveDate,
) -> Result<String, AiError> {
    let system_prompt = build_system_prompt(store, today);
    let tools = tool_definitions();

    let mut messages = vec![Message::user(question)];

    for iteration in 0..MAX_ITERATIONS {
        log::info!("Agent iteration {iteration}");

        let response = provider.chat(&system_prompt, &messages, &tools).await?;

        let wants_tools = response.stop_reason == StopReason::ToolUse
            && response
                .content
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolUse { .. }));

        if !wants_tools {
            return Ok(final_answer(&response.content));
        }

        let mut tool_results = Vec::new();

        for block in &response.content {
            if let ContentBlock::ToolUse { id, name, input } = block {
                log::debug!("Tool call {name} with {input}");
                let content = match execute_tool(store, name, input) {
                    Ok(json) => truncate_result(json.to_string()),
                    Err(e) => {
                        log::warn!("Tool {name} failed: {e}");
                        format!("Tool error: {e}")
                    }
                };
                tool_results.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content,
                });
            }
        }

        messages.push(Message {
            role: "assistant".to_string(),
            content: MessageContent::Blocks(response.content),
        });
        messages.push(Message {
            role: "user".to_string(),
            content: MessageContent::Blocks(tool_results),
        });
    }

    Err(AiError::MaxIterations {
        max_iterations: MAX_ITERATIONS,
    })
}

fn final_answer(blocks: &[ContentBlock]) -> String {
    let text = extract_text(blocks);
    let text = text.trim();
    if text.is_empty() {
        log::warn!("Model returned no answer text, using fallback");
        FALLBACK_ANSWER.to_string()
    } else {
        text.to_string()
    }
}

/// Executes a single tool by name with the given parameters.
fn execute_tool(
    store: &IncidentStore,
    name: &str,
    input: &serde_json::Value,
) -> Result<serde_json::Value, AiError> {
    if name == ToolName::GetCrimeData.to_string() {
        // Models sometimes send null instead of an empty object
        let params: CrimeDataQuery = if input.is_null() {
            CrimeDataQuery::default()
        } else {
            serde_json::from_value(input.clone())?
        };
        let incidents = tools::get_crime_data(store, &params)?;
        Ok(serde_json::json!({
            "total": incidents.len(),
            "incidents": incidents,
        }))
    } else {
        Err(AiError::Provider {
            message: format!("Unknown tool: {name}"),
        })
    }
}

/// Cuts oversized tool results so they fit the model's context.
fn truncate_result(raw: String) -> String {
    if raw.len() <= MAX_TOOL_RESULT_BYTES {
        return raw;
    }
    let mut cut = MAX_TOOL_RESULT_BYTES;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... (truncated, {} bytes total)", &raw[..cut], raw.len())
}
