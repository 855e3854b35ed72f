//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` REST endpoint. Gemini does not assign IDs to
//! function calls, so tool-use IDs are generated locally and mapped back
//! to function names when results are sent.

use serde::{Deserialize, Serialize};

use super::{ContentBlock, LlmProvider, LlmResponse, Message, MessageContent, StopReason};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const API_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini API provider.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// The key goes in a header so it never appears in request URLs, which
    /// transport errors echo.
    fn request(&self, body: &GeminiRequest) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{API_ROOT}/models/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTools>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl GeminiPart {
    const fn text(text: String) -> Self {
        Self {
            text: Some(text),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Finds the function name of an earlier tool use by its ID.
fn tool_name_for<'a>(messages: &'a [Message], tool_use_id: &str) -> Option<&'a str> {
    messages.iter().find_map(|m| match &m.content {
        MessageContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
            ContentBlock::ToolUse { id, name, .. } if id == tool_use_id => Some(name.as_str()),
            _ => None,
        }),
        MessageContent::Text(_) => None,
    })
}

/// Function responses must be JSON objects; anything else is wrapped.
fn response_object(content: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        Ok(value) => serde_json::json!({ "result": value }),
        Err(_) => serde_json::json!({ "result": content }),
    }
}

fn to_contents(messages: &[Message]) -> Vec<GeminiContent> {
    messages
        .iter()
        .map(|m| {
            let role = if m.role == "assistant" { "model" } else { "user" };
            let parts = match &m.content {
                MessageContent::Text(text) => vec![GeminiPart::text(text.clone())],
                MessageContent::Blocks(blocks) => blocks
                    .iter()
                    .map(|b| match b {
                        ContentBlock::Text { text } => GeminiPart::text(text.clone()),
                        ContentBlock::ToolUse { name, input, .. } => GeminiPart {
                            text: None,
                            function_call: Some(FunctionCall {
                                name: name.clone(),
                                args: input.clone(),
                            }),
                            function_response: None,
                        },
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                        } => GeminiPart {
                            text: None,
                            function_call: None,
                            function_response: Some(FunctionResponse {
                                name: tool_name_for(messages, tool_use_id)
                                    .unwrap_or(tool_use_id)
                                    .to_string(),
                                response: response_object(content),
                            }),
                        },
                    })
                    .collect(),
            };
            GeminiContent {
                role: Some(role.to_string()),
                parts,
            }
        })
        .collect()
}

fn from_api_response(response: GeminiResponse) -> Result<LlmResponse, AiError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AiError::Provider {
            message: "No candidates in Gemini response".to_string(),
        })?;

    let mut content = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text
            && !text.is_empty()
        {
            content.push(ContentBlock::Text { text });
        }
        if let Some(call) = part.function_call {
            content.push(ContentBlock::ToolUse {
                id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                name: call.name,
                input: call.args,
            });
        }
    }

    let stop_reason = if content
        .iter()
        .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    {
        StopReason::ToolUse
    } else if candidate.finish_reason.as_deref() == Some("MAX_TOKENS") {
        StopReason::MaxTokens
    } else {
        StopReason::EndTurn
    };

    Ok(LlmResponse {
        content,
        stop_reason,
    })
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<LlmResponse, AiError> {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(system_prompt.to_string())],
            },
            contents: to_contents(messages),
            tools: if tools.is_empty() {
                vec![]
            } else {
                vec![GeminiTools {
                    function_declarations: tools.to_vec(),
                }]
            },
            generation_config: GenerationConfig {
                max_output_tokens: 4096,
            },
        };

        let resp = self.request(&request).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: GeminiError = serde_json::from_str(&body).unwrap_or_else(|_| GeminiError {
                error: GeminiErrorDetail {
                    message: format!("HTTP {status}: {body}"),
                },
            });
            return Err(AiError::Provider {
                message: err.error.message,
            });
        }

        from_api_response(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_role_maps_to_model_and_results_carry_function_name() {
        let messages = vec![
            Message::user("Any harassment near Saket?"),
            Message {
                role: "assistant".to_string(),
                content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                    id: "call_abc".to_string(),
                    name: "get_crime_data".to_string(),
                    input: serde_json::json!({ "policeStation": "Saket" }),
                }]),
            },
            Message {
                role: "user".to_string(),
                content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: "call_abc".to_string(),
                    content: "[]".to_string(),
                }]),
            },
        ];

        let contents = to_contents(&messages);
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        let call = contents[1].parts[0].function_call.as_ref().unwrap();
        assert_eq!(call.args["policeStation"], "Saket");

        let response = contents[2].parts[0].function_response.as_ref().unwrap();
        assert_eq!(response.name, "get_crime_data");
        assert_eq!(response.response, serde_json::json!({ "result": [] }));
    }

    #[test]
    fn request_serializes_gemini_field_names() {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart::text("sys".to_string())],
            },
            contents: to_contents(&[Message::user("hi")]),
            tools: vec![GeminiTools {
                function_declarations: crime_radar_incident_models::tool_definitions(),
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 4096,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["tools"][0]["functionDeclarations"][0]["name"],
            "get_crime_data"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn api_key_is_sent_as_header_not_query() {
        let provider = GeminiProvider::new("SECRET-KEY-123".to_string(), "gemini-x".to_string());
        let request = provider
            .request(&GeminiRequest {
                system_instruction: GeminiContent {
                    role: None,
                    parts: vec![GeminiPart::text("sys".to_string())],
                },
                contents: to_contents(&[Message::user("hi")]),
                tools: vec![],
                generation_config: GenerationConfig {
                    max_output_tokens: 16,
                },
            })
            .build()
            .unwrap();

        assert!(request.url().query().is_none());
        assert!(!request.url().as_str().contains("SECRET-KEY-123"));
        assert_eq!(request.headers()["x-goog-api-key"], "SECRET-KEY-123");
    }

    #[tokio::test]
    async fn transport_errors_do_not_expose_the_api_key() {
        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all("http://127.0.0.1:9").unwrap())
            .build()
            .unwrap();
        let provider = GeminiProvider {
            api_key: "SECRET-KEY-123".to_string(),
            model: "gemini-x".to_string(),
            client,
        };

        let err = provider
            .chat("sys", &[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));

        let oracle_error = crime_radar_forecast::OracleError::from(err);
        assert!(!oracle_error.to_string().contains("SECRET-KEY-123"));
    }

    #[test]
    fn function_calls_get_generated_ids() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{ "candidates": [{
                "content": { "role": "model", "parts": [
                    { "functionCall": { "name": "get_crime_data", "args": { "crimeType": "Theft" } } }
                ] },
                "finishReason": "STOP"
            }] }"#,
        )
        .unwrap();
        let parsed = from_api_response(response).unwrap();
        assert_eq!(parsed.stop_reason, StopReason::ToolUse);
        match &parsed.content[0] {
            ContentBlock::ToolUse { id, name, input } => {
                assert!(id.starts_with("call_"));
                assert_eq!(name, "get_crime_data");
                assert_eq!(input["crimeType"], "Theft");
            }
            other => panic!("expected tool use, got {other:?}"),
        }
    }

    #[test]
    fn text_response_ends_turn() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{ "candidates": [{ "content": { "parts": [{ "text": "All quiet." }] }, "finishReason": "STOP" }] }"#,
        )
        .unwrap();
        let parsed = from_api_response(response).unwrap();
        assert_eq!(parsed.stop_reason, StopReason::EndTurn);
        assert_eq!(parsed.text(), "All quiet.");
    }

    #[test]
    fn missing_candidates_is_a_provider_error() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            from_api_response(response),
            Err(AiError::Provider { .. })
        ));
    }
}
