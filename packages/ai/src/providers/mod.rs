//! LLM provider abstraction and implementations.
//!
//! Supports Google Gemini, Anthropic, and `OpenAI` (or any
//! `OpenAI`-compatible server) via a common trait.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::AiError;

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Message content.
    pub content: MessageContent,
}

impl Message {
    /// A plain-text user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }
}

/// Content of a message, either simple text or structured blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content.
    Text(String),
    /// Structured content blocks (for tool results, etc.).
    Blocks(Vec<ContentBlock>),
}

/// A structured content block within a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// A tool use request from the assistant.
    ToolUse {
        /// Unique ID for this tool use.
        id: String,
        /// Tool name.
        name: String,
        /// Tool input parameters.
        input: serde_json::Value,
    },
    /// A tool result being sent back.
    ToolResult {
        /// The `tool_use` ID this result corresponds to.
        tool_use_id: String,
        /// The result content.
        content: String,
    },
}

/// Response from the LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Content blocks in the response.
    pub content: Vec<ContentBlock>,
    /// Whether the model wants to use tools (vs. providing a final answer).
    pub stop_reason: StopReason,
}

impl LlmResponse {
    /// All text blocks of the response joined by newlines.
    #[must_use]
    pub fn text(&self) -> String {
        extract_text(&self.content)
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Model finished its response naturally.
    EndTurn,
    /// Model wants to call one or more tools.
    ToolUse,
    /// Maximum tokens reached.
    MaxTokens,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request with tool definitions.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails.
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<LlmResponse, AiError>;
}

/// Extracts text content from content blocks.
#[must_use]
pub fn extract_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| {
            if let ContentBlock::Text { text } = b {
                Some(text.as_str())
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Creates an LLM provider based on environment variables.
///
/// See [`create_provider`] for the variables consulted.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Arc<dyn LlmProvider>, AiError> {
    create_provider(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
}

/// Creates an LLM provider from configuration values looked up by name.
///
/// If `AI_PROVIDER` is set, uses that provider. Otherwise auto-detects
/// from available credentials:
///
/// 1. `GEMINI_API_KEY` set -> Google Gemini
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 3. `OPENAI_API_KEY` or `AI_BASE_URL` set -> `OpenAI`-compatible
///
/// `AI_MODEL` overrides the default model and `AI_BASE_URL` points the
/// `OpenAI` provider at a compatible server (which may not need a key).
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn LlmProvider>, AiError> {
    let provider = lookup("AI_PROVIDER")
        .or_else(|| detect_provider(&lookup))
        .ok_or_else(|| AiError::Config {
            message: "No AI credentials found. Set one of GEMINI_API_KEY, ANTHROPIC_API_KEY, \
                      OPENAI_API_KEY, or AI_BASE_URL, or set AI_PROVIDER explicitly."
                .to_string(),
        })?;
    let model = lookup("AI_MODEL");

    let require_key = |name: &str| {
        lookup(name).ok_or_else(|| AiError::Config {
            message: format!("{name} environment variable not set"),
        })
    };

    match provider.to_lowercase().as_str() {
        "gemini" | "google" => {
            let api_key = require_key("GEMINI_API_KEY")?;
            let model = model.unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
            log::info!("Using Gemini provider with model {model}");
            Ok(Arc::new(gemini::GeminiProvider::new(api_key, model)))
        }
        "anthropic" | "claude" => {
            let api_key = require_key("ANTHROPIC_API_KEY")?;
            let model = model.unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string());
            log::info!("Using Anthropic provider with model {model}");
            Ok(Arc::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        "openai" | "gpt" => {
            let base_url = lookup("AI_BASE_URL");
            let api_key = match (lookup("OPENAI_API_KEY"), &base_url) {
                (Some(key), _) => key,
                // Self-hosted servers usually accept any key
                (None, Some(_)) => String::new(),
                (None, None) => require_key("OPENAI_API_KEY")?,
            };
            let model = model.unwrap_or_else(|| openai::DEFAULT_MODEL.to_string());
            log::info!("Using OpenAI-compatible provider with model {model}");
            Ok(Arc::new(openai::OpenAiProvider::new(api_key, model, base_url)))
        }
        other => Err(AiError::Config {
            message: format!(
                "Unknown AI provider: {other}. Use 'gemini', 'anthropic', or 'openai'."
            ),
        }),
    }
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_provider`].
fn detect_provider(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    if lookup("GEMINI_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: Gemini (GEMINI_API_KEY found)");
        return Some("gemini".to_string());
    }

    if lookup("ANTHROPIC_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return Some("anthropic".to_string());
    }

    if lookup("OPENAI_API_KEY").is_some() || lookup("AI_BASE_URL").is_some() {
        log::info!("Auto-detected AI provider: OpenAI (OPENAI_API_KEY or AI_BASE_URL found)");
        return Some("openai".to_string());
    }

    None
}
