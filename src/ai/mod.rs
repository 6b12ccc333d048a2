//! External generative model integration
//!
//! The model is an opaque remote capability: it takes a structured
//! [`ModelInvocation`] and answers with an optional JSON output plus any
//! structured errors it reported. Callers validate the output shape
//! themselves.

pub mod gemini;
pub mod http;
pub mod mock;
pub mod openai;

pub use gemini::GeminiModel;
pub use mock::{MockModel, MockReply};
pub use openai::OpenAiModel;

use crate::models::ImagePayload;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// One piece of prompt content.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    Media(ImagePayload),
}

/// A single prompt execution request handed to a backend.
#[derive(Debug, Clone)]
pub struct ModelInvocation {
    /// Stable prompt name, used for logging and as the schema name.
    pub name: &'static str,
    pub system: String,
    pub parts: Vec<PromptPart>,
    /// JSON schema the output is asked to conform to. Not enforced.
    pub output_schema: Value,
}

impl ModelInvocation {
    pub fn media(&self) -> impl Iterator<Item = &ImagePayload> {
        self.parts.iter().filter_map(|part| match part {
            PromptPart::Media(image) => Some(image),
            PromptPart::Text(_) => None,
        })
    }
}

/// Structured error reported by a completed model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelError {
    pub message: String,
    pub details: Option<String>,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// What a completed model call returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub output: Option<Value>,
    pub errors: Vec<ModelError>,
}

impl ModelResponse {
    pub fn output(output: Value) -> Self {
        Self {
            output: Some(output),
            errors: Vec::new(),
        }
    }

    pub fn rejected(error: ModelError) -> Self {
        Self {
            output: None,
            errors: vec![error],
        }
    }
}

/// The external model capability.
///
/// `Err` means the call itself failed. A call that completed but reported
/// problems returns `Ok` with `errors` populated.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn invoke(&self, invocation: &ModelInvocation) -> Result<ModelResponse>;
}

/// Parse model text as JSON, tolerating a surrounding markdown code fence.
pub(crate) fn parse_json_output(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    match serde_json::from_str(unfenced.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Model output is not valid JSON ({}): {}", e, trimmed);
            None
        }
    }
}
