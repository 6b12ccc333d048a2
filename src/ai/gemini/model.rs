use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::http::{rejection_from_body, ApiReply};
use crate::ai::{parse_json_output, ModelError, ModelInvocation, ModelResponse, ModelService, PromptPart};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const MAX_OUTPUT_TOKENS: u32 = 2048;

/// [`ModelService`] backed by Gemini `generateContent` in JSON mode.
pub struct GeminiModel {
    http: GeminiHttpClient,
}

impl GeminiModel {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(invocation: &ModelInvocation) -> GenerateContentRequest {
        let parts = invocation
            .parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => Part::Text { text: text.clone() },
                PromptPart::Media(image) => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type().to_string(),
                        data: image.base64_data(),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: invocation.system.clone(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(MAX_OUTPUT_TOKENS),
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(to_gemini_schema(&invocation.output_schema)),
            }),
        }
    }

    fn interpret(response: GenerateContentResponse) -> ModelResponse {
        if let Some(feedback) = response.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let mut error = ModelError::new(format!("The request was blocked ({})", reason));
                if let Some(message) = feedback.block_reason_message {
                    error = error.with_details(message);
                }
                return ModelResponse::rejected(error);
            }
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return ModelResponse::default();
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| match p {
                        Part::Text { text } => Some(text),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return match candidate.finish_reason.as_deref() {
                Some(reason) if reason != "STOP" => ModelResponse::rejected(ModelError::new(
                    format!("Generation stopped before producing output ({})", reason),
                )),
                _ => ModelResponse::default(),
            };
        }

        ModelResponse {
            output: parse_json_output(&text),
            errors: Vec::new(),
        }
    }
}

#[async_trait]
impl ModelService for GeminiModel {
    async fn invoke(&self, invocation: &ModelInvocation) -> Result<ModelResponse> {
        tracing::debug!(
            "Invoking {} via Gemini (model: {}, media parts: {})",
            invocation.name,
            self.http.model(),
            invocation.media().count()
        );

        let request = Self::build_request(invocation);
        match self.http.generate_content(&request).await? {
            ApiReply::Success(response) => Ok(Self::interpret(response)),
            ApiReply::Failed { status, body } => Ok(rejection_from_body("Gemini", status, &body)),
        }
    }
}

/// Gemini accepts an OpenAPI subset: upper-case type names and no
/// `additionalProperties`.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "additionalProperties")
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("type", Value::String(kind)) => Value::String(kind.to_ascii_uppercase()),
                        _ => to_gemini_schema(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}
