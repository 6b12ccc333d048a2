use super::client::OpenAiHttpClient;
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatMessageContent, ImageUrl,
    JsonSchema, MessagePart, ResponseFormat,
};
use crate::ai::http::{rejection_from_body, ApiReply};
use crate::ai::{parse_json_output, ModelError, ModelInvocation, ModelResponse, ModelService, PromptPart};
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

const MAX_COMPLETION_TOKENS: u32 = 2048;

/// [`ModelService`] backed by OpenAI chat completions with strict JSON schema output.
pub struct OpenAiModel {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiModel {
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
            http: OpenAiHttpClient::new_with_client(api_key, timeout, client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(&self, invocation: &ModelInvocation) -> ChatCompletionRequest {
        let parts = invocation
            .parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => MessagePart {
                    part_type: "text".to_string(),
                    text: Some(text.clone()),
                    image_url: None,
                },
                PromptPart::Media(image) => MessagePart {
                    part_type: "image_url".to_string(),
                    text: None,
                    image_url: Some(ImageUrl {
                        url: image.to_data_uri(),
                    }),
                },
            })
            .collect();

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(ChatMessageContent::Text(invocation.system.clone())),
                    refusal: None,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(ChatMessageContent::Parts(parts)),
                    refusal: None,
                },
            ],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
            response_format: Some(ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchema {
                    name: invocation.name.to_string(),
                    schema: invocation.output_schema.clone(),
                    strict: true,
                },
            }),
        }
    }

    fn interpret(response: ChatCompletionResponse) -> ModelResponse {
        let Some(choice) = response.choices.into_iter().next() else {
            return ModelResponse::default();
        };

        if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
            return ModelResponse::rejected(
                ModelError::new(refusal).with_details("OpenAI refusal"),
            );
        }

        match choice.message.content {
            Some(ChatMessageContent::Text(text)) if !text.trim().is_empty() => ModelResponse {
                output: parse_json_output(&text),
                errors: Vec::new(),
            },
            _ if choice.finish_reason.as_deref() == Some("content_filter") => {
                ModelResponse::rejected(ModelError::new(
                    "The response was withheld by the content filter",
                ))
            }
            _ => ModelResponse::default(),
        }
    }
}

#[async_trait]
impl ModelService for OpenAiModel {
    async fn invoke(&self, invocation: &ModelInvocation) -> Result<ModelResponse> {
        tracing::debug!(
            "Invoking {} via OpenAI (model: {}, media parts: {})",
            invocation.name,
            self.model,
            invocation.media().count()
        );

        let request = self.build_request(invocation);
        match self.http.chat_completion(&request).await? {
            ApiReply::Success(response) => Ok(Self::interpret(response)),
            ApiReply::Failed { status, body } => Ok(rejection_from_body("OpenAI", status, &body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImagePayload;
    use crate::Error;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

    fn make_model(server: &MockServer) -> OpenAiModel {
        OpenAiModel::new(
            "test-key".to_string(),
            "gpt-4o-mini".to_string(),
            Duration::from_secs(5),
        )
        .with_base_url(server.uri())
    }

    fn languages_invocation() -> ModelInvocation {
        ModelInvocation {
            name: "suggestLanguagesPrompt",
            system: "You are an expert in language and geography.".to_string(),
            parts: vec![PromptPart::Text("Location: Brazil".to_string())],
            output_schema: json!({
                "type": "object",
                "properties": {
                    "suggestedLanguages": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["suggestedLanguages"],
                "additionalProperties": false
            }),
        }
    }

    fn assistant_reply(content: serde_json::Value, finish_reason: &str) -> serde_json::Value {
        json!({
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": finish_reason
            }]
        })
    }

    #[tokio::test]
    async fn test_invoke_parses_structured_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHAT_COMPLETIONS_PATH))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_string_contains("\"json_schema\""))
            .and(body_string_contains("\"name\":\"suggestLanguagesPrompt\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(assistant_reply(
                json!("{\"suggestedLanguages\":[\"Portuguese\",\"Spanish\"]}"),
                "stop",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let response = make_model(&server)
            .invoke(&languages_invocation())
            .await
            .unwrap();
        assert_eq!(
            response.output,
            Some(json!({"suggestedLanguages": ["Portuguese", "Spanish"]}))
        );
    }

    #[tokio::test]
    async fn test_invoke_sends_image_as_data_uri() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHAT_COMPLETIONS_PATH))
            .and(body_string_contains("\"image_url\""))
            .and(body_string_contains("data:image/png;base64,iVBORw=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(assistant_reply(
                json!("{\"poem\":\"red\"}"),
                "stop",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let mut invocation = languages_invocation();
        invocation.parts = vec![PromptPart::Media(
            ImagePayload::new("image/png", vec![0x89, 0x50, 0x4E, 0x47]).unwrap(),
        )];

        let response = make_model(&server).invoke(&invocation).await.unwrap();
        assert_eq!(response.output, Some(json!({"poem": "red"})));
    }

    #[tokio::test]
    async fn test_invoke_refusal_is_structured_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHAT_COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "refusal": "I can't help with that image."
                    },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let response = make_model(&server)
            .invoke(&languages_invocation())
            .await
            .unwrap();
        assert_eq!(response.errors[0].message, "I can't help with that image.");
        assert!(response.output.is_none());
    }

    #[tokio::test]
    async fn test_invoke_bad_request_is_structured_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHAT_COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "Invalid image data",
                    "type": "invalid_request_error",
                    "code": null
                }
            })))
            .mount(&server)
            .await;

        let response = make_model(&server)
            .invoke(&languages_invocation())
            .await
            .unwrap();
        assert_eq!(response.errors[0].message, "Invalid image data");
    }

    #[tokio::test]
    async fn test_invoke_rate_limit_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHAT_COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = make_model(&server)
            .invoke(&languages_invocation())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_invoke_empty_choices_yields_no_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHAT_COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let response = make_model(&server)
            .invoke(&languages_invocation())
            .await
            .unwrap();
        assert_eq!(response, ModelResponse::default());
    }
}
