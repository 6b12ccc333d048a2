use super::{malformed, GenerationAdapter};
use crate::ai::{ModelInvocation, PromptPart};
use crate::models::{GenerationRequest, GenerationResult};
use crate::{prompts, Result};
use serde_json::{json, Value};

pub const PROMPT_NAME: &str = "generatePoemPrompt";

pub const INVALID_POEM_MESSAGE: &str =
    "The AI did not return a valid poem. The content might be empty or in an unexpected format.";

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "poem": {
                "type": "string",
                "description": "The generated poem."
            }
        },
        "required": ["poem"],
        "additionalProperties": false
    })
}

pub fn invocation(request: &GenerationRequest) -> ModelInvocation {
    ModelInvocation {
        name: PROMPT_NAME,
        system: prompts::POEM_SYSTEM.to_string(),
        parts: vec![
            PromptPart::Media(request.image().clone()),
            PromptPart::Text(prompts::render(
                prompts::POEM_USER,
                &[("language", request.language().as_str())],
            )),
        ],
        output_schema: output_schema(),
    }
}

/// Trimmed poem text, or `None` if the output does not carry a usable one.
fn extract_poem(output: Option<&Value>) -> Option<String> {
    output?
        .get("poem")?
        .as_str()
        .map(str::trim)
        .filter(|poem| !poem.is_empty())
        .map(str::to_string)
}

impl GenerationAdapter {
    /// Generate a poem describing `request.image()` in `request.language()`.
    pub async fn generate_poem(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        tracing::debug!(
            "Generating poem in {} for {} image ({} bytes)",
            request.language(),
            request.image().mime_type(),
            request.image().len()
        );

        let output = self.call("generate poem", &invocation(request)).await?;
        let poem = extract_poem(output.as_ref())
            .ok_or_else(|| malformed(PROMPT_NAME, output.as_ref(), INVALID_POEM_MESSAGE))?;

        tracing::info!("Generated poem ({} chars) in {}", poem.chars().count(), request.language());
        Ok(GenerationResult { poem })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockModel, ModelError, ModelResponse};
    use crate::flows::UNKNOWN_UPSTREAM_ERROR;
    use crate::models::{ImagePayload, Language};
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn request(language: &str) -> GenerationRequest {
        GenerationRequest::new(
            ImagePayload::new("image/png", vec![0x89, 0x50, 0x4E, 0x47]).unwrap(),
            Language::new(language).unwrap(),
        )
    }

    fn adapter(model: &MockModel) -> GenerationAdapter {
        GenerationAdapter::new(Arc::new(model.clone()))
    }

    #[tokio::test]
    async fn test_returns_poem_trimmed() {
        let model = MockModel::new().with_output(json!({"poem": "\n  Un carré rouge,\nsi rouge.  \n"}));

        let result = adapter(&model).generate_poem(&request("French")).await.unwrap();
        assert_eq!(result.poem, "Un carré rouge,\nsi rouge.");
    }

    #[tokio::test]
    async fn test_invocation_carries_image_and_language() {
        let model = MockModel::new();
        adapter(&model).generate_poem(&request("Tamil")).await.unwrap();

        let calls = model.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, PROMPT_NAME);
        assert_eq!(calls[0].system, prompts::POEM_SYSTEM);
        assert_eq!(calls[0].media().count(), 1);
        assert!(calls[0].parts.iter().any(
            |p| matches!(p, PromptPart::Text(text) if text.contains("Language: Tamil"))
        ));
        assert_eq!(calls[0].output_schema["required"], json!(["poem"]));
    }

    #[tokio::test]
    async fn test_malformed_outputs_are_rejected() {
        let bad_outputs = [
            None,
            Some(json!({})),
            Some(json!({"poem": 42})),
            Some(json!({"poem": null})),
            Some(json!({"poem": ""})),
            Some(json!({"poem": " \n\t "})),
            Some(json!("just a string")),
        ];

        for output in bad_outputs {
            let model = MockModel::new().with_response(ModelResponse {
                output: output.clone(),
                errors: Vec::new(),
            });
            let err = adapter(&model)
                .generate_poem(&request("English"))
                .await
                .unwrap_err();
            match err {
                Error::UpstreamMalformed(msg) => assert_eq!(msg, INVALID_POEM_MESSAGE),
                other => panic!("expected malformed for {:?}, got {:?}", output, other),
            }
        }
    }

    #[tokio::test]
    async fn test_structured_errors_surface_first_message() {
        let model = MockModel::new().with_response(ModelResponse {
            output: Some(json!({"poem": "ignored"})),
            errors: vec![
                ModelError::new("Image violates content policy").with_details("SAFETY"),
                ModelError::new("Second problem"),
            ],
        });

        let err = adapter(&model)
            .generate_poem(&request("English"))
            .await
            .unwrap_err();
        match err {
            Error::UpstreamRejected(msg) => assert_eq!(msg, "Image violates content policy"),
            other => panic!("expected rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_structured_error_uses_fallback_message() {
        let model = MockModel::new().with_response(ModelResponse::rejected(ModelError::new("  ")));

        let err = adapter(&model)
            .generate_poem(&request("English"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), UNKNOWN_UPSTREAM_ERROR);
    }

    #[tokio::test]
    async fn test_call_failure_is_unavailable_with_cause() {
        let model = MockModel::new().with_failure("network unreachable");

        let err = adapter(&model)
            .generate_poem(&request("English"))
            .await
            .unwrap_err();
        match err {
            Error::UpstreamUnavailable(msg) => {
                assert!(msg.starts_with("Failed to generate poem"));
                assert!(msg.contains("network unreachable"));
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
        assert_eq!(model.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_identical_input_yields_identical_output() {
        let model = MockModel::new().with_output(json!({"poem": "Same every time"}));
        let adapter = adapter(&model);
        let req = request("Hindi");

        let first = adapter.generate_poem(&req).await.unwrap();
        let second = adapter.generate_poem(&req).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_poem_keeps_inner_whitespace() {
        assert_eq!(
            extract_poem(Some(&json!({"poem": " a\n\n b "}))),
            Some("a\n\n b".to_string())
        );
    }
}
