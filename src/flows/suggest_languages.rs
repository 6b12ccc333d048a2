use super::{malformed, GenerationAdapter};
use crate::ai::{ModelInvocation, PromptPart};
use crate::models::{LanguageSuggestions, SuggestLanguagesRequest};
use crate::{prompts, Result};
use serde_json::{json, Value};

pub const PROMPT_NAME: &str = "suggestLanguagesPrompt";

pub const INVALID_SUGGESTIONS_MESSAGE: &str =
    "The AI did not return a valid list of languages for this location.";

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "suggestedLanguages": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Languages commonly spoken at the location."
            }
        },
        "required": ["suggestedLanguages"],
        "additionalProperties": false
    })
}

pub fn invocation(request: &SuggestLanguagesRequest) -> ModelInvocation {
    ModelInvocation {
        name: PROMPT_NAME,
        system: prompts::LANGUAGES_SYSTEM.to_string(),
        parts: vec![PromptPart::Text(prompts::render(
            prompts::LANGUAGES_USER,
            &[("location", request.location())],
        ))],
        output_schema: output_schema(),
    }
}

fn extract_languages(output: Option<&Value>) -> Option<Vec<String>> {
    output?
        .get("suggestedLanguages")?
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

impl GenerationAdapter {
    /// Ask the model which languages are commonly spoken at a location.
    ///
    /// The list comes back in the model's order, untouched.
    pub async fn suggest_languages(
        &self,
        request: &SuggestLanguagesRequest,
    ) -> Result<LanguageSuggestions> {
        tracing::debug!("Suggesting languages for location '{}'", request.location());

        let output = self
            .call("suggest languages", &invocation(request))
            .await?;
        let suggested_languages = extract_languages(output.as_ref()).ok_or_else(|| {
            malformed(PROMPT_NAME, output.as_ref(), INVALID_SUGGESTIONS_MESSAGE)
        })?;

        Ok(LanguageSuggestions {
            suggested_languages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockModel, ModelError, ModelResponse};
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn adapter(model: &MockModel) -> GenerationAdapter {
        GenerationAdapter::new(Arc::new(model.clone()))
    }

    #[tokio::test]
    async fn test_returns_list_unchanged() {
        let model = MockModel::new()
            .with_output(json!({"suggestedLanguages": ["Portuguese", "Spanish"]}));

        let request = SuggestLanguagesRequest::new("Brazil").unwrap();
        let result = adapter(&model).suggest_languages(&request).await.unwrap();
        assert_eq!(result.suggested_languages, vec!["Portuguese", "Spanish"]);

        let calls = model.invocations();
        assert_eq!(calls[0].name, PROMPT_NAME);
        assert_eq!(calls[0].media().count(), 0);
        assert!(calls[0]
            .parts
            .iter()
            .any(|p| matches!(p, PromptPart::Text(text) if text.contains("Location: Brazil"))));
    }

    #[tokio::test]
    async fn test_empty_list_is_a_valid_answer() {
        let model = MockModel::new().with_output(json!({"suggestedLanguages": []}));

        let request = SuggestLanguagesRequest::new("Antarctica").unwrap();
        let result = adapter(&model).suggest_languages(&request).await.unwrap();
        assert!(result.suggested_languages.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lists_are_rejected() {
        for output in [
            None,
            Some(json!({"suggestedLanguages": "Portuguese"})),
            Some(json!({"suggestedLanguages": ["Portuguese", 7]})),
            Some(json!({"languages": ["Portuguese"]})),
        ] {
            let model = MockModel::new().with_response(ModelResponse {
                output,
                errors: Vec::new(),
            });
            let request = SuggestLanguagesRequest::new("Brazil").unwrap();
            let err = adapter(&model).suggest_languages(&request).await.unwrap_err();
            assert!(matches!(err, Error::UpstreamMalformed(_)));
        }
    }

    #[tokio::test]
    async fn test_structured_error_is_rejected() {
        let model = MockModel::new()
            .with_response(ModelResponse::rejected(ModelError::new("quota exceeded")));

        let request = SuggestLanguagesRequest::new("Kenya").unwrap();
        let err = adapter(&model).suggest_languages(&request).await.unwrap_err();
        assert_eq!(err.user_message(), "quota exceeded");
    }

    #[tokio::test]
    async fn test_call_failure_is_unavailable() {
        let model = MockModel::new().with_failure("timed out");

        let request = SuggestLanguagesRequest::new("Kenya").unwrap();
        let err = adapter(&model).suggest_languages(&request).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(ref msg) if msg.contains("timed out")));
    }
}
