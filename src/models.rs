//! Data models and structures
//!
//! Defines the image payload, language selection, request/result types
//! exchanged with the generation adapter, and runtime configuration.

use crate::error::ValidationError;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// A user photo: MIME type plus bytes, transported as a `data:` URI.
///
/// Always declares an `image/*` MIME type and holds at least one byte.
/// Clones share the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl ImagePayload {
    pub fn new(
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> std::result::Result<Self, ValidationError> {
        let mime_type = mime_type.into().trim().to_ascii_lowercase();
        if !is_image_mime(&mime_type) {
            return Err(ValidationError::NotAnImage { mime_type });
        }

        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(ValidationError::EmptyImage);
        }

        Ok(Self {
            mime_type,
            bytes: bytes.into(),
        })
    }

    /// Parse `data:<mimetype>;base64,<payload>`.
    pub fn from_data_uri(uri: &str) -> std::result::Result<Self, ValidationError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ValidationError::MalformedDataUri("missing 'data:' scheme".into()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| ValidationError::MalformedDataUri("missing ',' separator".into()))?;

        let mut params = meta.split(';');
        let mime_type = params.next().unwrap_or_default();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(ValidationError::MalformedDataUri(
                "payload is not base64 encoded".into(),
            ));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ValidationError::MalformedDataUri(format!("invalid base64: {}", e)))?;

        Self::new(mime_type, bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data())
    }

    pub fn base64_data(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Image bytes stay out of logs.
impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FromStr for ImagePayload {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_data_uri(s)
    }
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

/// One entry of the language picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Languages offered by the picker. The first entry is the default.
pub const SUPPORTED_LANGUAGES: &[LanguageOption] = &[
    LanguageOption {
        value: "English",
        label: "English",
    },
    LanguageOption {
        value: "Hindi",
        label: "हिन्दी",
    },
    LanguageOption {
        value: "Bengali",
        label: "বাংলা",
    },
    LanguageOption {
        value: "Marathi",
        label: "मराठी",
    },
    LanguageOption {
        value: "Telugu",
        label: "తెలుగు",
    },
    LanguageOption {
        value: "Tamil",
        label: "தமிழ்",
    },
];

/// Target language of a poem.
///
/// Any non-blank string is accepted; the model decides whether it can write
/// in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn new(value: impl Into<String>) -> std::result::Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyLanguage);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display label when the value is one of [`SUPPORTED_LANGUAGES`].
    pub fn label(&self) -> Option<&'static str> {
        SUPPORTED_LANGUAGES
            .iter()
            .find(|opt| opt.value.eq_ignore_ascii_case(&self.0))
            .map(|opt| opt.label)
    }

    pub fn is_supported(&self) -> bool {
        self.label().is_some()
    }
}

impl Default for Language {
    fn default() -> Self {
        Self(SUPPORTED_LANGUAGES[0].value.to_string())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Language {
    type Error = ValidationError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.0
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Input of one poem generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    image: ImagePayload,
    language: Language,
}

impl GenerationRequest {
    pub fn new(image: ImagePayload, language: Language) -> Self {
        Self { image, language }
    }

    pub fn from_data_uri(
        image_uri: &str,
        language: &str,
    ) -> std::result::Result<Self, ValidationError> {
        Ok(Self::new(
            ImagePayload::from_data_uri(image_uri)?,
            Language::new(language)?,
        ))
    }

    pub fn image(&self) -> &ImagePayload {
        &self.image
    }

    pub fn language(&self) -> &Language {
        &self.language
    }
}

/// A validated poem. `poem` is never blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub poem: String,
}

/// Input of the language suggestion flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestLanguagesRequest {
    location: String,
}

impl SuggestLanguagesRequest {
    pub fn new(location: impl Into<String>) -> std::result::Result<Self, ValidationError> {
        let location = location.into();
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyLocation);
        }
        Ok(Self {
            location: trimmed.to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Languages commonly spoken at a location, in the order the model gave them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSuggestions {
    #[serde(rename = "suggestedLanguages")]
    pub suggested_languages: Vec<String>,
}

// Configuration

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Gemini,
    OpenAi,
}

impl AiProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini-2.0-flash",
            AiProvider::OpenAi => "gpt-4o-mini",
        }
    }
}

impl FromStr for AiProvider {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" | "googleai" => Ok(AiProvider::Gemini),
            "openai" => Ok(AiProvider::OpenAi),
            other => Err(crate::Error::Config(format!(
                "Unknown AI_PROVIDER '{}'. Expected 'gemini' or 'openai'",
                other
            ))),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiProvider::Gemini => f.write_str("gemini"),
            AiProvider::OpenAi => f.write_str("openai"),
        }
    }
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: AiProvider,
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub camera_device: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("AI_PROVIDER") {
            Some(value) => value.parse()?,
            None => AiProvider::Gemini,
        };

        let api_key = match provider {
            AiProvider::Gemini => var("GEMINI_API_KEY")
                .or_else(|| var("GOOGLE_API_KEY"))
                .ok_or_else(|| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?,
            AiProvider::OpenAi => var("OPENAI_API_KEY")
                .ok_or_else(|| crate::Error::Config("OPENAI_API_KEY not set".to_string()))?,
        };

        let timeout_secs = match var("AI_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(crate::Error::Config(format!(
                        "AI_TIMEOUT_SECS must be a positive number of seconds, got '{}'",
                        value
                    )))
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            provider,
            model: var("AI_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            api_key,
            base_url: var("AI_BASE_URL"),
            timeout: Duration::from_secs(timeout_secs),
            camera_device: var("CAMERA_DEVICE").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const RED_DOT_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_data_uri() {
        let payload = ImagePayload::from_data_uri(RED_DOT_URI).unwrap();
        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(&payload.bytes()[..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(payload.to_data_uri(), RED_DOT_URI);
    }

    #[test]
    fn test_data_uri_rejects_non_image_mime() {
        let err = ImagePayload::from_data_uri("data:text/plain;base64,aGVsbG8=").unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotAnImage {
                mime_type: "text/plain".to_string()
            }
        );
    }

    #[test]
    fn test_data_uri_rejects_empty_payload() {
        let err = ImagePayload::from_data_uri("data:image/png;base64,").unwrap_err();
        assert_eq!(err, ValidationError::EmptyImage);
    }

    #[test]
    fn test_data_uri_rejects_missing_scheme_and_encoding() {
        assert!(matches!(
            ImagePayload::from_data_uri("image/png;base64,iVBORw0KGgo="),
            Err(ValidationError::MalformedDataUri(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:image/png,rawbytes"),
            Err(ValidationError::MalformedDataUri(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:image/png;base64,@@not base64@@"),
            Err(ValidationError::MalformedDataUri(_))
        ));
    }

    #[test]
    fn test_debug_hides_bytes() {
        let payload = ImagePayload::new("image/jpeg", vec![0xFF, 0xD8, 0xFF]).unwrap();
        let rendered = format!("{:?}", payload);
        assert!(rendered.contains("image/jpeg"));
        assert!(rendered.contains("len: 3"));
        assert!(!rendered.contains("255"));
    }

    #[test]
    fn test_language_accepts_any_non_blank_value() {
        let lang = Language::new("  Klingon ").unwrap();
        assert_eq!(lang.as_str(), "Klingon");
        assert!(!lang.is_supported());
        assert_eq!(Language::new("   "), Err(ValidationError::EmptyLanguage));
    }

    #[test]
    fn test_default_language_is_first_supported() {
        let lang = Language::default();
        assert_eq!(lang.as_str(), "English");
        assert_eq!(Language::new("tamil").unwrap().label(), Some("தமிழ்"));
    }

    #[test]
    fn test_language_serde_validates() {
        let lang: Language = serde_json::from_str("\"French\"").unwrap();
        assert_eq!(lang.as_str(), "French");
        assert!(serde_json::from_str::<Language>("\"\"").is_err());
    }

    #[test]
    fn test_suggestions_use_camel_case_field() {
        let parsed: LanguageSuggestions =
            serde_json::from_str(r#"{"suggestedLanguages":["Portuguese","Spanish"]}"#).unwrap();
        assert_eq!(parsed.suggested_languages, vec!["Portuguese", "Spanish"]);
    }

    #[test]
    fn test_suggest_request_rejects_blank_location() {
        assert_eq!(
            SuggestLanguagesRequest::new(" "),
            Err(ValidationError::EmptyLocation)
        );
        assert_eq!(
            SuggestLanguagesRequest::new(" Brazil ").unwrap().location(),
            "Brazil"
        );
    }

    #[test]
    fn test_config_defaults_to_gemini() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")])).unwrap();
        assert_eq!(config.provider, AiProvider::Gemini);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.api_key, "g-key");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_config_openai_requires_key() {
        let err = Config::from_lookup(lookup(&[("AI_PROVIDER", "openai")])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let config = Config::from_lookup(lookup(&[
            ("AI_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "o-key"),
            ("AI_MODEL", "gpt-4o"),
            ("AI_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.provider, AiProvider::OpenAi);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("AI_PROVIDER", "bard")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("AI_TIMEOUT_SECS", "soon"),
        ]))
        .is_err());
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("AI_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(msg) if msg.contains("positive")));
    }
}
