//! Response classification shared by the HTTP backends.

use super::{ModelError, ModelResponse};
use crate::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Outcome of an HTTP exchange that reached the provider.
#[derive(Debug)]
pub enum ApiReply<T> {
    Success(T),
    /// The provider answered but refused the request.
    Failed { status: StatusCode, body: String },
}

/// Statuses that mean "try again later" rather than "this request is bad".
pub fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

/// Classify a provider response.
///
/// Transient statuses become `Error::UpstreamUnavailable`; an undecodable
/// success body becomes `Error::UpstreamMalformed`; other failures are
/// handed back as [`ApiReply::Failed`] for the backend to report as
/// structured errors.
pub async fn read_reply<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Response,
) -> Result<ApiReply<T>> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&body)
            .map(ApiReply::Success)
            .map_err(|e| {
                tracing::error!("Failed to parse {} response: {}\nBody: {}", provider, e, body);
                Error::UpstreamMalformed(format!("Failed to parse {} response: {}", provider, e))
            });
    }

    tracing::error!("{} API error (status {}): {}", provider, status, body);
    if is_transient(status) {
        return Err(Error::UpstreamUnavailable(format!(
            "{} API error (status {}): {}",
            provider, status, body
        )));
    }

    Ok(ApiReply::Failed { status, body })
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

// Gemini sends `status`, OpenAI sends `type`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "type")]
    status: Option<String>,
}

/// Turn a refused request into a structured model error.
pub fn rejection_from_body(provider: &str, status: StatusCode, body: &str) -> ModelResponse {
    let error = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let kind = envelope.error.status.unwrap_or_else(|| "unknown".to_string());
            ModelError::new(envelope.error.message.unwrap_or_default())
                .with_details(format!("{} status {} ({})", provider, status.as_u16(), kind))
        }
        Err(_) => ModelError::new(format!(
            "{} API error (status {}): {}",
            provider, status, body
        )),
    };
    ModelResponse::rejected(error)
}
