//! Generation adapter
//!
//! Shapes typed requests into model invocations, calls the model exactly
//! once per request and classifies whatever comes back. No retries happen at
//! this layer; the model either answers or the attempt fails.

pub mod generate_poem;
pub mod suggest_languages;

use crate::ai::{ModelInvocation, ModelService};
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Message used when the model reports an error without any text.
pub const UNKNOWN_UPSTREAM_ERROR: &str = "AI prompt execution failed with an unknown error.";

pub struct GenerationAdapter {
    model: Arc<dyn ModelService>,
}

impl GenerationAdapter {
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        Self { model }
    }

    /// Run one invocation and return its raw output, if any.
    ///
    /// `action` reads as "Failed to {action}" in unavailability messages.
    async fn call(&self, action: &str, invocation: &ModelInvocation) -> Result<Option<Value>> {
        let response = self
            .model
            .invoke(invocation)
            .await
            .map_err(|e| call_failure(action, invocation.name, e))?;

        if let Some(first) = response.errors.first() {
            for err in &response.errors {
                error!(
                    "[{}] Error from prompt: {} {}",
                    invocation.name,
                    err.message,
                    err.details.as_deref().unwrap_or_default()
                );
            }
            let message = first.message.trim();
            return Err(Error::UpstreamRejected(if message.is_empty() {
                UNKNOWN_UPSTREAM_ERROR.to_string()
            } else {
                message.to_string()
            }));
        }

        Ok(response.output)
    }
}

fn call_failure(action: &str, prompt: &str, err: Error) -> Error {
    error!("[{}] Model call failed: {}", prompt, err);
    match err {
        Error::UpstreamRejected(_) | Error::UpstreamMalformed(_) => err,
        Error::UpstreamUnavailable(cause) => {
            Error::UpstreamUnavailable(format!("Failed to {}: {}", action, cause))
        }
        other => Error::UpstreamUnavailable(format!("Failed to {}: {}", action, other)),
    }
}

fn malformed(prompt: &str, output: Option<&Value>, message: &str) -> Error {
    warn!(
        "[{}] Model returned invalid, empty, or missing output: {:?}",
        prompt, output
    );
    Error::UpstreamMalformed(message.to_string())
}
