use super::{ModelInvocation, ModelResponse, ModelService};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One scripted answer of [`MockModel`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(ModelResponse),
    /// The call itself fails, as a dropped connection would.
    Fail(String),
}

/// Deterministic stand-in for the external model.
///
/// Scripted replies are served in order and cycle once exhausted. With no
/// script, a fixed output matching the invoked prompt is returned. Clones
/// share state, so a clone kept by a test observes every call.
#[derive(Clone)]
pub struct MockModel {
    replies: Arc<Mutex<Vec<MockReply>>>,
    invocations: Arc<Mutex<Vec<ModelInvocation>>>,
    call_count: Arc<Mutex<usize>>,
    gate: Option<Arc<Notify>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            invocations: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            gate: None,
        }
    }

    pub fn with_response(self, response: ModelResponse) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Respond(response));
        self
    }

    pub fn with_output(self, output: serde_json::Value) -> Self {
        self.with_response(ModelResponse::output(output))
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Fail(message.into()));
        self
    }

    /// Hold every call until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn invocations(&self) -> Vec<ModelInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    fn default_output(invocation: &ModelInvocation) -> serde_json::Value {
        match invocation.name {
            "suggestLanguagesPrompt" => json!({ "suggestedLanguages": ["English"] }),
            _ => json!({ "poem": "A quiet picture,\nheld in light." }),
        }
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelService for MockModel {
    async fn invoke(&self, invocation: &ModelInvocation) -> Result<ModelResponse> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.invocations.lock().unwrap().push(invocation.clone());

        let reply = {
            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                None
            } else {
                Some(replies[(count - 1) % replies.len()].clone())
            }
        };

        match reply {
            None => Ok(ModelResponse::output(Self::default_output(invocation))),
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(message)) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message,
            ))),
        }
    }
}
