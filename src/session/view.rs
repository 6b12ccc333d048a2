//! Rendered projection of a session.
//!
//! Whatever draws the UI (the CLI here) reads a [`SessionView`] after each
//! transition instead of poking at the state machine directly.

use super::state::{AttemptState, Phase, SelectedImage};
use crate::error::ValidationError;
use crate::models::Language;

pub const FAILURE_TITLE: &str = "Error Generating Poem";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

/// A finished poem, bound to the image and language it was generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoemCard {
    pub image: SelectedImage,
    pub language: Language,
    pub poem: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: Phase,
    pub preview: Option<SelectedImage>,
    pub language: Language,
    pub submit_enabled: bool,
    pub loading: bool,
    pub alert: Option<Alert>,
    pub result: Option<PoemCard>,
}

impl SessionView {
    pub fn render(
        state: &AttemptState,
        language: &Language,
        notice: Option<&ValidationError>,
    ) -> Self {
        let loading = state.is_submitting();

        // Alerts are hidden while a request is running.
        let alert = if loading {
            None
        } else if let Some(notice) = notice {
            Some(Alert {
                title: notice.title().to_string(),
                message: notice.to_string(),
            })
        } else if let AttemptState::Failed { message, .. } = state {
            Some(Alert {
                title: FAILURE_TITLE.to_string(),
                message: message.clone(),
            })
        } else {
            None
        };

        let result = match state {
            AttemptState::Succeeded {
                image,
                language,
                poem,
            } => Some(PoemCard {
                image: image.clone(),
                language: language.clone(),
                poem: poem.clone(),
            }),
            _ => None,
        };

        Self {
            phase: state.phase(),
            preview: state.image().cloned(),
            language: language.clone(),
            submit_enabled: !loading && state.image().is_some(),
            loading,
            alert,
            result,
        }
    }
}
