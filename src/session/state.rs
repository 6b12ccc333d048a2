use crate::models::{ImagePayload, Language};
use std::fmt;

/// The image currently chosen in the session, as shown in the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub file_name: Option<String>,
    pub payload: ImagePayload,
}

/// Lifecycle of one generation attempt.
///
/// Terminal states keep the image that produced them, so a poem is always
/// displayed next to the exact picture it was written for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    ImageSelected {
        image: SelectedImage,
    },
    Submitting {
        image: SelectedImage,
        language: Language,
    },
    Succeeded {
        image: SelectedImage,
        language: Language,
        poem: String,
    },
    Failed {
        image: SelectedImage,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ImageSelected,
    Submitting,
    Succeeded,
    Failed,
}

impl AttemptState {
    pub fn phase(&self) -> Phase {
        match self {
            AttemptState::Idle => Phase::Idle,
            AttemptState::ImageSelected { .. } => Phase::ImageSelected,
            AttemptState::Submitting { .. } => Phase::Submitting,
            AttemptState::Succeeded { .. } => Phase::Succeeded,
            AttemptState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        match self {
            AttemptState::Idle => None,
            AttemptState::ImageSelected { image }
            | AttemptState::Submitting { image, .. }
            | AttemptState::Succeeded { image, .. }
            | AttemptState::Failed { image, .. } => Some(image),
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, AttemptState::Submitting { .. })
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::ImageSelected => "image-selected",
            Phase::Submitting => "submitting",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}
