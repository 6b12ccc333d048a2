//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Local input problems are [`ValidationError`]s and never reach the model;
//! everything that goes wrong around the model call is one of the three
//! `Upstream*` variants.

use thiserror::Error;

/// Fallback text shown when a generation failure carries no message.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An unexpected error occurred while generating the poem.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The model call completed but reported structured errors.
    #[error("Upstream rejected the request: {0}")]
    UpstreamRejected(String),

    /// The model call completed without a usable output.
    #[error("Upstream returned malformed output: {0}")]
    UpstreamMalformed(String),

    /// The model call itself failed (transport, timeout, outage).
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl Error {
    /// Text suitable for an alert banner, without the variant prefix.
    /// Text for the failure alert; never blank.
    pub fn user_message(&self) -> String {
        let message = match self {
            Error::Validation(e) => e.to_string(),
            Error::UpstreamRejected(msg)
            | Error::UpstreamMalformed(msg)
            | Error::UpstreamUnavailable(msg)
            | Error::Config(msg) => msg.clone(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamRejected(_) | Error::UpstreamMalformed(_) | Error::UpstreamUnavailable(_)
        )
    }
}

/// Bad local input, handled entirely on the client side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an image file (e.g., JPG, PNG, GIF). Got '{mime_type}'.")]
    NotAnImage { mime_type: String },

    #[error("The selected image is empty.")]
    EmptyImage,

    #[error("Malformed image data URI: {0}")]
    MalformedDataUri(String),

    #[error("Please select or capture an image before generating a poem.")]
    NoImageSelected,

    #[error("Please choose a language for the poem.")]
    EmptyLanguage,

    #[error("Please provide a location, such as a city or country name.")]
    EmptyLocation,

    #[error("A poem is already being generated. Please wait for it to finish.")]
    SubmissionInFlight,

    #[error("Camera access was denied. Please enable camera permissions ({0}).")]
    CameraDenied(String),

    #[error("Camera not available on this device.")]
    CameraUnavailable,
}

impl ValidationError {
    /// Short heading used when the error is rendered as an alert.
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::NotAnImage { .. }
            | ValidationError::EmptyImage
            | ValidationError::MalformedDataUri(_) => "Invalid File Type",
            ValidationError::NoImageSelected => "No Image Selected",
            ValidationError::EmptyLanguage => "No Language Selected",
            ValidationError::EmptyLocation => "No Location Given",
            ValidationError::SubmissionInFlight => "Generation In Progress",
            ValidationError::CameraDenied(_) => "Camera Access Denied",
            ValidationError::CameraUnavailable => "Camera Not Available",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
