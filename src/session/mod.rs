//! Client submission workflow
//!
//! A UI-agnostic state machine for one user session: pick an image, choose a
//! language, submit once, show the poem or the error.

pub mod camera;
pub mod controller;
pub mod state;
pub mod view;

pub use camera::{CameraAccess, CameraProbe, DeviceCameraProbe, MockCameraProbe};
pub use controller::SubmissionController;
pub use state::{AttemptState, Phase, SelectedImage};
pub use view::{Alert, PoemCard, SessionView};
