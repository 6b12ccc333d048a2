//! RhymeSnap - turns a photo into a poem in the language of your choice
//!
//! A generation adapter wraps the external model call (request shaping,
//! output validation, error classification) and a UI-agnostic submission
//! controller drives one image-to-poem attempt at a time.

pub mod ai;
pub mod app;
pub mod error;
pub mod flows;
pub mod models;
pub mod picker;
pub mod prompts;
pub mod session;

pub use error::{Error, Result, ValidationError};
