pub mod client;
pub mod model;
pub mod types;

pub use client::OpenAiHttpClient;
pub use model::OpenAiModel;
