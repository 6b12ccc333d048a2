pub mod client;
pub mod model;
pub mod types;

pub use client::GeminiHttpClient;
pub use model::GeminiModel;
