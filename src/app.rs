//! Application wiring: configuration, backend selection and the commands the
//! binary exposes.

use crate::ai::{GeminiModel, ModelService, OpenAiModel};
use crate::error::ValidationError;
use crate::flows::GenerationAdapter;
use crate::models::{AiProvider, Config, LanguageSuggestions, SuggestLanguagesRequest};
use crate::picker::PickedFile;
use crate::session::{CameraProbe, DeviceCameraProbe, Phase, SessionView, SubmissionController};
use crate::Result;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Owns the generation adapter and platform services for the CLI.
pub struct App {
    adapter: Arc<GenerationAdapter>,
    camera: Box<dyn CameraProbe>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub model: Arc<dyn ModelService>,
    pub camera: Box<dyn CameraProbe>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            adapter: Arc::new(GenerationAdapter::new(services.model)),
            camera: services.camera,
        }
    }

    fn build_model(config: &Config) -> Arc<dyn ModelService> {
        let client = reqwest::Client::new();
        let model: Arc<dyn ModelService> = match config.provider {
            AiProvider::Gemini => {
                info!("Model provider: Gemini (model: {})", config.model);
                let mut model = GeminiModel::new_with_client(
                    config.api_key.clone(),
                    config.model.clone(),
                    config.timeout,
                    client,
                );
                if let Some(url) = &config.base_url {
                    model = model.with_base_url(url.clone());
                }
                Arc::new(model)
            }
            AiProvider::OpenAi => {
                info!("Model provider: OpenAI (model: {})", config.model);
                let mut model = OpenAiModel::new_with_client(
                    config.api_key.clone(),
                    config.model.clone(),
                    config.timeout,
                    client,
                );
                if let Some(url) = &config.base_url {
                    model = model.with_base_url(url.clone());
                }
                Arc::new(model)
            }
        };
        model
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_services(AppServices {
            model: Self::build_model(config),
            camera: Box::new(DeviceCameraProbe::new(config.camera_device.clone())),
        })
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config))
    }

    /// A fresh session bound to this app's adapter.
    pub fn controller(&self) -> SubmissionController {
        SubmissionController::new(self.adapter.clone())
    }

    /// Run one poem attempt for an image file and return the final view.
    ///
    /// Local validation problems are returned as errors; generation failures
    /// come back as a view in the failed phase.
    pub async fn generate(&self, image: &Path, language: Option<&str>) -> Result<SessionView> {
        let controller = self.controller();

        let file = PickedFile::from_path(image)?;
        controller.select_image(file)?;
        if let Some(language) = language {
            controller.set_language(language)?;
        }
        controller.submit().await?;

        Ok(controller.view())
    }

    pub async fn suggest_languages(&self, location: &str) -> Result<LanguageSuggestions> {
        let request = SuggestLanguagesRequest::new(location)?;
        self.adapter.suggest_languages(&request).await
    }

    pub async fn probe_camera(&self) -> std::result::Result<(), ValidationError> {
        self.controller().request_camera(self.camera.as_ref()).await
    }
}

/// Plain-text rendering of a session view.
pub fn render_view(view: &SessionView) -> String {
    let mut out = String::new();

    if let Some(card) = &view.result {
        let language = match card.language.label() {
            Some(label) if label != card.language.as_str() => {
                format!("{} ({})", card.language, label)
            }
            _ => card.language.to_string(),
        };
        if let Some(name) = &card.image.file_name {
            let _ = writeln!(out, "Image: {}", name);
        }
        let _ = writeln!(out, "Generated Poem in {}:", language);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", card.poem);
    } else if let Some(alert) = &view.alert {
        let _ = writeln!(out, "{}: {}", alert.title, alert.message);
    } else if view.phase == Phase::Submitting {
        let _ = writeln!(out, "Generating your poem...");
    }

    out
}
