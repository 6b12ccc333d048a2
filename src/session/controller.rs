use super::camera::{CameraAccess, CameraProbe};
use super::state::{AttemptState, SelectedImage};
use super::view::SessionView;
use crate::error::{ValidationError, GENERIC_FAILURE_MESSAGE};
use crate::flows::GenerationAdapter;
use crate::models::{GenerationRequest, ImagePayload, Language};
use crate::picker::PickedFile;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

type Guarded<T> = std::result::Result<T, ValidationError>;

struct Session {
    state: AttemptState,
    language: Language,
    /// Most recent local validation problem, shown until the next accepted action.
    notice: Option<ValidationError>,
}

impl Session {
    fn transition(&mut self, next: AttemptState) {
        debug!("Session transition: {} -> {}", self.state.phase(), next.phase());
        self.state = next;
    }

    fn reject(&mut self, err: ValidationError) -> ValidationError {
        warn!("Rejected in {} state: {}", self.state.phase(), err);
        self.notice = Some(err.clone());
        err
    }
}

/// Drives one user session: image selection, language choice and a single
/// in-flight poem generation at a time.
///
/// All methods take `&self`; share the controller behind an `Arc` to submit
/// from a spawned task while the UI keeps reading [`SubmissionController::view`].
pub struct SubmissionController {
    adapter: Arc<GenerationAdapter>,
    session: Mutex<Session>,
}

impl SubmissionController {
    pub fn new(adapter: Arc<GenerationAdapter>) -> Self {
        Self {
            adapter,
            session: Mutex::new(Session {
                state: AttemptState::Idle,
                language: Language::default(),
                notice: None,
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        lock(&self.session)
    }

    pub fn state(&self) -> AttemptState {
        self.session().state.clone()
    }

    pub fn language(&self) -> Language {
        self.session().language.clone()
    }

    pub fn view(&self) -> SessionView {
        let session = self.session();
        SessionView::render(&session.state, &session.language, session.notice.as_ref())
    }

    /// Accept a picked or captured file as the session image.
    ///
    /// A non-image or empty file is rejected and leaves the current image,
    /// poem and state untouched.
    pub fn select_image(&self, file: PickedFile) -> Guarded<()> {
        let mut session = self.session();
        if session.state.is_submitting() {
            return Err(session.reject(ValidationError::SubmissionInFlight));
        }

        let payload = ImagePayload::new(file.mime_type, file.bytes)
            .map_err(|e| session.reject(e))?;

        info!(
            "Selected image {} ({}, {} bytes)",
            file.name,
            payload.mime_type(),
            payload.len()
        );
        session.notice = None;
        session.transition(AttemptState::ImageSelected {
            image: SelectedImage {
                file_name: Some(file.name),
                payload,
            },
        });
        Ok(())
    }

    pub fn set_language(&self, value: &str) -> Guarded<()> {
        let mut session = self.session();
        if session.state.is_submitting() {
            return Err(session.reject(ValidationError::SubmissionInFlight));
        }

        let language = Language::new(value).map_err(|e| session.reject(e))?;
        debug!("Language set to {}", language);
        session.language = language;
        session.notice = None;
        Ok(())
    }

    /// Drop the image and any poem or error, back to idle.
    pub fn clear(&self) -> Guarded<()> {
        let mut session = self.session();
        if session.state.is_submitting() {
            return Err(session.reject(ValidationError::SubmissionInFlight));
        }

        session.notice = None;
        session.transition(AttemptState::Idle);
        Ok(())
    }

    /// Check camera access before offering capture. Never touches the
    /// attempt state.
    pub async fn request_camera(&self, probe: &dyn CameraProbe) -> Guarded<()> {
        let access = probe.probe().await;

        let mut session = self.session();
        match access {
            CameraAccess::Granted => {
                session.notice = None;
                Ok(())
            }
            CameraAccess::Denied(reason) => Err(session.reject(ValidationError::CameraDenied(reason))),
            CameraAccess::Unavailable => Err(session.reject(ValidationError::CameraUnavailable)),
        }
    }

    /// Run one generation attempt with the current image and language.
    ///
    /// Returns the terminal state (`Succeeded` or `Failed`). Generation
    /// errors never escape as `Err`; only the submission guards do. If the
    /// returned future is dropped before it settles, the attempt ends as
    /// `Failed` with a generic message.
    pub async fn submit(&self) -> Guarded<AttemptState> {
        let (image, language) = {
            let mut session = self.session();
            if session.state.is_submitting() {
                return Err(session.reject(ValidationError::SubmissionInFlight));
            }
            let Some(image) = session.state.image().cloned() else {
                return Err(session.reject(ValidationError::NoImageSelected));
            };
            let language = session.language.clone();

            session.notice = None;
            session.transition(AttemptState::Submitting {
                image: image.clone(),
                language: language.clone(),
            });
            (image, language)
        };
        let pending = PendingAttempt {
            session: &self.session,
            image: Some(image.clone()),
        };

        let attempt_id = Uuid::new_v4();
        let request = GenerationRequest::new(image.payload.clone(), language.clone());
        let outcome = self
            .adapter
            .generate_poem(&request)
            .instrument(tracing::info_span!("attempt", id = %attempt_id))
            .await;

        let next = match outcome {
            Ok(result) => {
                info!("Attempt {} succeeded", attempt_id);
                AttemptState::Succeeded {
                    image,
                    language,
                    poem: result.poem,
                }
            }
            Err(e) => {
                error!("Attempt {} failed: {}", attempt_id, e);
                AttemptState::Failed {
                    image,
                    message: e.user_message(),
                }
            }
        };

        pending.settle(next.clone());
        Ok(next)
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    // The session is only ever replaced wholesale, so a poisoned lock still
    // holds a consistent value.
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Leaves `Submitting` exactly once: through `settle`, or on drop when the
/// attempt is cancelled or the call panics.
struct PendingAttempt<'a> {
    session: &'a Mutex<Session>,
    image: Option<SelectedImage>,
}

impl PendingAttempt<'_> {
    fn settle(mut self, next: AttemptState) {
        self.image = None;
        let mut session = lock(self.session);
        session.notice = None;
        session.transition(next);
    }
}

impl Drop for PendingAttempt<'_> {
    fn drop(&mut self) {
        let Some(image) = self.image.take() else {
            return;
        };
        warn!("Attempt abandoned before completion");
        lock(self.session).transition(AttemptState::Failed {
            image,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        });
    }
}
