use async_trait::async_trait;

use pictalk_core::model::{Checklist, ExerciseSession, ExerciseSettings, ImageReference};

use crate::error::ProviderError;

/// Image payload returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub reference: ImageReference,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// A provider's reply to one submitted description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseReply {
    /// Teacher-voice feedback for the child.
    pub message: String,
    /// Authoritative checklist snapshot after evaluating the utterance.
    /// `None` when the provider could not refresh it; the session keeps its
    /// current state.
    pub checklist: Option<Checklist>,
    /// Replacement image, when the provider rotated to a new one.
    pub image: Option<GeneratedImage>,
}

/// Source of generated images, checklists, and feedback for an exercise.
///
/// The remote gateway and the local simulation implement the same surface so
/// the exercise workflow can swap one for the other without changing shape.
#[async_trait]
pub trait ExerciseProvider: Send + Sync {
    /// Generates the image a new session will describe.
    async fn generate_image(
        &self,
        settings: &ExerciseSettings,
    ) -> Result<GeneratedImage, ProviderError>;

    /// Produces the checklist of details expected for the current image.
    async fn initial_checklist(
        &self,
        settings: &ExerciseSettings,
    ) -> Result<Checklist, ProviderError>;

    /// Evaluates one child utterance and produces feedback.
    async fn respond(
        &self,
        utterance: &str,
        session: &ExerciseSession,
    ) -> Result<ExerciseReply, ProviderError>;

    /// Markup rendition of the per-item checklist state.
    async fn checklist_markup(&self, session: &ExerciseSession) -> Result<String, ProviderError>;

    /// Markup rendition of overall progress.
    async fn progress_markup(&self, session: &ExerciseSession) -> Result<String, ProviderError>;

    /// Persists the session log on the provider side, returning a status
    /// message.
    async fn save_log(&self) -> Result<String, ProviderError>;

    /// Persists all session images on the provider side, returning a status
    /// message.
    async fn save_images(&self) -> Result<String, ProviderError>;
}
