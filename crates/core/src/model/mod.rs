mod checklist;
mod ids;
mod image;
mod session;
mod settings;
mod transcript;

pub use checklist::{Checklist, DetailItem, Progress};
pub use ids::{DetailId, SessionId};
pub use image::{ImageReference, ImageReferenceError};
pub use session::ExerciseSession;
pub use settings::{
    AutismLevel, Difficulty, ExerciseSettings, ExerciseSettingsError, ImageStyle,
};
pub use transcript::{SpeakerRole, Transcript, TranscriptEntry};
