use serde::{Deserialize, Serialize};
use std::fmt;

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeakerRole {
    Child,
    Teacher,
}

impl fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerRole::Child => f.write_str("Child"),
            SpeakerRole::Teacher => f.write_str("Teacher"),
        }
    }
}

/// One utterance in the session conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    speaker: SpeakerRole,
    text: String,
}

impl TranscriptEntry {
    #[must_use]
    pub fn speaker(&self) -> SpeakerRole {
        self.speaker
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Append-only conversation history for the active image.
///
/// Cleared only by session replacement when a new image is generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, speaker: SpeakerRole, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            text: text.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let mut transcript = Transcript::default();
        transcript.push(SpeakerRole::Child, "a big dog");
        transcript.push(SpeakerRole::Teacher, "Great job!");

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.entries()[0].speaker(), SpeakerRole::Child);
        assert_eq!(transcript.entries()[0].text(), "a big dog");
        assert_eq!(transcript.entries()[1].speaker(), SpeakerRole::Teacher);
    }

    #[test]
    fn speaker_labels() {
        assert_eq!(SpeakerRole::Child.to_string(), "Child");
        assert_eq!(SpeakerRole::Teacher.to_string(), "Teacher");
    }
}
