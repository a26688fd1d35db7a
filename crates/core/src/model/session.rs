use chrono::{DateTime, Utc};

use crate::model::checklist::{Checklist, Progress};
use crate::model::ids::{DetailId, SessionId};
use crate::model::image::ImageReference;
use crate::model::settings::ExerciseSettings;
use crate::model::transcript::{SpeakerRole, Transcript};

/// Live state for one image-description exercise.
///
/// A session is created when an image is generated and wholly superseded by
/// the next generation; the attempt budget, checklist, and transcript never
/// outlive the image they belong to. One session, one user: callers own the
/// session and pass it into each handler, so there is no ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSession {
    id: SessionId,
    settings: ExerciseSettings,
    image: ImageReference,
    checklist: Checklist,
    transcript: Transcript,
    attempt_count: u32,
    started_at: DateTime<Utc>,
}

impl ExerciseSession {
    /// Starts a session for a freshly generated image with a zeroed attempt
    /// budget and an empty transcript.
    #[must_use]
    pub fn new(
        settings: ExerciseSettings,
        image: ImageReference,
        checklist: Checklist,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            settings,
            image,
            checklist,
            transcript: Transcript::default(),
            attempt_count: 0,
            started_at,
        }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn settings(&self) -> &ExerciseSettings {
        &self.settings
    }

    #[must_use]
    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    #[must_use]
    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Records one submitted attempt, saturating at the configured limit.
    pub fn record_attempt(&mut self) {
        if self.attempt_count < self.settings.attempt_limit() {
            self.attempt_count += 1;
        }
    }

    #[must_use]
    pub fn attempts_remaining(&self) -> u32 {
        self.settings.attempt_limit().saturating_sub(self.attempt_count)
    }

    /// True when the next recorded attempt would be the last allowed.
    #[must_use]
    pub fn next_attempt_is_last(&self) -> bool {
        self.attempt_count + 1 >= self.settings.attempt_limit()
    }

    /// Attempt budget used up with unidentified details remaining.
    ///
    /// Reports the terminal condition only; the caller decides when to move
    /// to a new image.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempt_count >= self.settings.attempt_limit() && !self.checklist.all_identified()
    }

    /// Snapshot of identification progress over the checklist.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.checklist.progress()
    }

    /// True when identified details have reached the configured threshold.
    #[must_use]
    pub fn meets_threshold(&self) -> bool {
        self.progress().meets(self.settings.details_threshold())
    }

    /// Adopts an authoritative checklist snapshot (from the gateway or a
    /// local match pass). Returns the ids that transitioned to identified.
    pub fn adopt_checklist(&mut self, incoming: Checklist) -> Vec<DetailId> {
        self.checklist.adopt(incoming)
    }

    /// Appends one child/teacher exchange to the transcript.
    pub fn append_exchange(&mut self, child: &str, teacher: &str) {
        self.transcript.push(SpeakerRole::Child, child);
        self.transcript.push(SpeakerRole::Teacher, teacher);
    }

    /// Swaps in a fresh image reference returned mid-session by the gateway.
    pub fn replace_image(&mut self, image: ImageReference) {
        self.image = image;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher;
    use crate::time::fixed_now;

    fn build_session(attempt_limit: u32, details: &[&str]) -> ExerciseSession {
        let settings = ExerciseSettings::new(
            3,
            crate::model::AutismLevel::Level1,
            "animals",
            "",
            crate::model::ImageStyle::Cartoon,
            crate::model::Difficulty::VerySimple,
            attempt_limit,
            70.0,
        )
        .unwrap();
        let checklist = Checklist::new(details.iter().map(|d| (*d).to_string()));
        let image = ImageReference::inline("image/png", vec![0u8; 4]);
        ExerciseSession::new(settings, image, checklist, fixed_now())
    }

    #[test]
    fn attempts_saturate_at_limit() {
        let mut session = build_session(3, &["Animal type"]);
        for _ in 0..7 {
            session.record_attempt();
        }
        assert_eq!(session.attempt_count(), 3);
        assert_eq!(session.attempts_remaining(), 0);
    }

    #[test]
    fn exhausted_only_with_pending_details() {
        let mut session = build_session(3, &["Animal type", "Animal coloring"]);
        for _ in 0..3 {
            session.record_attempt();
        }
        assert!(session.is_exhausted());

        // identifying everything clears the condition regardless of attempts
        let newly = session.adopt_checklist(Checklist::from_states(vec![
            ("Animal type".to_string(), true),
            ("Animal coloring".to_string(), true),
        ]));
        assert_eq!(newly.len(), 2);
        assert!(!session.is_exhausted());
    }

    #[test]
    fn fresh_session_is_not_exhausted() {
        let session = build_session(1, &["Animal type"]);
        assert!(!session.is_exhausted());
        assert!(session.next_attempt_is_last());
    }

    #[test]
    fn next_attempt_is_last_tracks_budget() {
        let mut session = build_session(3, &["Animal type"]);
        assert!(!session.next_attempt_is_last());
        session.record_attempt();
        assert!(!session.next_attempt_is_last());
        session.record_attempt();
        assert!(session.next_attempt_is_last());
    }

    #[test]
    fn threshold_uses_full_precision() {
        let mut session = build_session(5, &["Apple tree", "Blue lake", "Green hill"]);
        matcher::identify(&mut session.checklist, "an apple next to a blue thing");
        // 2/3 = 66.67% < 70%
        assert!(!session.meets_threshold());
        matcher::identify(&mut session.checklist, "a green hill behind");
        assert!(session.meets_threshold());
    }

    #[test]
    fn exchanges_accumulate_in_order() {
        let mut session = build_session(3, &["Animal type"]);
        session.append_exchange("I see a cat", "Great job!");
        session.append_exchange("it is orange", "Good try!");

        let entries = session.transcript().entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].speaker(), SpeakerRole::Child);
        assert_eq!(entries[3].text(), "Good try!");
    }

    #[test]
    fn new_session_starts_clean() {
        let session = build_session(3, &["Animal type"]);
        assert_eq!(session.attempt_count(), 0);
        assert!(session.transcript().is_empty());
        assert_eq!(session.progress().identified, 0);
        assert_eq!(session.started_at(), fixed_now());
    }
}
