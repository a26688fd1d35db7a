//! Builds the teacher-voice reply for one evaluated utterance.

use rand::Rng;
use rand::seq::IndexedRandom;

use pictalk_core::model::{DetailItem, ExerciseSession};

/// Composes the acknowledgment, hint, or completion message for an attempt.
///
/// Pure given its inputs: the hint choice comes from the injected rng, so a
/// seeded rng reproduces the exact message. `pending` is the set of details
/// still unidentified after the utterance was evaluated, and the session is
/// read before its attempt is recorded so the last-attempt warning fires on
/// the final allowed round.
pub fn compose<R: Rng + ?Sized>(
    newly_identified: usize,
    pending: &[&DetailItem],
    session: &ExerciseSession,
    rng: &mut R,
) -> String {
    let mut message = if newly_identified > 0 {
        let plural = if newly_identified > 1 { "s" } else { "" };
        let mut praise =
            format!("Great job! You identified {newly_identified} new detail{plural}.");
        if newly_identified > 1 {
            praise.push_str(" Your observation skills are excellent!");
        }
        praise
    } else if let Some(hint) = pending.choose(rng) {
        format!(
            "Good try! Can you tell me more about the {}?",
            hint.text().to_lowercase()
        )
    } else {
        "Wonderful! You've identified all the details in this image.".to_owned()
    };

    if !pending.is_empty() && session.next_attempt_is_last() {
        message.push_str("\n\nThis is your last attempt. After this, we'll move to a new image.");
    }

    message
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
