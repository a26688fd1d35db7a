//! Workflow service driving one exercise against a provider.

use std::sync::Arc;

use tracing::debug;

use pictalk_core::Clock;
use pictalk_core::model::{ExerciseSession, ExerciseSettings, Progress};

use crate::error::ExerciseError;
use crate::provider::ExerciseProvider;

/// Result of submitting one child description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// Teacher-voice feedback for the child.
    pub message: String,
    /// How many details this utterance newly identified.
    pub newly_identified: usize,
    /// Progress after the utterance was applied.
    pub progress: Progress,
    /// Attempt budget used up with details still pending; the caller decides
    /// when to generate a new image.
    pub exhausted: bool,
}

/// Orchestrates image generation and description rounds.
///
/// Every user-triggered operation runs to completion before the next is
/// accepted; the session is owned by the caller and passed into each call,
/// so the service itself stays stateless.
#[derive(Clone)]
pub struct ExerciseService {
    clock: Clock,
    provider: Arc<dyn ExerciseProvider>,
}

impl ExerciseService {
    #[must_use]
    pub fn new(clock: Clock, provider: Arc<dyn ExerciseProvider>) -> Self {
        Self { clock, provider }
    }

    /// Generates a fresh image and checklist, producing the session that
    /// supersedes any prior one.
    ///
    /// # Errors
    ///
    /// Propagates provider failures; on a gateway error the caller may retry
    /// with the local simulation provider.
    pub async fn start_exercise(
        &self,
        settings: ExerciseSettings,
    ) -> Result<ExerciseSession, ExerciseError> {
        let image = self.provider.generate_image(&settings).await?;
        let checklist = self.provider.initial_checklist(&settings).await?;
        debug!(details = checklist.len(), "started exercise session");
        Ok(ExerciseSession::new(
            settings,
            image.reference,
            checklist,
            self.clock.now(),
        ))
    }

    /// Evaluates one utterance: provider feedback, checklist adoption,
    /// transcript append, attempt recording, optional image rotation.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::EmptyUtterance` for blank input and
    /// propagates provider failures.
    pub async fn submit_description(
        &self,
        session: &mut ExerciseSession,
        utterance: &str,
    ) -> Result<SubmissionOutcome, ExerciseError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(ExerciseError::EmptyUtterance);
        }

        let reply = self.provider.respond(utterance, session).await?;

        let newly = match reply.checklist {
            Some(incoming) => session.adopt_checklist(incoming),
            None => Vec::new(),
        };
        session.append_exchange(utterance, &reply.message);
        session.record_attempt();
        if let Some(image) = reply.image {
            session.replace_image(image.reference);
        }

        Ok(SubmissionOutcome {
            message: reply.message,
            newly_identified: newly.len(),
            progress: session.progress(),
            exhausted: session.is_exhausted(),
        })
    }

    /// Markup rendition of the per-item checklist state.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub async fn checklist_markup(
        &self,
        session: &ExerciseSession,
    ) -> Result<String, ExerciseError> {
        Ok(self.provider.checklist_markup(session).await?)
    }

    /// Markup rendition of overall progress.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub async fn progress_markup(
        &self,
        session: &ExerciseSession,
    ) -> Result<String, ExerciseError> {
        Ok(self.provider.progress_markup(session).await?)
    }

    /// Persists the session log on the provider side.
    ///
    /// # Errors
    ///
    /// Propagates provider failures; unavailable in local simulation.
    pub async fn save_log(&self) -> Result<String, ExerciseError> {
        Ok(self.provider.save_log().await?)
    }

    /// Persists all session images on the provider side.
    ///
    /// # Errors
    ///
    /// Propagates provider failures; unavailable in local simulation.
    pub async fn save_images(&self) -> Result<String, ExerciseError> {
        Ok(self.provider.save_images().await?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::LocalSimulation;
    use pictalk_core::time::fixed_now;

    #[tokio::test]
    async fn blank_descriptions_are_rejected_before_any_provider_call() {
        let service = ExerciseService::new(
            Clock::fixed(fixed_now()),
            Arc::new(LocalSimulation::with_seed(1)),
        );
        let mut session = service
            .start_exercise(ExerciseSettings::default_profile())
            .await
            .unwrap();

        let err = service
            .submit_description(&mut session, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ExerciseError::EmptyUtterance));
        assert_eq!(session.attempt_count(), 0);
        assert!(session.transcript().is_empty());
    }
}
