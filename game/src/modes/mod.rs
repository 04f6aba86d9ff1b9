//! Game coordinators.
//!
//! Each mode drives one or more lineages through the turn scheduler in
//! [`turn`] and reports progress as [`GameEvent`]s. Streaming modes run to
//! completion in one call; per-turn modes ([`inverse`], [`interactive`]) keep
//! their state between caller requests.

pub mod council;
pub mod fight;
pub mod interactive;
pub mod inverse;
pub mod solo;
pub mod turn;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::difficulty::Difficulty;
use crate::core::state::SessionState;
use crate::core::types::Mystery;
use crate::error::GameError;
use crate::events::{EventSink, GameEvent, LineageReport};
use crate::io::config::GameConfig;
use crate::io::provider::{ModelSpec, Provider};
use crate::roles::detective::Detective;
use crate::roles::generator::MysteryGenerator;
use crate::roles::narrator::{Narrator, NarratorPolicy};

/// Shared dependencies of every coordinator.
#[derive(Clone)]
pub struct GameContext {
    pub provider: Arc<dyn Provider>,
    pub config: GameConfig,
}

impl GameContext {
    pub fn new(provider: Arc<dyn Provider>, config: GameConfig) -> Self {
        Self { provider, config }
    }

    /// Reject unusable models before any provider call is made.
    pub fn preflight(&self, models: &[&ModelSpec]) -> Result<(), GameError> {
        for model in models {
            self.provider.preflight(model)?;
        }
        Ok(())
    }

    pub fn question_limit(&self, difficulty: Difficulty) -> usize {
        self.config.question_limit(difficulty)
    }

    pub fn generate_mystery(
        &self,
        model: &ModelSpec,
        difficulty: Difficulty,
    ) -> Result<Arc<Mystery>, GameError> {
        let generator = MysteryGenerator::new(
            Arc::clone(&self.provider),
            model.clone(),
            self.config.generation_attempts,
        );
        generator.generate(difficulty).map(Arc::new)
    }

    pub fn narrator(
        &self,
        model: &ModelSpec,
        mystery: &Arc<Mystery>,
        difficulty: Difficulty,
    ) -> Narrator {
        Narrator::new(
            Arc::clone(&self.provider),
            model.clone(),
            Arc::clone(mystery),
            difficulty,
            NarratorPolicy {
                answer_retries: self.config.answer_retries,
                validation_retries: self.config.validation_retries,
                provider_retries: self.config.provider_retries,
            },
        )
    }

    /// A Detective built from the situation alone.
    pub fn detective(&self, model: &ModelSpec, mystery: &Mystery) -> Detective {
        Detective::new(Arc::clone(&self.provider), model.clone(), mystery.situation.clone())
    }
}

pub(crate) fn start_banner(mode: &str, difficulty: Difficulty, limit: usize) -> String {
    format!("BLACK STORIES ({mode}) | Dificultad: {difficulty} | Límite: {limit} preguntas")
}

pub(crate) fn lineage_report(state: &SessionState) -> Result<LineageReport, GameError> {
    let (Some(attempt), Some(verdict)) = (state.attempt(), state.verdict()) else {
        return Err(GameError::protocol(format!(
            "{} has no validated solution",
            state.seat().label()
        )));
    };
    Ok(LineageReport {
        seat: state.seat(),
        questions: state.questions_asked(),
        solution: attempt.text.clone(),
        verdict: verdict.clone(),
    })
}

/// Close out a coordinator run: any error other than abandonment becomes
/// exactly one `error` event.
pub fn finish<T>(result: Result<T, GameError>, sink: &mut dyn EventSink) -> Result<T, GameError> {
    match result {
        Ok(value) => {
            info!("game finished");
            Ok(value)
        }
        Err(GameError::Abandoned) => {
            info!("game abandoned by consumer");
            Err(GameError::Abandoned)
        }
        Err(err) if err.is_caller_error() => {
            warn!(error = %err, "request rejected");
            let _ = sink.emit(GameEvent::Error(err.to_string()));
            Err(err)
        }
        Err(err) => {
            error!(error = %err, "game aborted");
            // The consumer may already be gone; the error is returned either way.
            let _ = sink.emit(GameEvent::Error(err.to_string()));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_input_is_reported_once() {
        let mut events = Vec::new();
        let err = finish::<()>(Err(GameError::InvalidInput("vacío".to_string())), &mut events)
            .unwrap_err();
        assert!(err.is_caller_error());
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], GameEvent::Error(message) if message.contains("vacío")));
    }

    #[test]
    fn abandoned_games_emit_nothing() {
        let mut events = Vec::new();
        assert!(matches!(
            finish::<()>(Err(GameError::Abandoned), &mut events),
            Err(GameError::Abandoned)
        ));
        assert!(finish(Ok(3), &mut events).is_ok());
        assert!(events.is_empty());
    }
}
