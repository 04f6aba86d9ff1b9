//! Council members: Visionary, Skeptic and Leader.
//!
//! Visionary and Skeptic output is advisory. Only the Leader's move reaches
//! the shared lineage.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::core::intent::{LeaderMove, parse_leader_move, strip_speaker_label};
use crate::core::types::QaEntry;
use crate::error::GameError;
use crate::io::prompt;
use crate::io::provider::{ModelSpec, Provider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouncilModels {
    pub visionary: ModelSpec,
    pub skeptic: ModelSpec,
    pub leader: ModelSpec,
}

pub struct CouncilMembers {
    provider: Arc<dyn Provider>,
    models: CouncilModels,
    situation: String,
}

impl CouncilMembers {
    pub fn new(
        provider: Arc<dyn Provider>,
        models: CouncilModels,
        situation: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            models,
            situation: situation.into(),
        }
    }

    #[instrument(skip_all, fields(model = %self.models.visionary))]
    pub fn theorize(&self, history: &[QaEntry]) -> Result<String, GameError> {
        let prompt = prompt::visionary(&self.situation, history)?;
        let raw = self.provider.generate(&self.models.visionary, &prompt)?;
        Ok(strip_speaker_label(&raw))
    }

    #[instrument(skip_all, fields(model = %self.models.skeptic))]
    pub fn critique(&self, history: &[QaEntry], theory: &str) -> Result<String, GameError> {
        let prompt = prompt::skeptic(&self.situation, history, theory)?;
        let raw = self.provider.generate(&self.models.skeptic, &prompt)?;
        Ok(strip_speaker_label(&raw))
    }

    /// Leader's decision. With `forced` set the final-guess prompt is used and
    /// the output is always a solution.
    #[instrument(skip_all, fields(model = %self.models.leader, forced = forced))]
    pub fn decide(
        &self,
        history: &[QaEntry],
        theory: &str,
        critique: &str,
        limit: usize,
        forced: bool,
    ) -> Result<LeaderMove, GameError> {
        let prompt = if forced {
            prompt::leader_final(&self.situation, history, theory, critique, limit)?
        } else {
            let remaining = limit.saturating_sub(history.len());
            prompt::leader(&self.situation, history, theory, critique, remaining)?
        };
        let raw = self.provider.generate(&self.models.leader, &prompt)?;
        let decision = parse_leader_move(&raw, forced);
        let text = match &decision {
            LeaderMove::Question(text) | LeaderMove::Solution(text) => text,
        };
        if text.trim().is_empty() {
            return Err(GameError::Format {
                what: "leader decision",
                attempts: 1,
                detail: "empty response".to_string(),
                raw,
            });
        }
        debug!(solution = matches!(decision, LeaderMove::Solution(_)), "leader decided");
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, model};

    fn members(provider: Arc<ScriptedProvider>) -> CouncilMembers {
        CouncilMembers::new(
            provider,
            CouncilModels {
                visionary: model("visionary"),
                skeptic: model("skeptic"),
                leader: model("leader"),
            },
            "Un hombre muerto en un campo.",
        )
    }

    #[test]
    fn each_member_uses_its_own_model() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply("visionary", "Cayó de un avión")
                .reply("skeptic", "No hay restos de avión")
                .reply("leader", "¿Llevaba algo a la espalda?"),
        );
        let council = members(provider.clone());
        let theory = council.theorize(&[]).expect("theory");
        let critique = council.critique(&[], &theory).expect("critique");
        let decision = council.decide(&[], &theory, &critique, 5, false).expect("decision");
        assert_eq!(
            decision,
            LeaderMove::Question("¿Llevaba algo a la espalda?".to_string())
        );
        assert!(provider.prompts_for("skeptic")[0].contains("Cayó de un avión"));
        assert!(provider.prompts_for("leader")[0].contains("Te quedan 5"));
    }

    #[test]
    fn forced_decision_uses_final_prompt() {
        let provider = Arc::new(ScriptedProvider::new().reply("leader", "Se le rompió el paracaídas"));
        let council = members(provider.clone());
        let decision = council.decide(&[], "t", "c", 0, true).expect("decision");
        assert_eq!(
            decision,
            LeaderMove::Solution("Se le rompió el paracaídas".to_string())
        );
        assert!(provider.prompts_for("leader")[0].contains("ha agotado"));
    }
}
