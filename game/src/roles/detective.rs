//! The Detective: asks questions and gives one final solution.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::core::intent::strip_speaker_label;
use crate::core::types::QaEntry;
use crate::error::GameError;
use crate::io::prompt;
use crate::io::provider::{ModelSpec, Provider};

/// A Detective only ever holds the public situation.
pub struct Detective {
    provider: Arc<dyn Provider>,
    model: ModelSpec,
    situation: String,
}

impl Detective {
    pub fn new(provider: Arc<dyn Provider>, model: ModelSpec, situation: impl Into<String>) -> Self {
        Self {
            provider,
            model,
            situation: situation.into(),
        }
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    /// Next question, or a solve-intent phrase. Classification is left to the caller.
    #[instrument(skip_all, fields(model = %self.model, asked = history.len()))]
    pub fn ask_or_solve(&self, history: &[QaEntry], remaining: usize) -> Result<String, GameError> {
        let prompt = prompt::detective_ask(&self.situation, history, remaining)?;
        let raw = self.provider.generate(&self.model, &prompt)?;
        let text = non_empty("detective turn", raw)?;
        debug!(len = text.len(), "detective spoke");
        Ok(text)
    }

    #[instrument(skip_all, fields(model = %self.model, forced = forced))]
    pub fn final_solution(
        &self,
        history: &[QaEntry],
        forced: bool,
        limit: usize,
    ) -> Result<String, GameError> {
        let prompt = prompt::detective_final(&self.situation, history, forced, limit)?;
        let raw = self.provider.generate(&self.model, &prompt)?;
        non_empty("final solution", raw)
    }
}

fn non_empty(what: &'static str, raw: String) -> Result<String, GameError> {
    let text = strip_speaker_label(&raw);
    if text.is_empty() {
        return Err(GameError::Format {
            what,
            attempts: 1,
            detail: "empty response".to_string(),
            raw,
        });
    }
    Ok(text)
}
