//! Mystery generation.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::core::difficulty::Difficulty;
use crate::core::types::Mystery;
use crate::error::GameError;
use crate::io::prompt::{self, JSON_WARNING};
use crate::io::provider::{ModelSpec, Provider};
use crate::io::structured::parse_mystery;

pub struct MysteryGenerator {
    provider: Arc<dyn Provider>,
    model: ModelSpec,
    attempts: u32,
}

impl MysteryGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: ModelSpec, attempts: u32) -> Self {
        Self {
            provider,
            model,
            attempts: attempts.max(1),
        }
    }

    /// Generate one mystery. Provider failures and unusable responses both
    /// consume an attempt; the last failure is returned on exhaustion.
    #[instrument(skip_all, fields(model = %self.model, difficulty = %difficulty))]
    pub fn generate(&self, difficulty: Difficulty) -> Result<Mystery, GameError> {
        let mut last_error = None;
        for attempt in 1..=self.attempts {
            let warning = (attempt > 1).then_some(JSON_WARNING);
            let prompt = prompt::story(difficulty, warning)?;
            let raw = match self.provider.generate(&self.model, &prompt) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(attempt, error = %err, "story generation call failed");
                    last_error = Some(GameError::Provider(err));
                    continue;
                }
            };
            match parse_mystery(&raw) {
                Ok(mystery) => {
                    info!(attempt, "mystery generated");
                    return Ok(mystery);
                }
                Err(detail) => {
                    warn!(attempt, detail = %detail, "story response unusable");
                    last_error = Some(GameError::Format {
                        what: "mystery",
                        attempts: attempt,
                        detail,
                        raw,
                    });
                }
            }
        }
        Err(last_error.unwrap_or_else(|| GameError::protocol("mystery generation made no attempt")))
    }
}
