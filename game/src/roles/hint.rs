//! Hints for a human detective.

use std::sync::Arc;

use tracing::instrument;

use crate::core::intent::strip_speaker_label;
use crate::core::types::{Mystery, QaEntry};
use crate::error::GameError;
use crate::io::prompt;
use crate::io::provider::{ModelSpec, Provider};

pub struct HintGenerator {
    provider: Arc<dyn Provider>,
    model: ModelSpec,
}

impl HintGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: ModelSpec) -> Self {
        Self { provider, model }
    }

    /// One cryptic hint. Callers treat errors as degraded, not fatal.
    #[instrument(skip_all, fields(model = %self.model, asked = history.len()))]
    pub fn hint(&self, mystery: &Mystery, history: &[QaEntry]) -> Result<String, GameError> {
        let prompt = prompt::hint(&mystery.situation, &mystery.hidden_solution, history)?;
        let raw = self.provider.generate(&self.model, &prompt)?;
        let hint = clean_hint(&raw);
        if hint.is_empty() {
            return Err(GameError::Format {
                what: "hint",
                attempts: 1,
                detail: "empty response".to_string(),
                raw,
            });
        }
        Ok(hint)
    }
}

/// Strip wrapping quotes and a leading `Pista:` label.
pub fn clean_hint(raw: &str) -> String {
    let mut text = raw.trim();
    for (open, close) in [('"', '"'), ('“', '”'), ('«', '»')] {
        if text.len() > 1 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
        }
    }
    strip_speaker_label(text)
}
