//! The Narrator: answers questions and judges solutions.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::core::answer::normalize_answer;
use crate::core::difficulty::Difficulty;
use crate::core::types::{AnswerToken, Mystery, QaEntry, Verdict};
use crate::error::GameError;
use crate::io::prompt::{self, ANSWER_WARNING, JSON_WARNING};
use crate::io::provider::{ModelSpec, Provider};
use crate::io::structured::parse_verdict;
use crate::roles::generate_with_retries;

/// Retry budgets for the Narrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarratorPolicy {
    /// Reprompts after a non-canonical answer.
    pub answer_retries: u32,
    /// Reprompts after an unparseable verdict.
    pub validation_retries: u32,
    /// Extra attempts after a provider error while validating.
    pub provider_retries: u32,
}

pub struct Narrator {
    provider: Arc<dyn Provider>,
    model: ModelSpec,
    mystery: Arc<Mystery>,
    difficulty: Difficulty,
    policy: NarratorPolicy,
}

impl Narrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: ModelSpec,
        mystery: Arc<Mystery>,
        difficulty: Difficulty,
        policy: NarratorPolicy,
    ) -> Self {
        Self {
            provider,
            model,
            mystery,
            difficulty,
            policy,
        }
    }

    /// Answer one question with a canonical token.
    ///
    /// Non-canonical replies are reprompted with a stricter warning; provider
    /// errors are returned immediately.
    #[instrument(skip_all, fields(model = %self.model, asked = history.len()))]
    pub fn answer(&self, question: &str, history: &[QaEntry]) -> Result<AnswerToken, GameError> {
        let attempts = self.policy.answer_retries + 1;
        let mut warning = None;
        let mut last_raw = String::new();
        for attempt in 1..=attempts {
            let prompt = prompt::narrator_answer(
                &self.mystery.situation,
                &self.mystery.hidden_solution,
                history,
                question,
                warning,
            )?;
            let raw = self.provider.generate(&self.model, &prompt)?;
            if let Some(token) = normalize_answer(&raw) {
                debug!(attempt, answer = token.as_str(), "narrator answered");
                return Ok(token);
            }
            warn!(attempt, attempts, raw = %raw, "narrator answer not canonical");
            warning = Some(ANSWER_WARNING);
            last_raw = raw;
        }
        Err(GameError::Format {
            what: "narrator answer",
            attempts,
            detail: "expected 'sí', 'no' or 'no es relevante'".to_string(),
            raw: last_raw,
        })
    }

    /// Judge a solution attempt under the difficulty rubric.
    #[instrument(skip_all, fields(model = %self.model, difficulty = %self.difficulty))]
    pub fn validate(&self, attempt: &str) -> Result<Verdict, GameError> {
        let attempts = self.policy.validation_retries + 1;
        let mut warning = None;
        let mut last = (String::new(), String::new());
        for round in 1..=attempts {
            let prompt = prompt::narrator_validate(
                &self.mystery.situation,
                &self.mystery.hidden_solution,
                attempt,
                self.difficulty,
                warning,
            )?;
            let raw = generate_with_retries(
                self.provider.as_ref(),
                &self.model,
                &prompt,
                self.policy.provider_retries,
            )?;
            match parse_verdict(&raw) {
                Ok(verdict) => {
                    debug!(round, outcome = verdict.outcome.label(), "solution validated");
                    return Ok(verdict);
                }
                Err(detail) => {
                    warn!(round, attempts, detail = %detail, "verdict unusable");
                    warning = Some(JSON_WARNING);
                    last = (detail, raw);
                }
            }
        }
        let (detail, raw) = last;
        Err(GameError::Format {
            what: "verdict",
            attempts,
            detail,
            raw,
        })
    }
}
