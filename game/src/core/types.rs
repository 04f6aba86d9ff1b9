//! Shared deterministic types for the game core.
//!
//! These types define stable contracts between the scheduler, the roles and
//! the event stream. They must not depend on external state or I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A generated mystery. Immutable once generated.
///
/// Only [`Mystery::situation`] may ever reach a Detective prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mystery {
    pub situation: String,
    pub hidden_solution: String,
}

/// Canonical Narrator reply to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerToken {
    #[serde(rename = "sí")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "no es relevante")]
    Irrelevant,
}

impl AnswerToken {
    pub const ALL: [AnswerToken; 3] = [AnswerToken::Yes, AnswerToken::No, AnswerToken::Irrelevant];

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerToken::Yes => "sí",
            AnswerToken::No => "no",
            AnswerToken::Irrelevant => "no es relevante",
        }
    }
}

impl fmt::Display for AnswerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question and its answer. Order in a history is significant: the whole
/// sequence is replayed into every later prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaEntry {
    pub question: String,
    pub answer: AnswerToken,
}

/// Binary correctness judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    /// Interpret a Narrator verdict label. Only `correcto` (any case, trailing
    /// punctuation ignored) counts as correct.
    pub fn from_label(label: &str) -> Self {
        let cleaned = label
            .trim()
            .trim_end_matches(['.', '!', '?', ',', ';'])
            .trim_start_matches(['¡', '¿'])
            .to_lowercase();
        if cleaned == "correcto" {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }

    pub fn is_correct(self) -> bool {
        self == Outcome::Correct
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Correct => "Correcto",
            Outcome::Incorrect => "Incorrecto",
        }
    }

    /// Result banner shown to players.
    pub fn result_label(self) -> &'static str {
        match self {
            Outcome::Correct => "VICTORIA",
            Outcome::Incorrect => "DERROTA",
        }
    }
}

/// The Narrator's judgement on one solution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    pub rationale: String,
}

/// Which detective lineage an event or state belongs to.
///
/// Single-lineage modes always play as [`Seat::First`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn number(self) -> u8 {
        match self {
            Seat::First => 1,
            Seat::Second => 2,
        }
    }

    pub fn label(self) -> String {
        format!("Detective {}", self.number())
    }
}
