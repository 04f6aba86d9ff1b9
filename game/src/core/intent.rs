//! Solve-intent classification and speaker-label cleanup.
//!
//! The phrase set is the single source of truth for "ready to solve"; every
//! mode classifies Detective output through [`is_ready`].

use std::sync::LazyLock;

use regex::Regex;

/// Canonical Spanish phrases a Detective uses to declare it is ready.
pub const READY_PHRASES: [&str; 6] = [
    "creo que ya lo tengo",
    "voy a resolver",
    "tengo la solución",
    "estoy listo para resolver",
    "es hora de la solución",
    "solución final",
];

static SPEAKER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\**\s*(detective(\s*\d+)?|narrador|l[ií]der|pista)\s*\**\s*:\s*\**\s*")
        .expect("speaker label regex should be valid")
});

static SOLUTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)soluci[oó]n\s*:").expect("solution marker regex should be valid")
});

/// True if `text` carries any ready phrase (case-insensitive substring match).
pub fn is_ready(text: &str) -> bool {
    let lowered = text.to_lowercase();
    READY_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Remove one leading `Detective:`-style speaker label and surrounding whitespace.
pub fn strip_speaker_label(text: &str) -> String {
    SPEAKER_LABEL.replace(text.trim(), "").trim().to_string()
}

/// What the council Leader decided this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderMove {
    Question(String),
    Solution(String),
}

/// Interpret Leader output.
///
/// A `SOLUCIÓN:` marker anywhere turns the rest of the text into a solution.
/// When `forced` is set (question budget exhausted) the whole text is the
/// solution even without the marker.
pub fn parse_leader_move(text: &str, forced: bool) -> LeaderMove {
    let cleaned = strip_speaker_label(text);
    if let Some(found) = SOLUTION_MARKER.find(&cleaned) {
        let explanation = cleaned[found.end()..].trim();
        let explanation = if explanation.is_empty() {
            cleaned.as_str()
        } else {
            explanation
        };
        return LeaderMove::Solution(explanation.to_string());
    }
    if forced {
        LeaderMove::Solution(cleaned)
    } else {
        LeaderMove::Question(cleaned)
    }
}
