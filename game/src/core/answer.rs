//! Normalisation of free-text replies into canonical answer tokens.

use crate::core::intent::strip_speaker_label;
use crate::core::types::AnswerToken;

/// Words a human Narrator may use to accept a Detective's solution.
pub const ACCEPT_WORDS: [&str; 4] = ["sí", "si", "correcto", "exacto"];

fn clean(raw: &str) -> String {
    strip_speaker_label(raw)
        .to_lowercase()
        .trim_start_matches(['¡', '¿', '"', '\'', '*'])
        .trim_end_matches(['.', ',', '!', '?', ';', '"', '\'', '*'])
        .trim()
        .to_string()
}

/// Map a raw reply onto a canonical token. Returns `None` for anything that is
/// not one of the three accepted answers after cleanup.
pub fn normalize_answer(raw: &str) -> Option<AnswerToken> {
    match clean(raw).as_str() {
        "sí" | "si" => Some(AnswerToken::Yes),
        "no" => Some(AnswerToken::No),
        "no es relevante" | "no relevante" | "irrelevante" => Some(AnswerToken::Irrelevant),
        _ => None,
    }
}

/// True if a human Narrator's response accepts the proposed solution.
pub fn is_solution_accepted(raw: &str) -> bool {
    let cleaned = clean(raw);
    ACCEPT_WORDS.contains(&cleaned.as_str())
}
