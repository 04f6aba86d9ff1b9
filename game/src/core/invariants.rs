//! Lineage invariants checked after every turn.

use crate::core::state::{Phase, SessionState};

/// Check invariants the state machine must uphold:
/// - history never exceeds the question limit
/// - a solved lineage carries exactly one attempt
/// - a verdict exists if and only if the lineage is done
/// - a forced attempt only happens at the limit
pub fn validate_invariants(state: &SessionState) -> Vec<String> {
    let mut errors = Vec::new();
    let label = state.seat().label();

    if state.history().len() > state.question_limit() {
        errors.push(format!(
            "{label}: {} questions exceed limit {}",
            state.history().len(),
            state.question_limit()
        ));
    }

    match state.phase() {
        Phase::Asking => {
            if state.attempt().is_some() {
                errors.push(format!("{label}: asking phase with a recorded solution"));
            }
        }
        Phase::Solved | Phase::Done => {
            if state.attempt().is_none() {
                errors.push(format!("{label}: solved without a solution attempt"));
            }
        }
    }

    if state.verdict().is_some() != (state.phase() == Phase::Done) {
        errors.push(format!("{label}: verdict presence does not match phase"));
    }

    if let Some(attempt) = state.attempt()
        && attempt.forced
        && !state.budget_exhausted()
    {
        errors.push(format!(
            "{label}: forced solution before reaching the question limit"
        ));
    }

    if state
        .history()
        .iter()
        .any(|entry| entry.question.trim().is_empty())
    {
        errors.push(format!("{label}: empty question in history"));
    }

    errors
}
