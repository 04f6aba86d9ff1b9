//! One tick of the turn scheduler for a single lineage.

use tracing::{debug, instrument};

use crate::core::intent::is_ready;
use crate::core::invariants::validate_invariants;
use crate::core::state::{SessionState, TurnAction};
use crate::core::types::Outcome;
use crate::error::GameError;
use crate::events::{EventSink, GameEvent};
use crate::roles::detective::Detective;
use crate::roles::narrator::Narrator;

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnReport {
    /// A question was asked and answered.
    Asked,
    /// A final solution was recorded (by intent or by the limit).
    Solved { forced: bool },
    Validated(Outcome),
    /// Nothing left to do.
    Finished,
}

/// Advance `state` by one tick, emitting events in protocol order.
#[instrument(skip_all, fields(seat = state.seat().number(), asked = state.questions_asked()))]
pub fn play_turn(
    detective: &Detective,
    narrator: &Narrator,
    state: &mut SessionState,
    sink: &mut dyn EventSink,
) -> Result<TurnReport, GameError> {
    let seat = state.seat();
    let limit = state.question_limit();
    let report = match state.next_action() {
        TurnAction::Ask => {
            let remaining = limit - state.questions_asked();
            let text = detective.ask_or_solve(state.history(), remaining)?;
            if is_ready(&text) {
                sink.emit(GameEvent::SolveIntent { seat, text })?;
                let solution = detective.final_solution(state.history(), false, limit)?;
                state.record_solution(solution.clone(), false)?;
                sink.emit(GameEvent::Solution {
                    seat,
                    text: solution,
                })?;
                TurnReport::Solved { forced: false }
            } else {
                sink.emit(GameEvent::Question {
                    seat,
                    text: text.clone(),
                })?;
                let answer = narrator.answer(&text, state.history())?;
                state.record_answer(text, answer)?;
                sink.emit(GameEvent::Answer { seat, answer })?;
                TurnReport::Asked
            }
        }
        TurnAction::ForceFinal => {
            sink.emit(GameEvent::ForcedFinal { seat, limit })?;
            let solution = detective.final_solution(state.history(), true, limit)?;
            state.record_solution(solution.clone(), true)?;
            sink.emit(GameEvent::Solution {
                seat,
                text: solution,
            })?;
            TurnReport::Solved { forced: true }
        }
        TurnAction::Validate => TurnReport::Validated(validate_state(narrator, state)?),
        TurnAction::Finished => TurnReport::Finished,
    };
    debug!(?report, "turn complete");
    check_invariants(state)?;
    Ok(report)
}

/// Run validation for a solved lineage and record the verdict.
pub fn validate_state(narrator: &Narrator, state: &mut SessionState) -> Result<Outcome, GameError> {
    let attempt = state
        .attempt()
        .map(|attempt| attempt.text.clone())
        .ok_or_else(|| GameError::protocol("validation requested without a solution"))?;
    let verdict = narrator.validate(&attempt)?;
    let outcome = verdict.outcome;
    state.record_verdict(verdict)?;
    Ok(outcome)
}

pub(crate) fn check_invariants(state: &SessionState) -> Result<(), GameError> {
    let errors = validate_invariants(state);
    if errors.is_empty() {
        return Ok(());
    }
    Err(GameError::protocol(errors.join("; ")))
}
