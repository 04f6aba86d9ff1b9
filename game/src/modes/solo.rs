//! Single-detective game: one AI Detective against the AI Narrator.

use tracing::{info, instrument};

use crate::core::difficulty::Difficulty;
use crate::core::state::SessionState;
use crate::core::types::{Outcome, Seat};
use crate::error::GameError;
use crate::events::{EventSink, GameEvent, Summary, SummaryResult};
use crate::io::provider::ModelSpec;
use crate::io::transcript::save_transcript;
use crate::modes::turn::{TurnReport, play_turn};
use crate::modes::{GameContext, finish, lineage_report, start_banner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoloRequest {
    pub difficulty: Difficulty,
    pub narrator: ModelSpec,
    pub detective: ModelSpec,
}

/// Play a full game. Emits exactly one `error` event on failure.
pub fn run_solo(
    ctx: &GameContext,
    request: &SoloRequest,
    sink: &mut dyn EventSink,
) -> Result<Summary, GameError> {
    let result = play(ctx, request, sink);
    finish(result, sink)
}

#[instrument(skip_all, fields(difficulty = %request.difficulty))]
fn play(
    ctx: &GameContext,
    request: &SoloRequest,
    sink: &mut dyn EventSink,
) -> Result<Summary, GameError> {
    ctx.preflight(&[&request.narrator, &request.detective])?;
    let limit = ctx.question_limit(request.difficulty);
    let mystery = ctx.generate_mystery(&request.narrator, request.difficulty)?;
    sink.emit(GameEvent::Started {
        banner: start_banner("clásico", request.difficulty, limit),
        situation: mystery.situation.clone(),
    })?;

    let detective = ctx.detective(&request.detective, &mystery);
    let narrator = ctx.narrator(&request.narrator, &mystery, request.difficulty);
    let mut state = SessionState::new(Seat::First, mystery, request.difficulty, limit);

    let mut outcome = Outcome::Incorrect;
    loop {
        match play_turn(&detective, &narrator, &mut state, sink)? {
            TurnReport::Validated(result) => outcome = result,
            TurnReport::Finished => break,
            TurnReport::Asked | TurnReport::Solved { .. } => {}
        }
    }
    info!(
        outcome = outcome.label(),
        questions = state.questions_asked(),
        "solo game complete"
    );

    let summary = Summary {
        hidden_solution: state.mystery().hidden_solution.clone(),
        lineages: vec![lineage_report(&state)?],
        result: SummaryResult::Solo(outcome),
    };
    save_transcript(ctx.config.transcript_dir.as_deref(), &state);
    sink.emit(GameEvent::Summary(summary.clone()))?;
    Ok(summary)
}
