//! Council mode: Visionary, Skeptic and Leader share one lineage.
//!
//! Strictly sequential. Each round the Visionary theorises, the Skeptic
//! critiques and the Leader either asks the Narrator one question or commits
//! to a solution. At the limit the Leader must give a final guess.

use tracing::{debug, info, instrument};

use crate::core::difficulty::Difficulty;
use crate::core::intent::LeaderMove;
use crate::core::state::SessionState;
use crate::core::types::Seat;
use crate::error::GameError;
use crate::events::{EventSink, GameEvent, Summary, SummaryResult};
use crate::io::provider::ModelSpec;
use crate::io::transcript::save_transcript;
use crate::modes::turn::{check_invariants, validate_state};
use crate::modes::{GameContext, finish, lineage_report, start_banner};
use crate::roles::council::{CouncilMembers, CouncilModels};

const VISIONARY_THINKING: &str = "🤔 El Visionario está pensando...";
const SKEPTIC_THINKING: &str = "🤨 El Escéptico está analizando...";
const LEADER_THINKING: &str = "🫡 El Líder está decidiendo...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouncilRequest {
    pub difficulty: Difficulty,
    pub narrator: ModelSpec,
    pub members: CouncilModels,
}

pub fn run_council(
    ctx: &GameContext,
    request: &CouncilRequest,
    sink: &mut dyn EventSink,
) -> Result<Summary, GameError> {
    let result = play(ctx, request, sink);
    finish(result, sink)
}

#[instrument(skip_all, fields(difficulty = %request.difficulty))]
fn play(
    ctx: &GameContext,
    request: &CouncilRequest,
    sink: &mut dyn EventSink,
) -> Result<Summary, GameError> {
    let models = &request.members;
    ctx.preflight(&[
        &request.narrator,
        &models.visionary,
        &models.skeptic,
        &models.leader,
    ])?;
    let limit = ctx.question_limit(request.difficulty);
    let mystery = ctx.generate_mystery(&request.narrator, request.difficulty)?;
    sink.emit(GameEvent::Started {
        banner: start_banner("consejo", request.difficulty, limit),
        situation: mystery.situation.clone(),
    })?;

    let council = CouncilMembers::new(
        ctx.provider.clone(),
        models.clone(),
        mystery.situation.clone(),
    );
    let narrator = ctx.narrator(&request.narrator, &mystery, request.difficulty);
    let mut state = SessionState::new(Seat::First, mystery, request.difficulty, limit);

    let mut round = 0;
    while !state.is_solved() {
        round += 1;
        let forced = state.budget_exhausted();
        sink.emit(GameEvent::Round(round))?;

        sink.emit(GameEvent::Status(VISIONARY_THINKING.to_string()))?;
        let theory = council.theorize(state.history())?;
        sink.emit(GameEvent::Theory(theory.clone()))?;

        sink.emit(GameEvent::Status(SKEPTIC_THINKING.to_string()))?;
        let critique = council.critique(state.history(), &theory)?;
        sink.emit(GameEvent::Critique(critique.clone()))?;

        if forced {
            sink.emit(GameEvent::ForcedFinal {
                seat: Seat::First,
                limit,
            })?;
        }
        sink.emit(GameEvent::Status(LEADER_THINKING.to_string()))?;
        match council.decide(state.history(), &theory, &critique, limit, forced)? {
            LeaderMove::Question(question) => {
                sink.emit(GameEvent::LeaderQuestion(question.clone()))?;
                let answer = narrator.answer(&question, state.history())?;
                state.record_answer(question, answer)?;
                sink.emit(GameEvent::Answer {
                    seat: Seat::First,
                    answer,
                })?;
            }
            LeaderMove::Solution(solution) => {
                state.record_solution(solution.clone(), forced)?;
                sink.emit(GameEvent::LeaderSolution(solution))?;
            }
        }
        check_invariants(&state)?;
        debug!(round, asked = state.questions_asked(), "council round complete");
    }

    let outcome = validate_state(&narrator, &mut state)?;
    info!(outcome = outcome.label(), rounds = round, "council game complete");
    let summary = Summary {
        hidden_solution: state.mystery().hidden_solution.clone(),
        lineages: vec![lineage_report(&state)?],
        result: SummaryResult::Solo(outcome),
    };
    save_transcript(ctx.config.transcript_dir.as_deref(), &state);
    sink.emit(GameEvent::Summary(summary.clone()))?;
    Ok(summary)
}
