//! Fight mode: two Detectives race on the same mystery and Narrator.
//!
//! Lineages keep independent histories and budgets. Each round gives every
//! active lineage one turn, lineage 1 first. With `parallel_fight_turns` the
//! turns of a round run on scoped threads and their buffered events are
//! flushed in seat order, so the stream is identical to the sequential one.

use std::thread;

use tracing::{debug, info, instrument};

use crate::core::arbitration::decide_winner;
use crate::core::difficulty::Difficulty;
use crate::core::state::{SessionState, TurnAction};
use crate::core::types::Seat;
use crate::error::GameError;
use crate::events::{EventSink, GameEvent, Summary, SummaryResult};
use crate::io::provider::ModelSpec;
use crate::modes::turn::play_turn;
use crate::modes::{GameContext, finish, lineage_report, start_banner};
use crate::roles::detective::Detective;
use crate::roles::narrator::Narrator;

const BOTH_AT_LIMIT: &str = "Ambos detectives han alcanzado el límite de preguntas.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FightRequest {
    pub narrator: ModelSpec,
    pub detectives: [ModelSpec; 2],
}

struct Lineage {
    detective: Detective,
    state: SessionState,
}

impl Lineage {
    fn is_active(&self) -> bool {
        self.state.next_action() == TurnAction::Ask
    }
}

pub fn run_fight(
    ctx: &GameContext,
    request: &FightRequest,
    sink: &mut dyn EventSink,
) -> Result<Summary, GameError> {
    let result = play(ctx, request, sink);
    finish(result, sink)
}

#[instrument(skip_all, fields(parallel = ctx.config.parallel_fight_turns))]
fn play(
    ctx: &GameContext,
    request: &FightRequest,
    sink: &mut dyn EventSink,
) -> Result<Summary, GameError> {
    let [first_model, second_model] = &request.detectives;
    ctx.preflight(&[&request.narrator, first_model, second_model])?;
    let difficulty = Difficulty::Fight;
    let limit = ctx.question_limit(difficulty);
    let mystery = ctx.generate_mystery(&request.narrator, difficulty)?;
    sink.emit(GameEvent::Started {
        banner: start_banner("pelea", difficulty, limit),
        situation: mystery.situation.clone(),
    })?;

    let narrator = ctx.narrator(&request.narrator, &mystery, difficulty);
    let mut lineages = [(Seat::First, first_model), (Seat::Second, second_model)].map(
        |(seat, model)| Lineage {
            detective: ctx.detective(model, &mystery),
            state: SessionState::new(seat, mystery.clone(), difficulty, limit),
        },
    );

    let mut round = 0;
    while lineages.iter().any(Lineage::is_active) {
        round += 1;
        sink.emit(GameEvent::Round(round))?;
        if ctx.config.parallel_fight_turns {
            play_round_parallel(&mut lineages, &narrator, sink)?;
        } else {
            for lineage in lineages.iter_mut().filter(|lineage| lineage.is_active()) {
                lineage_turn(lineage, &narrator, sink)?;
            }
        }
        debug!(round, "round complete");
    }

    if lineages.iter().all(|lineage| !lineage.state.is_solved()) {
        sink.emit(GameEvent::System(BOTH_AT_LIMIT.to_string()))?;
    }
    for lineage in &mut lineages {
        if lineage.state.next_action() == TurnAction::ForceFinal {
            play_turn(&lineage.detective, &narrator, &mut lineage.state, sink)?;
        }
    }
    for lineage in &mut lineages {
        play_turn(&lineage.detective, &narrator, &mut lineage.state, sink)?;
    }

    let [first, second] = &lineages;
    let standings = first.state.standing().zip(second.state.standing());
    let Some((first_standing, second_standing)) = standings else {
        return Err(GameError::protocol("fight ended without both verdicts"));
    };
    let arbitration = decide_winner(first_standing, second_standing);
    info!(winner = %arbitration.winner, rounds = round, "fight complete");

    let summary = Summary {
        hidden_solution: mystery.hidden_solution.clone(),
        lineages: vec![lineage_report(&first.state)?, lineage_report(&second.state)?],
        result: SummaryResult::Fight {
            winner: arbitration.winner,
            rationale: arbitration.rationale,
        },
    };
    sink.emit(GameEvent::Summary(summary.clone()))?;
    Ok(summary)
}

/// One lineage's turn inside a round, framed by its turn notices.
fn lineage_turn(
    lineage: &mut Lineage,
    narrator: &Narrator,
    sink: &mut dyn EventSink,
) -> Result<(), GameError> {
    let seat = lineage.state.seat();
    sink.emit(GameEvent::Turn(seat))?;
    play_turn(&lineage.detective, narrator, &mut lineage.state, sink)?;
    if lineage.state.is_solved() {
        sink.emit(GameEvent::LineageFinished(seat))?;
    }
    Ok(())
}

fn play_round_parallel(
    lineages: &mut [Lineage],
    narrator: &Narrator,
    sink: &mut dyn EventSink,
) -> Result<(), GameError> {
    let outcomes: Vec<(Vec<GameEvent>, Result<(), GameError>)> = thread::scope(|scope| {
        let handles: Vec<_> = lineages
            .iter_mut()
            .filter(|lineage| lineage.is_active())
            .map(|lineage| {
                scope.spawn(move || {
                    let mut buffer = Vec::new();
                    let result = lineage_turn(lineage, narrator, &mut buffer);
                    (buffer, result)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    (Vec::new(), Err(GameError::protocol("fight worker panicked")))
                })
            })
            .collect()
    });

    // Seat order: a failing lineage hides the events of the lineages after it,
    // exactly as a sequential round would never have run them.
    for (buffer, result) in outcomes {
        for event in buffer {
            sink.emit(event)?;
        }
        result?;
    }
    Ok(())
}
