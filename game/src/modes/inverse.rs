//! Inverse mode: the caller is the Narrator, the AI is the Detective.
//!
//! The game advances one caller answer at a time. Between requests it is
//! either waiting on an answer to a question or on a judgement of the
//! Detective's single solution.

use tracing::{debug, info, instrument};

use crate::core::answer::{is_solution_accepted, normalize_answer};
use crate::core::difficulty::Difficulty;
use crate::core::intent::is_ready;
use crate::core::state::{SessionState, TurnAction};
use crate::core::types::{Outcome, Seat, Verdict};
use crate::error::GameError;
use crate::events::{EventSink, GameEvent, GameResult};
use crate::io::provider::ModelSpec;
use crate::modes::GameContext;
use crate::modes::turn::check_invariants;
use crate::roles::detective::Detective;

const DETECTIVE_THINKING: &str = "El Detective está pensando...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseRequest {
    pub difficulty: Difficulty,
    pub detective: ModelSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Question(String),
    Solution,
}

pub struct InverseGame {
    detective: Detective,
    state: SessionState,
    pending: Option<Pending>,
    result: Option<GameResult>,
}

impl InverseGame {
    /// Generate the mystery, show it (with its solution) to the caller and
    /// play the Detective's first turn.
    #[instrument(skip_all, fields(difficulty = %request.difficulty))]
    pub fn start(
        ctx: &GameContext,
        request: &InverseRequest,
        sink: &mut dyn EventSink,
    ) -> Result<Self, GameError> {
        ctx.preflight(&[&request.detective])?;
        let limit = ctx.question_limit(request.difficulty);
        let mystery = ctx.generate_mystery(&request.detective, request.difficulty)?;
        sink.emit(GameEvent::InverseInit {
            situation: mystery.situation.clone(),
            solution: mystery.hidden_solution.clone(),
        })?;
        let mut game = Self {
            detective: ctx.detective(&request.detective, &mystery),
            state: SessionState::new(Seat::First, mystery, request.difficulty, limit),
            pending: None,
            result: None,
        };
        game.detective_turn(sink)?;
        Ok(game)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Apply the caller's reply to whatever the Detective last said.
    ///
    /// An answer to a question must be a canonical token; anything else is
    /// rejected without touching the game.
    #[instrument(skip_all, fields(asked = self.state.questions_asked()))]
    pub fn answer(&mut self, raw: &str, sink: &mut dyn EventSink) -> Result<(), GameError> {
        match self.pending.take() {
            None => Err(GameError::protocol("no question or solution is awaiting an answer")),
            Some(Pending::Question(question)) => {
                let Some(token) = normalize_answer(raw) else {
                    self.pending = Some(Pending::Question(question));
                    return Err(GameError::InvalidInput(format!(
                        "'{}' is not one of: sí, no, no es relevante",
                        raw.trim()
                    )));
                };
                self.state.record_answer(question, token)?;
                sink.emit(GameEvent::Answer {
                    seat: Seat::First,
                    answer: token,
                })?;
                check_invariants(&self.state)?;
                self.detective_turn(sink)
            }
            Some(Pending::Solution) => {
                let accepted = is_solution_accepted(raw);
                let outcome = if accepted {
                    Outcome::Correct
                } else {
                    Outcome::Incorrect
                };
                self.state.record_verdict(Verdict {
                    outcome,
                    rationale: raw.trim().to_string(),
                })?;
                let result = if accepted {
                    GameResult::AiWins
                } else {
                    GameResult::NarratorWins
                };
                self.result = Some(result);
                info!(result = result.as_str(), "inverse game over");
                sink.emit(GameEvent::GameOver(result))
            }
        }
    }

    fn detective_turn(&mut self, sink: &mut dyn EventSink) -> Result<(), GameError> {
        sink.emit(GameEvent::Status(DETECTIVE_THINKING.to_string()))?;
        let limit = self.state.question_limit();
        match self.state.next_action() {
            TurnAction::Ask => {
                let remaining = limit - self.state.questions_asked();
                let text = self.detective.ask_or_solve(self.state.history(), remaining)?;
                if is_ready(&text) {
                    let solution = self.detective.final_solution(self.state.history(), false, limit)?;
                    self.offer_solution(solution, false, sink)
                } else {
                    debug!("detective asked");
                    self.pending = Some(Pending::Question(text.clone()));
                    sink.emit(GameEvent::InverseQuestion(text))
                }
            }
            TurnAction::ForceFinal => {
                sink.emit(GameEvent::ForcedFinal {
                    seat: Seat::First,
                    limit,
                })?;
                let solution = self.detective.final_solution(self.state.history(), true, limit)?;
                self.offer_solution(solution, true, sink)
            }
            TurnAction::Validate | TurnAction::Finished => {
                Err(GameError::protocol("detective turn requested after solving"))
            }
        }
    }

    fn offer_solution(
        &mut self,
        solution: String,
        forced: bool,
        sink: &mut dyn EventSink,
    ) -> Result<(), GameError> {
        self.state.record_solution(solution.clone(), forced)?;
        self.pending = Some(Pending::Solution);
        check_invariants(&self.state)?;
        sink.emit(GameEvent::InverseSolution(solution))
    }
}
