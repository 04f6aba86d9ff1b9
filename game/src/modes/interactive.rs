//! Interactive mode: the caller is the Detective, the AI is the Narrator.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::core::difficulty::Difficulty;
use crate::core::state::SessionState;
use crate::core::types::{AnswerToken, Seat};
use crate::error::GameError;
use crate::events::{EventSink, GameEvent, Summary, SummaryResult};
use crate::io::provider::ModelSpec;
use crate::io::transcript::save_transcript;
use crate::modes::turn::{check_invariants, validate_state};
use crate::modes::{GameContext, lineage_report, start_banner};
use crate::roles::hint::HintGenerator;
use crate::roles::narrator::Narrator;

const READY_NOTICE: &str = "El Narrador está listo. Haz tus preguntas de sí o no.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveRequest {
    pub difficulty: Difficulty,
    pub narrator: ModelSpec,
}

pub struct InteractiveGame {
    narrator: Narrator,
    hints: HintGenerator,
    state: SessionState,
    transcript_dir: Option<PathBuf>,
    /// Set by the first error that ends the game; later calls are refused.
    aborted: Option<String>,
}

impl InteractiveGame {
    #[instrument(skip_all, fields(difficulty = %request.difficulty))]
    pub fn start(
        ctx: &GameContext,
        request: &InteractiveRequest,
        sink: &mut dyn EventSink,
    ) -> Result<Self, GameError> {
        ctx.preflight(&[&request.narrator])?;
        let limit = ctx.question_limit(request.difficulty);
        let mystery = ctx.generate_mystery(&request.narrator, request.difficulty)?;
        sink.emit(GameEvent::Started {
            banner: start_banner("interactivo", request.difficulty, limit),
            situation: mystery.situation.clone(),
        })?;
        sink.emit(GameEvent::Status(READY_NOTICE.to_string()))?;
        Ok(Self {
            narrator: ctx.narrator(&request.narrator, &mystery, request.difficulty),
            hints: HintGenerator::new(ctx.provider.clone(), request.narrator.clone()),
            state: SessionState::new(Seat::First, mystery, request.difficulty, limit),
            transcript_dir: ctx.config.transcript_dir.clone(),
            aborted: None,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn questions_remaining(&self) -> usize {
        self.state
            .question_limit()
            .saturating_sub(self.state.questions_asked())
    }

    /// Ask the Narrator one question.
    ///
    /// A Narrator that fails (or stays off-format past its retries) ends the
    /// game; only rejected input leaves it playable.
    #[instrument(skip_all, fields(asked = self.state.questions_asked()))]
    pub fn ask(&mut self, question: &str) -> Result<AnswerToken, GameError> {
        self.ensure_live()?;
        let result = self.ask_turn(question);
        self.track(result)
    }

    fn ask_turn(&mut self, question: &str) -> Result<AnswerToken, GameError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GameError::InvalidInput("question must not be empty".to_string()));
        }
        if self.state.is_solved() {
            return Err(GameError::InvalidInput(
                "the mystery has already been solved".to_string(),
            ));
        }
        if self.state.budget_exhausted() {
            return Err(GameError::InvalidInput(format!(
                "question limit of {} reached; submit a solution",
                self.state.question_limit()
            )));
        }
        let answer = self.narrator.answer(question, self.state.history())?;
        self.state.record_answer(question, answer)?;
        check_invariants(&self.state)?;
        Ok(answer)
    }

    /// A hint, or the error to show the caller. Never changes the game.
    pub fn hint(&self) -> Result<String, GameError> {
        self.ensure_live()?;
        self.hints
            .hint(self.state.mystery(), self.state.history())
            .inspect_err(|err| warn!(error = %err, "hint unavailable"))
    }

    /// Submit the one final solution and get it judged.
    #[instrument(skip_all, fields(asked = self.state.questions_asked()))]
    pub fn solve(&mut self, solution: &str, sink: &mut dyn EventSink) -> Result<Summary, GameError> {
        self.ensure_live()?;
        if self.state.is_solved() {
            return Err(GameError::protocol("a solution has already been submitted"));
        }
        let result = self.solve_turn(solution, sink);
        self.track(result)
    }

    fn solve_turn(&mut self, solution: &str, sink: &mut dyn EventSink) -> Result<Summary, GameError> {
        let solution = solution.trim();
        if solution.is_empty() {
            return Err(GameError::InvalidInput("solution must not be empty".to_string()));
        }
        let forced = self.state.budget_exhausted();
        self.state.record_solution(solution, forced)?;
        sink.emit(GameEvent::Solution {
            seat: Seat::First,
            text: solution.to_string(),
        })?;
        let outcome = validate_state(&self.narrator, &mut self.state)?;
        check_invariants(&self.state)?;
        info!(outcome = outcome.label(), "interactive game complete");

        let summary = Summary {
            hidden_solution: self.state.mystery().hidden_solution.clone(),
            lineages: vec![lineage_report(&self.state)?],
            result: SummaryResult::Solo(outcome),
        };
        save_transcript(self.transcript_dir.as_deref(), &self.state);
        sink.emit(GameEvent::Summary(summary.clone()))?;
        Ok(summary)
    }

    fn ensure_live(&self) -> Result<(), GameError> {
        match &self.aborted {
            Some(reason) => Err(GameError::protocol(format!("the game was aborted: {reason}"))),
            None => Ok(()),
        }
    }

    fn track<T>(&mut self, result: Result<T, GameError>) -> Result<T, GameError> {
        match &result {
            Ok(_) | Err(GameError::InvalidInput(_)) => {}
            Err(err) => {
                warn!(error = %err, "interactive game aborted");
                self.aborted = Some(err.to_string());
            }
        }
        result
    }
}
