//! Per-lineage state machine.
//!
//! A lineage is one Detective's play-through: its own history, its own budget
//! and at most one final solution. Coordinators drive it through
//! [`SessionState::next_action`] and record each outcome; the state refuses
//! transitions that would break the turn protocol.

use std::sync::Arc;

use tracing::debug;

use crate::core::arbitration::Standing;
use crate::core::difficulty::Difficulty;
use crate::core::types::{AnswerToken, Mystery, QaEntry, Seat, Verdict};
use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Questions may still be asked.
    Asking,
    /// A final solution is recorded and awaits validation.
    Solved,
    /// The verdict is in.
    Done,
}

/// What the scheduler must do next for a lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    /// Ask the Detective for a question or a solve-intent.
    Ask,
    /// The budget is spent; request exactly one final solution.
    ForceFinal,
    Validate,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionAttempt {
    pub text: String,
    /// True when the attempt was demanded by the question limit.
    pub forced: bool,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    seat: Seat,
    mystery: Arc<Mystery>,
    difficulty: Difficulty,
    question_limit: usize,
    history: Vec<QaEntry>,
    phase: Phase,
    attempt: Option<SolutionAttempt>,
    verdict: Option<Verdict>,
}

impl SessionState {
    pub fn new(
        seat: Seat,
        mystery: Arc<Mystery>,
        difficulty: Difficulty,
        question_limit: usize,
    ) -> Self {
        Self {
            seat,
            mystery,
            difficulty,
            question_limit,
            history: Vec::new(),
            phase: Phase::Asking,
            attempt: None,
            verdict: None,
        }
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn mystery(&self) -> &Mystery {
        &self.mystery
    }

    pub fn situation(&self) -> &str {
        &self.mystery.situation
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn question_limit(&self) -> usize {
        self.question_limit
    }

    pub fn history(&self) -> &[QaEntry] {
        &self.history
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn attempt(&self) -> Option<&SolutionAttempt> {
        self.attempt.as_ref()
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn questions_asked(&self) -> usize {
        self.history.len()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.history.len() >= self.question_limit
    }

    pub fn is_solved(&self) -> bool {
        self.attempt.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// The limit check happens here, at the start of every tick.
    pub fn next_action(&self) -> TurnAction {
        match self.phase {
            Phase::Asking if self.budget_exhausted() => TurnAction::ForceFinal,
            Phase::Asking => TurnAction::Ask,
            Phase::Solved => TurnAction::Validate,
            Phase::Done => TurnAction::Finished,
        }
    }

    pub fn record_answer(
        &mut self,
        question: impl Into<String>,
        answer: AnswerToken,
    ) -> Result<(), GameError> {
        if self.phase != Phase::Asking {
            return Err(GameError::protocol(format!(
                "{} cannot record a question after solving",
                self.seat.label()
            )));
        }
        if self.budget_exhausted() {
            return Err(GameError::protocol(format!(
                "{} exceeded its limit of {} questions",
                self.seat.label(),
                self.question_limit
            )));
        }
        self.history.push(QaEntry {
            question: question.into(),
            answer,
        });
        debug!(
            seat = self.seat.number(),
            asked = self.history.len(),
            limit = self.question_limit,
            "answer recorded"
        );
        Ok(())
    }

    /// Store the one final solution of this lineage.
    pub fn record_solution(
        &mut self,
        text: impl Into<String>,
        forced: bool,
    ) -> Result<(), GameError> {
        if self.attempt.is_some() || self.phase != Phase::Asking {
            return Err(GameError::protocol(format!(
                "{} already submitted a final solution",
                self.seat.label()
            )));
        }
        self.attempt = Some(SolutionAttempt {
            text: text.into(),
            forced,
        });
        self.phase = Phase::Solved;
        debug!(seat = self.seat.number(), forced, "solution recorded");
        Ok(())
    }

    pub fn record_verdict(&mut self, verdict: Verdict) -> Result<(), GameError> {
        if self.phase != Phase::Solved {
            return Err(GameError::protocol(format!(
                "{} has no solution awaiting validation",
                self.seat.label()
            )));
        }
        debug!(
            seat = self.seat.number(),
            outcome = verdict.outcome.label(),
            "verdict recorded"
        );
        self.verdict = Some(verdict);
        self.phase = Phase::Done;
        Ok(())
    }

    /// Arbitration input, available once the verdict is in.
    pub fn standing(&self) -> Option<Standing> {
        self.verdict.as_ref().map(|verdict| Standing {
            outcome: verdict.outcome,
            questions: self.history.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Outcome;

    fn state(limit: usize) -> SessionState {
        let mystery = Arc::new(Mystery {
            situation: "Un hombre yace muerto en un campo.".to_string(),
            hidden_solution: "Su paracaídas no se abrió.".to_string(),
        });
        SessionState::new(Seat::First, mystery, Difficulty::Medium, limit)
    }

    fn verdict(outcome: Outcome) -> Verdict {
        Verdict {
            outcome,
            rationale: "análisis".to_string(),
        }
    }

    #[test]
    fn fresh_lineage_asks() {
        let state = state(2);
        assert_eq!(state.next_action(), TurnAction::Ask);
        assert!(!state.is_solved());
    }

    #[test]
    fn limit_forces_final_at_start_of_tick() {
        let mut state = state(1);
        state.record_answer("¿Volaba?", AnswerToken::Yes).expect("answer");
        assert_eq!(state.next_action(), TurnAction::ForceFinal);
        let err = state.record_answer("¿Otra?", AnswerToken::No).unwrap_err();
        assert!(matches!(err, GameError::Protocol(_)));
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn second_solution_is_a_protocol_violation() {
        let mut state = state(3);
        state.record_solution("paracaídas", false).expect("first");
        let err = state.record_solution("otra idea", false).unwrap_err();
        assert!(matches!(err, GameError::Protocol(_)));
        assert_eq!(state.attempt().map(|a| a.text.as_str()), Some("paracaídas"));
    }

    #[test]
    fn verdict_completes_lineage() {
        let mut state = state(3);
        state.record_answer("¿Volaba?", AnswerToken::Yes).expect("answer");
        assert!(state.record_verdict(verdict(Outcome::Correct)).is_err());
        state.record_solution("paracaídas", false).expect("solution");
        assert_eq!(state.next_action(), TurnAction::Validate);
        state.record_verdict(verdict(Outcome::Correct)).expect("verdict");
        assert_eq!(state.next_action(), TurnAction::Finished);
        assert_eq!(
            state.standing(),
            Some(Standing {
                outcome: Outcome::Correct,
                questions: 1
            })
        );
    }

    #[test]
    fn no_questions_after_solving() {
        let mut state = state(3);
        state.record_solution("paracaídas", false).expect("solution");
        assert!(state.record_answer("¿Tarde?", AnswerToken::No).is_err());
    }
}
