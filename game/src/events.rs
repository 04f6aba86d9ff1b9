//! Ordered game event stream.
//!
//! Coordinators emit [`GameEvent`]s into an [`EventSink`]. The enum is closed;
//! consumers that need a wire shape convert through [`WireEvent`], and the CLI
//! and transcripts use [`render_text`].

use serde::Serialize;

use crate::core::arbitration::Winner;
use crate::core::types::{AnswerToken, Outcome, Seat, Verdict};
use crate::error::GameError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Session start banner with the public situation.
    Started { banner: String, situation: String },
    /// Transient progress notice ("thinking...").
    Status(String),
    System(String),
    Round(u32),
    Turn(Seat),
    LineageFinished(Seat),
    Question { seat: Seat, text: String },
    Answer { seat: Seat, answer: AnswerToken },
    SolveIntent { seat: Seat, text: String },
    ForcedFinal { seat: Seat, limit: usize },
    Solution { seat: Seat, text: String },
    Theory(String),
    Critique(String),
    LeaderQuestion(String),
    LeaderSolution(String),
    InverseInit { situation: String, solution: String },
    InverseQuestion(String),
    InverseSolution(String),
    GameOver(GameResult),
    Summary(Summary),
    Error(String),
}

/// Result of an inverse-mode game, where the caller is the Narrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    AiWins,
    NarratorWins,
}

impl GameResult {
    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::AiWins => "AI_WINS",
            GameResult::NarratorWins => "NARRATOR_WINS",
        }
    }
}

/// Final accounting of one lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageReport {
    pub seat: Seat,
    pub questions: usize,
    pub solution: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryResult {
    Solo(Outcome),
    Fight { winner: Winner, rationale: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub hidden_solution: String,
    pub lineages: Vec<LineageReport>,
    pub result: SummaryResult,
}

impl Summary {
    pub fn headline(&self) -> String {
        match &self.result {
            SummaryResult::Solo(outcome) => outcome.result_label().to_string(),
            SummaryResult::Fight { winner, .. } => format!("Ganador: {winner}"),
        }
    }

    /// True when the game ended in a win for the detective side.
    pub fn is_victory(&self) -> bool {
        match &self.result {
            SummaryResult::Solo(outcome) => outcome.is_correct(),
            SummaryResult::Fight { winner, .. } => *winner != Winner::Nobody,
        }
    }

    pub fn render(&self) -> String {
        let mut out = self.headline();
        if let SummaryResult::Fight { rationale, .. } = &self.result {
            out.push('\n');
            out.push_str(rationale);
        }
        for report in &self.lineages {
            out.push_str("\n\n");
            if self.lineages.len() > 1 {
                out.push_str(&format!("{}:\n", report.seat.label()));
            }
            out.push_str(&format!(
                "Preguntas realizadas: {}\nSolución propuesta: {}\nVeredicto: {}\nAnálisis: {}",
                report.questions,
                report.solution,
                report.verdict.outcome.label(),
                report.verdict.rationale
            ));
        }
        out.push_str(&format!("\n\nSolución real: {}", self.hidden_solution));
        out
    }
}

/// Receiver of the event stream.
///
/// An error from `emit` means the consumer is gone; coordinators stop at the
/// next turn boundary.
pub trait EventSink {
    fn emit(&mut self, event: GameEvent) -> Result<(), GameError>;
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) -> Result<(), GameError> {
        self.push(event);
        Ok(())
    }
}

/// Wire form of one event: `{type, content, phase, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub content: String,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mystery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl WireEvent {
    fn new(event_type: impl Into<String>, phase: &str, content: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            content: content.into(),
            phase: phase.to_string(),
            seat: None,
            mystery: None,
            solution: None,
            result: None,
            winner: None,
        }
    }

    fn with_seat(mut self, seat: Seat) -> Self {
        self.seat = Some(seat.number());
        self
    }
}

fn detective_type(seat: Seat) -> String {
    format!("detective{}_question", seat.number())
}

impl From<&GameEvent> for WireEvent {
    fn from(event: &GameEvent) -> Self {
        let content = render_text(event);
        match event {
            GameEvent::Started { situation, .. } => {
                let mut wire = WireEvent::new("system", "start", content);
                wire.mystery = Some(situation.clone());
                wire
            }
            GameEvent::Status(_) => WireEvent::new("status", "status", content),
            GameEvent::System(_) => WireEvent::new("system", "notice", content),
            GameEvent::Round(_) => WireEvent::new("system", "round", content),
            GameEvent::Turn(seat) => WireEvent::new("system", "turn", content).with_seat(*seat),
            GameEvent::LineageFinished(seat) => {
                WireEvent::new("system", "lineage_finished", content).with_seat(*seat)
            }
            GameEvent::Question { seat, .. } => {
                WireEvent::new(detective_type(*seat), "question", content).with_seat(*seat)
            }
            GameEvent::Answer { seat, .. } => {
                WireEvent::new("narrator", "answer", content).with_seat(*seat)
            }
            GameEvent::SolveIntent { seat, .. } => {
                WireEvent::new(detective_type(*seat), "solve_intent", content).with_seat(*seat)
            }
            GameEvent::ForcedFinal { seat, .. } => {
                WireEvent::new("system", "forced_final", content).with_seat(*seat)
            }
            GameEvent::Solution { seat, text } => {
                let mut wire =
                    WireEvent::new(detective_type(*seat), "solution", content).with_seat(*seat);
                wire.solution = Some(text.clone());
                wire
            }
            GameEvent::Theory(_) => WireEvent::new("council_visionary", "theory", content),
            GameEvent::Critique(_) => WireEvent::new("council_skeptic", "critique", content),
            GameEvent::LeaderQuestion(_) => WireEvent::new("council_leader", "question", content),
            GameEvent::LeaderSolution(text) => {
                let mut wire = WireEvent::new("council_leader", "solution", content);
                wire.solution = Some(text.clone());
                wire
            }
            GameEvent::InverseInit {
                situation,
                solution,
            } => {
                let mut wire = WireEvent::new("inverse_init", "start", content);
                wire.mystery = Some(situation.clone());
                wire.solution = Some(solution.clone());
                wire
            }
            GameEvent::InverseQuestion(_) => {
                WireEvent::new("inverse_question", "question", content)
            }
            GameEvent::InverseSolution(text) => {
                let mut wire = WireEvent::new("inverse_solution", "solution", content);
                wire.solution = Some(text.clone());
                wire
            }
            GameEvent::GameOver(result) => {
                let mut wire = WireEvent::new("game_over", "game_over", content);
                wire.result = Some(result.as_str().to_string());
                wire
            }
            GameEvent::Summary(summary) => {
                let mut wire = WireEvent::new("summary", "summary", content);
                wire.result = Some(summary.headline());
                if let SummaryResult::Fight { winner, .. } = &summary.result {
                    wire.winner = Some(winner.to_string());
                }
                wire.solution = Some(summary.hidden_solution.clone());
                wire
            }
            GameEvent::Error(_) => WireEvent::new("error", "error", content),
        }
    }
}

/// Human-readable rendering of one event.
pub fn render_text(event: &GameEvent) -> String {
    match event {
        GameEvent::Started { banner, situation } => format!("{banner}\n\n{situation}"),
        GameEvent::Status(text) | GameEvent::System(text) | GameEvent::Error(text) => {
            text.clone()
        }
        GameEvent::Round(number) => format!("--- Ronda {number} ---"),
        GameEvent::Turn(seat) => format!("Turno del {}:", seat.label()),
        GameEvent::LineageFinished(seat) => format!("{} ha finalizado.", seat.label()),
        GameEvent::Question { text, .. } | GameEvent::SolveIntent { text, .. } => text.clone(),
        GameEvent::Answer { answer, .. } => answer.as_str().to_string(),
        GameEvent::ForcedFinal { seat, limit } => format!(
            "⚠️ ¡Límite de {limit} preguntas alcanzado! {} debe dar su solución final.",
            seat.label()
        ),
        GameEvent::Solution { text, .. } => format!("Solución propuesta: {text}"),
        GameEvent::Theory(text) => format!("Visionario: {text}"),
        GameEvent::Critique(text) => format!("Escéptico: {text}"),
        GameEvent::LeaderQuestion(text) => format!("Líder: {text}"),
        GameEvent::LeaderSolution(text) => format!("Líder: SOLUCIÓN: {text}"),
        GameEvent::InverseInit {
            situation,
            solution,
        } => format!("Misterio: {situation}\n\nSolución (solo para ti): {solution}"),
        GameEvent::InverseQuestion(text) => text.clone(),
        GameEvent::InverseSolution(text) => format!("Solución propuesta: {text}"),
        GameEvent::GameOver(result) => match result {
            GameResult::AiWins => "¡El detective ha resuelto el misterio!".to_string(),
            GameResult::NarratorWins => "El detective no ha resuelto el misterio.".to_string(),
        },
        GameEvent::Summary(summary) => summary.render(),
    }
}
