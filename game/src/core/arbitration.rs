//! Winner arbitration between two finished lineages.

use std::fmt;

use crate::core::types::{Outcome, Seat};

/// How one lineage finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub outcome: Outcome,
    pub questions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Seat(Seat),
    Nobody,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Seat(seat) => f.write_str(&seat.label()),
            Winner::Nobody => f.write_str("Ninguno"),
        }
    }
}

/// Arbitration result with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arbitration {
    pub winner: Winner,
    pub rationale: String,
}

/// Decide the winner:
/// - both correct: fewer questions wins, ties go to the first seat
/// - exactly one correct: that one wins
/// - neither correct: nobody wins
pub fn decide_winner(first: Standing, second: Standing) -> Arbitration {
    match (first.outcome.is_correct(), second.outcome.is_correct()) {
        (true, true) => {
            let (winner, rationale) = if second.questions < first.questions {
                (
                    Seat::Second,
                    format!(
                        "Ambos acertaron; Detective 2 usó menos preguntas ({} frente a {}).",
                        second.questions, first.questions
                    ),
                )
            } else if first.questions < second.questions {
                (
                    Seat::First,
                    format!(
                        "Ambos acertaron; Detective 1 usó menos preguntas ({} frente a {}).",
                        first.questions, second.questions
                    ),
                )
            } else {
                (
                    Seat::First,
                    format!(
                        "Ambos acertaron con {} preguntas; el empate favorece a Detective 1.",
                        first.questions
                    ),
                )
            };
            Arbitration {
                winner: Winner::Seat(winner),
                rationale,
            }
        }
        (true, false) => Arbitration {
            winner: Winner::Seat(Seat::First),
            rationale: "Solo Detective 1 resolvió el misterio.".to_string(),
        },
        (false, true) => Arbitration {
            winner: Winner::Seat(Seat::Second),
            rationale: "Solo Detective 2 resolvió el misterio.".to_string(),
        },
        (false, false) => Arbitration {
            winner: Winner::Nobody,
            rationale: "Ningún detective resolvió el misterio.".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(outcome: Outcome, questions: usize) -> Standing {
        Standing { outcome, questions }
    }

    #[test]
    fn both_correct_fewer_questions_wins() {
        let result = decide_winner(
            standing(Outcome::Correct, 3),
            standing(Outcome::Correct, 5),
        );
        assert_eq!(result.winner, Winner::Seat(Seat::First));

        let result = decide_winner(
            standing(Outcome::Correct, 6),
            standing(Outcome::Correct, 2),
        );
        assert_eq!(result.winner, Winner::Seat(Seat::Second));
    }

    #[test]
    fn tie_goes_to_first_seat() {
        let result = decide_winner(
            standing(Outcome::Correct, 4),
            standing(Outcome::Correct, 4),
        );
        assert_eq!(result.winner, Winner::Seat(Seat::First));
        assert!(result.rationale.contains("empate"));
    }

    #[test]
    fn single_correct_wins_regardless_of_questions() {
        let result = decide_winner(
            standing(Outcome::Correct, 10),
            standing(Outcome::Incorrect, 1),
        );
        assert_eq!(result.winner, Winner::Seat(Seat::First));

        let result = decide_winner(
            standing(Outcome::Incorrect, 1),
            standing(Outcome::Correct, 10),
        );
        assert_eq!(result.winner, Winner::Seat(Seat::Second));
    }

    #[test]
    fn nobody_wins_when_both_fail() {
        let result = decide_winner(
            standing(Outcome::Incorrect, 2),
            standing(Outcome::Incorrect, 3),
        );
        assert_eq!(result.winner, Winner::Nobody);
        assert_eq!(result.winner.to_string(), "Ninguno");
    }
}
