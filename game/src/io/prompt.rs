//! Prompt rendering for every role.
//!
//! Templates live under `io/prompts/` and are compiled once. Renderers take
//! only the data a role is allowed to see: Detective and council prompts
//! never receive the hidden solution.

use std::sync::LazyLock;

use minijinja::{Environment, context};

use crate::core::difficulty::Difficulty;
use crate::core::intent::READY_PHRASES;
use crate::core::types::QaEntry;
use crate::error::GameError;

const HISTORY_PARTIAL: &str = include_str!("prompts/_history.md");
const NARRATOR_ANSWER_TEMPLATE: &str = include_str!("prompts/narrator_answer.md");
const NARRATOR_VALIDATE_TEMPLATE: &str = include_str!("prompts/narrator_validate.md");
const DETECTIVE_ASK_TEMPLATE: &str = include_str!("prompts/detective_ask.md");
const DETECTIVE_FINAL_TEMPLATE: &str = include_str!("prompts/detective_final.md");
const STORY_TEMPLATE: &str = include_str!("prompts/story.md");
const VISIONARY_TEMPLATE: &str = include_str!("prompts/visionary.md");
const SKEPTIC_TEMPLATE: &str = include_str!("prompts/skeptic.md");
const LEADER_TEMPLATE: &str = include_str!("prompts/leader.md");
const LEADER_FINAL_TEMPLATE: &str = include_str!("prompts/leader_final.md");
const HINT_TEMPLATE: &str = include_str!("prompts/hint.md");

/// Appended to a Narrator answer prompt after a non-canonical reply.
pub const ANSWER_WARNING: &str =
    "ADVERTENCIA: Debes responder ESTRICTAMENTE solo 'sí', 'no' o 'no es relevante'.";

/// Appended to a JSON prompt after an unparseable reply.
pub const JSON_WARNING: &str = "ADVERTENCIA: Debes responder ESTRICTAMENTE en formato JSON válido, \
     SIN bloques de código markdown ni texto antes o después del objeto.";

/// Validation strictness for a difficulty.
pub fn rubric(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "flexible; capturar el concepto principal es suficiente",
        Difficulty::Medium => "moderada; debe capturar la esencia de lo que pasó",
        Difficulty::Hard => "estricta; debe mencionar todos los elementos clave de la solución",
        Difficulty::Fight => {
            "moderada; debe capturar la esencia de lo que pasó, como en dificultad media"
        }
    }
}

/// Story tone for a difficulty.
pub fn tone(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "con lógica directa, pocos elementos rebuscados y causas evidentes.",
        Difficulty::Medium => "con una combinación de elementos lógicos y algunos giros inesperados.",
        Difficulty::Hard => "muy rebuscada, con causas no obvias y varios elementos engañosos.",
        Difficulty::Fight => "balanceada y apta para dos detectives compitiendo.",
    }
}

static ENGINE: LazyLock<PromptEngine> = LazyLock::new(PromptEngine::new);

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        for (name, source) in [
            ("history", HISTORY_PARTIAL),
            ("narrator_answer", NARRATOR_ANSWER_TEMPLATE),
            ("narrator_validate", NARRATOR_VALIDATE_TEMPLATE),
            ("detective_ask", DETECTIVE_ASK_TEMPLATE),
            ("detective_final", DETECTIVE_FINAL_TEMPLATE),
            ("story", STORY_TEMPLATE),
            ("visionary", VISIONARY_TEMPLATE),
            ("skeptic", SKEPTIC_TEMPLATE),
            ("leader", LEADER_TEMPLATE),
            ("leader_final", LEADER_FINAL_TEMPLATE),
            ("hint", HINT_TEMPLATE),
        ] {
            env.add_template(name, source)
                .expect("prompt template should be valid");
        }
        Self { env }
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, GameError> {
        let template = self.env.get_template(name)?;
        let rendered = template.render(ctx)?;
        Ok(rendered.trim().to_string())
    }
}

pub fn narrator_answer(
    situation: &str,
    solution: &str,
    history: &[QaEntry],
    question: &str,
    warning: Option<&str>,
) -> Result<String, GameError> {
    ENGINE.render(
        "narrator_answer",
        context! { situation, solution, history, question, warning },
    )
}

pub fn narrator_validate(
    situation: &str,
    solution: &str,
    attempt: &str,
    difficulty: Difficulty,
    warning: Option<&str>,
) -> Result<String, GameError> {
    ENGINE.render(
        "narrator_validate",
        context! {
            situation,
            solution,
            attempt,
            difficulty => difficulty.as_str(),
            rubric => rubric(difficulty),
            warning,
        },
    )
}

pub fn detective_ask(
    situation: &str,
    history: &[QaEntry],
    remaining: usize,
) -> Result<String, GameError> {
    ENGINE.render(
        "detective_ask",
        context! { situation, history, remaining, phrases => READY_PHRASES },
    )
}

pub fn detective_final(
    situation: &str,
    history: &[QaEntry],
    forced: bool,
    limit: usize,
) -> Result<String, GameError> {
    ENGINE.render(
        "detective_final",
        context! { situation, history, forced, limit },
    )
}

pub fn story(difficulty: Difficulty, warning: Option<&str>) -> Result<String, GameError> {
    ENGINE.render("story", context! { tone => tone(difficulty), warning })
}

pub fn visionary(situation: &str, history: &[QaEntry]) -> Result<String, GameError> {
    ENGINE.render("visionary", context! { situation, history })
}

pub fn skeptic(situation: &str, history: &[QaEntry], theory: &str) -> Result<String, GameError> {
    ENGINE.render("skeptic", context! { situation, history, theory })
}

pub fn leader(
    situation: &str,
    history: &[QaEntry],
    theory: &str,
    critique: &str,
    remaining: usize,
) -> Result<String, GameError> {
    ENGINE.render(
        "leader",
        context! { situation, history, theory, critique, remaining },
    )
}

pub fn leader_final(
    situation: &str,
    history: &[QaEntry],
    theory: &str,
    critique: &str,
    limit: usize,
) -> Result<String, GameError> {
    ENGINE.render(
        "leader_final",
        context! { situation, history, theory, critique, limit },
    )
}

pub fn hint(situation: &str, solution: &str, history: &[QaEntry]) -> Result<String, GameError> {
    ENGINE.render("hint", context! { situation, solution, history })
}
