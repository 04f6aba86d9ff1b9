//! End-to-end scenarios for the single-detective game.
//!
//! Every provider call is scripted; the tests assert on the emitted event
//! stream and on what each role was (and was not) shown.

use std::sync::Arc;

use game::core::difficulty::Difficulty;
use game::core::types::{Mystery, Outcome};
use game::error::{GameError, ProviderError};
use game::events::{GameEvent, SummaryResult, WireEvent};
use game::io::config::{GameConfig, QuestionLimits};
use game::io::provider::{ModelSpec, Provider};
use game::modes::GameContext;
use game::modes::solo::{SoloRequest, run_solo};
use game::roles::narrator::{Narrator, NarratorPolicy};
use game::test_support::{ScriptedProvider, model, mystery_json, verdict_json};

const SITUATION: &str = "Un hombre aparece muerto en medio de un campo con una mochila.";
const SOLUTION: &str = "Saltó de un avión y su paracaídas no se abrió.";

fn config(limits: QuestionLimits) -> GameConfig {
    GameConfig {
        question_limits: limits,
        ..GameConfig::default()
    }
}

fn request(difficulty: Difficulty) -> SoloRequest {
    SoloRequest {
        difficulty,
        narrator: model("narrator"),
        detective: model("detective"),
    }
}

fn wire_types(events: &[GameEvent]) -> Vec<(String, String)> {
    events
        .iter()
        .map(WireEvent::from)
        .map(|wire| (wire.event_type, wire.phase))
        .collect()
}

#[test]
fn easy_game_two_questions_then_correct_solution() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .replies("narrator", &["no", "Sí."])
            .reply("narrator", &verdict_json("Correcto", "Acertó el paracaídas."))
            .replies(
                "detective",
                &[
                    "¿Murió asesinado?",
                    "¿Cayó desde el aire?",
                    "Creo que ya lo tengo",
                    SOLUTION,
                ],
            ),
    );
    let ctx = GameContext::new(provider.clone(), GameConfig::default());
    let mut events = Vec::new();

    let summary = run_solo(&ctx, &request(Difficulty::Easy), &mut events).expect("game");

    assert_eq!(summary.result, SummaryResult::Solo(Outcome::Correct));
    assert_eq!(summary.headline(), "VICTORIA");
    assert_eq!(
        wire_types(&events),
        [
            ("system", "start"),
            ("detective1_question", "question"),
            ("narrator", "answer"),
            ("detective1_question", "question"),
            ("narrator", "answer"),
            ("detective1_question", "solve_intent"),
            ("detective1_question", "solution"),
            ("summary", "summary"),
        ]
        .map(|(kind, phase)| (kind.to_string(), phase.to_string()))
    );
    let answers: Vec<String> = events
        .iter()
        .filter(|event| matches!(event, GameEvent::Answer { .. }))
        .map(|event| WireEvent::from(event).content)
        .collect();
    assert_eq!(answers, ["no", "sí"]);

    let banner = WireEvent::from(&events[0]);
    assert!(banner.content.contains("Límite: 20 preguntas"));
    assert_eq!(banner.mystery.as_deref(), Some(SITUATION));
}

#[test]
fn detective_never_sees_the_hidden_solution() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .reply("narrator", "no")
            .reply("narrator", &verdict_json("Incorrecto", "No."))
            .replies("detective", &["¿Fue de noche?", "Tengo la solución", "Un infarto"]),
    );
    let ctx = GameContext::new(provider.clone(), GameConfig::default());
    run_solo(&ctx, &request(Difficulty::Medium), &mut Vec::new()).expect("game");

    let prompts = provider.prompts_for("detective");
    assert_eq!(prompts.len(), 3);
    for prompt in &prompts {
        assert!(prompt.contains(SITUATION));
        assert!(!prompt.contains(SOLUTION));
    }
    // The history is replayed into the final-solution prompt.
    assert!(prompts[2].contains("¿Fue de noche?"));
}

#[test]
fn limit_forces_exactly_one_final_solution() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .reply("narrator", "no es relevante")
            .reply("narrator", &verdict_json("Incorrecto", "Falta el avión."))
            .replies("detective", &["¿Llevaba mochila?", "Murió de sed"]),
    );
    let limits = QuestionLimits {
        easy: 3,
        medium: 2,
        hard: 1,
        fight: 1,
    };
    let ctx = GameContext::new(provider.clone(), config(limits));
    let mut events = Vec::new();

    let summary = run_solo(&ctx, &request(Difficulty::Hard), &mut events).expect("game");

    assert_eq!(provider.call_count("detective"), 2);
    assert_eq!(summary.lineages[0].questions, 1);
    assert_eq!(summary.lineages[0].solution, "Murió de sed");
    assert_eq!(summary.headline(), "DERROTA");
    let forced_at = events
        .iter()
        .position(|event| matches!(event, GameEvent::ForcedFinal { limit: 1, .. }))
        .expect("forced notice");
    assert!(matches!(events[forced_at + 1], GameEvent::Solution { .. }));
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, GameEvent::SolveIntent { .. }))
    );
}

#[test]
fn always_ready_detective_solves_once() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .always("narrator", &verdict_json("Incorrecto", "No."))
            .always("detective", "Voy a resolver: fue un accidente aéreo"),
    );
    let ctx = GameContext::new(provider.clone(), GameConfig::default());
    let mut events = Vec::new();

    run_solo(&ctx, &request(Difficulty::Easy), &mut events).expect("game");

    let solutions = events
        .iter()
        .filter(|event| matches!(event, GameEvent::Solution { .. }))
        .count();
    assert_eq!(solutions, 1);
    assert_eq!(provider.call_count("detective"), 2);
    // Mystery generation plus one validation call.
    assert_eq!(provider.call_count("narrator"), 2);
}

/// Judges a solution correct exactly when it repeats the hidden solution.
struct EchoJudge {
    hidden: String,
}

impl Provider for EchoJudge {
    fn generate(&self, _model: &ModelSpec, prompt: &str) -> Result<String, ProviderError> {
        let quoted = format!("\"{}\"", self.hidden);
        let label = if prompt.contains(&quoted) {
            "Correcto"
        } else {
            "Incorrecto"
        };
        Ok(verdict_json(label, "Comparación literal."))
    }
}

#[test]
fn hidden_solution_validates_as_correct_under_easy() {
    let mystery = Arc::new(Mystery {
        situation: SITUATION.to_string(),
        hidden_solution: SOLUTION.to_string(),
    });
    let narrator = Narrator::new(
        Arc::new(EchoJudge {
            hidden: SOLUTION.to_string(),
        }),
        model("narrator"),
        mystery,
        Difficulty::Easy,
        NarratorPolicy {
            answer_retries: 0,
            validation_retries: 0,
            provider_retries: 0,
        },
    );
    assert_eq!(
        narrator.validate(SOLUTION).expect("verdict").outcome,
        Outcome::Correct
    );
    assert_eq!(
        narrator.validate("Se perdió").expect("verdict").outcome,
        Outcome::Incorrect
    );
}

#[test]
fn non_canonical_narrator_aborts_with_one_error_event() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .always("narrator", "Quizás, depende")
            .always("detective", "¿Estaba solo?"),
    );
    let ctx = GameContext::new(provider.clone(), GameConfig::default());
    let mut events = Vec::new();

    let err = run_solo(&ctx, &request(Difficulty::Medium), &mut events).unwrap_err();

    assert!(matches!(err, GameError::Format { what: "narrator answer", attempts: 4, .. }));
    let errors = events
        .iter()
        .filter(|event| matches!(event, GameEvent::Error(_)))
        .count();
    assert_eq!(errors, 1);
    assert!(matches!(events.last(), Some(GameEvent::Error(_))));
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, GameEvent::Summary(_)))
    );
}

#[test]
fn failed_generation_never_starts_the_game() {
    let provider = Arc::new(ScriptedProvider::new().always("narrator", "no sé hacer JSON"));
    let ctx = GameContext::new(provider.clone(), GameConfig::default());
    let mut events = Vec::new();

    let err = run_solo(&ctx, &request(Difficulty::Easy), &mut events).unwrap_err();

    assert!(matches!(err, GameError::Format { what: "mystery", attempts: 3, .. }));
    assert_eq!(provider.call_count("narrator"), 3);
    assert_eq!(provider.call_count("detective"), 0);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], GameEvent::Error(_)));
}

#[test]
fn misconfigured_model_fails_before_any_call() {
    let provider = Arc::new(ScriptedProvider::new().unavailable("detective"));
    let ctx = GameContext::new(provider.clone(), GameConfig::default());

    let err = run_solo(&ctx, &request(Difficulty::Easy), &mut Vec::new()).unwrap_err();

    assert!(matches!(err, GameError::Configuration(_)));
    assert!(provider.calls().is_empty());
}

#[test]
fn finished_game_writes_transcript() {
    let temp = tempfile::tempdir().expect("tempdir");
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .reply("narrator", &verdict_json("Correcto", "Bien."))
            .replies("detective", &["Es hora de la solución", SOLUTION]),
    );
    let cfg = GameConfig {
        transcript_dir: Some(temp.path().to_path_buf()),
        ..GameConfig::default()
    };
    let ctx = GameContext::new(provider, cfg);

    run_solo(&ctx, &request(Difficulty::Easy), &mut Vec::new()).expect("game");

    let files: Vec<_> = std::fs::read_dir(temp.path())
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().into_string().expect("utf8"))
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("partida_") && files[0].ends_with(".txt"));
}
