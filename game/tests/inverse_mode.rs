//! Inverse mode: the caller narrates, the AI detective asks.

use std::sync::Arc;

use game::core::difficulty::Difficulty;
use game::core::types::{AnswerToken, Seat};
use game::error::GameError;
use game::events::{GameEvent, GameResult};
use game::io::config::{GameConfig, QuestionLimits};
use game::modes::GameContext;
use game::modes::inverse::{InverseGame, InverseRequest};
use game::test_support::{ScriptedProvider, model, mystery_json};

const SITUATION: &str = "Un hombre pide un vaso de agua y el camarero le apunta con una pistola.";
const SOLUTION: &str = "Tenía hipo; el susto se lo quitó.";

fn start(
    detective: &[&str],
    config: GameConfig,
) -> (InverseGame, Vec<GameEvent>, Arc<ScriptedProvider>) {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("detective", &mystery_json(SITUATION, SOLUTION))
            .replies("detective", detective),
    );
    let ctx = GameContext::new(provider.clone(), config);
    let request = InverseRequest {
        difficulty: Difficulty::Hard,
        detective: model("detective"),
    };
    let mut events = Vec::new();
    let game = InverseGame::start(&ctx, &request, &mut events).expect("start");
    (game, events, provider)
}

fn one_question_limit() -> GameConfig {
    GameConfig {
        question_limits: QuestionLimits {
            easy: 3,
            medium: 2,
            hard: 1,
            fight: 1,
        },
        ..GameConfig::default()
    }
}

#[test]
fn start_reveals_mystery_and_asks_first_question() {
    let (game, events, provider) = start(
        &["Detective: ¿Tenía sed?"],
        GameConfig::default(),
    );
    assert_eq!(
        events,
        [
            GameEvent::InverseInit {
                situation: SITUATION.to_string(),
                solution: SOLUTION.to_string(),
            },
            GameEvent::Status("El Detective está pensando...".to_string()),
            GameEvent::InverseQuestion("¿Tenía sed?".to_string()),
        ]
    );
    assert!(!game.is_over());
    // The detective model wrote the story; no narrator model is involved.
    assert_eq!(provider.calls().len(), 2);
}

#[test]
fn invalid_answer_is_rejected_without_changes() {
    let (mut game, _, provider) = start(
        &["¿Tenía sed?"],
        GameConfig::default(),
    );
    let calls_before = provider.calls().len();
    let mut events = Vec::new();

    let err = game.answer("tal vez", &mut events).unwrap_err();

    assert!(matches!(err, GameError::InvalidInput(_)));
    assert!(events.is_empty());
    assert_eq!(game.state().questions_asked(), 0);
    assert_eq!(provider.calls().len(), calls_before);
}

#[test]
fn accepted_solution_means_ai_wins() {
    let (mut game, _, provider) = start(
        &["¿Tenía sed?", "Creo que ya lo tengo", "Tenía hipo y el susto se lo quitó"],
        GameConfig::default(),
    );

    let mut events = Vec::new();
    game.answer("No.", &mut events).expect("answer");
    assert_eq!(
        events,
        [
            GameEvent::Answer {
                seat: Seat::First,
                answer: AnswerToken::No,
            },
            GameEvent::Status("El Detective está pensando...".to_string()),
            GameEvent::InverseSolution("Tenía hipo y el susto se lo quitó".to_string()),
        ]
    );
    // The answered question is in the final-solution prompt.
    let prompts = provider.prompts_for("detective");
    assert!(prompts.last().expect("prompt").contains("¿Tenía sed?"));

    let mut events = Vec::new();
    game.answer("¡Correcto!", &mut events).expect("judge");
    assert_eq!(events, [GameEvent::GameOver(GameResult::AiWins)]);
    assert_eq!(game.result(), Some(GameResult::AiWins));
    assert!(game.state().is_done());
}

#[test]
fn rejected_solution_means_narrator_wins() {
    let (mut game, _, _) = start(
        &["Voy a resolver", "Estaba loco"],
        GameConfig::default(),
    );
    let mut events = Vec::new();
    game.answer("No, nada que ver", &mut events).expect("judge");
    assert_eq!(events, [GameEvent::GameOver(GameResult::NarratorWins)]);
    assert_eq!(game.state().questions_asked(), 0);
}

#[test]
fn limit_forces_the_solution_offer() {
    let (mut game, _, _) = start(
        &["¿Estaba enfermo?", "Tenía hipo"],
        one_question_limit(),
    );
    let mut events = Vec::new();
    game.answer("no es relevante", &mut events).expect("answer");

    assert!(events.contains(&GameEvent::ForcedFinal {
        seat: Seat::First,
        limit: 1,
    }));
    assert!(matches!(events.last(), Some(GameEvent::InverseSolution(_))));
    assert!(game.state().attempt().expect("attempt").forced);
}

#[test]
fn answers_after_game_over_are_protocol_errors() {
    let (mut game, _, _) = start(
        &["Tengo la solución", "Hipo"],
        GameConfig::default(),
    );
    game.answer("sí", &mut Vec::new()).expect("judge");
    assert_eq!(game.result(), Some(GameResult::AiWins));

    let err = game.answer("sí", &mut Vec::new()).unwrap_err();
    assert!(matches!(err, GameError::Protocol(_)));
}
