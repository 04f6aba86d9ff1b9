//! Council mode: three advisory roles share one interrogation.

use std::sync::Arc;

use game::core::difficulty::Difficulty;
use game::core::types::Outcome;
use game::events::{GameEvent, SummaryResult, WireEvent};
use game::io::config::{GameConfig, QuestionLimits};
use game::modes::GameContext;
use game::modes::council::{CouncilRequest, run_council};
use game::roles::council::CouncilModels;
use game::test_support::{ScriptedProvider, model, mystery_json, verdict_json};

const SITUATION: &str = "Un hombre aparece muerto en medio de un campo con una mochila.";
const SOLUTION: &str = "Saltó de un avión y su paracaídas no se abrió.";
const THEORY: &str = "Cayó desde mucha altura";
const CRITIQUE: &str = "No hay edificios cerca";

fn request(difficulty: Difficulty) -> CouncilRequest {
    CouncilRequest {
        difficulty,
        narrator: model("narrator"),
        members: CouncilModels {
            visionary: model("visionary"),
            skeptic: model("skeptic"),
            leader: model("leader"),
        },
    }
}

fn members(provider: ScriptedProvider) -> ScriptedProvider {
    provider
        .always("visionary", &format!("Visionario: {THEORY}"))
        .always("skeptic", CRITIQUE)
}

fn wire_kinds(events: &[GameEvent]) -> Vec<String> {
    events
        .iter()
        .map(WireEvent::from)
        .map(|wire| format!("{}/{}", wire.event_type, wire.phase))
        .collect()
}

#[test]
fn leader_question_then_solution() {
    let provider = Arc::new(members(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .reply("narrator", "sí")
            .reply("narrator", &verdict_json("Correcto", "Paracaídas."))
            .replies(
                "leader",
                &["Líder: ¿Llevaba algo a la espalda?", "SOLUCIÓN: Su paracaídas no se abrió"],
            ),
    ));
    let ctx = GameContext::new(provider.clone(), GameConfig::default());
    let mut events = Vec::new();

    let summary = run_council(&ctx, &request(Difficulty::Medium), &mut events).expect("council");

    assert_eq!(summary.result, SummaryResult::Solo(Outcome::Correct));
    assert_eq!(summary.lineages[0].questions, 1);
    assert_eq!(summary.lineages[0].solution, "Su paracaídas no se abrió");
    let round = [
        "system/round",
        "status/status",
        "council_visionary/theory",
        "status/status",
        "council_skeptic/critique",
        "status/status",
    ];
    let mut expected = vec!["system/start"];
    expected.extend(round);
    expected.extend(["council_leader/question", "narrator/answer"]);
    expected.extend(round);
    expected.extend(["council_leader/solution", "summary/summary"]);
    assert_eq!(wire_kinds(&events), expected);
    assert!(events.contains(&GameEvent::Theory(THEORY.to_string())));
}

#[test]
fn advisory_output_never_reaches_the_narrator() {
    let provider = Arc::new(members(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .reply("narrator", "no")
            .reply("narrator", &verdict_json("Incorrecto", "No."))
            .replies("leader", &["¿Había un edificio?", "solución: se cayó de un árbol"]),
    ));
    let ctx = GameContext::new(provider.clone(), GameConfig::default());

    run_council(&ctx, &request(Difficulty::Easy), &mut Vec::new()).expect("council");

    let narrator_prompts = provider.prompts_for("narrator");
    for prompt in &narrator_prompts {
        assert!(!prompt.contains(THEORY));
        assert!(!prompt.contains(CRITIQUE));
    }
    // The second round's members see the shared history.
    assert!(provider.prompts_for("visionary")[1].contains("¿Había un edificio?"));
    for role in ["visionary", "skeptic", "leader"] {
        for prompt in provider.prompts_for(role) {
            assert!(!prompt.contains(SOLUTION), "{role} saw the hidden solution");
        }
    }
}

#[test]
fn exhausted_budget_forces_a_final_guess() {
    let provider = Arc::new(members(
        ScriptedProvider::new()
            .reply("narrator", &mystery_json(SITUATION, SOLUTION))
            .reply("narrator", "no")
            .reply("narrator", &verdict_json("Correcto", "Bien."))
            .replies("leader", &["¿Murió de hambre?", "Un paracaídas defectuoso"]),
    ));
    let config = GameConfig {
        question_limits: QuestionLimits {
            easy: 3,
            medium: 2,
            hard: 1,
            fight: 1,
        },
        ..GameConfig::default()
    };
    let ctx = GameContext::new(provider.clone(), config);
    let mut events = Vec::new();

    let summary = run_council(&ctx, &request(Difficulty::Hard), &mut events).expect("council");

    assert_eq!(summary.lineages[0].solution, "Un paracaídas defectuoso");
    let forced = events
        .iter()
        .position(|event| matches!(event, GameEvent::ForcedFinal { limit: 1, .. }))
        .expect("forced notice");
    let solution = events
        .iter()
        .position(|event| matches!(event, GameEvent::LeaderSolution(_)))
        .expect("leader solution");
    assert!(forced < solution);
    assert!(provider.prompts_for("leader")[1].contains("ha agotado"));
}
