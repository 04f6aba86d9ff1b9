//! Structured (JSON) model output: repair, schema check, extraction.

use std::sync::LazyLock;

use jsonschema::{Validator, validator_for};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::repair::repair;
use crate::core::types::{Mystery, Outcome, Verdict};

const MYSTERY_SCHEMA: &str = include_str!("../../schemas/mystery.schema.json");
const VERDICT_SCHEMA: &str = include_str!("../../schemas/verdict.schema.json");

const SITUATION_KEYS: [&str; 3] = ["situacion_misteriosa", "situation", "situacion_misterosa"];
const SOLUTION_KEYS: [&str; 2] = ["solucion_oculta", "hidden_solution"];
const VERDICT_KEYS: [&str; 2] = ["veredicto", "verdict"];
const ANALYSIS_KEYS: [&str; 2] = ["analisis", "analysis"];

/// Used when a verdict parses but carries no analysis.
pub const MISSING_ANALYSIS: &str = "No se pudo generar un análisis detallado.";

static MYSTERY_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| compile(MYSTERY_SCHEMA));
static VERDICT_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| compile(VERDICT_SCHEMA));

fn compile(schema: &str) -> Validator {
    let value: Value = serde_json::from_str(schema).expect("embedded schema should be valid json");
    validator_for(&value).expect("embedded schema should compile")
}

/// Repair, parse and schema-check a model response.
///
/// The error string describes the first failing step.
fn parse_object(raw: &str, validator: &Validator) -> Result<Value, String> {
    let repaired = repair(raw);
    if repaired != raw.trim() {
        debug!(raw_len = raw.len(), repaired_len = repaired.len(), "repaired model json");
    }
    let value: Value =
        serde_json::from_str(&repaired).map_err(|err| format!("parse json: {err}"))?;
    if !validator.is_valid(&value) {
        let messages = validator
            .iter_errors(&value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        warn!(errors = messages.len(), "model json failed schema validation");
        return Err(format!("schema validation failed: {}", messages.join("; ")));
    }
    Ok(value)
}

/// First non-blank string value among `keys`.
fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn parse_mystery(raw: &str) -> Result<Mystery, String> {
    let value = parse_object(raw, &MYSTERY_VALIDATOR)?;
    let situation =
        first_text(&value, &SITUATION_KEYS).ok_or_else(|| "situation is empty".to_string())?;
    let hidden_solution =
        first_text(&value, &SOLUTION_KEYS).ok_or_else(|| "hidden solution is empty".to_string())?;
    Ok(Mystery {
        situation,
        hidden_solution,
    })
}

pub fn parse_verdict(raw: &str) -> Result<Verdict, String> {
    let value = parse_object(raw, &VERDICT_VALIDATOR)?;
    let label = first_text(&value, &VERDICT_KEYS).ok_or_else(|| "verdict is empty".to_string())?;
    let rationale =
        first_text(&value, &ANALYSIS_KEYS).unwrap_or_else(|| MISSING_ANALYSIS.to_string());
    Ok(Verdict {
        outcome: Outcome::from_label(&label),
        rationale,
    })
}
