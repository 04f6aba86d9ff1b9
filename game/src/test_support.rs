//! Test-only helpers: a scripted provider and response fixtures.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::error::{GameError, ProviderError};
use crate::io::provider::{ModelSpec, Provider, ProviderKind};

/// A model spec whose name keys the scripted queues (`ollama:<name>`).
pub fn model(name: &str) -> ModelSpec {
    ModelSpec::new(ProviderKind::Ollama, name)
}

/// A well-formed mystery response.
pub fn mystery_json(situation: &str, solution: &str) -> String {
    serde_json::json!({
        "situacion_misteriosa": situation,
        "solucion_oculta": solution,
    })
    .to_string()
}

/// A well-formed verdict response.
pub fn verdict_json(label: &str, analysis: &str) -> String {
    serde_json::json!({ "veredicto": label, "analisis": analysis }).to_string()
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

#[derive(Default)]
struct Script {
    queues: HashMap<String, VecDeque<Scripted>>,
    fallbacks: HashMap<String, String>,
}

/// Provider returning predetermined responses per model name.
///
/// Each model has a FIFO queue; once it is empty the model's `always` reply
/// is used, and without one the call fails. Every call is logged, including
/// failed ones.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
    calls: Mutex<Vec<(String, String)>>,
    unavailable: HashSet<String>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, name: &str, item: Scripted) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script
                .queues
                .entry(name.to_string())
                .or_default()
                .push_back(item);
        }
        self
    }

    pub fn reply(self, name: &str, text: &str) -> Self {
        self.push(name, Scripted::Reply(text.to_string()))
    }

    pub fn replies(self, name: &str, texts: &[&str]) -> Self {
        texts
            .iter()
            .fold(self, |provider, text| provider.reply(name, text))
    }

    pub fn fail(self, name: &str, message: &str) -> Self {
        self.push(name, Scripted::Fail(message.to_string()))
    }

    /// Reply used whenever the model's queue is empty.
    pub fn always(self, name: &str, text: &str) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.fallbacks.insert(name.to_string(), text.to_string());
        }
        self
    }

    /// Make `preflight` reject this model as misconfigured.
    pub fn unavailable(mut self, name: &str) -> Self {
        self.unavailable.insert(name.to_string());
        self
    }

    /// All `(model, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn prompts_for(&self, name: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(model, _)| model == name)
            .map(|(_, prompt)| prompt)
            .collect()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.prompts_for(name).len()
    }
}

impl Provider for ScriptedProvider {
    fn generate(&self, model: &ModelSpec, prompt: &str) -> Result<String, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((model.model.clone(), prompt.to_string()));
        }
        let next = self.script.lock().ok().and_then(|mut script| {
            script
                .queues
                .get_mut(&model.model)
                .and_then(VecDeque::pop_front)
                .or_else(|| script.fallbacks.get(&model.model).cloned().map(Scripted::Reply))
        });
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(ProviderError::Transport {
                provider: "scripted",
                message,
            }),
            None => Err(ProviderError::Transport {
                provider: "scripted",
                message: format!("no scripted reply left for {}", model.model),
            }),
        }
    }

    fn preflight(&self, model: &ModelSpec) -> Result<(), GameError> {
        if self.unavailable.contains(&model.model) {
            return Err(GameError::Configuration(format!("{model} is not available")));
        }
        Ok(())
    }
}
