//! Text-generation providers.
//!
//! The [`Provider`] trait is the single seam between the game and any model
//! backend. [`HttpProvider`] talks to Gemini and Ollama over blocking HTTP;
//! tests use the scripted provider from `test_support` instead.

use std::fmt;
use std::str::FromStr;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{GameError, ProviderError};
use crate::io::config::{GEMINI_API_KEY_VAR, ProviderSettings};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Error bodies are cut to this many characters before they reach logs or events.
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }
}

/// A `provider:model` pair such as `gemini:gemini-2.5-flash` or `ollama:llama3:8b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model: String,
}

impl ModelSpec {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider.as_str(), self.model)
    }
}

impl FromStr for ModelSpec {
    type Err = GameError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (provider, model) = raw.trim().split_once(':').ok_or_else(|| {
            GameError::Configuration(format!(
                "model '{raw}' must have the form provider:model"
            ))
        })?;
        let provider = match provider.trim().to_lowercase().as_str() {
            "gemini" => ProviderKind::Gemini,
            "ollama" => ProviderKind::Ollama,
            other => {
                return Err(GameError::Configuration(format!(
                    "unknown provider '{other}' (expected gemini or ollama)"
                )));
            }
        };
        let model = model.trim();
        if model.is_empty() {
            return Err(GameError::Configuration(format!(
                "model '{raw}' is missing a model name"
            )));
        }
        Ok(Self::new(provider, model))
    }
}

/// Abstraction over text-generation backends.
pub trait Provider: Send + Sync {
    /// Run one prompt and return the raw response text.
    fn generate(&self, model: &ModelSpec, prompt: &str) -> Result<String, ProviderError>;

    /// Check that `model` can be used at all (credentials, host). Called once
    /// at session start so misconfiguration fails before any turn.
    fn preflight(&self, _model: &ModelSpec) -> Result<(), GameError> {
        Ok(())
    }
}

/// Provider backed by the Gemini and Ollama HTTP APIs.
///
/// Uses a blocking client, so it must be built and called off any async
/// runtime thread.
pub struct HttpProvider {
    client: Client,
    settings: ProviderSettings,
}

impl HttpProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, GameError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| GameError::Configuration(format!("build http client: {err}")))?;
        Ok(Self { client, settings })
    }

    fn gemini(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let api_key =
            self.settings
                .gemini_api_key
                .as_deref()
                .ok_or(ProviderError::MissingCredential {
                    provider: "gemini",
                    variable: GEMINI_API_KEY_VAR,
                })?;
        let url = format!("{GEMINI_BASE_URL}/{model}:generateContent");
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&GeminiRequest::new(prompt))
            .send()
            .map_err(|err| self.transport_error("gemini", err))?;
        let body = self.read_success("gemini", response)?;
        gemini_text(&body)
    }

    fn ollama(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.settings.ollama_host);
        let response = self
            .client
            .post(url)
            .json(&OllamaRequest {
                model,
                prompt,
                stream: false,
            })
            .send()
            .map_err(|err| self.transport_error("ollama", err))?;
        let body = self.read_success("ollama", response)?;
        ollama_text(&body)
    }

    fn read_success(
        &self,
        provider: &'static str,
        response: reqwest::blocking::Response,
    ) -> Result<String, ProviderError> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| self.transport_error(provider, err))?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider,
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }
        Ok(body)
    }

    fn transport_error(&self, provider: &'static str, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                provider,
                timeout_secs: self.settings.timeout.as_secs(),
            }
        } else {
            ProviderError::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }
}

impl Provider for HttpProvider {
    #[instrument(skip_all, fields(model = %model, prompt_len = prompt.len()))]
    fn generate(&self, model: &ModelSpec, prompt: &str) -> Result<String, ProviderError> {
        let text = match model.provider {
            ProviderKind::Gemini => self.gemini(&model.model, prompt)?,
            ProviderKind::Ollama => self.ollama(&model.model, prompt)?,
        };
        debug!(response_len = text.len(), "provider responded");
        Ok(text)
    }

    fn preflight(&self, model: &ModelSpec) -> Result<(), GameError> {
        match model.provider {
            ProviderKind::Gemini if self.settings.gemini_api_key.is_none() => {
                Err(GameError::Configuration(format!(
                    "{GEMINI_API_KEY_VAR} must be set to use {model}"
                )))
            }
            ProviderKind::Ollama if self.settings.ollama_host.trim().is_empty() => Err(
                GameError::Configuration(format!("an Ollama host is required to use {model}")),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

impl<'a> GeminiRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        }
    }
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}

fn envelope(provider: &'static str, message: impl Into<String>) -> ProviderError {
    ProviderError::Envelope {
        provider,
        message: message.into(),
    }
}

/// Extract the first candidate's text from a Gemini `generateContent` body.
fn gemini_text(body: &str) -> Result<String, ProviderError> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(|err| envelope("gemini", err.to_string()))?;
    parsed
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .map(|text| text.trim().to_string())
        .ok_or_else(|| envelope("gemini", "response has no candidate text"))
}

/// Extract the `response` field of a non-streaming Ollama generate body.
fn ollama_text(body: &str) -> Result<String, ProviderError> {
    let parsed: OllamaResponse =
        serde_json::from_str(body).map_err(|err| envelope("ollama", err.to_string()))?;
    parsed
        .response
        .map(|text| text.trim().to_string())
        .ok_or_else(|| envelope("ollama", "response field missing"))
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_model_specs() {
        let spec: ModelSpec = "gemini:gemini-2.5-flash".parse().expect("parse");
        assert_eq!(spec, ModelSpec::new(ProviderKind::Gemini, "gemini-2.5-flash"));

        let spec: ModelSpec = "Ollama:llama3:8b".parse().expect("parse");
        assert_eq!(spec.provider, ProviderKind::Ollama);
        assert_eq!(spec.model, "llama3:8b");
        assert_eq!(spec.to_string(), "ollama:llama3:8b");
    }

    #[test]
    fn rejects_unknown_provider_and_missing_model() {
        for raw in ["openai:gpt-4", "gemini", "ollama:  "] {
            let err = raw.parse::<ModelSpec>().unwrap_err();
            assert!(matches!(err, GameError::Configuration(_)), "{raw}");
        }
    }

    #[test]
    fn gemini_request_shape() {
        let body = serde_json::to_value(GeminiRequest::new("hola")).expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({"contents": [{"parts": [{"text": "hola"}]}]})
        );
    }

    #[test]
    fn extracts_gemini_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":" sí \n"}],"role":"model"}}]}"#;
        assert_eq!(gemini_text(body).expect("text"), "sí");

        let err = gemini_text(r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Envelope { .. }));
        assert!(gemini_text("not json").is_err());
    }

    #[test]
    fn extracts_ollama_response() {
        assert_eq!(
            ollama_text(r#"{"model":"llama3","response":"no","done":true}"#).expect("text"),
            "no"
        );
        assert!(ollama_text(r#"{"done":true}"#).is_err());
    }

    #[test]
    fn preflight_requires_gemini_key() {
        let provider = HttpProvider::new(ProviderSettings {
            gemini_api_key: None,
            ollama_host: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(1),
        })
        .expect("client");
        let gemini = ModelSpec::new(ProviderKind::Gemini, "gemini-2.5-flash");
        let ollama = ModelSpec::new(ProviderKind::Ollama, "llama3");
        assert!(matches!(
            provider.preflight(&gemini),
            Err(GameError::Configuration(_))
        ));
        assert!(provider.preflight(&ollama).is_ok());
        assert!(matches!(
            provider.generate(&gemini, "hola"),
            Err(ProviderError::MissingCredential { .. })
        ));
    }

    #[test]
    fn truncates_long_error_bodies() {
        let long = "x".repeat(10);
        assert_eq!(truncate(&long, 4), "xxxx…");
        assert_eq!(truncate("short", 10), "short");
    }
}
