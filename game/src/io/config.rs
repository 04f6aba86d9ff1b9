//! Game configuration loaded from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::difficulty::Difficulty;
use crate::io::provider::ModelSpec;

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const OLLAMA_HOST_VAR: &str = "OLLAMA_HOST";
pub const DEFAULT_MODEL: &str = "gemini:gemini-2.5-flash";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Game configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults
/// below. Environment variables and CLI flags override the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    /// Upper bound on a single provider request.
    pub request_timeout_secs: u64,

    /// Reprompts after a non-canonical Narrator answer before failing the lineage.
    pub answer_retries: u32,

    /// Reprompts after an unparseable verdict before failing validation.
    pub validation_retries: u32,

    /// Total mystery generation attempts.
    pub generation_attempts: u32,

    /// Extra attempts after a provider error during validation.
    pub provider_retries: u32,

    /// Run both fight lineages of a round on worker threads.
    pub parallel_fight_turns: bool,

    /// Where completed single-lineage transcripts are written. Disabled when unset.
    pub transcript_dir: Option<PathBuf>,

    pub ollama_host: String,

    pub question_limits: QuestionLimits,

    pub models: ModelDefaults,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuestionLimits {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub fight: usize,
}

impl Default for QuestionLimits {
    fn default() -> Self {
        Self {
            easy: 20,
            medium: 10,
            hard: 5,
            fight: 10,
        }
    }
}

impl QuestionLimits {
    pub fn for_difficulty(&self, difficulty: Difficulty) -> usize {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Fight => self.fight,
        }
    }
}

/// Models used when a request does not name one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelDefaults {
    pub narrator: String,
    pub detective: String,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            narrator: DEFAULT_MODEL.to_string(),
            detective: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            answer_retries: 3,
            validation_retries: 3,
            generation_attempts: 3,
            provider_retries: 2,
            parallel_fight_turns: false,
            transcript_dir: None,
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            question_limits: QuestionLimits::default(),
            models: ModelDefaults::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        let limits = &self.question_limits;
        if limits.hard == 0 || limits.fight == 0 {
            return Err(anyhow!("question limits must be > 0"));
        }
        if !(limits.easy > limits.medium && limits.medium > limits.hard) {
            return Err(anyhow!(
                "question limits must strictly decrease from easy to hard (got {}/{}/{})",
                limits.easy,
                limits.medium,
                limits.hard
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.generation_attempts == 0 {
            return Err(anyhow!("generation_attempts must be > 0"));
        }
        if self.ollama_host.trim().is_empty() {
            return Err(anyhow!("ollama_host must not be empty"));
        }
        for (role, model) in [
            ("narrator", &self.models.narrator),
            ("detective", &self.models.detective),
        ] {
            model
                .parse::<ModelSpec>()
                .map_err(|err| anyhow!("models.{role}: {err}"))?;
        }
        Ok(())
    }

    pub fn question_limit(&self, difficulty: Difficulty) -> usize {
        self.question_limits.for_difficulty(difficulty)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connection settings for the provider backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub gemini_api_key: Option<String>,
    pub ollama_host: String,
    pub timeout: Duration,
}

impl ProviderSettings {
    /// Resolve settings from config plus environment (`lookup` is normally
    /// `std::env::var`).
    pub fn resolve(cfg: &GameConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let gemini_api_key = lookup(GEMINI_API_KEY_VAR).filter(|key| !key.trim().is_empty());
        let ollama_host = lookup(OLLAMA_HOST_VAR)
            .filter(|host| !host.trim().is_empty())
            .unwrap_or_else(|| cfg.ollama_host.clone());
        Self {
            gemini_api_key,
            ollama_host: ollama_host.trim_end_matches('/').to_string(),
            timeout: cfg.request_timeout(),
        }
    }

    pub fn from_env(cfg: &GameConfig) -> Self {
        Self::resolve(cfg, |key| std::env::var(key).ok())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GameConfig::default()`.
pub fn load_config(path: &Path) -> Result<GameConfig> {
    if !path.exists() {
        let cfg = GameConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GameConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &GameConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
