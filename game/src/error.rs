//! Error taxonomy shared by roles and coordinators.
//!
//! Binaries wrap these in `anyhow`; library layers keep them typed so that
//! coordinators can decide between retrying, degrading and aborting.

use thiserror::Error;

/// Failure of a single text-generation call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} request timed out after {timeout_secs}s")]
    Timeout {
        provider: &'static str,
        timeout_secs: u64,
    },
    #[error("{provider} returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} requires {variable} to be set")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },
    #[error("{provider} response envelope malformed: {message}")]
    Envelope {
        provider: &'static str,
        message: String,
    },
}

/// Any error that can end a lineage, a request, or a session.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider answered, but not in the shape the role requires.
    #[error("{what} did not follow the expected format after {attempts} attempt(s): {detail} (raw: {raw:?})")]
    Format {
        what: &'static str,
        attempts: u32,
        detail: String,
        raw: String,
    },

    /// A scheduler invariant was broken. Always an implementation bug.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The caller supplied input the current turn cannot accept.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] minijinja::Error),

    /// The event consumer went away; the game stops before the next turn.
    #[error("session abandoned by caller")]
    Abandoned,
}

impl GameError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// True for errors caused by the caller rather than by the game or a provider.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Configuration(_))
    }
}
