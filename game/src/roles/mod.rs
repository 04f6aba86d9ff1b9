//! Agents of a match.
//!
//! Each role wraps one prompt family and its retry discipline. Roles own an
//! `Arc<dyn Provider>` so they can be shared with fight worker threads.

pub mod council;
pub mod detective;
pub mod generator;
pub mod hint;
pub mod narrator;

use tracing::warn;

use crate::error::ProviderError;
use crate::io::provider::{ModelSpec, Provider};

/// Call the provider, retrying up to `retries` extra times on failure.
pub(crate) fn generate_with_retries(
    provider: &dyn Provider,
    model: &ModelSpec,
    prompt: &str,
    retries: u32,
) -> Result<String, ProviderError> {
    let mut attempt = 0;
    loop {
        match provider.generate(model, prompt) {
            Ok(text) => return Ok(text),
            Err(err) if attempt < retries => {
                attempt += 1;
                warn!(model = %model, attempt, retries, error = %err, "provider call failed, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}
