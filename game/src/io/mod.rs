//! Side-effecting helpers: provider calls, configuration, prompts, transcripts.

pub mod config;
pub mod prompt;
pub mod provider;
pub mod structured;
pub mod transcript;
