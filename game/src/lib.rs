//! Black Stories deduction game engine.
//!
//! One or more Detective agents interrogate a Narrator agent, each backed by a
//! text-generation provider, to uncover the hidden solution of a generated
//! mystery. The architecture keeps the same strict separation throughout:
//!
//! - **[`core`]**: Pure, deterministic logic (lineage state machine, intent
//!   classification, answer normalisation, JSON repair, winner arbitration).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (provider HTTP calls, configuration,
//!   prompt rendering, transcripts).
//! - **[`roles`]**: The agents of a match (generator, narrator, detective,
//!   council members, hint giver), each a thin wrapper around one prompt and
//!   its retry discipline.
//!
//! Orchestration modules under [`modes`] drive the roles through the turn
//! scheduler and emit an ordered [`events::GameEvent`] stream.

pub mod core;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod modes;
pub mod roles;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
