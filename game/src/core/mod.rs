//! Deterministic, pure logic shared by the game core.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod answer;
pub mod arbitration;
pub mod difficulty;
pub mod intent;
pub mod invariants;
pub mod repair;
pub mod state;
pub mod types;
