//! Stable exit codes for the `black-stories` CLI.

/// The detective side won (solo victory or a fight with a winner).
pub const OK: i32 = 0;
/// The game could not start or aborted on an error.
pub const ERROR: i32 = 1;
/// The game finished without a victory.
pub const DEFEAT: i32 = 2;
