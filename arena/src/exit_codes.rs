//! Stable exit codes for arena CLI commands.

/// The command completed; for `duel` and `solo` a summary was written.
pub const OK: i32 = 0;
/// Any fatal error: bad input, a failed subprocess or a hosting failure.
pub const INVALID: i32 = 1;
