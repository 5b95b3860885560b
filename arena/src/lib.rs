//! Turn-based code-game arena.
//!
//! Participants submit programs on branches of a repository. The arena pits
//! them against a game runtime (solo) or against each other (duel), driving
//! every program as a short-lived subprocess that exchanges JSON on argv and
//! stdout, and reports progress on the pull request that asked for the match.
//!
//! - **[`core`]**: Pure, deterministic match logic (state machine, turn order,
//!   winner attribution, summaries). No I/O.
//! - **[`io`]**: Side effects (subprocesses, git, hosting API, files).
//!   Every external system sits behind a trait so drivers can be tested with
//!   scripted fakes.
//!
//! The drivers ([`prepare`], [`duel`], [`solo`]) compose the two behind the
//! CLI commands, sharing the game loop in [`looping`].

pub mod core;
pub mod duel;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod play;
pub mod prepare;
pub mod solo;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
