//! Failure taxonomy for a match.
//!
//! Every variant is fatal for the match that raised it. Errors travel inside
//! `anyhow::Error` with added context; callers that need the kind recover it
//! with `downcast_ref::<MatchError>()`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Challenge text or subprocess output could not be understood.
    #[error("parse failure: {0}")]
    Parse(String),

    /// The challenge named a game that is not in the manifest.
    #[error("unrecognized game identifier '{0}'")]
    UnknownGame(String),

    #[error("{program} timed out after {}ms", .timeout.as_millis())]
    SubprocessTimeout { program: String, timeout: Duration },

    #[error("{program} exited with status {code:?}: {stderr}")]
    SubprocessExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The source-control hosting API rejected or failed a request.
    #[error("hosting api failure: {0}")]
    Hosting(String),
}

impl MatchError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn hosting(message: impl Into<String>) -> Self {
        Self::Hosting(message.into())
    }
}

/// Find the [`MatchError`] anywhere in an error chain.
pub fn match_error(err: &anyhow::Error) -> Option<&MatchError> {
    err.chain().find_map(|cause| cause.downcast_ref::<MatchError>())
}
