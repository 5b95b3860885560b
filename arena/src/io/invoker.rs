//! Subprocess invoker for player and game-runtime executables.
//!
//! The [`Invoker`] trait decouples the game loop from process spawning. Tests
//! use scripted invokers that return predetermined stdout without spawning
//! anything; [`ProcessInvoker`] is the real backend.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::RegexSet;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::core::challenge::RunnerType;
use crate::core::types::Blob;
use crate::error::MatchError;
use crate::io::process::run_command_with_timeout;

/// Longest stderr excerpt carried in a non-zero exit error.
const STDERR_EXCERPT_BYTES: usize = 2_000;

/// An executable the loop can invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runnable {
    /// Name used in logs and error messages (e.g. `player P1 (alice)`).
    pub label: String,
    pub runner_type: RunnerType,
    pub path: PathBuf,
}

impl fmt::Display for Runnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Positional argument passed after the executable path.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Encoded as compact JSON text.
    Json(Blob),
    /// Passed verbatim.
    Text(String),
}

impl Arg {
    /// Encode any serializable value as a JSON argument.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value).context("encode argument")?;
        Ok(Self::Json(Blob::new(value)))
    }

    pub fn to_os_string(&self) -> OsString {
        match self {
            Arg::Json(blob) => blob.to_json().into(),
            Arg::Text(text) => text.into(),
        }
    }
}

/// Captured output of a successful invocation. Stdout is complete and valid
/// UTF-8; oversized or non-UTF-8 stdout fails the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub stdout: String,
    pub stderr: String,
}

/// Abstraction over subprocess execution.
pub trait Invoker {
    /// Run `runnable` with `args`. Timeouts and non-zero exits are errors
    /// carrying a [`MatchError`].
    fn invoke(&self, runnable: &Runnable, args: &[Arg]) -> Result<Invocation>;
}

/// Removes hosting-platform credentials from a child environment.
#[derive(Debug, Clone)]
pub struct EnvScrubber {
    patterns: RegexSet,
}

impl EnvScrubber {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = RegexSet::new(patterns).context("compile env scrub patterns")?;
        Ok(Self { patterns })
    }

    pub fn is_scrubbed(&self, name: &str) -> bool {
        self.patterns.is_match(name)
    }

    /// Keep only the variables whose names match no pattern.
    pub fn filter<I>(&self, vars: I) -> Vec<(OsString, OsString)>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        vars.into_iter()
            .filter(|(name, _)| !self.is_scrubbed(&name.to_string_lossy()))
            .collect()
    }
}

/// Invoker that spawns real processes with a hard timeout and a scrubbed
/// environment.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    timeout: Duration,
    output_limit_bytes: usize,
    scrubber: EnvScrubber,
}

impl ProcessInvoker {
    pub fn new(timeout: Duration, output_limit_bytes: usize, scrubber: EnvScrubber) -> Self {
        Self {
            timeout,
            output_limit_bytes,
            scrubber,
        }
    }

    fn command(&self, runnable: &Runnable, args: &[Arg]) -> Command {
        let mut cmd = match runnable.runner_type.interpreter() {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(&runnable.path);
                cmd
            }
            None => Command::new(&runnable.path),
        };
        cmd.args(args.iter().map(Arg::to_os_string));
        cmd.env_clear()
            .envs(self.scrubber.filter(std::env::vars_os()));
        cmd
    }
}

impl Invoker for ProcessInvoker {
    #[instrument(skip_all, fields(program = %runnable.label, args = args.len()))]
    fn invoke(&self, runnable: &Runnable, args: &[Arg]) -> Result<Invocation> {
        let cmd = self.command(runnable, args);
        debug!(path = %runnable.path.display(), "invoking");
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run {runnable}"))?;

        if output.timed_out {
            return Err(MatchError::SubprocessTimeout {
                program: runnable.label.clone(),
                timeout: self.timeout,
            }
            .into());
        }
        let stderr = output.stderr_text();
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "invocation failed");
            return Err(MatchError::SubprocessExit {
                program: runnable.label.clone(),
                code: output.status.code(),
                stderr: tail(stderr.trim(), STDERR_EXCERPT_BYTES).to_string(),
            }
            .into());
        }

        if output.stdout_truncated > 0 {
            return Err(MatchError::parse(format!(
                "{runnable} printed more than {} bytes",
                self.output_limit_bytes
            ))
            .into());
        }
        let stdout = String::from_utf8(output.stdout)
            .map_err(|err| MatchError::parse(format!("{runnable} printed invalid UTF-8: {err}")))?;

        Ok(Invocation { stdout, stderr })
    }
}

/// Last `max` bytes of `text`, cut at a char boundary.
fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
