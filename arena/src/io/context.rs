//! JSON artifacts shared between pipeline stages.
//!
//! The challenge context is written by `arena prepare` and read by the game
//! loops; the summary is written by the loops for later workflow steps. Each
//! participant's checkout carries a `player.config.json` naming its program.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::challenge::{ChallengeContext, RunnerType};
use crate::core::summary::Summary;
use crate::io::invoker::Runnable;

/// How a participant's move-producing program is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnableConfig {
    pub runner_type: RunnerType,
    pub runner_path: PathBuf,
}

impl RunnableConfig {
    /// Resolve against the participant's root.
    pub fn into_runnable(self, label: String, root: &Path) -> Runnable {
        Runnable {
            label,
            runner_type: self.runner_type,
            path: root.join(self.runner_path),
        }
    }
}

pub fn load_context(path: &Path) -> Result<ChallengeContext> {
    debug!(path = %path.display(), "loading challenge context");
    read_json(path, "challenge context")
}

pub fn write_context(path: &Path, context: &ChallengeContext) -> Result<()> {
    debug!(path = %path.display(), game = %context.game, "writing challenge context");
    write_json_atomic(path, context)
}

/// Load `<root>/<file_name>`.
pub fn load_runnable_config(root: &Path, file_name: &Path) -> Result<RunnableConfig> {
    read_json(&root.join(file_name), "runnable config")
}

pub fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    debug!(path = %path.display(), turns = summary.turns_played, "writing summary");
    write_json_atomic(path, summary)
}

pub fn load_summary(path: &Path) -> Result<Summary> {
    read_json(path, "summary")
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {what} {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {what} {}", path.display()))
}

/// Pretty JSON with trailing newline, written via temp file + rename.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf).with_context(|| format!("write temp {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
