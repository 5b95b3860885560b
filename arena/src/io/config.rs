//! Arena configuration stored in `arena.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Environment variable that turns on secret-state logging.
pub const DEBUG_ENV: &str = "ARENA_DEBUG";

/// Arena configuration (TOML).
///
/// Missing fields default to the values the CI workflow has always used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ArenaConfig {
    /// Hard wall-clock limit for every subprocess invocation.
    pub exec_timeout_ms: u64,

    /// Truncate subprocess stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Turn ceiling for solo runs; reaching it ends the run as `time_out`.
    pub solo_max_turns: u32,

    /// Optional turn ceiling for duels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duel_max_turns: Option<u32>,

    /// Log secret game state at debug level.
    pub log_secrets: bool,

    /// Regexes; environment variables whose names match any of them are not
    /// passed to players or game runtimes.
    pub scrub_env_patterns: Vec<String>,

    pub paths: PathsConfig,
}

/// Working-directory layout of a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the runner branch (holding the games) is materialized.
    pub game_root: PathBuf,
    /// The challenger's checkout.
    pub challenger_root: PathBuf,
    /// Where the challengee's branch is materialized.
    pub challengee_root: PathBuf,
    /// File name of a participant's runnable config, relative to its root.
    pub player_config: PathBuf,
    pub context: PathBuf,
    pub summary: PathBuf,
    pub manifest: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            game_root: PathBuf::from("branches/game"),
            challenger_root: PathBuf::from("."),
            challengee_root: PathBuf::from("branches/player2"),
            player_config: PathBuf::from("player.config.json"),
            context: PathBuf::from("challengeContext.json"),
            summary: PathBuf::from("summary.json"),
            manifest: PathBuf::from("games.toml"),
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            exec_timeout_ms: 5_000,
            output_limit_bytes: 1_000_000,
            solo_max_turns: 50,
            duel_max_turns: None,
            log_secrets: false,
            scrub_env_patterns: [
                "^GITHUB_", "^GH_", "^ACTIONS_", "^RUNNER_", "TOKEN", "SECRET",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            paths: PathsConfig::default(),
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.exec_timeout_ms == 0 {
            return Err(anyhow!("exec_timeout_ms must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.solo_max_turns == 0 {
            return Err(anyhow!("solo_max_turns must be > 0"));
        }
        if self.duel_max_turns == Some(0) {
            return Err(anyhow!("duel_max_turns must be > 0 when set"));
        }
        for pattern in &self.scrub_env_patterns {
            Regex::new(pattern)
                .with_context(|| format!("invalid scrub_env_patterns entry '{pattern}'"))?;
        }
        Ok(())
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_millis(self.exec_timeout_ms)
    }

    /// Resolve every configured path against `root`.
    pub fn rooted(&self, root: &Path) -> PathsConfig {
        let p = &self.paths;
        PathsConfig {
            game_root: root.join(&p.game_root),
            challenger_root: root.join(&p.challenger_root),
            challengee_root: root.join(&p.challengee_root),
            player_config: p.player_config.clone(),
            context: root.join(&p.context),
            summary: root.join(&p.summary),
            manifest: root.join(&p.manifest),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ArenaConfig::default()`. Setting
/// `ARENA_DEBUG` in the environment turns on `log_secrets`.
pub fn load_config(path: &Path) -> Result<ArenaConfig> {
    let mut cfg = if path.exists() {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?
    } else {
        ArenaConfig::default()
    };
    if std::env::var_os(DEBUG_ENV).is_some_and(|v| !v.is_empty()) {
        cfg.log_secrets = true;
    }
    cfg.validate()?;
    Ok(cfg)
}
