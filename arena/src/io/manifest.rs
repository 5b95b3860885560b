//! Registry of playable games (`games.toml`).
//!
//! ```toml
//! [games.ctf]
//! description = "Capture the flag on a 4x4 grid"
//! path = "games/capture-the-flag/index.js"
//! runnerType = "node"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::challenge::GameDetails;
use crate::error::MatchError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameManifest {
    #[serde(default)]
    pub games: BTreeMap<String, GameDetails>,
}

impl GameManifest {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parse game manifest")
    }

    /// Look up a game by id.
    pub fn resolve(&self, game: &str) -> Result<&GameDetails, MatchError> {
        self.games
            .get(game)
            .ok_or_else(|| MatchError::UnknownGame(game.to_string()))
    }
}

pub fn load_manifest(path: &Path) -> Result<GameManifest> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    GameManifest::parse(&raw).with_context(|| format!("load {}", path.display()))
}
