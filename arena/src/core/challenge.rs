//! Challenge comments and the resolved challenge context.
//!
//! A challenge is requested in a pull-request comment. Two phrasings are
//! understood:
//!
//! - `I challenge <branch> at <game>` starts a duel against another branch;
//! - `I play <game>` starts a solo run against the game itself.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::format::MatchFormat;
use crate::core::types::PlayerLabel;
use crate::error::MatchError;

/// Shown to the challenger when the comment cannot be parsed.
pub const EXPECTED_FORMAT: &str =
    "The expected format is \"I challenge `branch` at `game`.\" or \"I play `game`.\".";

static DUEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[Ii] challenge `?(?<other>[A-Za-z0-9/-]+)`? at `?(?<game>[A-Za-z0-9-]+)`?\.?$")
        .unwrap()
});

static SOLO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[Ii] play `?(?<game>[A-Za-z0-9-]+)`?\.?$").unwrap());

/// What a challenge comment asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    /// Branch of the opponent; `None` for a solo run.
    pub opponent: Option<String>,
    pub game: String,
}

impl ChallengeRequest {
    pub fn format(&self) -> MatchFormat {
        if self.opponent.is_some() {
            MatchFormat::Duel
        } else {
            MatchFormat::Solo
        }
    }
}

/// Parse a challenge comment. Surrounding whitespace is ignored.
pub fn parse_challenge(text: &str) -> Result<ChallengeRequest, MatchError> {
    let text = text.trim();
    if let Some(caps) = DUEL_RE.captures(text) {
        return Ok(ChallengeRequest {
            opponent: Some(caps["other"].to_string()),
            game: caps["game"].to_string(),
        });
    }
    if let Some(caps) = SOLO_RE.captures(text) {
        return Ok(ChallengeRequest {
            opponent: None,
            game: caps["game"].to_string(),
        });
    }
    Err(MatchError::parse(format!(
        "failed to parse challenge. {EXPECTED_FORMAT}"
    )))
}

/// How an executable is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerType {
    Node,
    Python,
    Shell,
    /// The path is executed directly.
    Binary,
}

impl RunnerType {
    /// Interpreter to launch the script with, if any.
    pub fn interpreter(self) -> Option<&'static str> {
        match self {
            RunnerType::Node => Some("node"),
            RunnerType::Python => Some("python3"),
            RunnerType::Shell => Some("sh"),
            RunnerType::Binary => None,
        }
    }
}

/// Runtime descriptor of a registered game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDetails {
    #[serde(default)]
    pub description: String,
    pub path: String,
    pub runner_type: RunnerType,
}

/// Resolved challenge, written by `arena prepare` and read by the game loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeContext {
    pub repo_owner: String,
    pub repo_name: String,
    pub pull_number: u64,
    /// Branch holding the games; materialized as the game root.
    pub runner_branch: String,
    pub challenger: String,
    pub challenger_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challengee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challengee_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<u64>,
    pub game: String,
    pub game_details: GameDetails,
}

impl ChallengeContext {
    /// Display name of the participant in `seat`.
    pub fn player_name(&self, seat: PlayerLabel) -> &str {
        match seat {
            PlayerLabel::P1 => &self.challenger,
            PlayerLabel::P2 => self.challengee.as_deref().unwrap_or("challengee"),
        }
    }
}
