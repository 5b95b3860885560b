//! Shared deterministic types for the match core.
//!
//! These types define stable contracts between the loop and the subprocesses
//! it drives. They carry no I/O and serialize to the exact wire shapes the
//! game runtimes and players exchange.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque JSON value crossing a process boundary.
///
/// Blobs are validated once when a subprocess document is decoded and are
/// passed through verbatim afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(Value);

impl Blob {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub const fn null() -> Self {
        Self(Value::Null)
    }

    /// An empty JSON object, the initial value of public and secret state.
    pub fn empty_object() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Compact JSON text, the form used on argv.
    pub fn to_json(&self) -> String {
        self.0.to_string()
    }
}

impl From<Value> for Blob {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seat at the table. Duels use both, solo runs only `P1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerLabel {
    P1,
    P2,
}

impl PlayerLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerLabel::P1 => "P1",
            PlayerLabel::P2 => "P2",
        }
    }
}

impl fmt::Display for PlayerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match outcome. `Running` is the only non-terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Running,
    Win,
    Loss,
    Draw,
    TimeOut,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::Running
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Running => "running",
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Draw => "draw",
            Outcome::TimeOut => "time_out",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument handed to the active player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInput<'a> {
    pub public_state: &'a Blob,
    pub stash: &'a Blob,
}

/// What a player prints for its move.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerOutput {
    pub action: Blob,
    /// Missing stash decodes as `null`; it still overwrites the previous one.
    #[serde(default)]
    pub stash: Blob,
}

/// What the game runtime prints for the zero-move setup invocation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupOutput {
    #[serde(default)]
    pub game_secrets: Option<Blob>,
    #[serde(default)]
    pub game_data: Option<Blob>,
}

/// Termination report embedded in a runtime response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerReport {
    pub done: bool,
    pub outcome: Outcome,
}

/// What the game runtime prints after applying an action.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerOutput {
    #[serde(default)]
    pub game_data: Option<Blob>,
    #[serde(default)]
    pub game_secrets: Option<Blob>,
    #[serde(default)]
    pub runner_state: Option<RunnerReport>,
}

/// One completed turn, as observed by loop callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRecord {
    pub turn: u32,
    pub player: PlayerLabel,
    pub action: Blob,
}
