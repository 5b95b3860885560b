//! Match formats: who plays when, and who won.
//!
//! The game loop is generic over a [`MatchFormat`]; the format supplies the
//! seating, the turn-order policy, the role token passed to the runtime and
//! the terminal-outcome-to-winner mapping.

use crate::core::types::{Outcome, PlayerLabel};

/// Literal role token inserted before the action in solo runtime invocations.
pub const SOLO_ROLE_TOKEN: &str = "player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFormat {
    /// Challenger (`P1`) against challengee (`P2`).
    Duel,
    /// A single participant against the game itself.
    Solo,
}

impl MatchFormat {
    pub fn players(self) -> &'static [PlayerLabel] {
        match self {
            MatchFormat::Duel => &[PlayerLabel::P1, PlayerLabel::P2],
            MatchFormat::Solo => &[PlayerLabel::P1],
        }
    }

    /// Player who moves on `turn` (1-indexed). Duel: `P1` iff `turn` is odd.
    pub fn active_player(self, turn: u32) -> PlayerLabel {
        match self {
            MatchFormat::Duel if turn % 2 == 1 => PlayerLabel::P1,
            MatchFormat::Duel => PlayerLabel::P2,
            MatchFormat::Solo => PlayerLabel::P1,
        }
    }

    /// Extra positional argument placed before the action for the runtime.
    pub fn role_token(self) -> Option<&'static str> {
        match self {
            MatchFormat::Duel => None,
            MatchFormat::Solo => Some(SOLO_ROLE_TOKEN),
        }
    }

    /// Seat credited with the win for a finished match.
    ///
    /// Duel attribution keeps the historical parity rule. Only a draw has no
    /// winner. An odd final turn with `win` goes to `P1`; every other
    /// combination, `time_out` included, goes to `P2`.
    pub fn winner(self, turn: u32, outcome: Outcome) -> Option<PlayerLabel> {
        match (self, outcome) {
            (_, Outcome::Running | Outcome::Draw) => None,
            (MatchFormat::Duel, Outcome::Win) if turn % 2 == 1 => Some(PlayerLabel::P1),
            (MatchFormat::Duel, _) => Some(PlayerLabel::P2),
            (MatchFormat::Solo, Outcome::Win) => Some(PlayerLabel::P1),
            (MatchFormat::Solo, _) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchFormat::Duel => "duel",
            MatchFormat::Solo => "solo",
        }
    }
}
