//! Final match summary and its headline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::challenge::ChallengeContext;
use crate::core::format::MatchFormat;
use crate::core::state::RunnerState;
use crate::core::types::Outcome;

/// Persisted result of a match (`summary.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub turns_played: u32,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub game_time_seconds: f64,
}

/// Derive the summary of a finished match.
pub fn build_summary(
    state: &RunnerState,
    format: MatchFormat,
    context: &ChallengeContext,
    game_time: Duration,
) -> Summary {
    let winner = format
        .winner(state.turn, state.outcome)
        .map(|seat| context.player_name(seat).to_string());
    Summary {
        turns_played: state.turn,
        outcome: state.outcome,
        winner,
        game_time_seconds: round_centis(game_time),
    }
}

/// Human-readable headline for the status comment.
pub fn headline(format: MatchFormat, summary: &Summary) -> String {
    match format {
        MatchFormat::Duel => match &summary.winner {
            Some(winner) => format!(":tada::tada: {winner} wins this round! :tada::tada:"),
            None => ":sweat_smile: Womp womp. It's a draw!".to_string(),
        },
        MatchFormat::Solo => match summary.outcome {
            Outcome::Win => ":tada::tada: You won this round! :tada::tada:".to_string(),
            Outcome::TimeOut => {
                ":sweat_smile: Womp womp. Your solution didn't pan out in time.".to_string()
            }
            Outcome::Running | Outcome::Loss | Outcome::Draw => {
                ":sweat_smile: Womp womp. Your solution didn't make it this time.".to_string()
            }
        },
    }
}

/// Seconds with two decimals, the precision shown in status lines.
pub fn round_centis(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 100.0).round() / 100.0
}
