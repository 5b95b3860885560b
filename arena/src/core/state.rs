//! Runner state and its per-turn transition rules.

use std::collections::BTreeMap;

use crate::core::types::{Blob, Outcome, PlayerLabel, RunnerOutput, SetupOutput};
use crate::error::MatchError;

/// Canonical state of one match, owned by the game loop for its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerState {
    pub turn: u32,
    pub is_done: bool,
    pub outcome: Outcome,
    pub game_data: Blob,
    pub game_secrets: Blob,
    pub player_stash: BTreeMap<PlayerLabel, Blob>,
}

impl RunnerState {
    /// Fresh state seeded from the runtime's setup response.
    ///
    /// Every seat starts with a `null` stash; absent setup fields become `{}`.
    pub fn new(players: &[PlayerLabel], setup: SetupOutput) -> Self {
        Self {
            turn: 0,
            is_done: false,
            outcome: Outcome::Running,
            game_data: setup.game_data.unwrap_or_else(Blob::empty_object),
            game_secrets: setup.game_secrets.unwrap_or_else(Blob::empty_object),
            player_stash: players.iter().map(|p| (*p, Blob::default())).collect(),
        }
    }

    /// Advance the turn counter. Returns the new turn number.
    pub fn begin_turn(&mut self) -> u32 {
        debug_assert!(!self.is_done, "turn started after the match ended");
        self.turn += 1;
        self.turn
    }

    pub fn stash(&self, player: PlayerLabel) -> &Blob {
        static NULL: Blob = Blob::null();
        self.player_stash.get(&player).unwrap_or(&NULL)
    }

    pub fn replace_stash(&mut self, player: PlayerLabel, stash: Blob) {
        self.player_stash.insert(player, stash);
    }

    /// Merge a runtime response into the state.
    ///
    /// Public and secret state are replaced wholesale when present. An embedded
    /// runner report sets `is_done` and `outcome`; a report that claims the match
    /// is done while still `running` is rejected.
    pub fn apply(&mut self, output: RunnerOutput) -> Result<(), MatchError> {
        if let Some(report) = output.runner_state
            && report.done
            && !report.outcome.is_terminal()
        {
            return Err(MatchError::parse(
                "runtime reported done with a non-terminal outcome",
            ));
        }

        if let Some(secrets) = output.game_secrets {
            self.game_secrets = secrets;
        }
        if let Some(data) = output.game_data {
            self.game_data = data;
        }
        if let Some(report) = output.runner_state {
            // is_done never flips back once set.
            self.is_done = self.is_done || report.done;
            self.outcome = report.outcome;
        }
        Ok(())
    }

    /// Force a time-out once `limit` turns have been played without a result.
    ///
    /// Returns `true` when the ceiling fired.
    pub fn enforce_turn_limit(&mut self, limit: Option<u32>) -> bool {
        match limit {
            Some(limit) if !self.is_done && self.turn >= limit => {
                self.is_done = true;
                self.outcome = Outcome::TimeOut;
                true
            }
            _ => false,
        }
    }
}
