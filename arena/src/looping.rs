//! The game loop shared by duels and solo runs.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::core::state::RunnerState;
use crate::core::types::TurnRecord;
use crate::io::invoker::Invoker;
use crate::turn::{Table, play_turn};

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStop {
    /// The runtime reported a terminal outcome.
    Finished,
    /// The turn ceiling was reached and the match was timed out.
    TurnLimit { limit: u32 },
}

/// Final state of a loop invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub state: RunnerState,
    pub stop: LoopStop,
    /// Wall-clock time spent playing turns.
    pub game_time: Duration,
}

/// Invoke the runtime with no arguments and seed a fresh state from its answer.
pub fn run_setup<I: Invoker + ?Sized>(table: &Table<'_, I>) -> Result<RunnerState> {
    let invocation = table
        .invoker
        .invoke(table.game, &[])
        .with_context(|| format!("{} setup", table.game))?;
    let setup = table
        .decoder
        .setup(&table.game.label, &invocation.stdout)
        .with_context(|| format!("{} setup", table.game))?;
    let state = RunnerState::new(table.format.players(), setup);
    info!(format = table.format.as_str(), public_state = %state.game_data, "game set up");
    if table.log_secrets {
        debug!(secrets = %state.game_secrets, "initial secret state");
    }
    Ok(state)
}

/// Play turns until the runtime reports the match done or `turn_limit` turns
/// have been played.
///
/// Stops immediately on any error; there is no retry and no partial-turn
/// recovery. `on_turn` sees every completed turn in order.
pub fn run_loop<I: Invoker + ?Sized, F: FnMut(&TurnRecord)>(
    table: &Table<'_, I>,
    mut state: RunnerState,
    turn_limit: Option<u32>,
    mut on_turn: F,
) -> Result<LoopOutcome> {
    let started = Instant::now();
    let mut stop = LoopStop::Finished;
    while !state.is_done {
        let record = play_turn(table, &mut state)?;
        on_turn(&record);
        if state.enforce_turn_limit(turn_limit)
            && let Some(limit) = turn_limit
        {
            warn!(limit, "turn limit reached, timing out");
            stop = LoopStop::TurnLimit { limit };
        }
    }
    let game_time = started.elapsed();
    info!(
        turns = state.turn,
        outcome = %state.outcome,
        elapsed_ms = game_time.as_millis() as u64,
        "match finished"
    );
    Ok(LoopOutcome {
        state,
        stop,
        game_time,
    })
}
