//! One turn of a match: ask the active player for a move, then let the game
//! runtime apply it.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, info_span};

use crate::core::format::MatchFormat;
use crate::core::state::RunnerState;
use crate::core::types::{PlayerInput, PlayerLabel, TurnRecord};
use crate::io::invoker::{Arg, Invoker, Runnable};
use crate::io::wire::WireDecoder;

/// Everything a match needs besides its state.
pub struct Table<'a, I: Invoker + ?Sized> {
    pub format: MatchFormat,
    pub game: &'a Runnable,
    pub players: &'a BTreeMap<PlayerLabel, Runnable>,
    pub invoker: &'a I,
    pub decoder: &'a WireDecoder,
    /// Log secret game state at debug level.
    pub log_secrets: bool,
}

impl<I: Invoker + ?Sized> Table<'_, I> {
    fn player(&self, seat: PlayerLabel) -> Result<&Runnable> {
        self.players
            .get(&seat)
            .ok_or_else(|| anyhow!("no program seated as {seat}"))
    }
}

/// Play the next turn and return what was played.
///
/// The player is invoked with `{publicState, stash}` and must answer with
/// `{action, stash}`; its stash is replaced before the runtime sees the action.
/// The runtime receives `gameSecrets gameData [role] action`.
pub fn play_turn<I: Invoker + ?Sized>(
    table: &Table<'_, I>,
    state: &mut RunnerState,
) -> Result<TurnRecord> {
    let turn = state.begin_turn();
    let seat = table.format.active_player(turn);
    let player = table.player(seat)?;
    let span = info_span!("turn", turn, player = %seat);
    let _enter = span.enter();

    let input = Arg::json(&PlayerInput {
        public_state: &state.game_data,
        stash: state.stash(seat),
    })?;
    let invocation = table
        .invoker
        .invoke(player, &[input])
        .with_context(|| format!("turn {turn}: {player} move"))?;
    let output = table
        .decoder
        .player(&player.label, &invocation.stdout)
        .with_context(|| format!("turn {turn}: {player} move"))?;
    state.replace_stash(seat, output.stash);

    let mut args = vec![
        Arg::Json(state.game_secrets.clone()),
        Arg::Json(state.game_data.clone()),
    ];
    if let Some(role) = table.format.role_token() {
        args.push(Arg::Text(role.to_string()));
    }
    args.push(Arg::Json(output.action.clone()));

    let invocation = table
        .invoker
        .invoke(table.game, &args)
        .with_context(|| format!("turn {turn}: {} applying move", table.game))?;
    let update = table
        .decoder
        .runner(&table.game.label, &invocation.stdout)
        .with_context(|| format!("turn {turn}: {} applying move", table.game))?;
    state
        .apply(update)
        .with_context(|| format!("turn {turn}: {} applying move", table.game))?;

    info!(
        action = %output.action,
        public_state = %state.game_data,
        done = state.is_done,
        outcome = %state.outcome,
        "turn played"
    );
    if table.log_secrets {
        debug!(secrets = %state.game_secrets, "secret state");
    }

    Ok(TurnRecord {
        turn,
        player: seat,
        action: output.action,
    })
}
