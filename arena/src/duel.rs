//! `arena duel`: the challenger's checkout against the challengee's branch.

use std::collections::BTreeMap;
use std::path::Path;
use std::thread;

use anyhow::{Result, anyhow};
use tracing::info;

use crate::core::challenge::ChallengeContext;
use crate::core::format::MatchFormat;
use crate::core::summary::Summary;
use crate::core::types::PlayerLabel;
use crate::io::config::{ArenaConfig, PathsConfig};
use crate::io::git::BranchSource;
use crate::io::hosting::Hosting;
use crate::io::invoker::Invoker;
use crate::play::{Seating, Services, game_runnable, run_match, seat_player};

/// Run a two-player match for the context at `context_path`.
pub fn run_duel<I, H, B>(
    root: &Path,
    context_path: &Path,
    cfg: &ArenaConfig,
    services: &Services<'_, I, H, B>,
) -> Result<Summary>
where
    I: Invoker + ?Sized,
    H: Hosting + ?Sized,
    B: BranchSource + ?Sized,
{
    run_match(MatchFormat::Duel, root, context_path, cfg, services)
}

/// Fetch the game and challengee branches side by side, then seat both
/// players. The challenger plays from its own checkout.
pub(crate) fn seat<B: BranchSource + ?Sized>(
    context: &ChallengeContext,
    paths: &PathsConfig,
    branches: &B,
) -> Result<Seating> {
    let challengee_branch = context
        .challengee_branch
        .as_deref()
        .ok_or_else(|| anyhow!("challenge context has no challengee branch"))?;

    thread::scope(|scope| -> Result<()> {
        let game = scope.spawn(|| branches.materialize(&context.runner_branch, &paths.game_root));
        let challengee =
            scope.spawn(|| branches.materialize(challengee_branch, &paths.challengee_root));
        let game = game
            .join()
            .map_err(|_| anyhow!("game branch fetch panicked"))?;
        let challengee = challengee
            .join()
            .map_err(|_| anyhow!("challengee branch fetch panicked"))?;
        game.and(challengee)
    })?;
    info!(
        runner_branch = %context.runner_branch,
        challengee_branch,
        "branches fetched"
    );

    let players = BTreeMap::from([
        (
            PlayerLabel::P1,
            seat_player(context, paths, PlayerLabel::P1, &paths.challenger_root)?,
        ),
        (
            PlayerLabel::P2,
            seat_player(context, paths, PlayerLabel::P2, &paths.challengee_root)?,
        ),
    ]);

    Ok(Seating {
        game: game_runnable(context, paths),
        players,
    })
}
