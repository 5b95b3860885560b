//! `arena solo`: a single participant against the game itself.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
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

/// Run a solo match for the context at `context_path`.
///
/// The run is timed out after `cfg.solo_max_turns` turns, and the final
/// status block lists every move played.
pub fn run_solo<I, H, B>(
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
    run_match(MatchFormat::Solo, root, context_path, cfg, services)
}

pub(crate) fn seat<B: BranchSource + ?Sized>(
    context: &ChallengeContext,
    paths: &PathsConfig,
    branches: &B,
) -> Result<Seating> {
    branches.materialize(&context.runner_branch, &paths.game_root)?;
    info!(runner_branch = %context.runner_branch, "game branch fetched");

    let player = seat_player(context, paths, PlayerLabel::P1, &paths.challenger_root)?;
    Ok(Seating {
        game: game_runnable(context, paths),
        players: BTreeMap::from([(PlayerLabel::P1, player)]),
    })
}
