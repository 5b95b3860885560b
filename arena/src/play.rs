//! Orchestration shared by `arena duel` and `arena solo`.
//!
//! A match runs in fixed stages, each reported in the status comment:
//! fetch the branches, set up the game, play until done, publish the summary.
//! Any failure aborts the match and is appended to the status comment.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::core::challenge::ChallengeContext;
use crate::core::format::MatchFormat;
use crate::core::summary::{Summary, build_summary};
use crate::core::types::{PlayerLabel, TurnRecord};
use crate::error::match_error;
use crate::io::config::{ArenaConfig, PathsConfig};
use crate::io::context::{load_context, load_runnable_config, write_summary};
use crate::io::git::BranchSource;
use crate::io::hosting::Hosting;
use crate::io::invoker::{Invoker, Runnable};
use crate::io::status::StatusBoard;
use crate::io::wire::WireDecoder;
use crate::looping::{run_loop, run_setup};
use crate::turn::Table;

/// External collaborators of a match.
pub struct Services<'a, I: Invoker + ?Sized, H: Hosting + ?Sized, B: BranchSource + ?Sized> {
    pub invoker: &'a I,
    pub hosting: &'a H,
    pub branches: &'a B,
}

/// Programs taking part in a match.
#[derive(Debug, Clone)]
pub(crate) struct Seating {
    pub game: Runnable,
    pub players: BTreeMap<PlayerLabel, Runnable>,
}

/// Load the context at `context_path` and play it to the end in `format`.
///
/// Relative paths from `cfg` are resolved against `root`. The summary is
/// written to the configured summary path and returned.
pub fn run_match<I, H, B>(
    format: MatchFormat,
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
    let context = load_context(context_path)?;
    let mut board = StatusBoard::for_context(services.hosting, &context);
    info!(
        format = format.as_str(),
        game = %context.game,
        challenger = %context.challenger,
        "starting match"
    );

    let attempt = (|| -> Result<Summary> {
        let paths = cfg.rooted(root);
        let fetch_started = Instant::now();
        let seating = match format {
            MatchFormat::Duel => crate::duel::seat(&context, &paths, services.branches)?,
            MatchFormat::Solo => crate::solo::seat(&context, &paths, services.branches)?,
        };
        let fetched = board.text().fetched(format, fetch_started.elapsed())?;
        board.append(&fetched).context("report fetched branches")?;

        let decoder = WireDecoder::new()?;
        let table = Table {
            format,
            game: &seating.game,
            players: &seating.players,
            invoker: services.invoker,
            decoder: &decoder,
            log_secrets: cfg.log_secrets,
        };
        let state = run_setup(&table)?;

        let turn_limit = match format {
            MatchFormat::Duel => cfg.duel_max_turns,
            MatchFormat::Solo => Some(cfg.solo_max_turns),
        };
        let mut moves: Vec<TurnRecord> = Vec::new();
        let outcome = run_loop(&table, state, turn_limit, |record| {
            if format == MatchFormat::Solo {
                moves.push(record.clone());
            }
        })?;

        let summary = build_summary(&outcome.state, format, &context, outcome.game_time);
        let report = board.text().summary(format, &summary, &moves)?;
        board.append(&report).context("report summary")?;
        write_summary(&paths.summary, &summary)?;
        Ok(summary)
    })();

    match attempt {
        Ok(summary) => {
            info!(
                turns = summary.turns_played,
                outcome = %summary.outcome,
                winner = ?summary.winner,
                "match complete"
            );
            Ok(summary)
        }
        Err(err) => {
            error!(kind = ?match_error(&err), "match failed: {err:#}");
            if let Err(report_err) = report_failure(&mut board, &err) {
                warn!("could not report failure: {report_err:#}");
            }
            Err(err)
        }
    }
}

/// Text shown to players when a stage fails.
pub(crate) fn failure_message(err: &anyhow::Error) -> String {
    match match_error(err) {
        Some(kind) => format!("{kind}"),
        None => format!("{err:#}"),
    }
}

fn report_failure<H: Hosting + ?Sized>(
    board: &mut StatusBoard<'_, H>,
    err: &anyhow::Error,
) -> Result<()> {
    let block = board.text().failure(&failure_message(err))?;
    board.append(&block)?;
    Ok(())
}

/// Load the runnable config in `root` and label it for `seat`.
pub(crate) fn seat_player(
    context: &ChallengeContext,
    paths: &PathsConfig,
    seat: PlayerLabel,
    root: &Path,
) -> Result<Runnable> {
    let label = format!("player {seat} ({})", context.player_name(seat));
    let config = load_runnable_config(root, &paths.player_config)
        .with_context(|| format!("load {label}"))?;
    Ok(config.into_runnable(label, root))
}

/// The game runtime inside the materialized game branch.
pub(crate) fn game_runnable(context: &ChallengeContext, paths: &PathsConfig) -> Runnable {
    Runnable {
        label: format!("game runtime ({})", context.game),
        runner_type: context.game_details.runner_type,
        path: paths.game_root.join(&context.game_details.path),
    }
}
