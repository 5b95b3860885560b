//! Arena CLI.
//!
//! Runs the three stages of a challenge workflow: `prepare` resolves a
//! challenge comment, `duel` and `solo` play the match it describes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use arena::duel::run_duel;
use arena::exit_codes;
use arena::io::config::{ArenaConfig, load_config};
use arena::io::git::Git;
use arena::io::hosting::GhHosting;
use arena::io::invoker::{EnvScrubber, ProcessInvoker};
use arena::logging;
use arena::play::Services;
use arena::prepare::{PrepareRequest, prepare_challenge};
use arena::solo::run_solo;

#[derive(Parser)]
#[command(name = "arena", version, about = "Turn-based code-game arena")]
struct Cli {
    /// Arena configuration file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "arena.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a challenge comment and write the challenge context.
    Prepare {
        /// Repository as `owner/name`.
        repo: String,
        /// Branch holding the games.
        runner_branch: String,
        /// Pull request the challenge was posted on.
        pull_number: u64,
        /// Body of the challenge comment.
        comment: String,
    },
    /// Play a two-player match.
    Duel {
        /// Challenge context written by `arena prepare`.
        context: PathBuf,
    },
    /// Play a single participant against the game.
    Solo {
        /// Challenge context written by `arena prepare`.
        context: PathBuf,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;
    let root = std::env::current_dir().context("resolve working directory")?;
    let hosting = GhHosting::new();

    match cli.command {
        Command::Prepare {
            repo,
            runner_branch,
            pull_number,
            comment,
        } => {
            let paths = cfg.rooted(&root);
            let request = PrepareRequest {
                repo: &repo,
                runner_branch: &runner_branch,
                pull_number,
                comment: &comment,
            };
            let context = prepare_challenge(&request, &paths.manifest, &paths.context, &hosting)?;
            println!("{}", serde_json::to_string_pretty(&context)?);
        }
        Command::Duel { context } => {
            let invoker = process_invoker(&cfg)?;
            let branches = Git::new(&root);
            let services = Services {
                invoker: &invoker,
                hosting: &hosting,
                branches: &branches,
            };
            let summary = run_duel(&root, &context, &cfg, &services)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Solo { context } => {
            let invoker = process_invoker(&cfg)?;
            let branches = Git::new(&root);
            let services = Services {
                invoker: &invoker,
                hosting: &hosting,
                branches: &branches,
            };
            let summary = run_solo(&root, &context, &cfg, &services)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

fn process_invoker(cfg: &ArenaConfig) -> Result<ProcessInvoker> {
    let scrubber = EnvScrubber::new(&cfg.scrub_env_patterns)?;
    Ok(ProcessInvoker::new(
        cfg.exec_timeout(),
        cfg.output_limit_bytes,
        scrubber,
    ))
}
