//! `arena prepare`: turn a challenge comment into a challenge context.
//!
//! The comment is parsed and the game resolved before anything is requested
//! from the hosting platform. Both participants are then looked up, a status
//! comment is opened on the pull request and the context is written for the
//! game loops.

use std::path::Path;
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{error, info, warn};

use crate::core::challenge::{ChallengeContext, parse_challenge};
use crate::error::match_error;
use crate::io::context::write_context;
use crate::io::hosting::{Hosting, Repo, SubmissionInfo};
use crate::io::manifest::load_manifest;
use crate::io::status::StatusBoard;
use crate::play::failure_message;

/// Arguments of `arena prepare`.
#[derive(Debug, Clone)]
pub struct PrepareRequest<'a> {
    /// `owner/name` of the repository.
    pub repo: &'a str,
    pub runner_branch: &'a str,
    pub pull_number: u64,
    /// Body of the challenge comment.
    pub comment: &'a str,
}

/// Resolve a challenge and write its context to `context_path`.
///
/// On failure a `💥 Oh no!` comment is posted on the pull request.
pub fn prepare_challenge<H: Hosting + ?Sized>(
    request: &PrepareRequest<'_>,
    manifest_path: &Path,
    context_path: &Path,
    hosting: &H,
) -> Result<ChallengeContext> {
    let repo = Repo::parse(request.repo)?;
    let mut board = StatusBoard::new(hosting, repo.clone(), request.pull_number, None);

    let attempt = (|| -> Result<ChallengeContext> {
        let challenge = parse_challenge(request.comment)?;
        let manifest = load_manifest(manifest_path)?;
        let game_details = manifest.resolve(&challenge.game)?.clone();

        let repo = &repo;
        let (challenger, challengee) = thread::scope(|scope| -> Result<_> {
            let challengee = challenge.opponent.as_deref().map(|branch| {
                scope.spawn(move || hosting.submission_by_branch(repo, branch))
            });
            let challenger = hosting.submission_by_pull(repo, request.pull_number);
            let challengee = challengee
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| anyhow!("challengee lookup panicked"))
                })
                .transpose()?
                .transpose()?;
            Ok((challenger?, challengee))
        })?;

        let (challengee, challengee_branch) = match challengee {
            Some(SubmissionInfo { author, branch }) => (Some(author), Some(branch)),
            None => (None, None),
        };
        let mut context = ChallengeContext {
            repo_owner: repo.owner.clone(),
            repo_name: repo.name.clone(),
            pull_number: request.pull_number,
            runner_branch: request.runner_branch.to_string(),
            challenger: challenger.author,
            challenger_branch: challenger.branch,
            challengee,
            challengee_branch,
            comment_id: None,
            game: challenge.game,
            game_details,
        };

        let header = board.text().header(&context)?;
        let comment_id = board.post(&header).context("open status comment")?;
        context.comment_id = Some(comment_id);
        write_context(context_path, &context)?;
        Ok(context)
    })();

    match attempt {
        Ok(context) => {
            info!(
                game = %context.game,
                challenger = %context.challenger,
                challengee = ?context.challengee,
                comment_id = ?context.comment_id,
                "challenge prepared"
            );
            Ok(context)
        }
        Err(err) => {
            error!(kind = ?match_error(&err), "could not prepare challenge: {err:#}");
            if let Err(report_err) = board.report_failure(&failure_message(&err)) {
                warn!("could not report failure: {report_err:#}");
            }
            Err(err)
        }
    }
}
