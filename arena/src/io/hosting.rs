//! Source-control hosting adapter.
//!
//! Drivers talk to the hosting platform through the [`Hosting`] trait. The
//! production backend, [`GhHosting`], shells out to `gh api` so credentials
//! stay with the `gh` CLI and never pass through this process.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::core::challenge::ChallengeContext;
use crate::error::MatchError;
use crate::io::process::run_command_with_timeout;

const GH_TIMEOUT: Duration = Duration::from_secs(30);
const GH_OUTPUT_LIMIT_BYTES: usize = 1_000_000;

/// `owner/name` of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`.
    pub fn parse(full_name: &str) -> Result<Self, MatchError> {
        match full_name.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(MatchError::parse(format!(
                "repository must look like owner/name, got '{full_name}'"
            ))),
        }
    }

    pub fn of(context: &ChallengeContext) -> Self {
        Self::new(&context.repo_owner, &context.repo_name)
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Who pushed a submission, and on which branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionInfo {
    pub author: String,
    pub branch: String,
}

/// Operations the arena needs from the hosting platform.
///
/// Implementations must be shareable across the scoped threads used to fetch
/// both participants at once.
pub trait Hosting: Sync {
    /// Head branch and author of a pull request.
    fn submission_by_pull(&self, repo: &Repo, pull: u64) -> Result<SubmissionInfo>;

    /// Author of the latest commit on `branch`.
    fn submission_by_branch(&self, repo: &Repo, branch: &str) -> Result<SubmissionInfo>;

    fn read_comment(&self, repo: &Repo, comment_id: u64) -> Result<String>;

    /// Replace comment `comment_id`, or create a new comment on `pull` when it
    /// is `None`. Returns the id of the written comment.
    fn upsert_comment(
        &self,
        repo: &Repo,
        pull: u64,
        comment_id: Option<u64>,
        body: &str,
    ) -> Result<u64>;
}

#[derive(Deserialize)]
struct PullResponse {
    head: PullHead,
}

#[derive(Deserialize)]
struct PullHead {
    #[serde(rename = "ref")]
    ref_name: String,
    user: Account,
}

#[derive(Deserialize)]
struct Account {
    login: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct BranchCommit {
    author: Option<Account>,
}

#[derive(Deserialize)]
struct CommentResponse {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

/// [`Hosting`] backed by the `gh` CLI.
#[derive(Debug, Clone)]
pub struct GhHosting {
    program: PathBuf,
}

impl Default for GhHosting {
    fn default() -> Self {
        Self::with_program("gh")
    }
}

impl GhHosting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `gh` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[instrument(skip_all, fields(endpoint))]
    fn api<T: DeserializeOwned>(&self, endpoint: &str, method: &str, body: Option<&str>) -> Result<T> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("api").arg("--method").arg(method).arg(endpoint);
        if let Some(body) = body {
            cmd.arg("-f").arg(format!("body={body}"));
        }
        debug!(method, "calling hosting api");

        let output = run_command_with_timeout(cmd, GH_TIMEOUT, GH_OUTPUT_LIMIT_BYTES)
            .map_err(|err| MatchError::hosting(format!("{method} {endpoint}: {err:#}")))?;
        if output.timed_out {
            return Err(MatchError::hosting(format!("{method} {endpoint} timed out")).into());
        }
        if !output.status.success() {
            let stderr = output.stderr_text();
            warn!(exit_code = ?output.status.code(), "hosting api call failed");
            return Err(MatchError::hosting(format!(
                "{method} {endpoint} failed: {}",
                stderr.trim()
            ))
            .into());
        }
        serde_json::from_slice(&output.stdout).map_err(|err| {
            MatchError::hosting(format!("{method} {endpoint} returned unexpected JSON: {err}"))
                .into()
        })
    }
}

impl Hosting for GhHosting {
    fn submission_by_pull(&self, repo: &Repo, pull: u64) -> Result<SubmissionInfo> {
        let response: PullResponse = self.api(&format!("repos/{repo}/pulls/{pull}"), "GET", None)?;
        Ok(SubmissionInfo {
            author: response.head.user.login,
            branch: response.head.ref_name,
        })
    }

    fn submission_by_branch(&self, repo: &Repo, branch: &str) -> Result<SubmissionInfo> {
        let response: BranchResponse =
            self.api(&format!("repos/{repo}/branches/{branch}"), "GET", None)?;
        let author = response.commit.author.ok_or_else(|| {
            MatchError::hosting(format!(
                "latest commit on {branch} has no linked author account"
            ))
        })?;
        Ok(SubmissionInfo {
            author: author.login,
            branch: branch.to_string(),
        })
    }

    fn read_comment(&self, repo: &Repo, comment_id: u64) -> Result<String> {
        let response: CommentResponse = self.api(
            &format!("repos/{repo}/issues/comments/{comment_id}"),
            "GET",
            None,
        )?;
        Ok(response.body.unwrap_or_default())
    }

    fn upsert_comment(
        &self,
        repo: &Repo,
        pull: u64,
        comment_id: Option<u64>,
        body: &str,
    ) -> Result<u64> {
        let response: CommentResponse = match comment_id {
            Some(id) => self.api(
                &format!("repos/{repo}/issues/comments/{id}"),
                "PATCH",
                Some(body),
            )?,
            None => self.api(
                &format!("repos/{repo}/issues/{pull}/comments"),
                "POST",
                Some(body),
            )?,
        };
        Ok(response.id)
    }
}
