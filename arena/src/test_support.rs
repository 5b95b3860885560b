//! Test helpers: scripted subprocesses, an in-memory hosting platform and
//! deterministic challenge contexts.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::core::challenge::{ChallengeContext, GameDetails, RunnerType};
use crate::error::MatchError;
use crate::io::git::BranchSource;
use crate::io::hosting::{Hosting, Repo, SubmissionInfo};
use crate::io::invoker::{Arg, Invocation, Invoker, Runnable};

/// A binary runnable whose path is its label.
pub fn runnable(label: &str) -> Runnable {
    Runnable {
        label: label.to_string(),
        runner_type: RunnerType::Binary,
        path: PathBuf::from(label),
    }
}

/// Two-player context: alice (`alice-bot`) challenges bob (`bob-bot`) at `ctf`.
pub fn duel_context() -> ChallengeContext {
    ChallengeContext {
        repo_owner: "acme".to_string(),
        repo_name: "games".to_string(),
        pull_number: 12,
        runner_branch: "main".to_string(),
        challenger: "alice".to_string(),
        challenger_branch: "alice-bot".to_string(),
        challengee: Some("bob".to_string()),
        challengee_branch: Some("bob-bot".to_string()),
        comment_id: Some(900),
        game: "ctf".to_string(),
        game_details: GameDetails {
            description: "Capture the flag".to_string(),
            path: "games/ctf/index.js".to_string(),
            runner_type: RunnerType::Node,
        },
    }
}

/// Solo context: alice plays `number-guessing`.
pub fn solo_context() -> ChallengeContext {
    ChallengeContext {
        challengee: None,
        challengee_branch: None,
        game: "number-guessing".to_string(),
        game_details: GameDetails {
            description: "Guess the number".to_string(),
            path: "games/guess.py".to_string(),
            runner_type: RunnerType::Python,
        },
        ..duel_context()
    }
}

enum Step {
    Stdout(String),
    Fail(MatchError),
}

/// Invoker that replays a fixed sequence of responses and records every call
/// as `(label, args)`.
#[derive(Default)]
pub struct ScriptedInvoker {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedInvoker {
    pub fn new<I, S>(stdouts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = stdouts.into_iter().map(|s| Step::Stdout(s.into())).collect();
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Append a response.
    pub fn then(self, stdout: impl Into<String>) -> Self {
        self.push(Step::Stdout(stdout.into()));
        self
    }

    /// Append a failing invocation.
    pub fn then_fail(self, err: MatchError) -> Self {
        self.push(Step::Fail(err));
        self
    }

    fn push(&self, step: Step) {
        self.script.lock().expect("script lock").push_back(step);
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn assert_drained(&self) {
        let remaining = self.script.lock().expect("script lock").len();
        assert_eq!(remaining, 0, "{remaining} scripted responses were never used");
    }
}

impl Invoker for ScriptedInvoker {
    fn invoke(&self, runnable: &Runnable, args: &[Arg]) -> Result<Invocation> {
        let args = args
            .iter()
            .map(|arg| arg.to_os_string().to_string_lossy().into_owned())
            .collect();
        self.calls
            .lock()
            .expect("calls lock")
            .push((runnable.label.clone(), args));
        match self.script.lock().expect("script lock").pop_front() {
            Some(Step::Stdout(stdout)) => Ok(Invocation {
                stdout,
                stderr: String::new(),
            }),
            Some(Step::Fail(err)) => Err(err.into()),
            None => Err(anyhow!("unexpected invocation of {}", runnable.label)),
        }
    }
}

#[derive(Default)]
struct HostingState {
    pulls: BTreeMap<u64, SubmissionInfo>,
    branches: BTreeMap<String, String>,
    comments: BTreeMap<u64, String>,
    next_comment_id: u64,
    calls: Vec<String>,
    fail_writes: bool,
}

/// In-memory [`Hosting`] that records every request.
#[derive(Default)]
pub struct RecordingHosting {
    state: Mutex<HostingState>,
}

impl RecordingHosting {
    pub fn with_pull(self, pull: u64, author: &str, branch: &str) -> Self {
        self.lock().pulls.insert(
            pull,
            SubmissionInfo {
                author: author.to_string(),
                branch: branch.to_string(),
            },
        );
        self
    }

    pub fn with_branch(self, branch: &str, author: &str) -> Self {
        self.lock()
            .branches
            .insert(branch.to_string(), author.to_string());
        self
    }

    pub fn with_comment(self, id: u64, body: &str) -> Self {
        self.lock().comments.insert(id, body.to_string());
        self
    }

    /// Make every comment write fail with a hosting error.
    pub fn failing_writes(self) -> Self {
        self.lock().fail_writes = true;
        self
    }

    pub fn comment_body(&self, id: u64) -> Option<String> {
        self.lock().comments.get(&id).cloned()
    }

    pub fn comments(&self) -> BTreeMap<u64, String> {
        self.lock().comments.clone()
    }

    /// Requests in the order they were made, e.g. `pull 12` or `upsert new`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostingState> {
        self.state.lock().expect("hosting lock")
    }
}

impl Hosting for RecordingHosting {
    fn submission_by_pull(&self, _repo: &Repo, pull: u64) -> Result<SubmissionInfo> {
        let mut state = self.lock();
        state.calls.push(format!("pull {pull}"));
        state
            .pulls
            .get(&pull)
            .cloned()
            .ok_or_else(|| MatchError::hosting(format!("no pull request {pull}")).into())
    }

    fn submission_by_branch(&self, _repo: &Repo, branch: &str) -> Result<SubmissionInfo> {
        let mut state = self.lock();
        state.calls.push(format!("branch {branch}"));
        let author = state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| MatchError::hosting(format!("no branch {branch}")))?;
        Ok(SubmissionInfo {
            author,
            branch: branch.to_string(),
        })
    }

    fn read_comment(&self, _repo: &Repo, comment_id: u64) -> Result<String> {
        let mut state = self.lock();
        state.calls.push(format!("read {comment_id}"));
        state
            .comments
            .get(&comment_id)
            .cloned()
            .ok_or_else(|| MatchError::hosting(format!("no comment {comment_id}")).into())
    }

    fn upsert_comment(
        &self,
        _repo: &Repo,
        _pull: u64,
        comment_id: Option<u64>,
        body: &str,
    ) -> Result<u64> {
        let mut state = self.lock();
        state.calls.push(match comment_id {
            Some(id) => format!("upsert {id}"),
            None => "upsert new".to_string(),
        });
        if state.fail_writes {
            return Err(MatchError::hosting("comment writes are disabled").into());
        }
        let id = match comment_id {
            Some(id) => id,
            None => {
                state.next_comment_id += 1;
                1000 + state.next_comment_id
            }
        };
        state.comments.insert(id, body.to_string());
        Ok(id)
    }
}

/// [`BranchSource`] that creates the target directory and writes canned files.
#[derive(Default)]
pub struct FakeBranches {
    files: BTreeMap<String, Vec<(PathBuf, String)>>,
    fetched: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeBranches {
    /// Files (relative path, contents) that `branch` will contain.
    pub fn with_file(mut self, branch: &str, path: impl AsRef<Path>, contents: &str) -> Self {
        self.files
            .entry(branch.to_string())
            .or_default()
            .push((path.as_ref().to_path_buf(), contents.to_string()));
        self
    }

    /// Materialized `(branch, target)` pairs, sorted by branch.
    pub fn fetched(&self) -> Vec<(String, PathBuf)> {
        let mut fetched = self.fetched.lock().expect("fetched lock").clone();
        fetched.sort();
        fetched
    }
}

impl BranchSource for FakeBranches {
    fn materialize(&self, branch: &str, target: &Path) -> Result<()> {
        let files = self
            .files
            .get(branch)
            .ok_or_else(|| anyhow!("fatal: invalid reference: {branch}"))?;
        for (path, contents) in files {
            let path = target.join(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, contents)?;
        }
        self.fetched
            .lock()
            .expect("fetched lock")
            .push((branch.to_string(), target.to_path_buf()));
        Ok(())
    }
}
