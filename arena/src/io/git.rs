//! Git adapter for materializing participant branches.
//!
//! Each match checks branches out side by side as worktrees of the current
//! repository, so we keep a small, explicit wrapper around `git` subprocess
//! calls.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

/// Something that can place a branch's files into a directory.
pub trait BranchSource: Sync {
    fn materialize(&self, branch: &str, target: &Path) -> Result<()>;
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Check out `branch` into `target` as a new worktree, forcing reuse of a
    /// branch that is already checked out elsewhere.
    #[instrument(skip_all, fields(branch, target = %target.display()))]
    pub fn worktree_add(&self, target: &Path, branch: &str) -> Result<()> {
        debug!(branch, "adding worktree");
        let target = target.to_string_lossy();
        self.run_checked(&["worktree", "add", target.as_ref(), branch, "-f"])?;
        Ok(())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

impl BranchSource for Git {
    fn materialize(&self, branch: &str, target: &Path) -> Result<()> {
        self.worktree_add(target, branch)
            .with_context(|| format!("materialize branch {branch}"))
    }
}
