//! Git operations abstraction layer
//!
//! The workflow talks to the version-control backend only through the [Repository]
//! trait. Implementations:
//!
//! - [repository::Git2Repository]: a real working copy, driven through `git2` and the `git` binary
//! - [mock::MockRepository]: an in-memory fake for tests
//!
//! [merge::MergeResolver] builds the conflict-override protocol on top of the trait.

pub mod merge;
pub mod mock;
pub mod repository;

pub use merge::{MergeResolver, MergeSpec};
pub use mock::MockRepository;
pub use repository::{Credentials, Git2Repository};

use crate::domain::{BranchRef, Stage, TagRef};
use crate::error::Result;
use std::fmt;

/// Identifier of a commit created by the workflow
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(pub String);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named merge strategy passed to the merge primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    #[default]
    Default,
    /// Keep the current branch's tree entirely (`-s ours`)
    Ours,
    /// Prefer the incoming side for conflicting hunks (`-X theirs`)
    Theirs,
}

impl MergeStrategy {
    /// Extra arguments for `git merge`
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            MergeStrategy::Default => &[],
            MergeStrategy::Ours => &["-s", "ours"],
            MergeStrategy::Theirs => &["-X", "theirs"],
        }
    }
}

/// Result of the merge primitive
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Paths left unmerged; empty when the merge succeeded
    pub conflicts: Vec<String>,
}

impl MergeOutcome {
    pub fn clean() -> Self {
        MergeOutcome::default()
    }

    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Version-control operations the workflow relies on.
///
/// All calls are synchronous and operate on the single checked-out working copy.
/// Branch names are short names (`release/2.1`); tag names are given without namespace
/// but listed as full refs.
pub trait Repository {
    /// Name of the checked-out branch
    fn current_branch(&self) -> Result<String>;

    /// Check out a branch
    ///
    /// When only the remote-tracking branch exists, a local branch tracking it is
    /// created first.
    ///
    /// # Arguments
    /// * `branch` - Short branch name
    /// * `force` - Discard local changes in the working tree
    fn checkout(&self, branch: &str, force: bool) -> Result<()>;

    /// Create a branch at HEAD and check it out
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Delete a branch
    ///
    /// # Arguments
    /// * `name` - Short branch name
    /// * `remote` - `false` deletes the local branch, `true` deletes it on the remote
    fn delete_branch(&self, name: &str, remote: bool) -> Result<()>;

    /// All local and remote-tracking branches
    fn list_branches(&self) -> Result<Vec<BranchRef>>;

    /// Look a branch up by short name, preferring the local branch over the remote one
    fn find_branch(&self, name: &str) -> Result<Option<BranchRef>> {
        let branches = self.list_branches()?;
        let local = branches.iter().find(|b| !b.is_remote() && b.name == name);
        let remote = branches.iter().find(|b| b.is_remote() && b.name == name);
        Ok(local.or(remote).cloned())
    }

    /// All tag refs with the tagger time of their tag object
    fn list_tags(&self) -> Result<Vec<TagRef>>;

    /// Create an annotated tag at HEAD
    fn tag(&self, name: &str, message: &str) -> Result<TagRef>;

    /// Delete a tag locally and on the remote
    fn delete_tag(&self, name: &str) -> Result<()>;

    /// Merge a ref into the current branch
    ///
    /// # Returns
    /// * `Ok(MergeOutcome)` - clean, or with the unmerged paths left in the index
    /// * `Err` - the merge could not run at all
    fn merge(&self, source: &str, strategy: MergeStrategy) -> Result<MergeOutcome>;

    /// Force one conflicting file to a side of the running merge and stage it
    fn checkout_file(&self, branch: &str, path: &str, stage: Stage) -> Result<()>;

    /// Commit everything in the working tree
    fn commit(&self, message: &str) -> Result<CommitId>;

    /// Revert a commit on the current branch
    fn revert(&self, commit: &CommitId) -> Result<()>;

    /// Reset the current branch, index and working tree to a ref
    fn reset_hard(&self, target: &str) -> Result<()>;

    /// Push the current branch
    fn push(&self) -> Result<()>;

    /// Push one branch and set it as upstream
    fn push_branch(&self, name: &str) -> Result<()>;

    /// Push every local branch and every tag
    fn push_all(&self) -> Result<()>;

    /// Human-readable description of HEAD (`git describe --tags`)
    fn describe(&self) -> Result<String>;
}
