use crate::build::BuildTool;
use crate::domain::{BranchRef, Stage, TagRef};
use crate::error::{GitFlowError, Result};
use crate::git::{CommitId, MergeOutcome, MergeStrategy, Repository};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

const REMOTE: &str = "origin";
const DESCRIPTOR: &str = "pom.xml";
const CLOCK_START: i64 = 1_700_000_000;

#[derive(Debug, Clone)]
struct MockTag {
    created_at: Option<i64>,
    version: Option<String>,
}

#[derive(Debug, Clone)]
struct ScriptedConflict {
    source_contains: String,
    files: Vec<String>,
}

#[derive(Debug, Clone)]
struct RunningMerge {
    source_version: Option<String>,
    unresolved: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    current: String,
    local: BTreeMap<String, Option<String>>,
    remote: BTreeMap<String, Option<String>>,
    tags: BTreeMap<String, MockTag>,
    clock: i64,
    conflicts: Vec<ScriptedConflict>,
    merge: Option<RunningMerge>,
    failures: BTreeSet<String>,
    journal: Vec<String>,
    commits: Vec<String>,
    reverted: Vec<CommitId>,
    compiled: usize,
}

/// In-memory stand-in for a working copy and its `pom.xml`.
///
/// Branches carry the descriptor version they were last set to, tags remember the
/// version they were cut from, and every call is appended to a journal. A default
/// merge between branches whose descriptors differ conflicts on `pom.xml`, as git does
/// when both sides bumped it; a target without a descriptor version takes the source's.
/// Further conflicts and failures are scripted by the test.
pub struct MockRepository {
    state: Mutex<MockState>,
}

impl MockRepository {
    /// Create a repository with one branch checked out, present locally and on the remote
    pub fn new(initial_branch: &str) -> Self {
        let mut state = MockState {
            current: initial_branch.to_string(),
            clock: CLOCK_START,
            ..MockState::default()
        };
        state.local.insert(initial_branch.to_string(), None);
        state.remote.insert(initial_branch.to_string(), None);

        MockRepository {
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a local branch (and its remote counterpart) without checking it out
    pub fn add_branch(&self, name: &str) {
        let mut state = self.state();
        let version = state.local.get(&state.current).cloned().flatten();
        state.local.insert(name.to_string(), version.clone());
        state.remote.insert(name.to_string(), version);
    }

    /// Add a branch that only exists on the remote
    pub fn add_remote_branch(&self, name: &str) {
        self.state().remote.insert(name.to_string(), None);
    }

    /// Set the descriptor version of a branch, locally and on the remote
    pub fn set_branch_version(&self, branch: &str, version: &str) {
        let mut state = self.state();
        state
            .local
            .insert(branch.to_string(), Some(version.to_string()));
        if state.remote.contains_key(branch) {
            state
                .remote
                .insert(branch.to_string(), Some(version.to_string()));
        }
    }

    /// Add a tag with an explicit tagger time
    pub fn add_tag(&self, name: &str, created_at: Option<i64>) {
        self.state().tags.insert(
            name.to_string(),
            MockTag {
                created_at,
                version: Some(name.to_string()),
            },
        );
    }

    /// Make the next merge of a source containing `source_contains` conflict on `files`
    pub fn script_conflict(&self, source_contains: &str, files: &[&str]) {
        self.state().conflicts.push(ScriptedConflict {
            source_contains: source_contains.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        });
    }

    /// Make every call of `operation` fail with an external failure
    pub fn fail_on(&self, operation: &str) {
        self.state().failures.insert(operation.to_string());
    }

    /// Stop failing `operation`
    pub fn recover(&self, operation: &str) {
        self.state().failures.remove(operation);
    }

    pub fn branch_version(&self, branch: &str) -> Option<String> {
        self.state().local.get(branch).cloned().flatten()
    }

    pub fn remote_branch_version(&self, branch: &str) -> Option<String> {
        self.state().remote.get(branch).cloned().flatten()
    }

    pub fn tag_version(&self, name: &str) -> Option<String> {
        self.state()
            .tags
            .get(name)
            .and_then(|tag| tag.version.clone())
    }

    pub fn has_local_branch(&self, name: &str) -> bool {
        self.state().local.contains_key(name)
    }

    pub fn has_remote_branch(&self, name: &str) -> bool {
        self.state().remote.contains_key(name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.state().tags.contains_key(name)
    }

    /// Every call made so far, in order
    pub fn journal(&self) -> Vec<String> {
        self.state().journal.clone()
    }

    /// Messages of the commits made so far
    pub fn commits(&self) -> Vec<String> {
        self.state().commits.clone()
    }

    pub fn reverted(&self) -> Vec<CommitId> {
        self.state().reverted.clone()
    }

    pub fn compile_count(&self) -> usize {
        self.state().compiled
    }

    /// Whether a merge is still waiting for its conflicts to be resolved
    pub fn merge_in_progress(&self) -> bool {
        self.state().merge.is_some()
    }

    fn record(&self, operation: &str, entry: String) -> Result<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.journal.push(entry.clone());
        if state.failures.contains(operation) {
            return Err(GitFlowError::ExternalFailure {
                command: entry,
                code: Some(1),
                stderr: format!("injected failure in {}", operation),
            });
        }
        Ok(state)
    }
}

impl MockState {
    fn version_of(&self, source: &str) -> Option<String> {
        let source = strip_tag_ref(source);
        let remote_prefix = format!("{}/", REMOTE);
        if let Some(version) = self.local.get(source) {
            return version.clone();
        }
        if let Some(name) = source.strip_prefix(remote_prefix.as_str()) {
            if let Some(version) = self.remote.get(name) {
                return version.clone();
            }
        }
        self.tags.get(source).and_then(|tag| tag.version.clone())
    }

    fn resolves(&self, source: &str) -> bool {
        let source = strip_tag_ref(source);
        let remote_prefix = format!("{}/", REMOTE);
        self.local.contains_key(source)
            || source
                .strip_prefix(remote_prefix.as_str())
                .map(|name| self.remote.contains_key(name))
                .unwrap_or(false)
            || self.tags.contains_key(source)
    }

    fn set_current_version(&mut self, version: Option<String>) {
        let current = self.current.clone();
        self.local.insert(current, version);
    }

    fn current_version(&self) -> Option<String> {
        self.local.get(&self.current).cloned().flatten()
    }
}

fn strip_tag_ref(source: &str) -> &str {
    source.strip_prefix("refs/tags/").unwrap_or(source)
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        Ok(self.state().current.clone())
    }

    fn checkout(&self, branch: &str, force: bool) -> Result<()> {
        let mut state = self.record("checkout", format!("checkout {}", branch))?;
        if !state.local.contains_key(branch) {
            let version = state
                .remote
                .get(branch)
                .cloned()
                .ok_or_else(|| GitFlowError::not_found(format!("branch {}", branch)))?;
            state.local.insert(branch.to_string(), version);
        }
        if force {
            state.merge = None;
        }
        state.current = branch.to_string();
        Ok(())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        let mut state = self.record("create_branch", format!("create_branch {}", name))?;
        if state.local.contains_key(name) {
            return Err(GitFlowError::already_exists(format!("branch {}", name)));
        }
        let version = state.local.get(&state.current).cloned().flatten();
        state.local.insert(name.to_string(), version);
        state.current = name.to_string();
        Ok(())
    }

    fn delete_branch(&self, name: &str, remote: bool) -> Result<()> {
        let side = if remote { "remote" } else { "local" };
        let mut state = self.record("delete_branch", format!("delete_branch {} {}", name, side))?;
        let removed = if remote {
            state.remote.remove(name).is_some()
        } else {
            if state.current == name {
                return Err(GitFlowError::precondition(format!(
                    "cannot delete the checked-out branch {}",
                    name
                )));
            }
            state.local.remove(name).is_some()
        };
        if removed {
            Ok(())
        } else {
            Err(GitFlowError::not_found(format!("{} branch {}", side, name)))
        }
    }

    fn list_branches(&self) -> Result<Vec<BranchRef>> {
        let state = self.state();
        let mut branches: Vec<BranchRef> = state.local.keys().map(BranchRef::local).collect();
        branches.extend(state.remote.keys().map(|name| BranchRef::remote(REMOTE, name)));
        Ok(branches)
    }

    fn list_tags(&self) -> Result<Vec<TagRef>> {
        let state = self.state();
        Ok(state
            .tags
            .iter()
            .map(|(name, tag)| TagRef::new(format!("refs/tags/{}", name), tag.created_at))
            .collect())
    }

    fn tag(&self, name: &str, _message: &str) -> Result<TagRef> {
        let mut state = self.record("tag", format!("tag {}", name))?;
        if state.tags.contains_key(name) {
            return Err(GitFlowError::already_exists(format!("tag {}", name)));
        }
        state.clock += 60;
        let created_at = Some(state.clock);
        let version = state.local.get(&state.current).cloned().flatten();
        state.tags.insert(
            name.to_string(),
            MockTag {
                created_at,
                version,
            },
        );
        Ok(TagRef::new(format!("refs/tags/{}", name), created_at))
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        let mut state = self.record("delete_tag", format!("delete_tag {}", name))?;
        match state.tags.remove(name) {
            Some(_) => Ok(()),
            None => Err(GitFlowError::not_found(format!("tag {}", name))),
        }
    }

    fn merge(&self, source: &str, strategy: MergeStrategy) -> Result<MergeOutcome> {
        let mut state = self.record("merge", format!("merge {} {:?}", source, strategy))?;
        if !state.resolves(source) {
            return Err(GitFlowError::ExternalFailure {
                command: format!("git merge {}", source),
                code: Some(1),
                stderr: format!("merge: {} - not something we can merge", source),
            });
        }

        let source_version = state.version_of(source);
        let target_version = state.current_version();

        let mut conflicts = Vec::new();
        if let Some(index) = state
            .conflicts
            .iter()
            .position(|c| source.contains(&c.source_contains))
        {
            conflicts = state.conflicts.remove(index).files;
        }

        match strategy {
            MergeStrategy::Ours => {}
            MergeStrategy::Theirs => {
                if source_version.is_some() {
                    state.set_current_version(source_version.clone());
                }
            }
            MergeStrategy::Default => match (&target_version, &source_version) {
                (Some(ours), Some(theirs)) if ours != theirs => {
                    if !conflicts.iter().any(|f| f == DESCRIPTOR) {
                        conflicts.insert(0, DESCRIPTOR.to_string());
                    }
                }
                (None, Some(_)) => state.set_current_version(source_version.clone()),
                _ => {}
            },
        }

        if conflicts.is_empty() {
            return Ok(MergeOutcome::clean());
        }
        state.merge = Some(RunningMerge {
            source_version,
            unresolved: conflicts.clone(),
        });
        Ok(MergeOutcome { conflicts })
    }

    fn checkout_file(&self, branch: &str, path: &str, stage: Stage) -> Result<()> {
        let mut state = self.record(
            "checkout_file",
            format!("checkout_file {} {} {}", branch, path, stage),
        )?;
        let running = state
            .merge
            .as_mut()
            .ok_or_else(|| GitFlowError::precondition("no merge in progress"))?;

        let before = running.unresolved.len();
        running.unresolved.retain(|p| p != path);
        if running.unresolved.len() == before {
            return Err(GitFlowError::not_found(format!("unmerged path {}", path)));
        }

        if stage == Stage::Theirs && path.ends_with(DESCRIPTOR) {
            let version = running.source_version.clone();
            state.set_current_version(version);
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<CommitId> {
        let mut state = self.record("commit", format!("commit {}", message))?;
        if let Some(running) = &state.merge {
            if !running.unresolved.is_empty() {
                return Err(GitFlowError::ExternalFailure {
                    command: "git commit".to_string(),
                    code: Some(128),
                    stderr: format!("unmerged files: {}", running.unresolved.join(", ")),
                });
            }
        }
        state.merge = None;
        state.commits.push(message.to_string());
        Ok(CommitId(format!("c{}", state.commits.len())))
    }

    fn revert(&self, commit: &CommitId) -> Result<()> {
        let mut state = self.record("revert", format!("revert {}", commit))?;
        state.reverted.push(commit.clone());
        Ok(())
    }

    fn reset_hard(&self, target: &str) -> Result<()> {
        let mut state = self.record("reset_hard", format!("reset_hard {}", target))?;
        state.merge = None;
        Ok(())
    }

    fn push(&self) -> Result<()> {
        let current = self.state().current.clone();
        let mut state = self.record("push", format!("push {}", current))?;
        let version = state.local.get(&current).cloned().flatten();
        state.remote.insert(current, version);
        Ok(())
    }

    fn push_branch(&self, name: &str) -> Result<()> {
        let mut state = self.record("push_branch", format!("push_branch {}", name))?;
        let version = state
            .local
            .get(name)
            .cloned()
            .ok_or_else(|| GitFlowError::not_found(format!("branch {}", name)))?;
        state.remote.insert(name.to_string(), version);
        Ok(())
    }

    fn push_all(&self) -> Result<()> {
        let mut state = self.record("push_all", "push_all".to_string())?;
        let local = state.local.clone();
        state.remote.extend(local);
        Ok(())
    }

    fn describe(&self) -> Result<String> {
        let state = self.state();
        let last_tag = state
            .tags
            .iter()
            .max_by_key(|(_, tag)| tag.created_at)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "untagged".to_string());
        Ok(format!("{}-{}-g{}", last_tag, state.current, state.commits.len()))
    }
}

impl BuildTool for MockRepository {
    fn set_version(&self, version: &str) -> Result<()> {
        let mut state = self.record("set_version", format!("set_version {}", version))?;
        state.set_current_version(Some(version.to_string()));
        Ok(())
    }

    fn compile(&self, skip_tests: bool) -> Result<()> {
        let mut state = self.record("compile", format!("compile skip_tests={}", skip_tests))?;
        state.compiled += 1;
        Ok(())
    }

    fn current_version(&self) -> Result<String> {
        let state = self.state();
        state
            .local
            .get(&state.current)
            .cloned()
            .flatten()
            .ok_or_else(|| {
                GitFlowError::not_found(format!("descriptor version on {}", state.current))
            })
    }
}
