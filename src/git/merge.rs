use crate::domain::Stage;
use crate::error::{GitFlowError, Result};
use crate::git::{MergeStrategy, Repository};
use tracing::{info, warn};

/// Message of the commit concluding an automatically resolved merge
pub const RESOLVED_CONFLICTS_MESSAGE: &str = "resolved conflicts";

/// One merge of `source_ref` into `branch_name`.
///
/// Conflicts on paths containing one of `ignoring_files` are settled by taking
/// `ignoring_files_stage`; `operation` is the command line an operator re-runs after
/// fixing anything else by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSpec {
    pub branch_name: String,
    pub source_ref: String,
    pub ignoring_files: Vec<String>,
    pub ignoring_files_stage: Stage,
    pub operation: String,
    pub strategy: MergeStrategy,
}

impl MergeSpec {
    pub fn new(
        branch_name: impl Into<String>,
        source_ref: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        MergeSpec {
            branch_name: branch_name.into(),
            source_ref: source_ref.into(),
            ignoring_files: Vec::new(),
            ignoring_files_stage: Stage::Ours,
            operation: operation.into(),
            strategy: MergeStrategy::Default,
        }
    }

    pub fn ignoring(mut self, files: &[&str], stage: Stage) -> Self {
        self.ignoring_files = files.iter().map(|f| f.to_string()).collect();
        self.ignoring_files_stage = stage;
        self
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Same merge into another branch with another side for the ignored files
    pub fn retarget(&self, branch_name: impl Into<String>, stage: Stage) -> Self {
        MergeSpec {
            branch_name: branch_name.into(),
            ignoring_files_stage: stage,
            ..self.clone()
        }
    }

    fn is_ignored(&self, path: &str) -> bool {
        self.ignoring_files
            .iter()
            .any(|ignored| path.contains(ignored.as_str()))
    }

    /// Commands that bring the target branch back and redo the merge by hand
    pub fn remediation(&self) -> String {
        [
            "Execute the steps:".to_string(),
            format!("git reset --hard {}", self.branch_name),
            format!("git checkout {}", self.branch_name),
            format!("git merge {}", self.source_ref),
            format!("git-flow {}", self.operation),
        ]
        .join("\n")
    }
}

/// Merges with partial, declarative conflict resolution.
///
/// The target branch must already be checked out. A merge either ends in a commit
/// or in a [`GitFlowError::Conflict`]; callers must not continue after the latter.
pub struct MergeResolver<'a, R: Repository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: Repository + ?Sized> MergeResolver<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        MergeResolver { repo }
    }

    pub fn merge(&self, spec: &MergeSpec) -> Result<()> {
        info!("Merging {} into {}", spec.source_ref, spec.branch_name);
        let outcome = self.repo.merge(&spec.source_ref, spec.strategy)?;
        if outcome.is_clean() {
            return Ok(());
        }

        let mut unresolved = Vec::new();
        for path in outcome.conflicts {
            if spec.is_ignored(&path) {
                info!(
                    "Resolving conflict on {} with {} side",
                    path, spec.ignoring_files_stage
                );
                self.repo
                    .checkout_file(&spec.branch_name, &path, spec.ignoring_files_stage)?;
            } else {
                unresolved.push(path);
            }
        }

        if !unresolved.is_empty() {
            warn!(
                "Merge of {} into {} left {} unresolved file(s)",
                spec.source_ref,
                spec.branch_name,
                unresolved.len()
            );
            return Err(GitFlowError::Conflict {
                files: unresolved,
                source_ref: spec.source_ref.clone(),
                target_branch: spec.branch_name.clone(),
                remediation: spec.remediation(),
            });
        }

        self.repo.commit(RESOLVED_CONFLICTS_MESSAGE)?;
        Ok(())
    }
}
