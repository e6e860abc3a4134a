//! Workflow operations
//!
//! Each operation is a short script over branch state paired with a compensating
//! rollback. [`run_operation`] is the two-phase construct they share: run the script,
//! and on failure attempt each compensation, record its outcome, and hand back the
//! original error.

pub mod development;
pub mod hotfix;
pub mod init;
pub mod release;

pub use development::{finish_development, start_development};
pub use hotfix::{finish_hotfix, start_hotfix};
pub use init::init;
pub use release::{build_release, finish_release, publish_release, start_release};

use crate::build::BuildTool;
use crate::config::Config;
use crate::domain::{comparator, BranchRef, FlowPattern, TagRef, TagRegistry, VersionId};
use crate::error::{GitFlowError, Result};
use crate::git::{CommitId, MergeResolver, MergeSpec, Repository};
use std::fmt;
use tracing::{error, info, warn};

/// Named workflow operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    StartRelease,
    BuildRelease,
    FinishRelease,
    StartHotfix,
    FinishHotfix,
    StartDevelopment,
    FinishDevelopment,
    PublishRelease,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Init => "init",
            Operation::StartRelease => "start-release",
            Operation::BuildRelease => "build-release",
            Operation::FinishRelease => "finish-release",
            Operation::StartHotfix => "start-hotfix",
            Operation::FinishHotfix => "finish-hotfix",
            Operation::StartDevelopment => "start-development",
            Operation::FinishDevelopment => "finish-development",
            Operation::PublishRelease => "publish-release",
        };
        write!(f, "{}", name)
    }
}

impl Operation {
    /// Commit and tag message carrying the operation marker
    pub fn message(&self, text: impl fmt::Display) -> String {
        format!("[GitFlow::{}] {}", self, text)
    }

    /// Command line an operator re-runs after resolving a conflict
    pub fn command_line(&self, argument: &str) -> String {
        format!("{} {}", self, argument).trim_end().to_string()
    }
}

/// What a successful operation left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    pub operation: Operation,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub version: Option<String>,
    /// `describe` of HEAD once the operation finished
    pub head: Option<String>,
}

impl WorkflowReport {
    pub fn new(operation: Operation) -> Self {
        WorkflowReport {
            operation,
            branch: None,
            tag: None,
            version: None,
            head: None,
        }
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// One compensating action attempted during rollback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compensation {
    pub action: String,
    /// Failure of the compensation itself, if any
    pub error: Option<String>,
}

impl Compensation {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A failed operation: the error that triggered it and the rollback evidence
#[derive(Debug)]
pub struct WorkflowFailure {
    pub operation: Operation,
    pub error: GitFlowError,
    pub compensations: Vec<Compensation>,
}

impl fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.error)
    }
}

impl std::error::Error for WorkflowFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub type WorkflowResult = std::result::Result<WorkflowReport, WorkflowFailure>;

/// Records compensating actions; their failures are logged and kept, never raised
#[derive(Debug, Default)]
pub struct Compensator {
    records: Vec<Compensation>,
}

impl Compensator {
    pub fn attempt<F>(&mut self, action: impl Into<String>, compensate: F)
    where
        F: FnOnce() -> Result<()>,
    {
        let action = action.into();
        info!("Rollback: {}", action);
        let error = match compensate() {
            Ok(()) => None,
            Err(e) => {
                warn!("Rollback step '{}' failed: {}", action, e);
                Some(e.to_string())
            }
        };
        self.records.push(Compensation { action, error });
    }

    pub fn into_records(self) -> Vec<Compensation> {
        self.records
    }
}

/// Run an operation and, if it fails, its rollback.
///
/// `run` records what it changed in `S` so `rollback` only undoes work this run did.
/// The original error is always the one returned.
pub fn run_operation<S, T, F, G>(
    operation: Operation,
    run: F,
    rollback: G,
) -> std::result::Result<T, WorkflowFailure>
where
    S: Default,
    F: FnOnce(&mut S) -> Result<T>,
    G: FnOnce(&S, &mut Compensator),
{
    let mut state = S::default();
    match run(&mut state) {
        Ok(value) => Ok(value),
        Err(err) => {
            error!("{} failed: {}", operation, err);
            let mut compensator = Compensator::default();
            rollback(&state, &mut compensator);
            Err(WorkflowFailure {
                operation,
                error: err,
                compensations: compensator.into_records(),
            })
        }
    }
}

/// Everything an operation needs, passed explicitly
pub struct FlowContext<'a, R: Repository + ?Sized, B: BuildTool + ?Sized> {
    pub repo: &'a R,
    pub build: &'a B,
    pub pattern: &'a FlowPattern,
    pub config: &'a Config,
}

impl<'a, R: Repository + ?Sized, B: BuildTool + ?Sized> FlowContext<'a, R, B> {
    pub fn new(repo: &'a R, build: &'a B, pattern: &'a FlowPattern, config: &'a Config) -> Self {
        FlowContext {
            repo,
            build,
            pattern,
            config,
        }
    }

    pub fn master(&self) -> &str {
        self.pattern.master()
    }

    pub fn develop(&self) -> &str {
        self.pattern.develop()
    }

    pub fn descriptor(&self) -> &str {
        &self.config.build.descriptor
    }

    pub fn skip_tests(&self) -> bool {
        self.config.build.skip_tests
    }

    pub fn merger(&self) -> MergeResolver<'a, R> {
        MergeResolver::new(self.repo)
    }

    pub fn merge(&self, spec: &MergeSpec) -> Result<()> {
        self.merger().merge(spec)
    }

    /// Fail unless `branch` is checked out
    pub fn require_on(&self, branch: &str) -> Result<()> {
        let current = self.repo.current_branch()?;
        if current != branch {
            return Err(GitFlowError::precondition(format!(
                "you must be on branch {} (currently on {})",
                branch, current
            )));
        }
        Ok(())
    }

    pub fn require_branch(&self, name: &str) -> Result<BranchRef> {
        self.repo
            .find_branch(name)?
            .ok_or_else(|| GitFlowError::not_found(format!("branch {}", name)))
    }

    pub fn require_no_branch(&self, name: &str) -> Result<()> {
        match self.repo.find_branch(name)? {
            Some(_) => Err(GitFlowError::already_exists(format!("branch {}", name))),
            None => Ok(()),
        }
    }

    /// Latest tag, optionally within one release line
    pub fn last_tag(&self, scope: Option<&VersionId>) -> Result<Option<(TagRef, VersionId)>> {
        let tags = self.repo.list_tags()?;
        TagRegistry::new(self.pattern).find_last_tag(&tags, scope)
    }

    pub fn last_version(&self, scope: Option<&VersionId>) -> Result<Option<VersionId>> {
        Ok(self.last_tag(scope)?.map(|(_, version)| version))
    }

    /// Next tag version of a release line, `<release>.0` when the line has no tag yet
    pub fn next_tag_version(&self, release: &VersionId) -> Result<VersionId> {
        comparator::increment_based_on_last_tag(release, |line| self.last_version(Some(line)))
    }

    /// Version in the build descriptor of the checked-out branch
    pub fn current_version(&self) -> Result<VersionId> {
        VersionId::parse_descriptor(&self.build.current_version()?)
    }

    /// Write a version into the build descriptor, with the development suffix if marked
    pub fn set_version(&self, version: &VersionId) -> Result<String> {
        let rendered = version.descriptor_string(&self.config.versions.development_suffix);
        self.build.set_version(&rendered)?;
        Ok(rendered)
    }

    pub fn compile(&self) -> Result<()> {
        self.build.compile(self.skip_tests())
    }

    pub fn commit(&self, operation: Operation, text: impl fmt::Display) -> Result<CommitId> {
        self.repo.commit(&operation.message(text))
    }

    /// Tag HEAD with a version, never carrying the development marker
    pub fn tag(&self, operation: Operation, version: &VersionId) -> Result<String> {
        let name = self.pattern.tag_name(&version.as_final());
        self.repo
            .tag(&name, &operation.message(format!("Create tag {}", name)))?;
        Ok(name)
    }

    /// Finish a report with the description of HEAD
    pub fn report(&self, report: WorkflowReport) -> WorkflowReport {
        let head = match self.repo.describe() {
            Ok(head) => Some(head),
            Err(e) => {
                warn!("Could not describe HEAD: {}", e);
                None
            }
        };
        WorkflowReport { head, ..report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::StartRelease.to_string(), "start-release");
        assert_eq!(Operation::FinishDevelopment.to_string(), "finish-development");
        assert_eq!(
            Operation::FinishRelease.message("Create tag 2.1.0"),
            "[GitFlow::finish-release] Create tag 2.1.0"
        );
        assert_eq!(Operation::Init.command_line(""), "init");
        assert_eq!(
            Operation::FinishHotfix.command_line("fix-login"),
            "finish-hotfix fix-login"
        );
    }

    #[test]
    fn test_run_operation_success_skips_rollback() {
        let result = run_operation(
            Operation::Init,
            |_: &mut ()| Ok(7),
            |_, _| panic!("rollback must not run"),
        );
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_run_operation_keeps_original_error() {
        #[derive(Default)]
        struct Progress {
            created: bool,
        }

        let result: std::result::Result<(), WorkflowFailure> = run_operation(
            Operation::StartRelease,
            |state: &mut Progress| {
                state.created = true;
                Err(GitFlowError::already_exists("branch release/2.1"))
            },
            |state, compensator| {
                assert!(state.created);
                compensator.attempt("checkout develop", || Ok(()));
                compensator.attempt("delete branch release/2.1", || {
                    Err(GitFlowError::not_found("branch release/2.1"))
                });
            },
        );

        let failure = result.unwrap_err();
        assert_eq!(failure.operation, Operation::StartRelease);
        assert!(matches!(failure.error, GitFlowError::AlreadyExists(_)));
        assert_eq!(failure.compensations.len(), 2);
        assert!(failure.compensations[0].succeeded());
        assert!(failure.compensations[1]
            .error
            .as_deref()
            .unwrap()
            .contains("release/2.1"));
        assert!(failure.to_string().starts_with("start-release failed"));
    }
}
