use std::cmp::Ordering;
use tracing::info;

use super::{run_operation, FlowContext, Operation, WorkflowReport, WorkflowResult};
use crate::build::BuildTool;
use crate::domain::comparator::{self, compare};
use crate::domain::{BranchKind, Stage, VersionId};
use crate::error::{GitFlowError, Result};
use crate::git::{CommitId, MergeSpec, MergeStrategy, Repository};

#[derive(Debug, Default)]
struct StartProgress {
    created: Option<String>,
    pushed: bool,
}

/// Branch `release/<v>` off develop at version `<v>.0` with the development marker
pub fn start_release<R, B>(ctx: &FlowContext<'_, R, B>, version: &str) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    run_operation(
        Operation::StartRelease,
        |progress: &mut StartProgress| run_start(ctx, version, progress),
        |progress, compensator| {
            let Some(branch) = &progress.created else {
                return;
            };
            compensator.attempt("reset working copy", || ctx.repo.reset_hard("HEAD"));
            compensator.attempt(format!("checkout {}", ctx.develop()), || {
                ctx.repo.checkout(ctx.develop(), true)
            });
            compensator.attempt(format!("delete local branch {}", branch), || {
                ctx.repo.delete_branch(branch, false)
            });
            if progress.pushed {
                compensator.attempt(format!("delete remote branch {}", branch), || {
                    ctx.repo.delete_branch(branch, true)
                });
            }
        },
    )
}

fn run_start<R, B>(
    ctx: &FlowContext<'_, R, B>,
    version: &str,
    progress: &mut StartProgress,
) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::StartRelease;
    let release = ctx.pattern.parse_release_version(version)?;
    if release.minor == 0 {
        return Err(GitFlowError::precondition(format!(
            "release {} is reserved for init; the first release must be {}.1 at least",
            release, release.major
        )));
    }

    let branch = ctx.pattern.build_release_branch_name(&release);
    ctx.require_no_branch(&branch)?;
    if let Some((tag, _)) = ctx.last_tag(Some(&release))? {
        return Err(GitFlowError::already_exists(format!(
            "release {} was already tagged as {}",
            release,
            tag.short_name()
        )));
    }
    if ctx.repo.find_branch(ctx.develop())?.is_none() {
        return Err(GitFlowError::not_found(format!(
            "branch {}; run init first",
            ctx.develop()
        )));
    }
    ctx.require_on(ctx.develop())?;

    info!("Starting release {}", release);
    ctx.repo.create_branch(&branch)?;
    progress.created = Some(branch.clone());

    let rendered = ctx.set_version(&release.first_tag().as_development())?;
    ctx.compile()?;
    ctx.commit(op, format!("Create release branch {} ({})", branch, rendered))?;
    ctx.repo.push_branch(&branch)?;
    progress.pushed = true;

    Ok(ctx.report(
        WorkflowReport::new(op)
            .branch(branch)
            .version(rendered),
    ))
}

/// Merge develop into `release/<v>`, tag the result and move the release branch to the next patch.
///
/// Has no rollback.
pub fn build_release<R, B>(ctx: &FlowContext<'_, R, B>, version: &str) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    run_operation(
        Operation::BuildRelease,
        |_: &mut ()| run_build(ctx, version),
        |_, _| {},
    )
}

fn run_build<R, B>(ctx: &FlowContext<'_, R, B>, version: &str) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::BuildRelease;
    let release = ctx.pattern.parse_release_version(version)?;
    let branch = ctx.pattern.build_release_branch_name(&release);
    ctx.require_branch(&branch)?;
    ctx.require_on(ctx.develop())?;

    let develop_ref = ctx.require_branch(ctx.develop())?.qualified_name();

    // The release branch owns its descriptor version; develop's is always ahead
    ctx.repo.checkout(&branch, false)?;
    let spec = MergeSpec::new(&branch, develop_ref, op.command_line(version))
        .ignoring(&[ctx.descriptor()], Stage::Ours);
    ctx.merge(&spec)?;

    let merged = ctx.current_version()?;
    require_line(&merged, &release)?;
    let tag = ctx.tag(op, &merged)?;
    ctx.commit(op, format!("Build release branch {}", release))?;
    ctx.repo.push_all()?;

    let next = comparator::increment(&merged.as_final())?.as_development();
    let rendered = ctx.set_version(&next)?;
    ctx.commit(op, format!("Bumped version number to {}", rendered))?;
    ctx.repo.push_all()?;

    Ok(ctx.report(
        WorkflowReport::new(op)
            .branch(branch)
            .tag(tag)
            .version(rendered),
    ))
}

#[derive(Debug, Default)]
struct FinishProgress {
    started: bool,
    bump: Option<CommitId>,
    tag: Option<String>,
}

/// Merge `release/<v>` into develop, tag it and move the release branch to the next patch
pub fn finish_release<R, B>(ctx: &FlowContext<'_, R, B>, version: &str) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    run_operation(
        Operation::FinishRelease,
        |progress: &mut FinishProgress| run_finish(ctx, version, progress),
        |progress, compensator| {
            if !progress.started {
                return;
            }
            let develop = ctx.develop();
            compensator.attempt(format!("checkout {}", develop), || {
                ctx.repo.checkout(develop, true)
            });
            compensator.attempt(format!("reset {} to {}", develop, ctx.pattern.origin()), || {
                ctx.repo
                    .reset_hard(&format!("{}/{}", ctx.pattern.origin(), develop))
            });
            if let Some(bump) = &progress.bump {
                compensator.attempt(format!("revert {}", bump), || {
                    ctx.repo.revert(bump)?;
                    ctx.repo.push()
                });
            }
            if let Some(tag) = &progress.tag {
                compensator.attempt(format!("delete tag {}", tag), || ctx.repo.delete_tag(tag));
            }
        },
    )
}

fn run_finish<R, B>(
    ctx: &FlowContext<'_, R, B>,
    version: &str,
    progress: &mut FinishProgress,
) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::FinishRelease;
    let release = ctx.pattern.parse_release_version(version)?;
    let branch = ctx.pattern.build_release_branch_name(&release);
    let release_ref = ctx.require_branch(&branch)?.qualified_name();
    ctx.require_on(ctx.develop())?;

    if let Some(latest) = ctx.last_version(None)? {
        if comparator::is_release_older_than(&release, &latest) {
            return Err(GitFlowError::precondition(format!(
                "release {} is older than the latest tag {}",
                release, latest
            )));
        }
    }
    progress.started = true;

    // A hotfix may have tagged this line since develop last moved
    let mut develop_version = ctx.current_version()?;
    if let Some(last) = ctx.last_version(Some(&release))? {
        if compare(&develop_version, &last) != Ordering::Greater {
            info!("Found newer tag {}", last);
            let bumped = comparator::increment(&last)?.as_development();
            let rendered = ctx.set_version(&bumped)?;
            let commit = ctx.commit(op, format!("Bumped version number to {}", rendered))?;
            ctx.repo.push()?;
            progress.bump = Some(commit);
            develop_version = bumped;
        }
    }

    let stage = comparator::define_stage_for_merge(&develop_version, &release);
    let spec = MergeSpec::new(ctx.develop(), release_ref, op.command_line(version))
        .ignoring(&[ctx.descriptor()], stage);
    ctx.merge(&spec)?;

    let merged = ctx.current_version()?;
    require_line(&merged, &release)?;
    let tag = ctx.tag(op, &merged)?;
    progress.tag = Some(tag.clone());
    ctx.commit(op, format!("Finish release branch {}", release))?;
    ctx.repo.push_all()?;

    let next = comparator::increment(&merged.as_final())?.as_development();
    ctx.repo.checkout(&branch, false)?;
    let rendered = ctx.set_version(&next)?;
    ctx.commit(op, format!("Bumped version number to {}", rendered))?;
    ctx.repo.push_all()?;

    Ok(ctx.report(
        WorkflowReport::new(op)
            .branch(branch)
            .tag(tag)
            .version(rendered),
    ))
}

#[derive(Debug, Default)]
struct PublishProgress {
    started: bool,
}

/// Merge the latest tag of `<v>` into master and remove the line's working branches
pub fn publish_release<R, B>(ctx: &FlowContext<'_, R, B>, version: &str) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    run_operation(
        Operation::PublishRelease,
        |progress: &mut PublishProgress| run_publish(ctx, version, progress),
        |progress, compensator| {
            if !progress.started {
                return;
            }
            let master = ctx.master();
            compensator.attempt(format!("checkout {}", master), || {
                ctx.repo.checkout(master, true)
            });
            compensator.attempt(format!("reset {} to {}", master, ctx.pattern.origin()), || {
                ctx.repo
                    .reset_hard(&format!("{}/{}", ctx.pattern.origin(), master))
            });
        },
    )
}

fn run_publish<R, B>(
    ctx: &FlowContext<'_, R, B>,
    version: &str,
    progress: &mut PublishProgress,
) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::PublishRelease;
    let release = ctx.pattern.parse_release_version(version)?;
    let (tag, tag_version) = ctx.last_tag(Some(&release))?.ok_or_else(|| {
        GitFlowError::not_found(format!(
            "tag for release {}; run finish-release first",
            release
        ))
    })?;

    progress.started = true;
    info!("Publishing {} to {}", tag.short_name(), ctx.master());
    ctx.repo.checkout(ctx.master(), false)?;

    let spec = MergeSpec::new(ctx.master(), tag.name.as_str(), op.command_line(version))
        .ignoring(&[ctx.descriptor()], Stage::Theirs)
        .with_strategy(MergeStrategy::Theirs);
    ctx.merge(&spec)?;
    ctx.compile()?;
    ctx.repo.push()?;

    delete_release_branches(ctx, &release)?;

    Ok(ctx.report(
        WorkflowReport::new(op)
            .branch(ctx.master())
            .tag(tag.short_name())
            .version(tag_version.to_string()),
    ))
}

/// Remove `feature/<v>/*`, `bugfix/<v>/*` and `release/<v>`, locally and on the remote
fn delete_release_branches<R, B>(ctx: &FlowContext<'_, R, B>, release: &VersionId) -> Result<()>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let release_branch = ctx.pattern.build_release_branch_name(release);
    let feature_prefix = ctx.pattern.dev_branch_prefix(BranchKind::Feature, release);
    let bugfix_prefix = ctx.pattern.dev_branch_prefix(BranchKind::Bugfix, release);

    for branch in ctx.repo.list_branches()? {
        let doomed = branch.name == release_branch
            || branch.name.starts_with(&feature_prefix)
            || branch.name.starts_with(&bugfix_prefix);
        if doomed {
            info!("Deleting {}", branch.qualified_name());
            ctx.repo.delete_branch(&branch.name, branch.is_remote())?;
        }
    }
    Ok(())
}

/// The descriptor must still be on the release line being tagged
fn require_line(version: &VersionId, release: &VersionId) -> Result<()> {
    if compare(version, release) != Ordering::Equal {
        return Err(GitFlowError::precondition(format!(
            "descriptor version {} does not belong to release {}",
            version, release
        )));
    }
    Ok(())
}
