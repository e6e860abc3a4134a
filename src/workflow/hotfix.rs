use std::cmp::Ordering;
use tracing::info;

use super::{run_operation, FlowContext, Operation, WorkflowReport, WorkflowResult};
use crate::build::BuildTool;
use crate::domain::comparator::{self, compare};
use crate::domain::Stage;
use crate::error::{GitFlowError, Result};
use crate::git::{CommitId, MergeSpec, Repository};

#[derive(Debug, Default)]
struct StartProgress {
    created: Option<String>,
    pushed: bool,
}

/// Branch `hotfix/<label>` off master at the next patch of master's release line
pub fn start_hotfix<R, B>(ctx: &FlowContext<'_, R, B>, label: &str) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    run_operation(
        Operation::StartHotfix,
        |progress: &mut StartProgress| run_start(ctx, label, progress),
        |progress, compensator| {
            let Some(branch) = &progress.created else {
                return;
            };
            let master = ctx.master();
            compensator.attempt("reset working copy", || ctx.repo.reset_hard("HEAD"));
            compensator.attempt(format!("checkout {}", master), || {
                ctx.repo.checkout(master, true)
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
    label: &str,
    progress: &mut StartProgress,
) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::StartHotfix;
    if label.trim().is_empty() {
        return Err(GitFlowError::invalid_format("hotfix name must not be empty"));
    }

    ctx.require_on(ctx.master())?;
    let branch = ctx.pattern.build_hotfix_branch_name(label);
    ctx.require_no_branch(&branch)?;

    let current = ctx.current_version()?.as_final();
    let mut next = ctx.next_tag_version(&current.release_line())?;
    if compare(&next, &current) != Ordering::Greater {
        next = comparator::increment(&current)?;
    }

    info!("Starting hotfix {} at {}", branch, next);
    ctx.repo.create_branch(&branch)?;
    progress.created = Some(branch.clone());

    let rendered = ctx.set_version(&next.as_development())?;
    ctx.commit(op, format!("Create hotfix branch {} ({})", branch, rendered))?;
    ctx.repo.push_branch(&branch)?;
    progress.pushed = true;

    Ok(ctx.report(
        WorkflowReport::new(op)
            .branch(branch)
            .version(rendered),
    ))
}

#[derive(Debug, Default)]
struct FinishProgress {
    started: bool,
    bump: Option<CommitId>,
    tag: Option<String>,
}

/// Ship `hotfix/<label>` to master with a tag, then carry it into develop
pub fn finish_hotfix<R, B>(ctx: &FlowContext<'_, R, B>, label: &str) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let branch = ctx.pattern.build_hotfix_branch_name(label);
    run_operation(
        Operation::FinishHotfix,
        |progress: &mut FinishProgress| run_finish(ctx, label, &branch, progress),
        |progress, compensator| {
            if !progress.started {
                return;
            }
            if let Some(bump) = &progress.bump {
                compensator.attempt(format!("revert {} on {}", bump, branch), || {
                    ctx.repo.checkout(&branch, true)?;
                    ctx.repo.revert(bump)?;
                    ctx.repo.push()
                });
            }
            if let Some(tag) = &progress.tag {
                compensator.attempt(format!("delete tag {}", tag), || ctx.repo.delete_tag(tag));
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

fn run_finish<R, B>(
    ctx: &FlowContext<'_, R, B>,
    label: &str,
    branch: &str,
    progress: &mut FinishProgress,
) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::FinishHotfix;
    ctx.require_branch(branch)?;
    progress.started = true;

    ctx.repo.checkout(branch, false)?;
    let mut hotfix_version = ctx.current_version()?;
    let line = hotfix_version.release_line();

    // Another hotfix may have been tagged on this line meanwhile
    if let Some(last) = ctx.last_version(Some(&line))? {
        if compare(&hotfix_version, &last) != Ordering::Greater {
            info!("Found newer tag {}", last);
            let bumped = comparator::increment(&last)?.as_development();
            let rendered = ctx.set_version(&bumped)?;
            let commit = ctx.commit(op, format!("Bumped version number to {}", rendered))?;
            progress.bump = Some(commit);
            ctx.repo.push()?;
            hotfix_version = bumped;
        }
    }

    let master = ctx.master();
    let hotfix_ref = ctx.require_branch(branch)?.qualified_name();
    ctx.repo.checkout(master, false)?;
    ctx.repo
        .reset_hard(&format!("{}/{}", ctx.pattern.origin(), master))?;

    let spec = MergeSpec::new(master, hotfix_ref, op.command_line(label))
        .ignoring(&[ctx.descriptor()], Stage::Theirs);
    ctx.merge(&spec)?;

    let released = hotfix_version.as_final();
    let rendered = ctx.set_version(&released)?;
    ctx.commit(op, format!("Set version to {}", rendered))?;
    let tag = ctx.tag(op, &released)?;
    progress.tag = Some(tag.clone());
    ctx.repo.push_all()?;

    let develop = ctx.develop();
    ctx.repo.checkout(develop, false)?;
    let develop_version = ctx.current_version()?;
    let stage = comparator::define_stage_for_merge(&develop_version, &line);
    ctx.merge(&spec.retarget(develop, stage))?;
    ctx.repo.push()?;

    ctx.repo.delete_branch(branch, true)?;
    if ctx.repo.find_branch(branch)?.is_some() {
        ctx.repo.delete_branch(branch, false)?;
    }

    Ok(ctx.report(
        WorkflowReport::new(op)
            .branch(master)
            .tag(tag)
            .version(rendered),
    ))
}
