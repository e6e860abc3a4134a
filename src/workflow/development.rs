use tracing::info;

use super::{run_operation, FlowContext, Operation, WorkflowReport, WorkflowResult};
use crate::build::BuildTool;
use crate::domain::Stage;
use crate::error::Result;
use crate::git::{MergeSpec, Repository};

#[derive(Debug, Default)]
struct StartProgress {
    created: Option<String>,
}

/// Branch `<feature|bugfix>/<release>/<label>` off its release branch
pub fn start_development<R, B>(ctx: &FlowContext<'_, R, B>, full_name: &str) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    run_operation(
        Operation::StartDevelopment,
        |progress: &mut StartProgress| run_start(ctx, full_name, progress),
        |progress, compensator| {
            let Some(branch) = &progress.created else {
                return;
            };
            let develop = ctx.develop();
            compensator.attempt("reset working copy", || ctx.repo.reset_hard("HEAD"));
            compensator.attempt(format!("checkout {}", develop), || {
                ctx.repo.checkout(develop, true)
            });
            compensator.attempt(format!("delete local branch {}", branch), || {
                ctx.repo.delete_branch(branch, false)
            });
        },
    )
}

fn run_start<R, B>(
    ctx: &FlowContext<'_, R, B>,
    full_name: &str,
    progress: &mut StartProgress,
) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::StartDevelopment;
    let dev = ctx.pattern.validate_full_branch_name(full_name)?;
    let release_branch = ctx.pattern.build_release_branch_name(&dev.release);
    ctx.require_branch(&release_branch)?;
    ctx.require_no_branch(&dev.full_name)?;

    ctx.compile()?;

    info!("Starting {} {} from {}", dev.kind, dev.full_name, release_branch);
    ctx.repo.checkout(&release_branch, false)?;
    ctx.repo.create_branch(&dev.full_name)?;
    progress.created = Some(dev.full_name.clone());
    ctx.repo.push_branch(&dev.full_name)?;

    Ok(ctx.report(WorkflowReport::new(op).branch(dev.full_name)))
}

/// Merge a development branch back into its release branch.
///
/// The release branch keeps its own build descriptor. Has no rollback.
pub fn finish_development<R, B>(
    ctx: &FlowContext<'_, R, B>,
    full_name: &str,
    delete_branch_after: bool,
) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    run_operation(
        Operation::FinishDevelopment,
        |_: &mut ()| run_finish(ctx, full_name, delete_branch_after),
        |_, _| {},
    )
}

fn run_finish<R, B>(
    ctx: &FlowContext<'_, R, B>,
    full_name: &str,
    delete_branch_after: bool,
) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::FinishDevelopment;
    let dev = ctx.pattern.validate_full_branch_name(full_name)?;
    let release_branch = ctx.pattern.build_release_branch_name(&dev.release);

    ctx.repo.checkout(&release_branch, false)?;
    let dev_ref = ctx.require_branch(&dev.full_name)?;

    let spec = MergeSpec::new(&release_branch, dev_ref.qualified_name(), op.command_line(full_name))
        .ignoring(&[ctx.descriptor()], Stage::Ours);
    ctx.merge(&spec)?;
    ctx.compile()?;
    ctx.repo.push()?;

    if delete_branch_after || ctx.config.behavior.delete_branch_after {
        info!("Deleting {}", dev.full_name);
        let on_remote = ctx
            .repo
            .list_branches()?
            .iter()
            .any(|b| b.is_remote() && b.name == dev.full_name);
        if on_remote {
            ctx.repo.delete_branch(&dev.full_name, true)?;
        }
        if !dev_ref.is_remote() {
            ctx.repo.delete_branch(&dev.full_name, false)?;
        }
    }

    Ok(ctx.report(WorkflowReport::new(op).branch(release_branch)))
}
