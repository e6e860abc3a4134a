use tracing::info;

use super::{run_operation, FlowContext, Operation, WorkflowReport, WorkflowResult};
use crate::build::BuildTool;
use crate::domain::VersionId;
use crate::error::Result;
use crate::git::Repository;

/// Create the develop branch from master and stamp the first `1.0.<n>` tag.
///
/// Nothing is changed before the last precondition, so there is nothing to roll back.
pub fn init<R, B>(ctx: &FlowContext<'_, R, B>) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    run_operation(Operation::Init, |_: &mut ()| run(ctx), |_, _| {})
}

fn run<R, B>(ctx: &FlowContext<'_, R, B>) -> Result<WorkflowReport>
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    let op = Operation::Init;
    ctx.require_on(ctx.master())?;
    ctx.require_no_branch(ctx.develop())?;

    let version = ctx.next_tag_version(&VersionId::release(1, 0))?;
    info!("Initializing {} at version {}", ctx.develop(), version);

    ctx.repo.create_branch(ctx.develop())?;
    let rendered = ctx.set_version(&version)?;
    ctx.commit(op, format!("Set version to {}", rendered))?;
    let tag = ctx.tag(op, &version)?;
    ctx.repo.push_all()?;

    Ok(ctx.report(
        WorkflowReport::new(op)
            .branch(ctx.develop())
            .tag(tag)
            .version(rendered),
    ))
}
