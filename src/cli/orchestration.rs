//! Dispatch from a parsed command to a workflow operation
//!
//! Kept free of clap so the workflow can be driven programmatically.

use crate::build::BuildTool;
use crate::cli::Command;
use crate::git::Repository;
use crate::workflow::{self, FlowContext, WorkflowResult};

/// One workflow invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowRequest {
    Init,
    StartRelease { version: String },
    BuildRelease { version: String },
    FinishRelease { version: String },
    StartHotfix { name: String },
    FinishHotfix { name: String },
    StartDevelopment { full_branch_name: String },
    FinishDevelopment {
        full_branch_name: String,
        delete_branch_after: bool,
    },
    PublishRelease { version: String },
}

impl From<Command> for WorkflowRequest {
    fn from(command: Command) -> Self {
        match command {
            Command::Init => WorkflowRequest::Init,
            Command::StartRelease { version } => WorkflowRequest::StartRelease { version },
            Command::BuildRelease { version } => WorkflowRequest::BuildRelease { version },
            Command::FinishRelease { version } => WorkflowRequest::FinishRelease { version },
            Command::StartHotfix { name } => WorkflowRequest::StartHotfix { name },
            Command::FinishHotfix { name } => WorkflowRequest::FinishHotfix { name },
            Command::StartDevelopment { full_branch_name } => {
                WorkflowRequest::StartDevelopment { full_branch_name }
            }
            Command::FinishDevelopment {
                full_branch_name,
                delete_branch_after,
            } => WorkflowRequest::FinishDevelopment {
                full_branch_name,
                delete_branch_after,
            },
            Command::PublishRelease { version, .. } => WorkflowRequest::PublishRelease { version },
        }
    }
}

/// Run the requested operation against the given context
pub fn run_workflow<R, B>(request: &WorkflowRequest, ctx: &FlowContext<'_, R, B>) -> WorkflowResult
where
    R: Repository + ?Sized,
    B: BuildTool + ?Sized,
{
    match request {
        WorkflowRequest::Init => workflow::init(ctx),
        WorkflowRequest::StartRelease { version } => workflow::start_release(ctx, version),
        WorkflowRequest::BuildRelease { version } => workflow::build_release(ctx, version),
        WorkflowRequest::FinishRelease { version } => workflow::finish_release(ctx, version),
        WorkflowRequest::StartHotfix { name } => workflow::start_hotfix(ctx, name),
        WorkflowRequest::FinishHotfix { name } => workflow::finish_hotfix(ctx, name),
        WorkflowRequest::StartDevelopment { full_branch_name } => {
            workflow::start_development(ctx, full_branch_name)
        }
        WorkflowRequest::FinishDevelopment {
            full_branch_name,
            delete_branch_after,
        } => workflow::finish_development(ctx, full_branch_name, *delete_branch_after),
        WorkflowRequest::PublishRelease { version } => workflow::publish_release(ctx, version),
    }
}
