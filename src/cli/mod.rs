//! Command-line surface
//!
//! `Cli` is the clap definition used by the binary; [orchestration] turns a parsed
//! command into a workflow call without depending on clap.

pub mod orchestration;

pub use orchestration::{run_workflow, WorkflowRequest};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "git-flow",
    version,
    about = "Release, hotfix and feature branch workflow for Maven projects"
)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Username for the remote")]
    pub username: Option<String>,

    #[arg(long, global = true, help = "Password or token for the remote")]
    pub password: Option<String>,

    #[arg(long, global = true, help = "Skip tests when building the project")]
    pub skip_tests: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create develop from master and tag the first version
    Init,

    /// Start a release branch from develop
    StartRelease {
        /// Release version, e.g. 1.2
        version: String,
    },

    /// Merge develop into a release branch and tag it
    BuildRelease {
        /// Release version, e.g. 1.2
        version: String,
    },

    /// Merge a release branch into develop and tag it
    FinishRelease {
        /// Release version, e.g. 1.2
        version: String,
    },

    /// Start a hotfix branch from master
    StartHotfix {
        /// Hotfix name, e.g. fix-login
        name: String,
    },

    /// Merge a hotfix branch into master and develop
    FinishHotfix {
        /// Hotfix name, e.g. fix-login
        name: String,
    },

    /// Start a feature or bugfix branch from its release branch
    StartDevelopment {
        /// <feature|bugfix>/<release>/<name>, e.g. feature/1.2/search
        full_branch_name: String,
    },

    /// Merge a feature or bugfix branch into its release branch
    FinishDevelopment {
        /// <feature|bugfix>/<release>/<name>, e.g. feature/1.2/search
        full_branch_name: String,

        #[arg(long, help = "Delete the branch once merged")]
        delete_branch_after: bool,
    },

    /// Merge the latest tag of a release into master and remove its branches
    PublishRelease {
        /// Release version, e.g. 1.2
        version: String,

        #[arg(short, long, help = "Skip confirmation prompt")]
        force: bool,
    },
}

impl Command {
    /// Publishing deletes branches and needs an explicit go-ahead
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Command::PublishRelease { force: false, .. })
    }
}
