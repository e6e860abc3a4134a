use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use git_flow::build::Maven;
use git_flow::cli::{run_workflow, Cli, WorkflowRequest};
use git_flow::config;
use git_flow::domain::FlowPattern;
use git_flow::git::{Credentials, Git2Repository};
use git_flow::ui;
use git_flow::workflow::FlowContext;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "git_flow=debug" } else { "git_flow=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };
    if cli.skip_tests {
        config.build.skip_tests = true;
    }

    let pattern = FlowPattern::new(&config.branches).context("invalid branch naming scheme")?;

    let credentials = Credentials {
        username: cli.username.clone(),
        password: cli.password.clone(),
    };
    let repo = match Git2Repository::open(".", &config.branches.origin, credentials) {
        Ok(repo) => repo.with_tag_namespace(&config.branches.tag_namespace),
        Err(e) => {
            ui::display_error(&format!("Git repository error: {}", e));
            std::process::exit(1);
        }
    };

    let workdir = std::env::current_dir().context("cannot determine working directory")?;
    let maven = Maven::new(&workdir, &config.build);

    if cli.command.needs_confirmation()
        && !ui::confirm_action("Publishing merges the release into master and deletes its branches. Continue?")?
    {
        ui::display_status("Operation cancelled by user");
        return Ok(());
    }

    let ctx = FlowContext::new(&repo, &maven, &pattern, &config);
    let request = WorkflowRequest::from(cli.command);

    match run_workflow(&request, &ctx) {
        Ok(report) => {
            ui::display_report(&report);
            Ok(())
        }
        Err(failure) => {
            ui::display_failure(&failure);
            std::process::exit(1);
        }
    }
}
