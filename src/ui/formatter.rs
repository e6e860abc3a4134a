//! Pure formatting functions for UI output.
//!
//! `format_*` functions build the text; `display_*` functions print it.

use console::style;

use crate::error::GitFlowError;
use crate::workflow::{WorkflowFailure, WorkflowReport};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Summary lines of a finished operation
pub fn format_report(report: &WorkflowReport) -> Vec<String> {
    let mut lines = vec![format!("{} finished", report.operation)];
    if let Some(branch) = &report.branch {
        lines.push(format!("  Branch:  {}", branch));
    }
    if let Some(tag) = &report.tag {
        lines.push(format!("  Tag:     {}", tag));
    }
    if let Some(version) = &report.version {
        lines.push(format!("  Version: {}", version));
    }
    if let Some(head) = &report.head {
        lines.push(format!("  HEAD:    {}", head));
    }
    lines
}

/// Display the outcome of a successful operation.
pub fn display_report(report: &WorkflowReport) {
    let lines = format_report(report);
    if let Some((first, rest)) = lines.split_first() {
        display_success(first);
        for line in rest {
            println!("{}", line);
        }
    }
}

/// Rollback lines of a failed operation, one per compensation attempted
pub fn format_compensations(failure: &WorkflowFailure) -> Vec<String> {
    failure
        .compensations
        .iter()
        .map(|c| match &c.error {
            None => format!("  rolled back: {}", c.action),
            Some(err) => format!("  rollback failed: {} ({})", c.action, err),
        })
        .collect()
}

/// Display a failed operation: the original error, the rollback attempts and,
/// for merge conflicts, the recovery steps.
pub fn display_failure(failure: &WorkflowFailure) {
    match &failure.error {
        GitFlowError::Conflict {
            files,
            source_ref,
            target_branch,
            remediation,
        } => {
            display_error(&format!(
                "{}: the merge has conflicts, please resolve them manually [from {} to {}]",
                failure.operation, source_ref, target_branch
            ));
            for file in files {
                eprintln!("  {} {}", style("conflict:").red(), file);
            }
            eprintln!("\n{}", style(remediation).bold());
        }
        other => display_error(&format!("{}: {}", failure.operation, other)),
    }

    if !failure.compensations.is_empty() {
        eprintln!("\n{}", style("Rollback:").bold());
        for line in format_compensations(failure) {
            eprintln!("{}", line);
        }
    }
}
