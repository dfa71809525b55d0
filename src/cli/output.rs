use colored::Colorize;
use serde_json::json;

use crate::core::models::outcome::{SyncOutcome, SyncReport};

/// Print a success message.
pub fn success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a header line.
pub fn header(msg: &str) {
    println!("\n{}", msg.bold());
}

/// Print a key id with its public part, dimmed.
pub fn key_line(id: &str, public: Option<&str>) {
    match public {
        Some(public) => println!("  {}  {}", id.bold(), public.dimmed()),
        None => println!("  {}", id.bold()),
    }
}

/// Render the terminal state of an operation.
pub fn outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Completed(report) => completed(report),
        SyncOutcome::Cancelled => warning("Cancelled"),
        SyncOutcome::Failed {
            operation,
            error: err,
            root_cause,
        } => {
            error(&format!("{operation} failed: {err}"));
            if *root_cause != err.to_string() {
                eprintln!("    {} {}", "cause:".dimmed(), root_cause);
            }
            if outcome.rollback_requested() {
                eprintln!("\n  Local commits were kept but are not on the remote.");
            }
        }
    }
}

/// Machine-readable form of `outcome`, one JSON document on stdout.
pub fn outcome_json(outcome: &SyncOutcome) {
    let value = match outcome {
        SyncOutcome::Completed(report) => json!({ "status": "completed", "report": report }),
        SyncOutcome::Cancelled => json!({ "status": "cancelled" }),
        SyncOutcome::Failed {
            operation,
            error,
            root_cause,
        } => json!({
            "status": "failed",
            "operation": operation,
            "error": error.to_string(),
            "root_cause": root_cause,
            "rollback_requested": outcome.rollback_requested(),
        }),
    };
    println!("{value:#}");
}

fn completed(report: &SyncReport) {
    if report.commit_skipped {
        println!("  Nothing to commit");
    }
    if let Some(status) = report.rebase_status {
        println!("  Rebase: {}", format!("{status:?}").dimmed());
    }
    for update in &report.ref_updates {
        println!("  {} {}", update.remote_ref, update.status.name().dimmed());
    }
    success(&format!(
        "{} complete ({} commands)",
        capitalize(&report.operation.to_string()),
        report.commands_run
    ));
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
