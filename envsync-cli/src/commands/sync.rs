//! `envsync push` / `envsync pull`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use envsync_sync::{SyncOutcome, SyncReport};

use super::open_manager;
use crate::GlobalArgs;

/// Arguments for `envsync push`.
#[derive(Args, Debug)]
pub struct PushArgs {}

/// Arguments for `envsync pull`.
#[derive(Args, Debug)]
pub struct PullArgs {}

impl PushArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<()> {
        let (project, mut manager) = open_manager(globals)?;
        let report = manager
            .push()
            .with_context(|| format!("push failed for '{}'", project.secret_name))?;
        print_report(&project.secret_name, &report);
        Ok(())
    }
}

impl PullArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<()> {
        let (project, mut manager) = open_manager(globals)?;
        let report = manager
            .pull()
            .with_context(|| format!("pull failed for '{}'", project.secret_name))?;
        print_report(&project.secret_name, &report);
        Ok(())
    }
}

pub(crate) fn print_report(secret_name: &str, report: &SyncReport) {
    println!("{}", describe(secret_name, &report.outcome));
    match &report.outcome {
        SyncOutcome::Resolved {
            conflicting_keys, ..
        } => {
            println!("  conflicting keys: {}", conflicting_keys.join(", "));
            println!("  conflicts so far: {}", report.conflict_count);
        }
        SyncOutcome::MarkersWritten { conflicting_keys } => {
            println!("  conflicting keys: {}", conflicting_keys.join(", "));
            println!("  edit the file to pick a value for each key, then run `envsync push`");
        }
        _ => {}
    }
}

fn describe(secret_name: &str, outcome: &SyncOutcome) -> String {
    let tick = "✓".green().bold();
    match outcome {
        SyncOutcome::FirstPush => format!("{tick} created '{secret_name}' from the local file"),
        SyncOutcome::Uploaded => format!("{tick} pushed local changes to '{secret_name}'"),
        SyncOutcome::AlreadyInSync => format!("{tick} '{secret_name}' already in sync"),
        SyncOutcome::LocalAhead => format!(
            "{tick} local file has unpushed changes; nothing pulled (run `envsync push`)"
        ),
        SyncOutcome::FastForwardRemote => {
            format!("{tick} updated local file from '{secret_name}'")
        }
        SyncOutcome::Merged => {
            format!("{tick} merged non-overlapping changes with '{secret_name}'")
        }
        SyncOutcome::Resolved { policy, .. } => format!(
            "{} conflict with '{secret_name}' resolved ({policy})",
            "!".yellow().bold()
        ),
        SyncOutcome::MarkersWritten { .. } => format!(
            "{} conflict markers written to the local file; '{secret_name}' left unchanged",
            "!".yellow().bold()
        ),
        SyncOutcome::CreatedLocal => format!("{tick} created local file from '{secret_name}'"),
    }
}
