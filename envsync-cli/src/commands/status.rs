//! `envsync status`: where the local file stands against the remote copy.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use envsync_sync::status::{self, format_datetime_age};
use envsync_sync::{StatusReport, SyncStatus};

use super::open_manager;
use crate::GlobalArgs;

/// Arguments for `envsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "env file")]
    env_file: String,
    #[tabled(rename = "secret")]
    secret: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "last sync")]
    last_sync: String,
    #[tabled(rename = "by")]
    by: String,
    #[tabled(rename = "conflicts")]
    conflicts: u64,
}

impl StatusArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<()> {
        let (project, manager) = open_manager(globals)?;
        let report = status::check(&manager)
            .with_context(|| format!("status check failed for '{}'", project.secret_name))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&report);
        Ok(())
    }
}

fn print_table(report: &StatusReport) {
    println!(
        "envsync v{} | {} {}",
        env!("CARGO_PKG_VERSION"),
        status_indicator(report.status),
        report.status.to_string().to_uppercase(),
    );

    let row = StatusTableRow {
        env_file: report.env_file.clone(),
        secret: report.secret_name.clone(),
        status: report.status.to_string(),
        last_sync: last_sync_label(report),
        by: report
            .last_sync_by
            .map(|actor| actor.to_string())
            .unwrap_or_else(|| "-".to_string()),
        conflicts: report.conflict_count,
    };
    let mut table = Table::new([row]);
    table.with(Style::rounded());
    println!("{table}");

    if report.status != SyncStatus::InSync {
        println!("{}", report.status.hint().bright_black());
    }
}

fn last_sync_label(report: &StatusReport) -> String {
    match report.last_sync_time {
        Some(at) => format!(
            "{} ({} ago)",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            format_datetime_age(at)
        ),
        None => "never".to_string(),
    }
}

fn status_indicator(status: SyncStatus) -> String {
    match status {
        SyncStatus::InSync => "■".green().bold().to_string(),
        SyncStatus::LocalAhead | SyncStatus::RemoteAhead => "■".yellow().bold().to_string(),
        SyncStatus::Diverged => "■".red().bold().to_string(),
        SyncStatus::NeverSynced | SyncStatus::RemoteMissing => "■".bright_black().bold().to_string(),
    }
}
