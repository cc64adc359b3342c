//! envsync: keep a local env file in sync with an encrypted remote copy.
//!
//! # Usage
//!
//! ```text
//! envsync init --secret-name <name> --store-dir <dir> [--key-source env|file] [--strategy ...]
//! envsync generate-key [--format base64|hex] [--output <path>]
//! envsync push
//! envsync pull
//! envsync watch [--push] [--confirm]
//! envsync status [--json]
//! envsync diff
//! ```
//!
//! Global flags: `--sync-file <path>` (default `.env-sync.yaml`),
//! `--key <base64>` (overrides `ENVSYNC_ENCRYPTION_KEY` and the key file),
//! `--debug`.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, init::InitArgs, keygen::GenerateKeyArgs, status::StatusArgs,
    sync::{PullArgs, PushArgs},
    watch::WatchArgs,
};
use envsync_core::config::DEFAULT_CONFIG_FILE;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "envsync",
    version,
    about = "Sync a local env file with an encrypted remote copy",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the project config.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub sync_file: PathBuf,

    /// Base64 encryption key; takes precedence over the configured source.
    #[arg(long, global = true, value_name = "BASE64")]
    pub key: Option<String>,

    /// Verbose logging.
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new .env-sync.yaml for this project.
    Init(InitArgs),

    /// Generate a random 256-bit encryption key.
    GenerateKey(GenerateKeyArgs),

    /// Publish local changes, reconciling with the remote copy.
    Push(PushArgs),

    /// Fetch the remote copy, reconciling with local changes.
    Pull(PullArgs),

    /// Watch the env file; pull periodically and optionally push edits.
    Watch(WatchArgs),

    /// Show whether local and remote agree.
    Status(StatusArgs),

    /// Unified diff between the remote copy and the local file.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let globals = cli.globals;

    // Logs go to stderr; without --debug only `watch` installs a subscriber.
    match &cli.command {
        Commands::Watch(args) => envsync_daemon::init_tracing(globals.debug, args.json_logs),
        _ if globals.debug => envsync_daemon::init_tracing(true, false),
        _ => {}
    }

    match cli.command {
        Commands::Init(args) => args.run(&globals),
        Commands::GenerateKey(args) => args.run(),
        Commands::Push(args) => args.run(&globals),
        Commands::Pull(args) => args.run(&globals),
        Commands::Watch(args) => args.run(&globals),
        Commands::Status(args) => args.run(&globals),
        Commands::Diff(args) => args.run(&globals),
    }
}
