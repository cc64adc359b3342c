//! `envsync diff`: unified diff of the remote copy against the local file.

use anyhow::{Context, Result};
use clap::Args;

use envsync_sync::diff::diff_env;

use super::open_manager;
use crate::GlobalArgs;

/// Arguments for `envsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<()> {
        let (project, manager) = open_manager(globals)?;
        let diff = diff_env(&manager)
            .with_context(|| format!("diff failed for '{}'", project.secret_name))?;

        if !diff.remote_exists {
            println!("'{}' does not exist remotely yet.", project.secret_name);
        }
        if !diff.local_exists {
            println!("{} does not exist locally yet.", manager.env_file().display());
        }
        if diff.is_empty() {
            println!("No differences for '{}'.", project.secret_name);
            return Ok(());
        }

        print!("{}", diff.unified_diff);
        if !diff.unified_diff.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
