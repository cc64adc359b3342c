//! `envsync generate-key [--format base64|hex] [--output <path>]`

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use envsync_sync::EncryptionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyFormat {
    Base64,
    Hex,
}

/// Arguments for `envsync generate-key`.
#[derive(Args, Debug)]
pub struct GenerateKeyArgs {
    /// Printed encoding. Key files are always base64.
    #[arg(long, value_enum, default_value_t = KeyFormat::Base64, conflicts_with = "output")]
    pub format: KeyFormat,

    /// Write the key to an owner-only file instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl GenerateKeyArgs {
    pub fn run(self) -> Result<()> {
        let key = EncryptionKey::generate();

        let Some(path) = self.output else {
            match self.format {
                KeyFormat::Base64 => println!("{}", key.to_base64()),
                KeyFormat::Hex => println!("{}", key.to_hex()),
            }
            return Ok(());
        };

        write_key_file(&path, &key)?;
        println!("✓ Wrote encryption key to {}", path.display());
        println!("  Set `key_source: file` and `key_file: {}` in .env-sync.yaml", path.display());
        Ok(())
    }
}

fn write_key_file(path: &Path, key: &EncryptionKey) -> Result<()> {
    if path.exists() {
        bail!("{} already exists; refusing to overwrite a key", path.display());
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    writeln!(file, "{}", key.to_base64())
        .and_then(|()| file.sync_all())
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}
