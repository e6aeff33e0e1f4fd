//! `passboard init [--command <cmd>] [--page]`

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use passboard_core::Config;

use crate::GlobalArgs;

const STARTER_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Passboard</title>
</head>
<body>
  <section class="list">
  </section>
</body>
</html>
"#;

/// Write a default configuration into the base directory.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Extraction command to put in the new config.
    #[arg(long, value_name = "CMD")]
    pub command: Option<String>,

    /// Also write a starter page with an empty listing region if the
    /// document does not exist yet.
    #[arg(long)]
    pub page: bool,
}

impl InitArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<ExitCode> {
        let path = globals.config_path();
        let config = Config {
            extract_command: self.command,
            ..Config::default()
        };

        if config
            .write_if_absent(&path)
            .with_context(|| format!("failed to write {}", path.display()))?
        {
            println!("✓ Wrote {}", path.display());
        } else {
            println!("• {} already exists; left unchanged", path.display());
        }

        let resolved = globals.resolve()?;
        if let Some(output_dir) = resolved.store.parent() {
            std::fs::create_dir_all(output_dir)
                .with_context(|| format!("failed to create {}", output_dir.display()))?;
            println!("✓ Output directory {}", output_dir.display());
        }

        if self.page && !resolved.document.exists() {
            std::fs::write(&resolved.document, STARTER_PAGE)
                .with_context(|| format!("failed to write {}", resolved.document.display()))?;
            println!("✓ Wrote starter page {}", resolved.document.display());
        }

        if resolved.extract_command.is_none() {
            println!("  Set extract_command in {} before `passboard run`.", path.display());
        }
        Ok(ExitCode::SUCCESS)
    }
}
