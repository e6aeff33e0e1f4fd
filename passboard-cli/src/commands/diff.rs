//! `passboard diff`: show the unified diff publishing would apply.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use passboard_sync::{diff::diff_document, pipeline::renderer_for};

use crate::GlobalArgs;

/// Arguments for `passboard diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<ExitCode> {
        let config = globals.resolve()?;
        let renderer = renderer_for(&config).context("failed to load templates")?;

        let diff = diff_document(&config, &renderer)
            .with_context(|| format!("diff failed for {}", config.document.display()))?;

        match diff {
            None => println!("No differences for {}.", config.document.display()),
            Some(diff) => {
                print!("{}", diff.unified_diff);
                if !diff.unified_diff.ends_with('\n') {
                    println!();
                }
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}
