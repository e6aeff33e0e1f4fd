//! Shared cycle entrypoint used by the CLI and the runner.

use passboard_core::ResolvedConfig;
use passboard_renderer::Renderer;

use crate::extract::CommandExtractor;
use crate::orchestrator::{CycleOutcome, Orchestrator};
use crate::publish::PublishMode;
use crate::SyncError;

/// Renderer for the configured region and template overrides.
pub fn renderer_for(config: &ResolvedConfig) -> Result<Renderer, SyncError> {
    Ok(Renderer::with_template_dir(
        config.region.clone(),
        config.template_dir.as_deref(),
    )?)
}

/// Orchestrator wired to the configured shell extractor.
pub fn build(config: &ResolvedConfig, mode: PublishMode) -> Result<Orchestrator<CommandExtractor>, SyncError> {
    let extractor = CommandExtractor::from_config(config)?;
    let renderer = renderer_for(config)?;
    Ok(Orchestrator::new(extractor, renderer, config).with_mode(mode))
}

/// Build an orchestrator and run a single cycle.
pub fn run_once(config: &ResolvedConfig, mode: PublishMode) -> Result<CycleOutcome, SyncError> {
    let mut orchestrator = build(config, mode)?;
    Ok(orchestrator.cycle())
}
