use anyhow::{Context, Result};
use renderer::{Effect, EffectConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let defaults = EffectConfig::default();
    let config = EffectConfig {
        surface_size: cli.size,
        antialiasing: cli.antialias,
        target_fps: cli.fps,
        lerp_factor: cli.lerp_factor.unwrap_or(defaults.lerp_factor),
        time_scale: cli.time_scale.unwrap_or(defaults.time_scale),
    };

    tracing::info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        fps = ?config.target_fps,
        "launching metaball background effect"
    );

    let effect = Effect::launch(config).context("failed to launch the effect")?;
    effect.wait()
}
