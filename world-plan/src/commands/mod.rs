//! Subcommand implementations.

pub mod check;
pub mod plan;
pub mod selftest;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use world_rs::{AnalysisConfig, F0Options, Refinement, SpectralEnvelopeOptions, World};

use crate::cli::OptionArgs;

/// Defaults, then `--config`, then individual flags.
pub fn resolve_config(options: &OptionArgs) -> Result<AnalysisConfig> {
    let base = match &options.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };

    let f0 = apply_f0_flags(options, base.f0).context("Invalid F0 options")?;
    let spectral = match options.q1 {
        Some(q1) => SpectralEnvelopeOptions::new(q1).context("Invalid spectral envelope options")?,
        None => base.spectral,
    };
    let refinement = if options.no_refine {
        Refinement::Skip
    } else {
        base.refinement
    };

    Ok(base.f0(f0).spectral(spectral).refinement(refinement))
}

fn apply_f0_flags(options: &OptionArgs, base: F0Options) -> world_rs::Result<F0Options> {
    let mut draft = base.to_builder();
    if let Some(hz) = options.f0_floor {
        draft = draft.f0_floor(hz);
    }
    if let Some(hz) = options.f0_ceil {
        draft = draft.f0_ceil(hz);
    }
    if let Some(n) = options.channels_per_octave {
        draft = draft.channels_per_octave(n);
    }
    if let Some(ms) = options.frame_period {
        draft = draft.frame_period_ms(ms);
    }
    if let Some(speed) = options.speed {
        draft = draft.speed_factor(speed);
    }
    if let Some(range) = options.allowed_range {
        draft = draft.allowed_range(range);
    }
    draft.build()
}

fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid analysis config: {}", path.display()))
}

/// The linked engine, or an error explaining how to get one.
pub fn engine() -> Result<World> {
    World::new().context(
        "This command needs the WORLD library; rebuild with it installed (pkg-config `world`) or with --features bundled",
    )
}
