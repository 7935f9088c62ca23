//! Option validation command.

use anyhow::Result;
use colored::Colorize;
use world_rs::{AnalysisConfig, Refinement};

use crate::cli::OptionArgs;
use crate::output;

/// Run the check command.
pub fn run(options: &OptionArgs, json: bool, quiet: bool) -> Result<()> {
    let config = super::resolve_config(options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if !quiet {
        print_config(&config);
        println!();
    }
    output::print_success("options are valid", quiet);
    Ok(())
}

fn print_config(config: &AnalysisConfig) {
    let f0 = &config.f0;

    println!("{}", "F0 Estimation".bold().underline());
    println!();
    output::print_kv("F0 range", &format!("{} Hz to {} Hz", f0.f0_floor(), f0.f0_ceil()), 2);
    output::print_kv("Channels per octave", &f0.channels_per_octave().to_string(), 2);
    output::print_kv("Frame period", &format!("{} ms", f0.frame_period_ms()), 2);
    output::print_kv("Speed factor", &f0.speed_factor().to_string(), 2);
    output::print_kv("Allowed range", &f0.allowed_range().to_string(), 2);

    output::print_header("Later Stages");
    println!();
    let refinement = match config.refinement {
        Refinement::StoneMask => "on",
        Refinement::Skip => "off",
    };
    output::print_kv("Refinement", refinement, 2);
    output::print_kv("Envelope q1", &config.spectral.q1().to_string(), 2);
    output::print_kv("Aperiodicity reserved", &config.aperiodicity.reserved().to_string(), 2);
}
