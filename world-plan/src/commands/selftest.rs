//! Synthetic round-trip command.

use std::f64::consts::PI;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use colored::Colorize;
use tracing::info;
use world_rs::{Pipeline, SampleRate};

use crate::cli::OptionArgs;
use crate::output;

/// Run the selftest command.
pub fn run(
    sample_rate: u32,
    seconds: f64,
    tone: Option<f64>,
    options: &OptionArgs,
    quiet: bool,
) -> Result<()> {
    let fs = SampleRate::new(sample_rate).context("Invalid sample rate")?;
    let config = super::resolve_config(options)?;
    let signal = synthetic_signal(fs, seconds, tone);
    let pipeline = Pipeline::new(super::engine()?);

    info!("selftest: {} samples at {}", signal.len(), fs);
    let start = Instant::now();
    let analysis = pipeline
        .analyze(&signal, fs, &config)
        .context("Analysis failed")?;
    let analyzed = start.elapsed();
    let output = pipeline
        .resynthesize(&analysis, Some(signal.len()))
        .context("Synthesis failed")?;
    let total = start.elapsed();

    ensure!(
        output.len() == signal.len(),
        "synthesized {} samples, expected {}",
        output.len(),
        signal.len()
    );
    let peak = output.iter().fold(0.0f64, |m, y| m.max(y.abs()));

    if !quiet {
        println!("{}", "Round Trip".bold().underline());
        println!();
        let source = match tone {
            Some(hz) => format!("{} Hz sine", hz),
            None => "silence".to_string(),
        };
        output::print_kv("Signal", &format!("{}, {}", source, output::format_duration(seconds)), 2);
        output::print_kv("Frames", &output::format_number(analysis.frames()), 2);
        output::print_kv("Voiced frames", &output::format_number(analysis.f0.voiced_frames()), 2);
        output::print_kv("F0 source", &analysis.f0.source().to_string(), 2);
        output::print_kv("FFT size", &analysis.fft_size().to_string(), 2);
        output::print_kv("Output peak", &format!("{:.4}", peak), 2);
        output::print_kv("Analysis time", &output::format_duration(analyzed.as_secs_f64()), 2);
        output::print_kv("Total time", &output::format_duration(total.as_secs_f64()), 2);
        println!();
    }

    output::print_success(
        &format!("{} samples analyzed and resynthesized", output::format_number(output.len())),
        quiet,
    );
    Ok(())
}

/// Silence, or a half-scale sine at `tone` Hz.
fn synthetic_signal(fs: SampleRate, seconds: f64, tone: Option<f64>) -> Vec<f64> {
    let rate = fs.hz() as f64;
    let len = (seconds * rate).round() as usize;
    match tone {
        Some(hz) => (0..len)
            .map(|i| 0.5 * (2.0 * PI * hz * i as f64 / rate).sin())
            .collect(),
        None => vec![0.0; len],
    }
}
