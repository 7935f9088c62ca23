//! Buffer plan command.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use world_rs::{output_length, BufferPlan, Pipeline, SampleRate};

use crate::output;

/// Run the plan command.
pub fn run(
    sample_rate: u32,
    length: Option<usize>,
    seconds: Option<f64>,
    frame_period_ms: f64,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let fs = SampleRate::new(sample_rate).context("Invalid sample rate")?;
    let signal_length = match (length, seconds) {
        (Some(n), _) => n,
        (None, Some(s)) => (s * fs.hz() as f64).round() as usize,
        (None, None) => 0,
    };

    let pipeline = Pipeline::new(super::engine()?);
    let plan = pipeline
        .plan(fs, signal_length, frame_period_ms)
        .context("Failed to size buffers")?;
    let synthesis_length = output_length(plan.frames, frame_period_ms, fs);

    if json {
        let value = json!({
            "sample_rate": plan.sample_rate.hz(),
            "signal_length": plan.signal_length,
            "frame_period_ms": frame_period_ms,
            "frames": plan.frames,
            "fft_size": plan.fft_size,
            "bins": plan.bins,
            "matrix_bytes": plan.matrix_bytes(),
            "output_length": synthesis_length,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if !quiet {
        print_plan(&plan, frame_period_ms, synthesis_length);
    }
    Ok(())
}

fn print_plan(plan: &BufferPlan, frame_period_ms: f64, synthesis_length: usize) {
    let duration = plan.signal_length as f64 / plan.sample_rate.hz() as f64;

    println!("{}", "Signal".bold().underline());
    println!();
    output::print_kv("Sample rate", &plan.sample_rate.to_string(), 2);
    output::print_kv("Length", &format!("{} samples", output::format_number(plan.signal_length)), 2);
    output::print_kv("Duration", &output::format_duration(duration), 2);

    output::print_header("Buffers");
    println!();
    output::print_kv("Frame period", &format!("{} ms", frame_period_ms), 2);
    output::print_kv("Frames", &output::format_number(plan.frames), 2);
    output::print_kv("FFT size", &plan.fft_size.to_string(), 2);
    output::print_kv("Frequency bins", &plan.bins.to_string(), 2);
    output::print_kv(
        "Matrix shape",
        &format!("{} x {} ({} each)", plan.bins, plan.frames, output::format_size(plan.matrix_bytes())),
        2,
    );
    output::print_kv(
        "Synthesis length",
        &format!("{} samples", output::format_number(synthesis_length)),
        2,
    );
}
