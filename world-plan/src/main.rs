//! world-plan - Validate, size and self-check WORLD analysis runs.
//!
//! The tool exercises the world-rs pipeline without any audio files:
//! it checks option sets, prints buffer plans, and round trips a
//! synthetic signal through every stage.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, Command};

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(args) {
        output::print_error(&e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked by -v/-q.
fn init_logging(args: &Args) {
    let level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main dispatch function.
fn run(args: Args) -> Result<()> {
    args.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    match &args.command {
        Command::Plan {
            sample_rate,
            length,
            seconds,
            frame_period,
            json,
        } => commands::plan::run(*sample_rate, *length, *seconds, *frame_period, *json, args.quiet),
        Command::Check { options, json } => commands::check::run(options, *json, args.quiet),
        Command::Selftest {
            sample_rate,
            seconds,
            tone,
            options,
        } => commands::selftest::run(*sample_rate, *seconds, *tone, options, args.quiet),
    }
}
