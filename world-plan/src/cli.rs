//! Command-line argument definitions using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Validate, size and self-check WORLD analysis runs.
///
/// world-plan checks option sets before they reach the analysis stages,
/// prints the buffer sizes a run will allocate, and runs a complete
/// analysis/resynthesis round trip on a synthetic signal.
#[derive(Parser, Debug)]
#[command(name = "world-plan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = EXAMPLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Show stage-by-stage logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the buffer sizes for analyzing a signal
    Plan {
        /// Sample rate in Hz
        #[arg(short = 'r', long, value_name = "HZ", default_value = "44100")]
        sample_rate: u32,

        /// Signal length in samples
        #[arg(short = 'n', long, value_name = "N", conflicts_with = "seconds")]
        length: Option<usize>,

        /// Signal length in seconds
        #[arg(short = 's', long, value_name = "S")]
        seconds: Option<f64>,

        /// Frame period in milliseconds
        #[arg(long, value_name = "MS", default_value = "5")]
        frame_period: f64,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate an option set without running anything
    Check {
        #[command(flatten)]
        options: OptionArgs,

        /// Print the resolved options as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze and resynthesize a synthetic signal
    Selftest {
        /// Sample rate in Hz
        #[arg(short = 'r', long, value_name = "HZ", default_value = "44100")]
        sample_rate: u32,

        /// Signal length in seconds
        #[arg(short = 's', long, value_name = "S", default_value = "1")]
        seconds: f64,

        /// Use a sine at this frequency instead of silence
        #[arg(long, value_name = "HZ")]
        tone: Option<f64>,

        #[command(flatten)]
        options: OptionArgs,
    },
}

/// Analysis options shared by `check` and `selftest`.
///
/// Flags override the values loaded from `--config`, which in turn
/// override the defaults.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// JSON file holding an analysis configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    // ========================================================================
    // F0 Estimation
    // ========================================================================
    /// Lower F0 bound in Hz [default: 71]
    #[arg(long, value_name = "HZ")]
    pub f0_floor: Option<f64>,

    /// Upper F0 bound in Hz [default: 800]
    #[arg(long, value_name = "HZ")]
    pub f0_ceil: Option<f64>,

    /// Filter channels per octave [default: 2]
    #[arg(long, value_name = "N")]
    pub channels_per_octave: Option<f64>,

    /// Frame period in milliseconds [default: 5]
    #[arg(long, value_name = "MS")]
    pub frame_period: Option<f64>,

    /// Decimation factor, 1 to 12 [default: 1]
    #[arg(long, value_name = "N")]
    pub speed: Option<u32>,

    /// Allowed F0 fluctuation between channels [default: 0.1]
    #[arg(long, value_name = "X")]
    pub allowed_range: Option<f64>,

    // ========================================================================
    // Later Stages
    // ========================================================================
    /// Spectral envelope smoothing coefficient [default: -0.09]
    #[arg(long, value_name = "X", allow_hyphen_values = true)]
    pub q1: Option<f64>,

    /// Skip F0 refinement
    #[arg(long)]
    pub no_refine: bool,
}

impl Args {
    /// Validate argument combinations that clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet cannot be used together".to_string());
        }

        match &self.command {
            Command::Plan {
                length, seconds, ..
            } => {
                if length.is_none() && seconds.is_none() {
                    return Err("plan needs a signal length: pass --length or --seconds".to_string());
                }
                if let Some(s) = seconds {
                    check_seconds(*s)?;
                }
            }
            Command::Selftest { seconds, tone, .. } => {
                check_seconds(*seconds)?;
                if let Some(hz) = tone {
                    if !hz.is_finite() || *hz <= 0.0 {
                        return Err(format!("--tone must be a positive frequency, got {}", hz));
                    }
                }
            }
            Command::Check { .. } => {}
        }

        Ok(())
    }
}

fn check_seconds(seconds: f64) -> Result<(), String> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("--seconds must be >= 0, got {}", seconds));
    }
    Ok(())
}

const EXAMPLES: &str = r#"
EXAMPLES:
    # Buffer sizes for one second at 44.1 kHz
    world-plan plan --sample-rate 44100 --length 44100

    # Same, for a 10 ms frame period, as JSON
    world-plan plan -r 16000 --seconds 2.5 --frame-period 10 --json

    # Check an option set
    world-plan check --f0-floor 80 --f0-ceil 640 --speed 2

    # Check a configuration file, overriding one field
    world-plan check --config analysis.json --q1 -0.15

    # Round trip one second of silence
    world-plan selftest --sample-rate 16000

    # Round trip a 220 Hz tone without refinement, with stage logging
    world-plan -v selftest --tone 220 --no-refine
"#;
