//! # world-rs
//!
//! Safe orchestration of the WORLD speech analysis/resynthesis stages:
//! F0 estimation, F0 refinement, spectral envelope, aperiodicity and
//! waveform synthesis.
//!
//! The DSP lives in the WORLD library. This crate validates options,
//! sizes every buffer the library writes into, marshals matrices to and
//! from the library's pointer-per-frame layout, and sequences the stages
//! with shape checks at each hand-off.
//!
//! ## Quick Start
//!
//! ```no_run
//! use world_rs::{F0Options, Pipeline, Result, SampleRate, SpectralEnvelopeOptions};
//! use world_rs::AperiodicityOptions;
//!
//! fn main() -> Result<()> {
//!     let pipeline = Pipeline::world()?;
//!     let fs = SampleRate::new(44100)?;
//!     let signal = vec![0.0; 44100];
//!
//!     let f0_options = F0Options::builder()
//!         .f0_floor(80.0)
//!         .f0_ceil(640.0)
//!         .build()?;
//!
//!     let raw = pipeline.estimate_f0(&signal, fs, &f0_options)?;
//!     let track = pipeline.refine_f0(&signal, fs, &raw)?;
//!     let spectral = pipeline.estimate_spectral_envelope(
//!         &signal,
//!         fs,
//!         &track,
//!         &SpectralEnvelopeOptions::default(),
//!     )?;
//!     let aperiodicity =
//!         pipeline.estimate_aperiodicity(&signal, fs, &track, &AperiodicityOptions::default())?;
//!
//!     println!("{} frames, {} bins", track.len(), spectral.bins());
//!
//!     let output = pipeline.synthesize(
//!         &track,
//!         &spectral,
//!         &aperiodicity,
//!         f0_options.frame_period_ms(),
//!         fs,
//!         signal.len(),
//!     )?;
//!     assert_eq!(output.len(), signal.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Engines
//!
//! [`Pipeline`] is generic over [`Engine`], the call contract of the
//! numeric library. [`World`] is the implementation over the linked C
//! library; tests and alternative back ends can provide their own.
//!
//! ## Feature Flags
//!
//! - `ndarray`: Convert [`Matrix`] to and from `ndarray::Array2`
//! - `serde`: Validated (de)serialization of the option records
//! - `bundled`: Compile WORLD from a bundled source tree
//! - `static`: Force static linking of WORLD
//!
//! ## Thread Safety
//!
//! Nothing in this crate holds global or mutable state. A [`Pipeline`]
//! can be shared across threads; each run allocates its own buffers.

#![deny(missing_docs)]

// Modules
mod engine;
mod error;
mod matrix;
mod options;
mod pipeline;
pub mod sizing;
mod track;

// Public exports
pub use engine::{Engine, World};
pub use error::{Error, Result};
pub use matrix::{from_pointer_columns, ColumnPointers, ColumnPointersMut, Matrix};
pub use options::{
    AnalysisConfig, AperiodicityOptions, F0Options, F0OptionsBuilder, Refinement, SampleRate,
    SpectralEnvelopeOptions, DEFAULT_SAMPLE_RATE, SPEED_FACTOR_RANGE,
};
pub use pipeline::Pipeline;
pub use sizing::{fft_size, frame_count, frequency_bin_count, output_length, BufferPlan};
pub use track::{Analysis, Aperiodicity, F0Source, F0Track, SpectralEnvelope};

// Conditional re-exports
#[cfg(feature = "ndarray")]
pub use ndarray;
