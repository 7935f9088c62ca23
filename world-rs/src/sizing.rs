//! Buffer sizing.
//!
//! Each stage writes into caller-allocated buffers whose lengths the
//! engine dictates. These functions ask the engine, so callers never
//! under- or over-allocate. They are deterministic and deliberately
//! uncached.

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::options::{validate_frame_period, SampleRate};

/// Number of analysis frames for `signal_length` samples.
///
/// A zero-length signal has zero frames; the engine is not consulted for
/// it (it would report a single frame for an empty buffer).
///
/// # Errors
///
/// - [`Error::Configuration`] if `frame_period_ms` is not finite and positive
/// - [`Error::LengthOverflow`] if `signal_length` exceeds the engine's `int`
/// - [`Error::NumericEngine`] if the engine reports a bad count
pub fn frame_count<E: Engine>(
    engine: &E,
    sample_rate: SampleRate,
    signal_length: usize,
    frame_period_ms: f64,
) -> Result<usize> {
    validate_frame_period(frame_period_ms)?;
    if signal_length == 0 {
        return Ok(0);
    }
    let frames = engine.frame_count(sample_rate, signal_length, frame_period_ms)?;
    if frames == 0 {
        return Err(Error::numeric_engine(
            "frame_count",
            format!("no frames reported for {} samples", signal_length),
        ));
    }
    Ok(frames)
}

/// FFT size the spectral stages use at `sample_rate`.
///
/// # Errors
///
/// [`Error::NumericEngine`] if the engine reports a non-positive size.
pub fn fft_size<E: Engine>(engine: &E, sample_rate: SampleRate) -> Result<usize> {
    let size = engine.fft_size(sample_rate)?;
    if size == 0 {
        return Err(Error::numeric_engine("fft_size", "engine reported 0"));
    }
    Ok(size)
}

/// Rows of every spectral and aperiodicity matrix: `fft_size / 2 + 1`.
pub fn frequency_bin_count<E: Engine>(engine: &E, sample_rate: SampleRate) -> Result<usize> {
    Ok(bins_for_fft_size(fft_size(engine, sample_rate)?))
}

pub(crate) const fn bins_for_fft_size(fft_size: usize) -> usize {
    fft_size / 2 + 1
}

/// Conventional synthesis length for a track of `frames` frames:
/// `floor((frames - 1) * frame_period_ms / 1000 * sample_rate) + 1`, or 0
/// for an empty track.
pub fn output_length(frames: usize, frame_period_ms: f64, sample_rate: SampleRate) -> usize {
    if frames == 0 {
        return 0;
    }
    let seconds = (frames - 1) as f64 * frame_period_ms / 1000.0;
    (seconds * sample_rate.hz() as f64) as usize + 1
}

/// Every buffer size one analysis run needs, derived up front.
///
/// # Example
///
/// ```no_run
/// use world_rs::{BufferPlan, SampleRate, World};
///
/// let engine = World::new()?;
/// let plan = BufferPlan::new(&engine, SampleRate::new(44100)?, 44100, 5.0)?;
/// assert_eq!(plan.frames, 201);
/// assert_eq!(plan.bins, 1025);
/// # Ok::<(), world_rs::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPlan {
    /// Sample rate the plan was derived for.
    pub sample_rate: SampleRate,
    /// Length of the analyzed signal.
    pub signal_length: usize,
    /// Frames in the F0 track and time axis.
    pub frames: usize,
    /// FFT size of the spectral stages.
    pub fft_size: usize,
    /// Rows of each spectral/aperiodicity matrix.
    pub bins: usize,
}

impl BufferPlan {
    /// Derive the plan from the engine.
    pub fn new<E: Engine>(
        engine: &E,
        sample_rate: SampleRate,
        signal_length: usize,
        frame_period_ms: f64,
    ) -> Result<Self> {
        let frames = frame_count(engine, sample_rate, signal_length, frame_period_ms)?;
        let fft_size = fft_size(engine, sample_rate)?;
        Ok(BufferPlan {
            sample_rate,
            signal_length,
            frames,
            fft_size,
            bins: bins_for_fft_size(fft_size),
        })
    }

    /// Elements in one spectral or aperiodicity matrix.
    pub fn matrix_len(&self) -> usize {
        self.bins * self.frames
    }

    /// Bytes of one spectral or aperiodicity matrix.
    pub fn matrix_bytes(&self) -> usize {
        self.matrix_len() * std::mem::size_of::<f64>()
    }
}
