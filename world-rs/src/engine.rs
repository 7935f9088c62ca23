//! The numeric engine seam.
//!
//! [`Engine`] is the call contract between the orchestrator and whatever
//! performs the DSP: one method per entry point, with buffers already
//! sized and allocated by the caller. [`World`] implements it over the
//! linked WORLD library.
//!
//! # Thread Safety
//!
//! Implementations must tolerate concurrent calls from several threads,
//! each with its own buffers. The orchestrator assumes this but cannot
//! enforce it; the `Send + Sync` bound is the closest the type system
//! gets.

use tracing::trace;

use crate::error::{c_len, Error, Result};
use crate::matrix::{ColumnPointers, ColumnPointersMut};
use crate::options::{AperiodicityOptions, F0Options, SampleRate, SpectralEnvelopeOptions};

/// One entry point per call in the engine's contract.
///
/// Every output buffer is caller-owned and pre-sized; an engine only
/// writes into it. Lengths are already checked by the orchestrator, but
/// implementations still return [`Error::NumericEngine`] on any fault they
/// can observe.
pub trait Engine: Send + Sync {
    /// Number of analysis frames for `signal_length` samples.
    fn frame_count(
        &self,
        sample_rate: SampleRate,
        signal_length: usize,
        frame_period_ms: f64,
    ) -> Result<usize>;

    /// FFT size used by the spectral stages at `sample_rate`.
    fn fft_size(&self, sample_rate: SampleRate) -> Result<usize>;

    /// Fill `time_axis` and `f0` (equal, pre-sized lengths).
    fn estimate_f0(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        options: &F0Options,
        time_axis: &mut [f64],
        f0: &mut [f64],
    ) -> Result<()>;

    /// Fill `refined` (same length as `f0`).
    fn refine_f0(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        refined: &mut [f64],
    ) -> Result<()>;

    /// Fill one column per frame of `spectrogram`.
    fn spectral_envelope(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        options: &SpectralEnvelopeOptions,
        spectrogram: &mut ColumnPointersMut<'_>,
    ) -> Result<()>;

    /// Fill one column per frame of `aperiodicity`.
    #[allow(clippy::too_many_arguments)]
    fn aperiodicity(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        fft_size: usize,
        options: &AperiodicityOptions,
        aperiodicity: &mut ColumnPointersMut<'_>,
    ) -> Result<()>;

    /// Fill `output` with the resynthesized waveform.
    #[allow(clippy::too_many_arguments)]
    fn synthesize(
        &self,
        f0: &[f64],
        spectrogram: &ColumnPointers<'_>,
        aperiodicity: &ColumnPointers<'_>,
        fft_size: usize,
        frame_period_ms: f64,
        sample_rate: SampleRate,
        output: &mut [f64],
    ) -> Result<()>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn frame_count(&self, fs: SampleRate, len: usize, period: f64) -> Result<usize> {
        (**self).frame_count(fs, len, period)
    }

    fn fft_size(&self, fs: SampleRate) -> Result<usize> {
        (**self).fft_size(fs)
    }

    fn estimate_f0(
        &self,
        signal: &[f64],
        fs: SampleRate,
        options: &F0Options,
        time_axis: &mut [f64],
        f0: &mut [f64],
    ) -> Result<()> {
        (**self).estimate_f0(signal, fs, options, time_axis, f0)
    }

    fn refine_f0(
        &self,
        signal: &[f64],
        fs: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        refined: &mut [f64],
    ) -> Result<()> {
        (**self).refine_f0(signal, fs, time_axis, f0, refined)
    }

    fn spectral_envelope(
        &self,
        signal: &[f64],
        fs: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        options: &SpectralEnvelopeOptions,
        spectrogram: &mut ColumnPointersMut<'_>,
    ) -> Result<()> {
        (**self).spectral_envelope(signal, fs, time_axis, f0, options, spectrogram)
    }

    fn aperiodicity(
        &self,
        signal: &[f64],
        fs: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        fft_size: usize,
        options: &AperiodicityOptions,
        aperiodicity: &mut ColumnPointersMut<'_>,
    ) -> Result<()> {
        (**self).aperiodicity(signal, fs, time_axis, f0, fft_size, options, aperiodicity)
    }

    fn synthesize(
        &self,
        f0: &[f64],
        spectrogram: &ColumnPointers<'_>,
        aperiodicity: &ColumnPointers<'_>,
        fft_size: usize,
        frame_period_ms: f64,
        fs: SampleRate,
        output: &mut [f64],
    ) -> Result<()> {
        (**self).synthesize(
            f0,
            spectrogram,
            aperiodicity,
            fft_size,
            frame_period_ms,
            fs,
            output,
        )
    }
}

// ============================================================================
// World
// ============================================================================

/// The WORLD library, called through `world-sys`.
///
/// Stateless: every call goes straight to the library on the calling
/// thread and blocks until it returns.
#[derive(Debug, Clone, Copy)]
pub struct World {
    _private: (),
}

impl World {
    /// Get a handle to the linked library.
    ///
    /// # Errors
    ///
    /// [`Error::NumericEngine`] if `world-sys` was built without the
    /// library (stub bindings).
    pub fn new() -> Result<Self> {
        if !Self::is_available() {
            return Err(Error::numeric_engine(
                "World::new",
                "the WORLD library was not linked when world-sys was built",
            ));
        }
        Ok(World { _private: () })
    }

    /// Check whether the library was linked at build time.
    pub fn is_available() -> bool {
        !world_sys::STUB_BINDINGS
    }
}

/// Reject NaN or infinite values written by the library.
fn check_finite(call: &'static str, what: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(Error::numeric_engine(
            call,
            format!("non-finite {} value at index {}", what, index),
        )),
        None => Ok(()),
    }
}

/// Reject a buffer whose length differs from the frame count.
fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::shape_mismatch(what, expected, actual));
    }
    Ok(())
}

impl Engine for World {
    fn frame_count(
        &self,
        sample_rate: SampleRate,
        signal_length: usize,
        frame_period_ms: f64,
    ) -> Result<usize> {
        let x_length = c_len("signal length", signal_length)?;
        // SAFETY: pure arithmetic on scalars.
        let frames = unsafe {
            world_sys::GetSamplesForDIO(sample_rate.as_c_int(), x_length, frame_period_ms)
        };
        trace!(frames = frames, "GetSamplesForDIO");
        usize::try_from(frames).map_err(|_| {
            Error::numeric_engine("GetSamplesForDIO", format!("returned {}", frames))
        })
    }

    fn fft_size(&self, sample_rate: SampleRate) -> Result<usize> {
        // SAFETY: pure arithmetic on a scalar.
        let fft_size = unsafe { world_sys::GetFFTSizeForCheapTrick(sample_rate.as_c_int()) };
        trace!(fft_size = fft_size, "GetFFTSizeForCheapTrick");
        if fft_size <= 0 {
            return Err(Error::numeric_engine(
                "GetFFTSizeForCheapTrick",
                format!("returned {}", fft_size),
            ));
        }
        Ok(fft_size as usize)
    }

    fn estimate_f0(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        options: &F0Options,
        time_axis: &mut [f64],
        f0: &mut [f64],
    ) -> Result<()> {
        let x_length = c_len("signal length", signal.len())?;
        let frames = self.frame_count(sample_rate, signal.len(), options.frame_period_ms())?;
        check_len("time axis", frames, time_axis.len())?;
        check_len("f0", frames, f0.len())?;

        let raw = options.to_raw();
        // SAFETY: both outputs hold exactly GetSamplesForDIO(..) elements.
        unsafe {
            world_sys::Dio(
                signal.as_ptr(),
                x_length,
                sample_rate.as_c_int(),
                &raw,
                time_axis.as_mut_ptr(),
                f0.as_mut_ptr(),
            );
        }

        check_finite("Dio", "f0", f0)?;
        check_finite("Dio", "time axis", time_axis)
    }

    fn refine_f0(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        refined: &mut [f64],
    ) -> Result<()> {
        let x_length = c_len("signal length", signal.len())?;
        let f0_length = c_len("f0 length", f0.len())?;
        check_len("time axis", f0.len(), time_axis.len())?;
        check_len("refined f0", f0.len(), refined.len())?;

        // SAFETY: all three per-frame buffers hold f0_length elements.
        unsafe {
            world_sys::StoneMask(
                signal.as_ptr(),
                x_length,
                sample_rate.as_c_int(),
                time_axis.as_ptr(),
                f0.as_ptr(),
                f0_length,
                refined.as_mut_ptr(),
            );
        }

        check_finite("StoneMask", "f0", refined)
    }

    fn spectral_envelope(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        options: &SpectralEnvelopeOptions,
        spectrogram: &mut ColumnPointersMut<'_>,
    ) -> Result<()> {
        let x_length = c_len("signal length", signal.len())?;
        let f0_length = c_len("f0 length", f0.len())?;
        check_len("time axis", f0.len(), time_axis.len())?;
        check_len("spectrogram columns", f0.len(), spectrogram.len())?;
        let bins = self.fft_size(sample_rate)? / 2 + 1;
        check_len("spectrogram rows", bins, spectrogram.rows())?;

        let raw = options.to_raw();
        // SAFETY: one column pointer per frame, each addressing `bins`
        // elements of a matrix borrowed for the duration of the call.
        unsafe {
            world_sys::CheapTrick(
                signal.as_ptr(),
                x_length,
                sample_rate.as_c_int(),
                time_axis.as_ptr(),
                f0.as_ptr(),
                f0_length,
                &raw,
                spectrogram.as_mut_ptr(),
            );
        }

        for col in 0..spectrogram.len() {
            check_finite("CheapTrick", "spectral envelope", spectrogram.column_mut(col))?;
        }
        Ok(())
    }

    fn aperiodicity(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        fft_size: usize,
        options: &AperiodicityOptions,
        aperiodicity: &mut ColumnPointersMut<'_>,
    ) -> Result<()> {
        let x_length = c_len("signal length", signal.len())?;
        let f0_length = c_len("f0 length", f0.len())?;
        let fft_size_c = c_len("fft size", fft_size)?;
        check_len("time axis", f0.len(), time_axis.len())?;
        check_len("aperiodicity columns", f0.len(), aperiodicity.len())?;
        check_len("aperiodicity rows", fft_size / 2 + 1, aperiodicity.rows())?;

        let raw = options.to_raw();
        // SAFETY: one column pointer per frame, each addressing
        // fft_size / 2 + 1 elements of a borrowed matrix.
        unsafe {
            world_sys::D4C(
                signal.as_ptr(),
                x_length,
                sample_rate.as_c_int(),
                time_axis.as_ptr(),
                f0.as_ptr(),
                f0_length,
                fft_size_c,
                &raw,
                aperiodicity.as_mut_ptr(),
            );
        }

        for col in 0..aperiodicity.len() {
            check_finite("D4C", "aperiodicity", aperiodicity.column_mut(col))?;
        }
        Ok(())
    }

    fn synthesize(
        &self,
        f0: &[f64],
        spectrogram: &ColumnPointers<'_>,
        aperiodicity: &ColumnPointers<'_>,
        fft_size: usize,
        frame_period_ms: f64,
        sample_rate: SampleRate,
        output: &mut [f64],
    ) -> Result<()> {
        let f0_length = c_len("f0 length", f0.len())?;
        let fft_size_c = c_len("fft size", fft_size)?;
        let y_length = c_len("output length", output.len())?;
        check_len("spectrogram columns", f0.len(), spectrogram.len())?;
        check_len("aperiodicity columns", f0.len(), aperiodicity.len())?;
        check_len("spectrogram rows", fft_size / 2 + 1, spectrogram.rows())?;
        check_len("aperiodicity rows", fft_size / 2 + 1, aperiodicity.rows())?;

        // SAFETY: matrices are borrowed for the call, one pointer per frame,
        // and `output` holds y_length elements.
        unsafe {
            world_sys::Synthesis(
                f0.as_ptr(),
                f0_length,
                spectrogram.as_ptr(),
                aperiodicity.as_ptr(),
                fft_size_c,
                frame_period_ms,
                sample_rate.as_c_int(),
                y_length,
                output.as_mut_ptr(),
            );
        }

        check_finite("Synthesis", "output", output)
    }
}
