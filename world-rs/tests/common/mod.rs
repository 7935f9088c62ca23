//! A deterministic stand-in for the WORLD library.
//!
//! Sizing follows the library's formulas, so shapes match what the real
//! engine would produce. Outputs are positional patterns that let tests
//! check marshalling order. Every entry point is counted.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use world_rs::{
    AperiodicityOptions, ColumnPointers, ColumnPointersMut, Engine, Error, F0Options, Result,
    SampleRate, SpectralEnvelopeOptions,
};

/// F0 reported for every frame of a non-silent signal.
pub const VOICED_F0: f64 = 150.0;

/// Lower F0 bound the library's FFT sizing assumes.
const FLOOR_F0: f64 = 71.0;

#[derive(Debug, Default)]
pub struct Calls {
    pub sizing: AtomicUsize,
    pub estimate_f0: AtomicUsize,
    pub refine_f0: AtomicUsize,
    pub spectral_envelope: AtomicUsize,
    pub aperiodicity: AtomicUsize,
    pub synthesize: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct FakeEngine {
    pub calls: Calls,
    fault: Option<&'static str>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose `call` always fails.
    pub fn failing(call: &'static str) -> Self {
        FakeEngine {
            calls: Calls::default(),
            fault: Some(call),
        }
    }

    /// Calls to the numeric stages, excluding sizing queries.
    pub fn stage_calls(&self) -> usize {
        [
            &self.calls.estimate_f0,
            &self.calls.refine_f0,
            &self.calls.spectral_envelope,
            &self.calls.aperiodicity,
            &self.calls.synthesize,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn enter(&self, call: &'static str, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.fault == Some(call) {
            return Err(Error::numeric_engine(call, "injected fault"));
        }
        Ok(())
    }
}

/// Frame count the library reports for `len` samples.
pub fn world_frames(fs: u32, len: usize, frame_period_ms: f64) -> usize {
    (1000.0 * len as f64 / fs as f64 / frame_period_ms) as usize + 1
}

/// FFT size the library uses at `fs`.
pub fn world_fft_size(fs: u32) -> usize {
    let exponent = 1 + (3.0 * fs as f64 / FLOOR_F0 + 1.0).log2() as u32;
    1 << exponent
}

/// Value the fake writes at `(bin, frame)` of a spectral envelope.
pub fn spectral_value(bin: usize, frame: usize) -> f64 {
    frame as f64 * 10_000.0 + bin as f64
}

/// Value the fake writes for every bin of an aperiodicity frame.
pub fn aperiodicity_value(frame: usize) -> f64 {
    1.0 / (frame as f64 + 2.0)
}

impl Engine for FakeEngine {
    fn frame_count(&self, fs: SampleRate, len: usize, frame_period_ms: f64) -> Result<usize> {
        self.enter("frame_count", &self.calls.sizing)?;
        Ok(world_frames(fs.hz(), len, frame_period_ms))
    }

    fn fft_size(&self, fs: SampleRate) -> Result<usize> {
        self.enter("fft_size", &self.calls.sizing)?;
        Ok(world_fft_size(fs.hz()))
    }

    fn estimate_f0(
        &self,
        signal: &[f64],
        fs: SampleRate,
        options: &F0Options,
        time_axis: &mut [f64],
        f0: &mut [f64],
    ) -> Result<()> {
        self.enter("estimate_f0", &self.calls.estimate_f0)?;
        let frames = world_frames(fs.hz(), signal.len(), options.frame_period_ms());
        assert_eq!(time_axis.len(), frames);
        assert_eq!(f0.len(), frames);

        let voiced = signal.iter().any(|&x| x != 0.0);
        for (i, (t, f)) in time_axis.iter_mut().zip(f0.iter_mut()).enumerate() {
            *t = i as f64 * options.frame_period_ms() / 1000.0;
            *f = if voiced { VOICED_F0 } else { 0.0 };
        }
        Ok(())
    }

    fn refine_f0(
        &self,
        _signal: &[f64],
        _fs: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        refined: &mut [f64],
    ) -> Result<()> {
        self.enter("refine_f0", &self.calls.refine_f0)?;
        assert_eq!(time_axis.len(), f0.len());
        assert_eq!(refined.len(), f0.len());

        for (r, &f) in refined.iter_mut().zip(f0) {
            *r = if f > 0.0 { f + 1.0 } else { 0.0 };
        }
        Ok(())
    }

    fn spectral_envelope(
        &self,
        _signal: &[f64],
        fs: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        _options: &SpectralEnvelopeOptions,
        spectrogram: &mut ColumnPointersMut<'_>,
    ) -> Result<()> {
        self.enter("spectral_envelope", &self.calls.spectral_envelope)?;
        assert_eq!(time_axis.len(), f0.len());
        assert_eq!(spectrogram.len(), f0.len());
        assert_eq!(spectrogram.rows(), world_fft_size(fs.hz()) / 2 + 1);

        for frame in 0..spectrogram.len() {
            for (bin, v) in spectrogram.column_mut(frame).iter_mut().enumerate() {
                *v = spectral_value(bin, frame);
            }
        }
        Ok(())
    }

    fn aperiodicity(
        &self,
        _signal: &[f64],
        _fs: SampleRate,
        time_axis: &[f64],
        f0: &[f64],
        fft_size: usize,
        _options: &AperiodicityOptions,
        aperiodicity: &mut ColumnPointersMut<'_>,
    ) -> Result<()> {
        self.enter("aperiodicity", &self.calls.aperiodicity)?;
        assert_eq!(time_axis.len(), f0.len());
        assert_eq!(aperiodicity.len(), f0.len());
        assert_eq!(aperiodicity.rows(), fft_size / 2 + 1);

        for frame in 0..aperiodicity.len() {
            aperiodicity.column_mut(frame).fill(aperiodicity_value(frame));
        }
        Ok(())
    }

    fn synthesize(
        &self,
        f0: &[f64],
        spectrogram: &ColumnPointers<'_>,
        aperiodicity: &ColumnPointers<'_>,
        fft_size: usize,
        _frame_period_ms: f64,
        _fs: SampleRate,
        output: &mut [f64],
    ) -> Result<()> {
        self.enter("synthesize", &self.calls.synthesize)?;
        assert_eq!(spectrogram.len(), f0.len());
        assert_eq!(aperiodicity.len(), f0.len());
        assert_eq!(spectrogram.rows(), fft_size / 2 + 1);
        assert_eq!(aperiodicity.rows(), fft_size / 2 + 1);

        // Silence in, silence out; otherwise a constant the tests can spot.
        let level = if f0.iter().any(|&f| f > 0.0) { 0.5 } else { 0.0 };
        output.fill(level);
        Ok(())
    }
}
