//! The analysis/resynthesis pipeline.
//!
//! [`Pipeline`] sequences the stages over an [`Engine`]: it sizes and
//! allocates every buffer, checks shapes at each hand-off, and only then
//! calls into the engine. Stages never run on their own buffers' say-so;
//! a mismatch is reported before anything is marshalled.
//!
//! # Example
//!
//! ```no_run
//! use world_rs::{AnalysisConfig, Pipeline, SampleRate};
//!
//! let pipeline = Pipeline::world()?;
//! let fs = SampleRate::new(16000)?;
//! let signal = vec![0.0; 16000];
//!
//! let analysis = pipeline.analyze(&signal, fs, &AnalysisConfig::default())?;
//! let output = pipeline.resynthesize(&analysis, None)?;
//! assert_eq!(analysis.frames(), 201);
//! assert_eq!(output.len(), 16001);
//! # Ok::<(), world_rs::Error>(())
//! ```

use tracing::{debug, warn};

use crate::engine::{Engine, World};
use crate::error::{c_len, Error, Result};
use crate::matrix::Matrix;
use crate::options::{
    validate_frame_period, AnalysisConfig, AperiodicityOptions, F0Options, Refinement, SampleRate,
    SpectralEnvelopeOptions,
};
use crate::sizing::{self, bins_for_fft_size, BufferPlan};
use crate::track::{Analysis, Aperiodicity, F0Source, F0Track, SpectralEnvelope};

/// Stage sequencer over an [`Engine`].
///
/// Holds nothing but the engine, so a `Pipeline` is `Send + Sync`
/// whenever the engine is and can be shared between threads that each
/// analyze their own signal.
#[derive(Debug, Clone)]
pub struct Pipeline<E: Engine = World> {
    engine: E,
}

impl Pipeline<World> {
    /// A pipeline over the linked WORLD library.
    ///
    /// # Errors
    ///
    /// [`Error::NumericEngine`] if the library was not linked.
    pub fn world() -> Result<Self> {
        Ok(Pipeline::new(World::new()?))
    }
}

impl<E: Engine> Pipeline<E> {
    /// Wrap an engine.
    pub fn new(engine: E) -> Self {
        Pipeline { engine }
    }

    /// The engine stages are run on.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Take the engine back.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Buffer sizes for analyzing `signal_length` samples.
    pub fn plan(
        &self,
        sample_rate: SampleRate,
        signal_length: usize,
        frame_period_ms: f64,
    ) -> Result<BufferPlan> {
        BufferPlan::new(&self.engine, sample_rate, signal_length, frame_period_ms)
    }

    // ========================================================================
    // Stages
    // ========================================================================

    /// Estimate the raw F0 contour of `signal`.
    ///
    /// The returned track has one entry per frame, as sized by
    /// [`sizing::frame_count`], and is tagged [`F0Source::Raw`]. An empty
    /// signal yields an empty track without invoking the engine.
    ///
    /// # Errors
    ///
    /// - [`Error::LengthOverflow`] if the signal is too long for the engine
    /// - [`Error::NumericEngine`] on an engine fault
    pub fn estimate_f0(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        options: &F0Options,
    ) -> Result<F0Track> {
        c_len("signal length", signal.len())?;
        let frame_period_ms = options.frame_period_ms();
        let frames = sizing::frame_count(&self.engine, sample_rate, signal.len(), frame_period_ms)?;
        if frames == 0 {
            debug!("estimate_f0: empty signal, no frames");
            return Ok(F0Track::empty(frame_period_ms, F0Source::Raw));
        }

        let mut time_axis = vec![0.0; frames];
        let mut f0 = vec![0.0; frames];
        self.engine
            .estimate_f0(signal, sample_rate, options, &mut time_axis, &mut f0)?;

        let track = F0Track::new(time_axis, f0, frame_period_ms, F0Source::Raw)?;
        debug!(
            "estimate_f0: {} frames ({} voiced) at {}",
            track.len(),
            track.voiced_frames(),
            sample_rate
        );
        Ok(track)
    }

    /// Refine an F0 track against the signal it was estimated from.
    ///
    /// The result keeps the input's time axis and frame period and is
    /// tagged [`F0Source::Refined`].
    ///
    /// # Errors
    ///
    /// - [`Error::ShapeMismatch`] if the track is inconsistent
    /// - [`Error::LengthOverflow`] if the signal is too long for the engine
    /// - [`Error::NumericEngine`] on an engine fault
    pub fn refine_f0(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        track: &F0Track,
    ) -> Result<F0Track> {
        track.check_consistent()?;
        c_len("signal length", signal.len())?;
        if track.source() == F0Source::Refined {
            debug!("refine_f0: track is already refined");
        }
        if track.is_empty() {
            return Ok(F0Track::empty(track.frame_period_ms(), F0Source::Refined));
        }

        let mut refined = vec![0.0; track.len()];
        self.engine.refine_f0(
            signal,
            sample_rate,
            track.time_axis(),
            track.f0(),
            &mut refined,
        )?;

        debug!("refine_f0: {} frames", refined.len());
        F0Track::new(
            track.time_axis().to_vec(),
            refined,
            track.frame_period_ms(),
            F0Source::Refined,
        )
    }

    /// Estimate the spectral envelope, one column per frame of `track`.
    ///
    /// The matrix has [`sizing::frequency_bin_count`] rows. For an empty
    /// track it has zero columns and the engine's envelope estimator is
    /// not invoked.
    ///
    /// # Errors
    ///
    /// - [`Error::ShapeMismatch`] if the track is inconsistent
    /// - [`Error::LengthOverflow`] if the signal is too long for the engine
    /// - [`Error::NumericEngine`] on an engine fault
    pub fn estimate_spectral_envelope(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        track: &F0Track,
        options: &SpectralEnvelopeOptions,
    ) -> Result<SpectralEnvelope> {
        track.check_consistent()?;
        c_len("signal length", signal.len())?;
        let fft_size = sizing::fft_size(&self.engine, sample_rate)?;
        let bins = bins_for_fft_size(fft_size);

        let matrix = if track.is_empty() {
            Matrix::zeros(bins, 0)
        } else {
            let mut arena = Matrix::zeros(bins, track.len());
            let mut columns = arena.to_pointer_columns();
            self.engine.spectral_envelope(
                signal,
                sample_rate,
                track.time_axis(),
                track.f0(),
                options,
                &mut columns,
            )?;
            // Read back through the pointer array, whatever the engine left in it.
            columns.to_matrix()
        };

        debug!(
            "estimate_spectral_envelope: {} bins x {} frames ({} f0)",
            bins,
            track.len(),
            track.source()
        );
        Ok(SpectralEnvelope::new(matrix, fft_size, track.source()))
    }

    /// Estimate band aperiodicity, one column per frame of `track`.
    ///
    /// Uses the same FFT size as [`estimate_spectral_envelope`]
    /// so the two matrices always agree in shape for the same track.
    ///
    /// [`estimate_spectral_envelope`]: Pipeline::estimate_spectral_envelope
    ///
    /// # Errors
    ///
    /// - [`Error::ShapeMismatch`] if the track is inconsistent
    /// - [`Error::LengthOverflow`] if the signal is too long for the engine
    /// - [`Error::NumericEngine`] on an engine fault
    pub fn estimate_aperiodicity(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        track: &F0Track,
        options: &AperiodicityOptions,
    ) -> Result<Aperiodicity> {
        track.check_consistent()?;
        c_len("signal length", signal.len())?;
        let fft_size = sizing::fft_size(&self.engine, sample_rate)?;
        let bins = bins_for_fft_size(fft_size);

        let matrix = if track.is_empty() {
            Matrix::zeros(bins, 0)
        } else {
            let mut arena = Matrix::zeros(bins, track.len());
            let mut columns = arena.to_pointer_columns();
            self.engine.aperiodicity(
                signal,
                sample_rate,
                track.time_axis(),
                track.f0(),
                fft_size,
                options,
                &mut columns,
            )?;
            columns.to_matrix()
        };

        debug!(
            "estimate_aperiodicity: {} bins x {} frames ({} f0)",
            bins,
            track.len(),
            track.source()
        );
        Ok(Aperiodicity::new(matrix, fft_size, track.source()))
    }

    /// Resynthesize `output_length` samples from an F0 track and its
    /// matrices.
    ///
    /// Every shape is checked before the engine is called: both matrices
    /// need one column per frame, `frequency_bin_count(sample_rate)` rows
    /// and the engine's FFT size. A matrix computed from a track with a
    /// different [`F0Source`] is only warned about.
    ///
    /// Once the shapes check out, an empty track or a zero
    /// `output_length` resynthesizes to `output_length` zeros without
    /// calling the engine's synthesizer.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if `frame_period_ms` is not finite and positive
    /// - [`Error::ShapeMismatch`] on any shape disagreement
    /// - [`Error::LengthOverflow`] if `output_length` is too long for the engine
    /// - [`Error::NumericEngine`] on an engine fault
    #[allow(clippy::too_many_arguments)]
    pub fn synthesize(
        &self,
        track: &F0Track,
        spectral: &SpectralEnvelope,
        aperiodicity: &Aperiodicity,
        frame_period_ms: f64,
        sample_rate: SampleRate,
        output_length: usize,
    ) -> Result<Vec<f64>> {
        validate_frame_period(frame_period_ms)?;
        track.check_consistent()?;
        c_len("output length", output_length)?;

        let frames = track.len();
        if spectral.frames() != frames {
            return Err(Error::shape_mismatch(
                "spectral envelope frames",
                frames,
                spectral.frames(),
            ));
        }
        if aperiodicity.frames() != frames {
            return Err(Error::shape_mismatch(
                "aperiodicity frames",
                frames,
                aperiodicity.frames(),
            ));
        }
        if aperiodicity.fft_size() != spectral.fft_size() {
            return Err(Error::shape_mismatch(
                "aperiodicity fft size",
                spectral.fft_size(),
                aperiodicity.fft_size(),
            ));
        }
        warn_on_source_mismatch(track.source(), spectral.source(), aperiodicity.source());
        if frame_period_ms != track.frame_period_ms() {
            warn!(
                "synthesize: frame period {} ms differs from the track's {} ms",
                frame_period_ms,
                track.frame_period_ms()
            );
        }

        let fft_size = sizing::fft_size(&self.engine, sample_rate)?;
        if spectral.fft_size() != fft_size {
            return Err(Error::shape_mismatch(
                "spectral envelope fft size",
                fft_size,
                spectral.fft_size(),
            ));
        }
        let bins = bins_for_fft_size(fft_size);
        if spectral.bins() != bins {
            return Err(Error::shape_mismatch(
                "spectral envelope bins",
                bins,
                spectral.bins(),
            ));
        }
        if aperiodicity.bins() != bins {
            return Err(Error::shape_mismatch(
                "aperiodicity bins",
                bins,
                aperiodicity.bins(),
            ));
        }

        let mut output = vec![0.0; output_length];
        if frames == 0 || output_length == 0 {
            debug!("synthesize: nothing to render, {} zero samples", output_length);
            return Ok(output);
        }

        let spectrogram = spectral.matrix().column_pointers();
        let aperiodicity = aperiodicity.matrix().column_pointers();
        self.engine.synthesize(
            track.f0(),
            &spectrogram,
            &aperiodicity,
            fft_size,
            frame_period_ms,
            sample_rate,
            &mut output,
        )?;

        debug!("synthesize: {} frames -> {} samples", frames, output.len());
        Ok(output)
    }

    // ========================================================================
    // Whole runs
    // ========================================================================

    /// Run every analysis stage on `signal`.
    ///
    /// Refinement runs only when `config.refinement` asks for it; the
    /// matrices are always computed from the final track.
    pub fn analyze(
        &self,
        signal: &[f64],
        sample_rate: SampleRate,
        config: &AnalysisConfig,
    ) -> Result<Analysis> {
        let raw = self.estimate_f0(signal, sample_rate, &config.f0)?;
        let f0 = match config.refinement {
            Refinement::Skip => raw,
            Refinement::StoneMask => self.refine_f0(signal, sample_rate, &raw)?,
        };
        let spectral = self.estimate_spectral_envelope(signal, sample_rate, &f0, &config.spectral)?;
        let aperiodicity =
            self.estimate_aperiodicity(signal, sample_rate, &f0, &config.aperiodicity)?;

        Ok(Analysis {
            f0,
            spectral,
            aperiodicity,
            sample_rate,
        })
    }

    /// Resynthesize a complete analysis.
    ///
    /// Without an explicit `output_length`, renders
    /// [`sizing::output_length`] samples for the track.
    pub fn resynthesize(&self, analysis: &Analysis, output_length: Option<usize>) -> Result<Vec<f64>> {
        let frame_period_ms = analysis.f0.frame_period_ms();
        let output_length = output_length.unwrap_or_else(|| {
            sizing::output_length(analysis.frames(), frame_period_ms, analysis.sample_rate)
        });
        self.synthesize(
            &analysis.f0,
            &analysis.spectral,
            &analysis.aperiodicity,
            frame_period_ms,
            analysis.sample_rate,
            output_length,
        )
    }
}

fn warn_on_source_mismatch(track: F0Source, spectral: F0Source, aperiodicity: F0Source) {
    match (spectral == track, aperiodicity == track) {
        (true, true) => {}
        (false, true) => warn!(
            "synthesize: spectral envelope was computed from a {} track, synthesizing from {}",
            spectral, track
        ),
        (true, false) => warn!(
            "synthesize: aperiodicity was computed from a {} track, synthesizing from {}",
            aperiodicity, track
        ),
        (false, false) => warn!(
            "synthesize: both matrices were computed from a {} track, synthesizing from {}",
            spectral, track
        ),
    }
}
