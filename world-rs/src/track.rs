//! F0 tracks and the analysis matrices derived from them.

use std::fmt;

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::options::{validate_frame_period, SampleRate};
use crate::sizing::bins_for_fft_size;

/// Which stage produced an F0 track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum F0Source {
    /// Straight from F0 estimation.
    Raw,
    /// After refinement.
    Refined,
}

impl fmt::Display for F0Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            F0Source::Raw => write!(f, "raw"),
            F0Source::Refined => write!(f, "refined"),
        }
    }
}

/// One F0 value per analysis frame, with the frame times.
///
/// `time_axis` is in seconds; `f0` is in Hz with 0 marking unvoiced
/// frames. Both always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct F0Track {
    time_axis: Vec<f64>,
    f0: Vec<f64>,
    frame_period_ms: f64,
    source: F0Source,
}

impl F0Track {
    /// Pair a time axis with F0 values.
    ///
    /// # Errors
    ///
    /// - [`Error::ShapeMismatch`] if the lengths differ
    /// - [`Error::Configuration`] if the frame period is not positive, a
    ///   frame time is not finite, or an F0 value is not finite and `>= 0`
    pub fn new(
        time_axis: Vec<f64>,
        f0: Vec<f64>,
        frame_period_ms: f64,
        source: F0Source,
    ) -> Result<Self> {
        if time_axis.len() != f0.len() {
            return Err(Error::shape_mismatch("f0 track", time_axis.len(), f0.len()));
        }
        validate_frame_period(frame_period_ms)?;
        if let Some((i, t)) = time_axis.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(Error::configuration(
                "time_axis",
                format!("must be finite, got {} at frame {}", t, i),
            ));
        }
        if let Some((i, f)) = f0
            .iter()
            .enumerate()
            .find(|(_, f)| !f.is_finite() || **f < 0.0)
        {
            return Err(Error::configuration(
                "f0",
                format!("must be finite and >= 0, got {} at frame {}", f, i),
            ));
        }
        Ok(F0Track {
            time_axis,
            f0,
            frame_period_ms,
            source,
        })
    }

    /// An empty track (zero frames).
    pub fn empty(frame_period_ms: f64, source: F0Source) -> Self {
        F0Track {
            time_axis: Vec::new(),
            f0: Vec::new(),
            frame_period_ms,
            source,
        }
    }

    /// Frame times in seconds.
    pub fn time_axis(&self) -> &[f64] {
        &self.time_axis
    }

    /// F0 per frame in Hz.
    pub fn f0(&self) -> &[f64] {
        &self.f0
    }

    /// Frame period the track was estimated with.
    pub fn frame_period_ms(&self) -> f64 {
        self.frame_period_ms
    }

    /// Which stage produced the track.
    pub fn source(&self) -> F0Source {
        self.source
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.f0.len()
    }

    /// Check if the track has no frames.
    pub fn is_empty(&self) -> bool {
        self.f0.is_empty()
    }

    /// Number of frames with a non-zero F0.
    pub fn voiced_frames(&self) -> usize {
        self.f0.iter().filter(|&&f| f > 0.0).count()
    }

    /// Iterate over `(time, f0)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time_axis.iter().copied().zip(self.f0.iter().copied())
    }

    /// Split into `(time_axis, f0)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.time_axis, self.f0)
    }

    /// Re-check the length invariant before a hand-off.
    pub(crate) fn check_consistent(&self) -> Result<()> {
        if self.time_axis.len() != self.f0.len() {
            return Err(Error::shape_mismatch(
                "f0 track",
                self.time_axis.len(),
                self.f0.len(),
            ));
        }
        Ok(())
    }
}

macro_rules! analysis_matrix {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            matrix: Matrix,
            fft_size: usize,
            source: F0Source,
        }

        impl $name {
            pub(crate) fn new(matrix: Matrix, fft_size: usize, source: F0Source) -> Self {
                $name {
                    matrix,
                    fft_size,
                    source,
                }
            }

            /// Wrap a matrix computed elsewhere (or edited by the caller).
            ///
            /// # Errors
            ///
            /// [`Error::ShapeMismatch`] if the matrix does not have
            /// `fft_size / 2 + 1` rows.
            pub fn from_matrix(matrix: Matrix, fft_size: usize, source: F0Source) -> Result<Self> {
                let bins = bins_for_fft_size(fft_size);
                if matrix.rows() != bins {
                    return Err(Error::shape_mismatch(
                        concat!(stringify!($name), " rows"),
                        bins,
                        matrix.rows(),
                    ));
                }
                Ok($name::new(matrix, fft_size, source))
            }

            /// The `bins x frames` matrix.
            pub fn matrix(&self) -> &Matrix {
                &self.matrix
            }

            /// Take the matrix.
            pub fn into_matrix(self) -> Matrix {
                self.matrix
            }

            /// FFT size the matrix was computed with.
            pub fn fft_size(&self) -> usize {
                self.fft_size
            }

            /// Source of the F0 track the matrix was computed from.
            pub fn source(&self) -> F0Source {
                self.source
            }

            /// Frequency bins (rows).
            pub fn bins(&self) -> usize {
                self.matrix.rows()
            }

            /// Frames (columns).
            pub fn frames(&self) -> usize {
                self.matrix.cols()
            }

            /// One frame's values.
            ///
            /// # Panics
            ///
            /// Panics if `frame >= self.frames()`.
            pub fn frame(&self, frame: usize) -> &[f64] {
                self.matrix.column(frame)
            }
        }
    };
}

analysis_matrix!(
    /// Smoothed power spectrum per frame, `fft_size / 2 + 1` bins each.
    SpectralEnvelope
);

analysis_matrix!(
    /// Band aperiodicity per frame, `fft_size / 2 + 1` bins each.
    Aperiodicity
);

/// The outputs of one complete analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// The F0 track every matrix was computed from.
    pub f0: F0Track,
    /// Spectral envelope.
    pub spectral: SpectralEnvelope,
    /// Aperiodicity.
    pub aperiodicity: Aperiodicity,
    /// Sample rate of the analyzed signal.
    pub sample_rate: SampleRate,
}

impl Analysis {
    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.f0.len()
    }

    /// FFT size of the spectral stages.
    pub fn fft_size(&self) -> usize {
        self.spectral.fft_size()
    }
}
