//! Analysis option records and their validation.
//!
//! Every record here is an immutable value whose only construction paths
//! run the validator: the positional `new` constructors, the builders'
//! `build()`, and (with the `serde` feature) deserialization. There is no
//! way to hold an option record that has not been checked.
//!
//! # Defaults
//!
//! The `Default` implementations describe a **44.1 kHz** source signal,
//! matching the engine's own initializers. They are not adjusted for other
//! sample rates anywhere else in the crate; callers analyzing other rates
//! should pick their own `speed_factor` and F0 range.
//!
//! # Example
//!
//! ```
//! use world_rs::F0Options;
//!
//! let options = F0Options::builder()
//!     .f0_floor(80.0)
//!     .f0_ceil(640.0)
//!     .frame_period_ms(10.0)
//!     .build()?;
//!
//! assert_eq!(options.frame_period_ms(), 10.0);
//!
//! // Out-of-range values are rejected at construction
//! assert!(F0Options::builder().speed_factor(13).build().is_err());
//! # Ok::<(), world_rs::Error>(())
//! ```

use std::fmt;

use world_sys::{CheapTrickOption, D4COption, DioOption};

use crate::error::{Error, Result};

/// Sample rate assumed by every `Default` option record.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Legal range of [`F0Options::speed_factor`].
pub const SPEED_FACTOR_RANGE: std::ops::RangeInclusive<u32> = 1..=12;

// ============================================================================
// SampleRate
// ============================================================================

/// A validated sample rate in Hz.
///
/// Must be positive and representable as the engine's C `int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub struct SampleRate(u32);

impl SampleRate {
    /// Validate a sample rate.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if `hz` is zero or above `i32::MAX`.
    pub fn new(hz: u32) -> Result<Self> {
        if hz == 0 {
            return Err(Error::configuration("sample_rate", "must be > 0, got 0"));
        }
        if hz > i32::MAX as u32 {
            return Err(Error::configuration(
                "sample_rate",
                format!("must be <= {}, got {}", i32::MAX, hz),
            ));
        }
        Ok(SampleRate(hz))
    }

    /// The rate in Hz.
    pub const fn hz(self) -> u32 {
        self.0
    }

    /// The rate as the engine's `int`. Always in range by construction.
    pub(crate) const fn as_c_int(self) -> i32 {
        self.0 as i32
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        SampleRate(DEFAULT_SAMPLE_RATE)
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = Error;

    fn try_from(hz: u32) -> Result<Self> {
        SampleRate::new(hz)
    }
}

impl From<SampleRate> for u32 {
    fn from(rate: SampleRate) -> u32 {
        rate.0
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

// ============================================================================
// F0Options
// ============================================================================

/// Options for F0 estimation.
///
/// | field | constraint |
/// |---|---|
/// | `f0_floor` | finite, > 0, < `f0_ceil` |
/// | `f0_ceil` | finite, > 0 |
/// | `channels_per_octave` | finite, > 0 |
/// | `frame_period_ms` | finite, > 0 |
/// | `speed_factor` | 1 to 12 |
/// | `allowed_range` | finite, >= 0 |
///
/// The defaults (71 Hz to 800 Hz, 2 channels per octave, 5 ms frames,
/// speed 1, allowed range 0.1) assume a 44.1 kHz source.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "F0OptionsBuilder"))]
pub struct F0Options {
    f0_floor: f64,
    f0_ceil: f64,
    channels_per_octave: f64,
    frame_period_ms: f64,
    speed_factor: u32,
    allowed_range: f64,
}

impl F0Options {
    /// Validate and create an option record from every field.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] naming the first field that violates its
    /// constraint.
    pub fn new(
        f0_floor: f64,
        f0_ceil: f64,
        channels_per_octave: f64,
        frame_period_ms: f64,
        speed_factor: u32,
        allowed_range: f64,
    ) -> Result<Self> {
        F0OptionsBuilder {
            f0_floor,
            f0_ceil,
            channels_per_octave,
            frame_period_ms,
            speed_factor,
            allowed_range,
        }
        .build()
    }

    /// Start a builder seeded with the defaults.
    pub fn builder() -> F0OptionsBuilder {
        F0OptionsBuilder::default()
    }

    /// Start a builder seeded with this record's values.
    pub fn to_builder(&self) -> F0OptionsBuilder {
        F0OptionsBuilder {
            f0_floor: self.f0_floor,
            f0_ceil: self.f0_ceil,
            channels_per_octave: self.channels_per_octave,
            frame_period_ms: self.frame_period_ms,
            speed_factor: self.speed_factor,
            allowed_range: self.allowed_range,
        }
    }

    /// Lower F0 bound in Hz.
    pub fn f0_floor(&self) -> f64 {
        self.f0_floor
    }

    /// Upper F0 bound in Hz.
    pub fn f0_ceil(&self) -> f64 {
        self.f0_ceil
    }

    /// Filter channels per octave.
    pub fn channels_per_octave(&self) -> f64 {
        self.channels_per_octave
    }

    /// Frame period in milliseconds.
    pub fn frame_period_ms(&self) -> f64 {
        self.frame_period_ms
    }

    /// Decimation ratio used by the estimator.
    pub fn speed_factor(&self) -> u32 {
        self.speed_factor
    }

    /// Threshold for fixing F0 contour errors.
    pub fn allowed_range(&self) -> f64 {
        self.allowed_range
    }

    pub(crate) fn to_raw(&self) -> DioOption {
        DioOption {
            f0_floor: self.f0_floor,
            f0_ceil: self.f0_ceil,
            channels_in_octave: self.channels_per_octave,
            frame_period: self.frame_period_ms,
            speed: self.speed_factor as i32,
            allowed_range: self.allowed_range,
        }
    }
}

impl Default for F0Options {
    fn default() -> Self {
        F0Options {
            f0_floor: 71.0,
            f0_ceil: 800.0,
            channels_per_octave: 2.0,
            frame_period_ms: 5.0,
            speed_factor: 1,
            allowed_range: 0.1,
        }
    }
}

/// Draft of an [`F0Options`] record. Nothing is checked until [`build()`](Self::build).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct F0OptionsBuilder {
    f0_floor: f64,
    f0_ceil: f64,
    channels_per_octave: f64,
    frame_period_ms: f64,
    speed_factor: u32,
    allowed_range: f64,
}

impl Default for F0OptionsBuilder {
    fn default() -> Self {
        F0Options::default().to_builder()
    }
}

impl F0OptionsBuilder {
    /// Set the lower F0 bound in Hz.
    pub fn f0_floor(mut self, hz: f64) -> Self {
        self.f0_floor = hz;
        self
    }

    /// Set the upper F0 bound in Hz.
    pub fn f0_ceil(mut self, hz: f64) -> Self {
        self.f0_ceil = hz;
        self
    }

    /// Set the number of filter channels per octave.
    pub fn channels_per_octave(mut self, channels: f64) -> Self {
        self.channels_per_octave = channels;
        self
    }

    /// Set the frame period in milliseconds.
    pub fn frame_period_ms(mut self, ms: f64) -> Self {
        self.frame_period_ms = ms;
        self
    }

    /// Set the decimation ratio (1 to 12).
    pub fn speed_factor(mut self, speed: u32) -> Self {
        self.speed_factor = speed;
        self
    }

    /// Set the contour-fixing threshold.
    pub fn allowed_range(mut self, range: f64) -> Self {
        self.allowed_range = range;
        self
    }

    /// Validate the draft.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] naming the first violated field.
    pub fn build(self) -> Result<F0Options> {
        positive("f0_floor", self.f0_floor)?;
        positive("f0_ceil", self.f0_ceil)?;
        if self.f0_floor >= self.f0_ceil {
            return Err(Error::configuration(
                "f0_floor",
                format!(
                    "must be < f0_ceil ({}), got {}",
                    self.f0_ceil, self.f0_floor
                ),
            ));
        }
        positive("channels_per_octave", self.channels_per_octave)?;
        positive("frame_period_ms", self.frame_period_ms)?;
        if !SPEED_FACTOR_RANGE.contains(&self.speed_factor) {
            return Err(Error::configuration(
                "speed_factor",
                format!(
                    "must be in {}..={}, got {}",
                    SPEED_FACTOR_RANGE.start(),
                    SPEED_FACTOR_RANGE.end(),
                    self.speed_factor
                ),
            ));
        }
        finite("allowed_range", self.allowed_range)?;
        if self.allowed_range < 0.0 {
            return Err(Error::configuration(
                "allowed_range",
                format!("must be >= 0, got {}", self.allowed_range),
            ));
        }

        Ok(F0Options {
            f0_floor: self.f0_floor,
            f0_ceil: self.f0_ceil,
            channels_per_octave: self.channels_per_octave,
            frame_period_ms: self.frame_period_ms,
            speed_factor: self.speed_factor,
            allowed_range: self.allowed_range,
        })
    }
}

impl TryFrom<F0OptionsBuilder> for F0Options {
    type Error = Error;

    fn try_from(draft: F0OptionsBuilder) -> Result<Self> {
        draft.build()
    }
}

// ============================================================================
// SpectralEnvelopeOptions / AperiodicityOptions
// ============================================================================

/// Options for spectral envelope estimation.
///
/// A single smoothing coefficient, `q1`. Any finite value is accepted; the
/// default is -0.09.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SpectralEnvelopeRecord"))]
pub struct SpectralEnvelopeOptions {
    q1: f64,
}

impl SpectralEnvelopeOptions {
    /// Default smoothing coefficient.
    pub const DEFAULT_Q1: f64 = -0.09;

    /// Validate and create the options.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if `q1` is NaN or infinite.
    pub fn new(q1: f64) -> Result<Self> {
        finite("q1", q1)?;
        Ok(SpectralEnvelopeOptions { q1 })
    }

    /// The smoothing coefficient.
    pub fn q1(&self) -> f64 {
        self.q1
    }

    pub(crate) fn to_raw(&self) -> CheapTrickOption {
        CheapTrickOption { q1: self.q1 }
    }
}

impl Default for SpectralEnvelopeOptions {
    fn default() -> Self {
        SpectralEnvelopeOptions {
            q1: Self::DEFAULT_Q1,
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SpectralEnvelopeRecord {
    #[serde(default = "default_q1")]
    q1: f64,
}

#[cfg(feature = "serde")]
fn default_q1() -> f64 {
    SpectralEnvelopeOptions::DEFAULT_Q1
}

#[cfg(feature = "serde")]
impl TryFrom<SpectralEnvelopeRecord> for SpectralEnvelopeOptions {
    type Error = Error;

    fn try_from(record: SpectralEnvelopeRecord) -> Result<Self> {
        SpectralEnvelopeOptions::new(record.q1)
    }
}

/// Options for aperiodicity estimation.
///
/// Holds a single reserved scalar with no effect on the analysis. It is
/// passed to the engine untouched so the call signature stays intact.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct AperiodicityOptions {
    reserved: f64,
}

impl AperiodicityOptions {
    /// Create the options with an explicit reserved value.
    pub fn new(reserved: f64) -> Self {
        AperiodicityOptions { reserved }
    }

    /// The reserved value.
    pub fn reserved(&self) -> f64 {
        self.reserved
    }

    pub(crate) fn to_raw(&self) -> D4COption {
        D4COption {
            dummy: self.reserved,
        }
    }
}

// ============================================================================
// AnalysisConfig
// ============================================================================

/// Whether the raw F0 contour is refined before envelope estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Refinement {
    /// Feed the raw estimate straight into the later stages.
    Skip,
    /// Refine the estimate first.
    #[default]
    StoneMask,
}

/// Everything [`Pipeline::analyze`](crate::Pipeline::analyze) needs besides the signal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct AnalysisConfig {
    /// F0 estimation options.
    pub f0: F0Options,
    /// Spectral envelope options.
    pub spectral: SpectralEnvelopeOptions,
    /// Aperiodicity options.
    pub aperiodicity: AperiodicityOptions,
    /// Whether to refine the F0 contour.
    pub refinement: Refinement,
}

impl AnalysisConfig {
    /// Create a configuration with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the F0 options.
    pub fn f0(mut self, options: F0Options) -> Self {
        self.f0 = options;
        self
    }

    /// Set the spectral envelope options.
    pub fn spectral(mut self, options: SpectralEnvelopeOptions) -> Self {
        self.spectral = options;
        self
    }

    /// Set the aperiodicity options.
    pub fn aperiodicity(mut self, options: AperiodicityOptions) -> Self {
        self.aperiodicity = options;
        self
    }

    /// Choose whether to refine the F0 contour.
    pub fn refinement(mut self, refinement: Refinement) -> Self {
        self.refinement = refinement;
        self
    }
}

// ============================================================================
// Field checks
// ============================================================================

fn finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::configuration(
            field,
            format!("must be finite, got {}", value),
        ))
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(Error::configuration(
            field,
            format!("must be > 0, got {}", value),
        ))
    }
}

/// Check a frame period passed outside of [`F0Options`].
pub(crate) fn validate_frame_period(frame_period_ms: f64) -> Result<()> {
    positive("frame_period_ms", frame_period_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: Error) -> &'static str {
        match err {
            Error::Configuration { field, .. } => field,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let defaults = F0Options::default();
        assert_eq!(F0Options::builder().build().unwrap(), defaults);
        assert_eq!(defaults.f0_floor(), 71.0);
        assert_eq!(defaults.f0_ceil(), 800.0);
        assert_eq!(defaults.speed_factor(), 1);
        assert_eq!(SampleRate::default().hz(), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_floor_must_be_below_ceil() {
        let err = F0Options::builder()
            .f0_floor(500.0)
            .f0_ceil(400.0)
            .build()
            .unwrap_err();
        assert_eq!(field_of(err), "f0_floor");

        let err = F0Options::builder()
            .f0_floor(400.0)
            .f0_ceil(400.0)
            .build()
            .unwrap_err();
        assert_eq!(field_of(err), "f0_floor");
    }

    #[test]
    fn test_each_field_is_named() {
        let cases = [
            (F0Options::builder().f0_floor(0.0), "f0_floor"),
            (F0Options::builder().f0_ceil(-1.0), "f0_ceil"),
            (F0Options::builder().channels_per_octave(0.0), "channels_per_octave"),
            (F0Options::builder().frame_period_ms(0.0), "frame_period_ms"),
            (F0Options::builder().frame_period_ms(f64::NAN), "frame_period_ms"),
            (F0Options::builder().speed_factor(0), "speed_factor"),
            (F0Options::builder().speed_factor(13), "speed_factor"),
            (F0Options::builder().allowed_range(-0.01), "allowed_range"),
            (F0Options::builder().allowed_range(f64::INFINITY), "allowed_range"),
        ];

        for (draft, field) in cases {
            assert_eq!(field_of(draft.build().unwrap_err()), field);
        }
    }

    #[test]
    fn test_speed_factor_bounds_accepted() {
        for speed in SPEED_FACTOR_RANGE {
            assert!(F0Options::builder().speed_factor(speed).build().is_ok());
        }
    }

    #[test]
    fn test_allowed_range_zero_accepted() {
        assert!(F0Options::builder().allowed_range(0.0).build().is_ok());
    }

    #[test]
    fn test_positional_constructor_matches_builder() {
        let positional = F0Options::new(80.0, 600.0, 3.0, 10.0, 4, 0.2).unwrap();
        let built = F0Options::builder()
            .f0_floor(80.0)
            .f0_ceil(600.0)
            .channels_per_octave(3.0)
            .frame_period_ms(10.0)
            .speed_factor(4)
            .allowed_range(0.2)
            .build()
            .unwrap();
        assert_eq!(positional, built);
        assert_eq!(positional.to_builder().build().unwrap(), positional);

        assert!(F0Options::new(80.0, 600.0, 3.0, 10.0, 0, 0.2).is_err());
    }

    #[test]
    fn test_to_raw() {
        let raw = F0Options::default().to_raw();
        assert_eq!(raw, DioOption::default());

        let raw = SpectralEnvelopeOptions::default().to_raw();
        assert_eq!(raw.q1, -0.09);

        let raw = AperiodicityOptions::new(0.25).to_raw();
        assert_eq!(raw.dummy, 0.25);
    }

    #[test]
    fn test_spectral_options() {
        assert!(SpectralEnvelopeOptions::new(-0.15).is_ok());
        assert!(SpectralEnvelopeOptions::new(3.0).is_ok());
        assert_eq!(
            field_of(SpectralEnvelopeOptions::new(f64::NAN).unwrap_err()),
            "q1"
        );
    }

    #[test]
    fn test_sample_rate() {
        assert!(SampleRate::new(16000).is_ok());
        assert_eq!(field_of(SampleRate::new(0).unwrap_err()), "sample_rate");
        assert!(SampleRate::new(u32::MAX).is_err());
        assert_eq!(SampleRate::new(48000).unwrap().to_string(), "48000 Hz");
    }

    #[test]
    fn test_analysis_config_builder() {
        let config = AnalysisConfig::new()
            .f0(F0Options::builder().frame_period_ms(10.0).build().unwrap())
            .refinement(Refinement::Skip);

        assert_eq!(config.f0.frame_period_ms(), 10.0);
        assert_eq!(config.refinement, Refinement::Skip);
        assert_eq!(AnalysisConfig::default().refinement, Refinement::StoneMask);
    }
}
