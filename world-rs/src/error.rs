//! Error types for analysis and synthesis.
//!
//! This module provides the [`Error`] enum covering every way a pipeline
//! run can fail, along with a convenient [`Result`] type alias.
//!
//! Nothing here is retried automatically: every operation is a
//! deterministic function of its inputs, so a failed call only succeeds
//! again once the inputs change.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while analyzing or synthesizing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An option value is outside its legal range.
    ///
    /// Always raised before any engine call; fix the value and retry.
    #[error("Invalid configuration: {field} {constraint}")]
    Configuration {
        /// Name of the offending field.
        field: &'static str,
        /// The constraint that was violated, including the bad value.
        constraint: String,
    },

    /// A buffer length or matrix shape does not match what the stage expects.
    #[error("Shape mismatch in {what}: expected {expected}, found {actual}")]
    ShapeMismatch {
        /// What was being compared.
        what: &'static str,
        /// The length the stage required.
        expected: usize,
        /// The length it was given.
        actual: usize,
    },

    /// The numeric engine failed or is unavailable.
    #[error("Numeric engine error in {call}: {reason}")]
    NumericEngine {
        /// The engine entry point involved.
        call: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// A length does not fit the engine's C `int`.
    #[error("{what} of {len} exceeds the engine's maximum of {}", i32::MAX)]
    LengthOverflow {
        /// What was being measured.
        what: &'static str,
        /// The offending length.
        len: usize,
    },
}

impl Error {
    /// Create a Configuration error.
    pub fn configuration(field: &'static str, constraint: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            constraint: constraint.into(),
        }
    }

    /// Create a ShapeMismatch error.
    pub const fn shape_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create a NumericEngine error.
    pub fn numeric_engine(call: &'static str, reason: impl Into<String>) -> Self {
        Self::NumericEngine {
            call,
            reason: reason.into(),
        }
    }

    /// Create a LengthOverflow error.
    pub const fn length_overflow(what: &'static str, len: usize) -> Self {
        Self::LengthOverflow { what, len }
    }

    /// Check if this error came from option validation.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if this error came from a shape check between stages.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }
}

/// Convert a buffer length into the engine's `int`.
pub(crate) fn c_len(what: &'static str, len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::length_overflow(what, len))
}
