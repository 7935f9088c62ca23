//! # world-sys
//!
//! Raw FFI bindings to the WORLD speech analysis/synthesis library
//! (DIO, StoneMask, CheapTrick, D4C and Synthesis).
//!
//! This crate provides low-level, unsafe bindings. For a safe, idiomatic
//! Rust API, use the `world-rs` crate instead.
//!
//! ## Usage
//!
//! These bindings are primarily intended for use by `world-rs`. Direct
//! usage requires careful attention to:
//!
//! - Sizing every output buffer with [`GetSamplesForDIO`] and
//!   [`GetFFTSizeForCheapTrick`] before the call that fills it
//! - Passing spectrogram/aperiodicity matrices as arrays of per-frame
//!   pointers, each frame holding `fft_size / 2 + 1` doubles
//! - Keeping every buffer alive for the duration of the call
//!
//! ## Example
//!
//! ```no_run
//! use world_sys::*;
//!
//! let fs = 16000;
//! let x = vec![0.0f64; fs as usize];
//! let option = DioOption::default();
//!
//! unsafe {
//!     let frames = GetSamplesForDIO(fs, x.len() as i32, option.frame_period) as usize;
//!     let mut time_axis = vec![0.0; frames];
//!     let mut f0 = vec![0.0; frames];
//!
//!     Dio(
//!         x.as_ptr(),
//!         x.len() as i32,
//!         fs,
//!         &option,
//!         time_axis.as_mut_ptr(),
//!         f0.as_mut_ptr(),
//!     );
//! }
//! ```
//!
//! ## WORLD Version
//!
//! The declarations follow the WORLD API before release 0.2.1: a
//! single-argument `GetFFTSizeForCheapTrick(fs)` and a one-field
//! [`CheapTrickOption`]. The build script only accepts a system library
//! whose pkg-config version is at least 0.1.0 and below 0.2.1, and only
//! compiles a bundled tree whose `cheaptrick.h` has the older signature.
//! Anything else falls through to the next linkage option, and finally
//! to the stubs.
//!
//! ## Feature Flags
//!
//! - `bundled`: Compile WORLD from a source tree at `world-sys/World`
//!   instead of linking to a system library
//! - `static`: Force static linking (implies `bundled`)
//!
//! When neither a system library nor a bundled tree is available, the
//! build falls back to stub bindings: every function panics and
//! [`STUB_BINDINGS`] is `true`.

#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]

use libc::c_int;

/// `true` when the build script could not find the WORLD library and the
/// functions below are panicking stand-ins.
pub const STUB_BINDINGS: bool = cfg!(world_stub_bindings);

// ============================================================================
// Option Structures
// ============================================================================

/// Options for [`Dio`] (F0 estimation).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DioOption {
    /// Lower F0 bound in Hz.
    pub f0_floor: f64,
    /// Upper F0 bound in Hz.
    pub f0_ceil: f64,
    /// Number of filter channels per octave.
    pub channels_in_octave: f64,
    /// Frame period in milliseconds.
    pub frame_period: f64,
    /// Decimation ratio, 1 to 12.
    pub speed: c_int,
    /// Threshold for fixing F0 contour errors.
    pub allowed_range: f64,
}

impl Default for DioOption {
    /// Mirrors `InitializeDioOption` for a 44.1 kHz source.
    fn default() -> Self {
        DioOption {
            f0_floor: 71.0,
            f0_ceil: 800.0,
            channels_in_octave: 2.0,
            frame_period: 5.0,
            speed: 1,
            allowed_range: 0.1,
        }
    }
}

/// Options for [`CheapTrick`] (spectral envelope).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheapTrickOption {
    /// Spectral recovery coefficient.
    pub q1: f64,
}

impl Default for CheapTrickOption {
    fn default() -> Self {
        CheapTrickOption { q1: -0.09 }
    }
}

/// Options for [`D4C`] (aperiodicity). Reserved by the library.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct D4COption {
    /// Placeholder with no effect on the analysis.
    pub dummy: f64,
}

// ============================================================================
// Library Entry Points
// ============================================================================

#[cfg(not(world_stub_bindings))]
extern "C" {
    /// Number of frames DIO produces for `x_length` samples.
    pub fn GetSamplesForDIO(fs: c_int, x_length: c_int, frame_period: f64) -> c_int;

    /// Fill `option` with the library defaults.
    pub fn InitializeDioOption(option: *mut DioOption);

    /// Estimate F0. `temporal_positions` and `f0` must hold
    /// `GetSamplesForDIO(..)` elements each.
    pub fn Dio(
        x: *const f64,
        x_length: c_int,
        fs: c_int,
        option: *const DioOption,
        temporal_positions: *mut f64,
        f0: *mut f64,
    );

    /// Refine an F0 contour. `refined_f0` must hold `f0_length` elements.
    pub fn StoneMask(
        x: *const f64,
        x_length: c_int,
        fs: c_int,
        temporal_positions: *const f64,
        f0: *const f64,
        f0_length: c_int,
        refined_f0: *mut f64,
    );

    /// FFT size used by CheapTrick, D4C and Synthesis at this sample rate.
    pub fn GetFFTSizeForCheapTrick(fs: c_int) -> c_int;

    /// Fill `option` with the library defaults.
    pub fn InitializeCheapTrickOption(option: *mut CheapTrickOption);

    /// Estimate the spectral envelope. `spectrogram` points at `f0_length`
    /// frame pointers, each addressing `fft_size / 2 + 1` doubles.
    pub fn CheapTrick(
        x: *const f64,
        x_length: c_int,
        fs: c_int,
        temporal_positions: *const f64,
        f0: *const f64,
        f0_length: c_int,
        option: *const CheapTrickOption,
        spectrogram: *mut *mut f64,
    );

    /// Fill `option` with the library defaults.
    pub fn InitializeD4COption(option: *mut D4COption);

    /// Estimate aperiodicity. Same layout as [`CheapTrick`].
    pub fn D4C(
        x: *const f64,
        x_length: c_int,
        fs: c_int,
        temporal_positions: *const f64,
        f0: *const f64,
        f0_length: c_int,
        fft_size: c_int,
        option: *const D4COption,
        aperiodicity: *mut *mut f64,
    );

    /// Synthesize `y_length` samples into `y`.
    pub fn Synthesis(
        f0: *const f64,
        f0_length: c_int,
        spectrogram: *const *const f64,
        aperiodicity: *const *const f64,
        fft_size: c_int,
        frame_period: f64,
        fs: c_int,
        y_length: c_int,
        y: *mut f64,
    );
}

#[cfg(world_stub_bindings)]
pub use stub::*;

/// Stand-ins used when the library was not found at build time.
///
/// To use the engine, either install WORLD so pkg-config can find it, or
/// place the WORLD source tree at `world-sys/World` and rebuild with
/// `--features bundled`.
#[cfg(world_stub_bindings)]
mod stub {
    use super::{CheapTrickOption, D4COption, DioOption};
    use libc::c_int;

    fn unavailable(name: &str) -> ! {
        panic!("{name}: WORLD library was not available when world-sys was built")
    }

    pub unsafe fn GetSamplesForDIO(_fs: c_int, _x_length: c_int, _frame_period: f64) -> c_int {
        unavailable("GetSamplesForDIO")
    }

    pub unsafe fn InitializeDioOption(_option: *mut DioOption) {
        unavailable("InitializeDioOption")
    }

    pub unsafe fn Dio(
        _x: *const f64,
        _x_length: c_int,
        _fs: c_int,
        _option: *const DioOption,
        _temporal_positions: *mut f64,
        _f0: *mut f64,
    ) {
        unavailable("Dio")
    }

    pub unsafe fn StoneMask(
        _x: *const f64,
        _x_length: c_int,
        _fs: c_int,
        _temporal_positions: *const f64,
        _f0: *const f64,
        _f0_length: c_int,
        _refined_f0: *mut f64,
    ) {
        unavailable("StoneMask")
    }

    pub unsafe fn GetFFTSizeForCheapTrick(_fs: c_int) -> c_int {
        unavailable("GetFFTSizeForCheapTrick")
    }

    pub unsafe fn InitializeCheapTrickOption(_option: *mut CheapTrickOption) {
        unavailable("InitializeCheapTrickOption")
    }

    pub unsafe fn CheapTrick(
        _x: *const f64,
        _x_length: c_int,
        _fs: c_int,
        _temporal_positions: *const f64,
        _f0: *const f64,
        _f0_length: c_int,
        _option: *const CheapTrickOption,
        _spectrogram: *mut *mut f64,
    ) {
        unavailable("CheapTrick")
    }

    pub unsafe fn InitializeD4COption(_option: *mut D4COption) {
        unavailable("InitializeD4COption")
    }

    pub unsafe fn D4C(
        _x: *const f64,
        _x_length: c_int,
        _fs: c_int,
        _temporal_positions: *const f64,
        _f0: *const f64,
        _f0_length: c_int,
        _fft_size: c_int,
        _option: *const D4COption,
        _aperiodicity: *mut *mut f64,
    ) {
        unavailable("D4C")
    }

    pub unsafe fn Synthesis(
        _f0: *const f64,
        _f0_length: c_int,
        _spectrogram: *const *const f64,
        _aperiodicity: *const *const f64,
        _fft_size: c_int,
        _frame_period: f64,
        _fs: c_int,
        _y_length: c_int,
        _y: *mut f64,
    ) {
        unavailable("Synthesis")
    }
}

// ============================================================================
// Tests
// ============================================================================
