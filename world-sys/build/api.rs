//! The WORLD API revision the declarations in `src/lib.rs` are written
//! against. Shared by the build script and the integration tests.

/// Oldest pkg-config version accepted.
pub const MIN_VERSION: &str = "0.1.0";

/// First pkg-config version that is *not* accepted.
///
/// 0.2.1 grew `CheapTrickOption` to `{ q1, f0_floor, fft_size }` and gave
/// `GetFFTSizeForCheapTrick` an option argument.
pub const MAX_VERSION: &str = "0.2.1";

/// Whether a `cheaptrick.h` declares the single-argument
/// `GetFFTSizeForCheapTrick(int fs)`.
///
/// Returns `false` when the declaration is missing.
pub fn cheaptrick_header_matches(header: &str) -> bool {
    let Some(start) = header.find("GetFFTSizeForCheapTrick(") else {
        return false;
    };
    let params = &header[start + "GetFFTSizeForCheapTrick(".len()..];
    match params.find(')') {
        Some(end) => !params[..end].contains(','),
        None => false,
    }
}
