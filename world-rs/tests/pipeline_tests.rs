//! Integration tests for the stage sequencing.
//!
//! These run against a deterministic fake engine, so they need no native
//! library.

mod common;

use approx::assert_relative_eq;
use common::{aperiodicity_value, spectral_value, FakeEngine, VOICED_F0};
use world_rs::{
    output_length, AnalysisConfig, Aperiodicity, AperiodicityOptions, Error, F0Options, F0Source,
    F0Track, Matrix, Pipeline, Refinement, SampleRate, SpectralEnvelope, SpectralEnvelopeOptions,
};

fn fs(hz: u32) -> SampleRate {
    SampleRate::new(hz).unwrap()
}

/// A 1 kHz-ish square wave, enough for the fake to call it voiced.
fn tone(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| if (i / 8) % 2 == 0 { 0.25 } else { -0.25 })
        .collect()
}

fn pipeline() -> Pipeline<FakeEngine> {
    Pipeline::new(FakeEngine::new())
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_silent_second_at_44100() {
    let pipeline = pipeline();
    let fs = fs(44100);
    let signal = vec![0.0; 44100];

    let raw = pipeline
        .estimate_f0(&signal, fs, &F0Options::default())
        .unwrap();
    assert_eq!(raw.len(), 201);
    assert_eq!(raw.time_axis().len(), 201);
    assert_eq!(raw.source(), F0Source::Raw);
    assert_eq!(raw.voiced_frames(), 0);
    assert_relative_eq!(raw.time_axis()[1], 0.005);

    let track = pipeline.refine_f0(&signal, fs, &raw).unwrap();
    assert_eq!(track.len(), 201);
    assert_eq!(track.source(), F0Source::Refined);
    assert_eq!(track.time_axis(), raw.time_axis());

    let spectral = pipeline
        .estimate_spectral_envelope(&signal, fs, &track, &SpectralEnvelopeOptions::default())
        .unwrap();
    let aperiodicity = pipeline
        .estimate_aperiodicity(&signal, fs, &track, &AperiodicityOptions::default())
        .unwrap();
    assert_eq!(spectral.matrix().shape(), (1025, 201));
    assert_eq!(aperiodicity.matrix().shape(), (1025, 201));
    assert_eq!(spectral.fft_size(), 2048);

    let output = pipeline
        .synthesize(&track, &spectral, &aperiodicity, 5.0, fs, 44100)
        .unwrap();
    assert_eq!(output.len(), 44100);
    assert!(output.iter().all(|&y| y == 0.0));
    assert_eq!(pipeline.engine().stage_calls(), 5);
}

#[test]
fn test_matrices_keep_frame_order() {
    let pipeline = pipeline();
    let fs = fs(16000);
    let signal = tone(16000);

    let track = pipeline
        .estimate_f0(&signal, fs, &F0Options::default())
        .unwrap();
    let spectral = pipeline
        .estimate_spectral_envelope(&signal, fs, &track, &SpectralEnvelopeOptions::default())
        .unwrap();
    let aperiodicity = pipeline
        .estimate_aperiodicity(&signal, fs, &track, &AperiodicityOptions::default())
        .unwrap();

    assert_eq!(spectral.bins(), 513);
    for frame in [0, 1, 100, 200] {
        assert_eq!(spectral.frame(frame)[0], spectral_value(0, frame));
        assert_eq!(spectral.frame(frame)[512], spectral_value(512, frame));
        assert_eq!(spectral.matrix().get(7, frame), Some(spectral_value(7, frame)));
        assert!(aperiodicity
            .frame(frame)
            .iter()
            .all(|&a| a == aperiodicity_value(frame)));
    }
}

#[test]
fn test_voiced_signal_round_trip() {
    let pipeline = pipeline();
    let fs = fs(16000);
    let signal = tone(8000);

    let analysis = pipeline
        .analyze(&signal, fs, &AnalysisConfig::default())
        .unwrap();
    assert_eq!(analysis.frames(), 101);
    assert_eq!(analysis.f0.voiced_frames(), 101);
    assert_eq!(analysis.f0.f0()[0], VOICED_F0 + 1.0);

    let output = pipeline.resynthesize(&analysis, Some(signal.len())).unwrap();
    assert_eq!(output.len(), signal.len());
    assert!(output.iter().all(|&y| y == 0.5));
}

// ============================================================================
// Refinement choice
// ============================================================================

#[test]
fn test_analyze_refines_by_default() {
    let pipeline = pipeline();
    let signal = tone(4000);

    let analysis = pipeline
        .analyze(&signal, fs(16000), &AnalysisConfig::default())
        .unwrap();

    assert_eq!(analysis.f0.source(), F0Source::Refined);
    assert_eq!(analysis.spectral.source(), F0Source::Refined);
    assert_eq!(analysis.aperiodicity.source(), F0Source::Refined);
    assert_eq!(FakeEngine::count(&pipeline.engine().calls.refine_f0), 1);
}

#[test]
fn test_analyze_can_skip_refinement() {
    let pipeline = pipeline();
    let signal = tone(4000);
    let config = AnalysisConfig::new().refinement(Refinement::Skip);

    let analysis = pipeline.analyze(&signal, fs(16000), &config).unwrap();

    assert_eq!(analysis.f0.source(), F0Source::Raw);
    assert_eq!(analysis.f0.f0()[0], VOICED_F0);
    assert_eq!(FakeEngine::count(&pipeline.engine().calls.refine_f0), 0);
}

#[test]
fn test_resynthesize_default_length() {
    let pipeline = pipeline();
    let fs = fs(44100);
    let signal = vec![0.0; 44100];

    let analysis = pipeline
        .analyze(&signal, fs, &AnalysisConfig::default())
        .unwrap();
    let output = pipeline.resynthesize(&analysis, None).unwrap();

    assert_eq!(output.len(), output_length(201, 5.0, fs));
    assert_eq!(output.len(), 44101);
}

// ============================================================================
// Degenerate inputs
// ============================================================================

#[test]
fn test_empty_signal_never_reaches_the_engine() {
    let pipeline = pipeline();
    let fs = fs(44100);
    let signal: Vec<f64> = Vec::new();

    let raw = pipeline
        .estimate_f0(&signal, fs, &F0Options::default())
        .unwrap();
    assert!(raw.is_empty());
    assert!(raw.time_axis().is_empty());

    let track = pipeline.refine_f0(&signal, fs, &raw).unwrap();
    assert!(track.is_empty());
    assert_eq!(track.source(), F0Source::Refined);

    let spectral = pipeline
        .estimate_spectral_envelope(&signal, fs, &track, &SpectralEnvelopeOptions::default())
        .unwrap();
    let aperiodicity = pipeline
        .estimate_aperiodicity(&signal, fs, &track, &AperiodicityOptions::default())
        .unwrap();
    assert_eq!(spectral.frames(), 0);
    assert_eq!(aperiodicity.frames(), 0);
    assert_eq!(spectral.bins(), 1025);

    let output = pipeline
        .synthesize(&track, &spectral, &aperiodicity, 5.0, fs, 64)
        .unwrap();
    assert_eq!(output, vec![0.0; 64]);

    assert_eq!(pipeline.engine().stage_calls(), 0);
}

#[test]
fn test_zero_output_length() {
    let pipeline = pipeline();
    let fs = fs(16000);
    let signal = tone(1600);
    let analysis = pipeline
        .analyze(&signal, fs, &AnalysisConfig::default())
        .unwrap();

    let output = pipeline.resynthesize(&analysis, Some(0)).unwrap();
    assert!(output.is_empty());
    assert_eq!(FakeEngine::count(&pipeline.engine().calls.synthesize), 0);
}

// ============================================================================
// Hand-off checks
// ============================================================================

#[test]
fn test_frame_count_mismatch_is_rejected() {
    let pipeline = pipeline();
    let fs = fs(16000);
    let long = tone(720);
    let short = tone(640);

    let track = pipeline
        .estimate_f0(&long, fs, &F0Options::default())
        .unwrap();
    let shorter = pipeline
        .estimate_f0(&short, fs, &F0Options::default())
        .unwrap();
    assert_eq!((track.len(), shorter.len()), (10, 9));

    let spectral = pipeline
        .estimate_spectral_envelope(&long, fs, &track, &SpectralEnvelopeOptions::default())
        .unwrap();
    let aperiodicity = pipeline
        .estimate_aperiodicity(&short, fs, &shorter, &AperiodicityOptions::default())
        .unwrap();

    let err = pipeline
        .synthesize(&track, &spectral, &aperiodicity, 5.0, fs, 720)
        .unwrap_err();
    assert_eq!(err, Error::shape_mismatch("aperiodicity frames", 10, 9));
    assert_eq!(FakeEngine::count(&pipeline.engine().calls.synthesize), 0);
}

#[test]
fn test_matrix_from_other_sample_rate_is_rejected() {
    let pipeline = pipeline();
    let signal = tone(1600);

    let analysis = pipeline
        .analyze(&signal, fs(16000), &AnalysisConfig::default())
        .unwrap();

    let err = pipeline
        .synthesize(
            &analysis.f0,
            &analysis.spectral,
            &analysis.aperiodicity,
            5.0,
            fs(44100),
            4410,
        )
        .unwrap_err();
    assert_eq!(err, Error::shape_mismatch("spectral envelope fft size", 2048, 1024));
    assert_eq!(FakeEngine::count(&pipeline.engine().calls.synthesize), 0);
}

#[test]
fn test_zero_length_output_still_checks_sample_rate() {
    let pipeline = pipeline();
    let analysis = pipeline
        .analyze(&tone(1600), fs(16000), &AnalysisConfig::default())
        .unwrap();

    let err = pipeline
        .synthesize(
            &analysis.f0,
            &analysis.spectral,
            &analysis.aperiodicity,
            5.0,
            fs(44100),
            0,
        )
        .unwrap_err();
    assert_eq!(err, Error::shape_mismatch("spectral envelope fft size", 2048, 1024));
    assert_eq!(FakeEngine::count(&pipeline.engine().calls.synthesize), 0);
}

#[test]
fn test_non_finite_track_cannot_be_built() {
    let err = F0Track::new(
        vec![f64::NAN, 0.005, 0.010, 0.015],
        vec![f64::INFINITY, -5.0, f64::NAN, 0.0],
        5.0,
        F0Source::Raw,
    )
    .unwrap_err();
    assert!(err.is_configuration());

    let err = F0Track::new(vec![0.0; 4], vec![0.0; 4], f64::NAN, F0Source::Raw).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_mixed_fft_sizes_are_rejected() {
    let pipeline = pipeline();
    let track = F0Track::new(vec![0.0; 4], vec![0.0; 4], 5.0, F0Source::Raw).unwrap();
    let spectral =
        SpectralEnvelope::from_matrix(Matrix::zeros(1025, 4), 2048, F0Source::Raw).unwrap();
    let aperiodicity = Aperiodicity::from_matrix(Matrix::zeros(513, 4), 1024, F0Source::Raw).unwrap();

    let err = pipeline
        .synthesize(&track, &spectral, &aperiodicity, 5.0, fs(44100), 100)
        .unwrap_err();
    assert!(err.is_shape_mismatch());
    assert_eq!(pipeline.engine().stage_calls(), 0);
}

#[test]
fn test_bad_frame_period_is_rejected_before_any_call() {
    let pipeline = pipeline();
    let track = F0Track::new(vec![0.0; 4], vec![0.0; 4], 5.0, F0Source::Raw).unwrap();
    let spectral =
        SpectralEnvelope::from_matrix(Matrix::zeros(1025, 4), 2048, F0Source::Raw).unwrap();
    let aperiodicity =
        Aperiodicity::from_matrix(Matrix::zeros(1025, 4), 2048, F0Source::Raw).unwrap();

    for period in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let err = pipeline
            .synthesize(&track, &spectral, &aperiodicity, period, fs(44100), 100)
            .unwrap_err();
        assert!(err.is_configuration(), "period {} gave {:?}", period, err);
    }
    assert_eq!(pipeline.engine().stage_calls(), 0);
    assert_eq!(FakeEngine::count(&pipeline.engine().calls.sizing), 0);
}

#[test]
fn test_source_mismatch_only_warns() {
    let pipeline = pipeline();
    let fs = fs(16000);
    let signal = tone(1600);

    let raw = pipeline
        .estimate_f0(&signal, fs, &F0Options::default())
        .unwrap();
    let refined = pipeline.refine_f0(&signal, fs, &raw).unwrap();
    let spectral = pipeline
        .estimate_spectral_envelope(&signal, fs, &raw, &SpectralEnvelopeOptions::default())
        .unwrap();
    let aperiodicity = pipeline
        .estimate_aperiodicity(&signal, fs, &raw, &AperiodicityOptions::default())
        .unwrap();

    let output = pipeline
        .synthesize(&refined, &spectral, &aperiodicity, 5.0, fs, 1600)
        .unwrap();
    assert_eq!(output.len(), 1600);
}

// ============================================================================
// Sizing and faults
// ============================================================================

#[test]
fn test_frame_count_is_monotonic() {
    let pipeline = pipeline();
    let fs = fs(22050);

    let mut previous = 0;
    for len in (0..22050).step_by(97) {
        let frames = pipeline.plan(fs, len, 5.0).unwrap().frames;
        assert!(frames >= previous, "{} samples gave {} < {}", len, frames, previous);
        previous = frames;
    }
}

#[test]
fn test_zero_length_plan() {
    let pipeline = pipeline();
    let plan = pipeline.plan(fs(44100), 0, 5.0).unwrap();

    assert_eq!(plan.frames, 0);
    assert_eq!(plan.bins, 1025);
    assert_eq!(plan.matrix_len(), 0);
}

#[test]
fn test_engine_fault_aborts_the_run() {
    let pipeline = Pipeline::new(FakeEngine::failing("aperiodicity"));
    let signal = tone(1600);

    let err = pipeline
        .analyze(&signal, fs(16000), &AnalysisConfig::default())
        .unwrap_err();
    assert_eq!(err, Error::numeric_engine("aperiodicity", "injected fault"));
}

#[test]
fn test_independent_runs_on_threads() {
    let reference = pipeline();
    let pipeline = pipeline();
    let fs = fs(16000);
    let lengths = [1600usize, 3200, 4000, 8000];

    let expected: Vec<_> = lengths
        .iter()
        .map(|&len| {
            let signal = tone(len);
            let analysis = reference
                .analyze(&signal, fs, &AnalysisConfig::default())
                .unwrap();
            let output = reference.resynthesize(&analysis, Some(len)).unwrap();
            (analysis, output)
        })
        .collect();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = lengths
            .iter()
            .map(|&len| {
                let pipeline = &pipeline;
                scope.spawn(move || {
                    let signal = tone(len);
                    let analysis = pipeline
                        .analyze(&signal, fs, &AnalysisConfig::default())
                        .unwrap();
                    let output = pipeline.resynthesize(&analysis, Some(len)).unwrap();
                    (analysis, output)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (len, ((analysis, output), (want_analysis, want_output))) in
        lengths.iter().zip(results.iter().zip(&expected))
    {
        assert_eq!(analysis, want_analysis, "analysis differs for {} samples", len);
        assert_eq!(output, want_output, "output differs for {} samples", len);
        assert_eq!(output.len(), *len);
    }
    assert_eq!(FakeEngine::count(&pipeline.engine().calls.synthesize), 4);
}
