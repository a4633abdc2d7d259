//! Sample-and-hold oscillator integration tests.

mod common;

use blitosc_engine::{OscillatorConfiguration, OscillatorKind, BLOCK_SIZE_OS};
use common::{mean, peak, render};

fn lag_one_correlation(samples: &[f32], lag: usize) -> f64 {
    let m = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;
    let var: f64 = samples.iter().map(|&s| (s as f64 - m).powi(2)).sum();
    let cov: f64 = samples
        .windows(lag + 1)
        .map(|w| (w[0] as f64 - m) * (w[lag] as f64 - m))
        .sum();
    cov / var
}

fn hold(shape: f32) -> OscillatorConfiguration {
    OscillatorConfiguration {
        shape,
        ..Default::default()
    }
}

#[test]
fn test_hold_output_is_bounded_noise() {
    let out = render(OscillatorKind::SampleAndHold, &hold(0.0), 60.0, 400);
    let tail = &out[20 * BLOCK_SIZE_OS..];
    assert!(tail.iter().all(|s| s.is_finite()));
    assert!(peak(tail) < 1.5);
    assert!(peak(tail) > 0.1);
    assert!(mean(tail).abs() < 0.1, "dc {}", mean(tail));
}

#[test]
fn test_correlation_sets_sign_persistence() {
    // Compare levels one hold apart: one period is about 337 samples at pitch 60.
    let lag = 168;
    let smooth = render(OscillatorKind::SampleAndHold, &hold(-1.0), 60.0, 600);
    let jumpy = render(OscillatorKind::SampleAndHold, &hold(1.0), 60.0, 600);
    let smooth_corr = lag_one_correlation(&smooth[20 * BLOCK_SIZE_OS..], lag);
    let jumpy_corr = lag_one_correlation(&jumpy[20 * BLOCK_SIZE_OS..], lag);
    assert!(smooth_corr > 0.2, "smooth {smooth_corr}");
    assert!(jumpy_corr < -0.2, "jumpy {jumpy_corr}");
}

#[test]
fn test_low_cut_removes_dc_drift() {
    let config = OscillatorConfiguration {
        low_cut: Some(2000.0),
        ..Default::default()
    };
    let open = render(OscillatorKind::SampleAndHold, &hold(0.0), 40.0, 400);
    let cut = render(OscillatorKind::SampleAndHold, &config, 40.0, 400);
    let rms = |s: &[f32]| (s.iter().map(|&x| (x as f64).powi(2)).sum::<f64>() / s.len() as f64).sqrt();
    assert!(rms(&cut[40 * BLOCK_SIZE_OS..]) < rms(&open[40 * BLOCK_SIZE_OS..]));
}

#[test]
fn test_high_cut_smooths_steps() {
    let config = OscillatorConfiguration {
        high_cut: Some(200.0),
        ..Default::default()
    };
    let open = render(OscillatorKind::SampleAndHold, &hold(0.0), 90.0, 200);
    let cut = render(OscillatorKind::SampleAndHold, &config, 90.0, 200);
    let max_step = |s: &[f32]| s.windows(2).fold(0.0f32, |m, w| m.max((w[1] - w[0]).abs()));
    assert!(max_step(&cut[20 * BLOCK_SIZE_OS..]) < max_step(&open[20 * BLOCK_SIZE_OS..]) * 0.5);
}
