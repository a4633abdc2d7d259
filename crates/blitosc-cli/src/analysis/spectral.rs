//! Frequency-domain and crossing metrics.

use rustfft::{num_complex::Complex, FftPlanner};

/// Largest FFT used for pitch estimation.
const MAX_FFT_SIZE: usize = 65536;

/// Frequency of the strongest bin above 20 Hz, from a Hann-windowed FFT.
pub(super) fn calculate_dominant_frequency(samples: &[f32], sample_rate: u32) -> f64 {
    if samples.len() < 64 {
        return 0.0;
    }

    let fft_size = samples.len().next_power_of_two().min(MAX_FFT_SIZE);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);

    let mut buffer: Vec<Complex<f32>> = samples
        .iter()
        .take(fft_size)
        .map(|&s| Complex::new(s, 0.0))
        .collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    for (i, sample) in buffer.iter_mut().enumerate() {
        let window = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / fft_size as f32).cos());
        *sample = Complex::new(sample.re * window, 0.0);
    }

    fft.process(&mut buffer);

    let nyquist = fft_size / 2;
    let freq_resolution = sample_rate as f64 / fft_size as f64;
    let min_bin = (20.0 / freq_resolution).ceil() as usize;

    let mut max_magnitude = 0.0f32;
    let mut max_bin = 0usize;
    for (i, c) in buffer.iter().take(nyquist).enumerate().skip(min_bin) {
        let magnitude = c.norm();
        if magnitude > max_magnitude {
            max_magnitude = magnitude;
            max_bin = i;
        }
    }

    max_bin as f64 * freq_resolution
}

/// Sign changes per sample.
pub(super) fn calculate_zero_crossing_rate(samples: &[f32]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / (samples.len() - 1) as f64
}
