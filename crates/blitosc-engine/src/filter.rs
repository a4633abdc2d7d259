//! Biquad filters for the sample-and-hold oscillator's low and high cut.
//!
//! Coefficients follow the Audio EQ Cookbook and are computed in `f64`; the
//! running state is `f32` like the rest of the signal path.

use std::f64::consts::PI;

use crate::integrator::DENORMAL_FLOOR;

/// Butterworth Q.
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Biquad filter coefficients, normalized by `a0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoeffs {
    /// Creates lowpass filter coefficients.
    ///
    /// # Arguments
    /// * `cutoff` - Cutoff frequency in Hz
    /// * `q` - Q factor, 0.707 is Butterworth
    /// * `sample_rate` - Rate the filter runs at in Hz
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let (cos_omega, alpha) = omega_terms(cutoff, q, sample_rate);
        let b1 = 1.0 - cos_omega;
        Self::normalized(b1 / 2.0, b1, b1 / 2.0, cos_omega, alpha)
    }

    /// Creates highpass filter coefficients.
    ///
    /// # Arguments
    /// * `cutoff` - Cutoff frequency in Hz
    /// * `q` - Q factor
    /// * `sample_rate` - Rate the filter runs at in Hz
    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let (cos_omega, alpha) = omega_terms(cutoff, q, sample_rate);
        let b0 = (1.0 + cos_omega) / 2.0;
        Self::normalized(b0, -(1.0 + cos_omega), b0, cos_omega, alpha)
    }

    fn normalized(b0: f64, b1: f64, b2: f64, cos_omega: f64, alpha: f64) -> Self {
        let a0 = 1.0 + alpha;
        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (-2.0 * cos_omega / a0) as f32,
            a2: ((1.0 - alpha) / a0) as f32,
        }
    }
}

fn omega_terms(cutoff: f64, q: f64, sample_rate: f64) -> (f64, f64) {
    // Clamp Q to minimum safe value to prevent division by zero
    let q = q.max(0.5);
    let cutoff = cutoff.clamp(1.0, sample_rate * 0.49);
    let omega = 2.0 * PI * cutoff / sample_rate;
    (omega.cos(), omega.sin() / (2.0 * q))
}

/// Transposed direct form II biquad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Replaces the coefficients, keeping state.
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }

    /// Filters a buffer in place.
    pub fn process_block(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s);
        }
        if self.z1.abs() < DENORMAL_FLOOR {
            self.z1 = 0.0;
        }
        if self.z2.abs() < DENORMAL_FLOOR {
            self.z2 = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_state_gain(coeffs: BiquadCoeffs, freq: f64, sample_rate: f64) -> f32 {
        let mut f = Biquad::new(coeffs);
        let n = (sample_rate * 0.5) as usize;
        let mut peak = 0.0f32;
        for i in 0..n {
            let x = (2.0 * PI * freq * i as f64 / sample_rate).sin() as f32;
            let y = f.process(x);
            if i > n / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_lowpass_passes_low_blocks_high() {
        let c = BiquadCoeffs::lowpass(1000.0, BUTTERWORTH_Q, 48000.0);
        assert!(steady_state_gain(c, 100.0, 48000.0) > 0.95);
        assert!(steady_state_gain(c, 10000.0, 48000.0) < 0.05);
    }

    #[test]
    fn test_highpass_passes_high_blocks_low() {
        let c = BiquadCoeffs::highpass(1000.0, BUTTERWORTH_Q, 48000.0);
        assert!(steady_state_gain(c, 10000.0, 48000.0) > 0.95);
        assert!(steady_state_gain(c, 50.0, 48000.0) < 0.05);
    }

    #[test]
    fn test_cutoff_at_minus_three_db() {
        let c = BiquadCoeffs::lowpass(2000.0, BUTTERWORTH_Q, 48000.0);
        let g = steady_state_gain(c, 2000.0, 48000.0);
        assert!((g - BUTTERWORTH_Q as f32).abs() < 0.02, "gain {}", g);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut f = Biquad::new(BiquadCoeffs::lowpass(500.0, BUTTERWORTH_Q, 48000.0));
        let mut block = [1.0f32; 64];
        f.process_block(&mut block);
        f.reset();
        assert_eq!(f.process(0.0), 0.0);
    }
}
