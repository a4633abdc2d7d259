//! Portable 4-wide float vectors and the impulse convolution kernels.
//!
//! [`convolve_scalar`] is the reference; [`convolve`] processes the taps four
//! at a time with the same operation order, so the two agree to the bit on
//! targets without fused multiply-add contraction.

use crate::constants::FIR_WIDTH;

/// Four packed `f32` lanes, 16-byte aligned.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C, align(16))]
pub struct F32x4(pub [f32; 4]);

impl F32x4 {
    /// All lanes set to `v`.
    #[inline(always)]
    pub fn splat(v: f32) -> Self {
        Self([v; 4])
    }

    /// Loads four lanes from the start of `src`.
    #[inline(always)]
    pub fn load(src: &[f32]) -> Self {
        Self([src[0], src[1], src[2], src[3]])
    }

    /// Stores the lanes to the start of `dst`.
    #[inline(always)]
    pub fn store(self, dst: &mut [f32]) {
        dst[..4].copy_from_slice(&self.0);
    }

    #[inline(always)]
    pub fn add(self, rhs: Self) -> Self {
        let (a, b) = (self.0, rhs.0);
        Self([a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]])
    }

    #[inline(always)]
    pub fn mul(self, rhs: Self) -> Self {
        let (a, b) = (self.0, rhs.0);
        Self([a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]])
    }

    /// `self * m + a`, unfused.
    #[inline(always)]
    pub fn mul_add(self, m: Self, a: Self) -> Self {
        self.mul(m).add(a)
    }
}

/// Adds `(kernel + lipol * delta) * gain` into the first [`FIR_WIDTH`] samples of `dst`.
#[inline]
pub fn convolve(
    dst: &mut [f32],
    kernel: &[f32; FIR_WIDTH],
    delta: &[f32; FIR_WIDTH],
    lipol: f32,
    gain: f32,
) {
    let lipol = F32x4::splat(lipol);
    let gain = F32x4::splat(gain);
    for k in (0..FIR_WIDTH).step_by(4) {
        let taps = F32x4::load(&delta[k..]).mul_add(lipol, F32x4::load(&kernel[k..]));
        let out = taps.mul_add(gain, F32x4::load(&dst[k..]));
        out.store(&mut dst[k..]);
    }
}

/// Stereo form of [`convolve`]: one interpolated kernel, two gains.
#[inline]
pub fn convolve_stereo(
    left: &mut [f32],
    right: &mut [f32],
    kernel: &[f32; FIR_WIDTH],
    delta: &[f32; FIR_WIDTH],
    lipol: f32,
    gain_left: f32,
    gain_right: f32,
) {
    let lipol = F32x4::splat(lipol);
    let gl = F32x4::splat(gain_left);
    let gr = F32x4::splat(gain_right);
    for k in (0..FIR_WIDTH).step_by(4) {
        let taps = F32x4::load(&delta[k..]).mul_add(lipol, F32x4::load(&kernel[k..]));
        taps.mul_add(gl, F32x4::load(&left[k..])).store(&mut left[k..]);
        taps.mul_add(gr, F32x4::load(&right[k..])).store(&mut right[k..]);
    }
}

/// Scalar reference for [`convolve`].
pub fn convolve_scalar(
    dst: &mut [f32],
    kernel: &[f32; FIR_WIDTH],
    delta: &[f32; FIR_WIDTH],
    lipol: f32,
    gain: f32,
) {
    for i in 0..FIR_WIDTH {
        let tap = delta[i] * lipol + kernel[i];
        dst[i] += tap * gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinc::SincTable;

    #[test]
    fn test_lane_ops() {
        let a = F32x4([1.0, 2.0, 3.0, 4.0]);
        let b = F32x4::splat(2.0);
        assert_eq!(a.add(b), F32x4([3.0, 4.0, 5.0, 6.0]));
        assert_eq!(a.mul(b), F32x4([2.0, 4.0, 6.0, 8.0]));
        assert_eq!(a.mul_add(b, a), F32x4([3.0, 6.0, 9.0, 12.0]));

        let mut out = [0.0f32; 6];
        a.store(&mut out[2..]);
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(F32x4::load(&out[2..]), a);
    }

    #[test]
    fn test_vector_matches_scalar() {
        let table = SincTable::new();
        for (bin, lipol, gain) in [(0, 0.0, 1.0), (17, 1234.0, -0.75), (255, 65535.0, 0.3)] {
            let row = table.row(bin);
            let mut scalar = [0.25f32; FIR_WIDTH + 3];
            let mut vector = scalar;
            convolve_scalar(&mut scalar[3..], &row.kernel, &row.delta, lipol, gain);
            convolve(&mut vector[3..], &row.kernel, &row.delta, lipol, gain);
            for (s, v) in scalar.iter().zip(vector.iter()) {
                assert!((s - v).abs() <= 1e-7, "{} vs {}", s, v);
            }
        }
    }

    #[test]
    fn test_stereo_matches_two_mono_passes() {
        let table = SincTable::new();
        let row = table.row(99);
        let mut l = [0.0f32; FIR_WIDTH];
        let mut r = [0.0f32; FIR_WIDTH];
        convolve_stereo(&mut l, &mut r, &row.kernel, &row.delta, 500.0, 0.4, 1.6);

        let mut ml = [0.0f32; FIR_WIDTH];
        let mut mr = [0.0f32; FIR_WIDTH];
        convolve_scalar(&mut ml, &row.kernel, &row.delta, 500.0, 0.4);
        convolve_scalar(&mut mr, &row.kernel, &row.delta, 500.0, 1.6);
        for i in 0..FIR_WIDTH {
            assert!((l[i] - ml[i]).abs() <= 1e-7);
            assert!((r[i] - mr[i]).abs() <= 1e-7);
        }
    }
}
