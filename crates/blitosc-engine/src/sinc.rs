//! Windowed-sinc interpolation table.
//!
//! Every impulse deposited by an oscillator is spread over [`FIR_WIDTH`]
//! output samples using a Blackman-windowed sinc. The kernel for an arbitrary
//! sub-sample offset is looked up from [`SINC_BINS`] precomputed rows plus a
//! per-tap slope to the next row, so a 16-bit sub-bin fraction can be applied
//! with one multiply-add per tap.
//!
//! The table is built once per process and shared read-only by every voice.

use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::constants::{FIR_WIDTH, SINC_BINS};

/// Normalized cutoff of the kernel relative to the oversampled Nyquist.
pub const SINC_CUTOFF: f64 = 0.455;

/// Scale of the slope table: one bin spans this many sub-bin steps.
pub const SUB_BIN_STEPS: f64 = 65536.0;

static SHARED: OnceLock<SincTable> = OnceLock::new();

/// One coarse bin: kernel taps and the per-tap delta to the next bin.
#[derive(Debug, Clone, Copy)]
#[repr(C, align(16))]
pub struct SincRow {
    /// Kernel coefficients for this bin's offset.
    pub kernel: [f32; FIR_WIDTH],
    /// `(next_bin - this_bin) / 65536` per tap.
    pub delta: [f32; FIR_WIDTH],
}

/// Precomputed windowed-sinc kernels indexed by fractional-sample bin.
#[derive(Debug, Clone)]
pub struct SincTable {
    rows: Vec<SincRow>,
}

impl SincTable {
    /// Builds a table. Prefer [`SincTable::shared`] outside of tests.
    pub fn new() -> Self {
        let mut rows = vec![
            SincRow {
                kernel: [0.0; FIR_WIDTH],
                delta: [0.0; FIR_WIDTH],
            };
            SINC_BINS + 1
        ];

        for (j, row) in rows.iter_mut().enumerate() {
            for (i, tap) in row.kernel.iter_mut().enumerate() {
                let t = -(i as f64) + (FIR_WIDTH as f64 / 2.0) + (j as f64 / SINC_BINS as f64) - 1.0;
                *tap = (symmetric_blackman(t, FIR_WIDTH) * SINC_CUTOFF * sinc(SINC_CUTOFF * t)) as f32;
            }
        }

        for j in 0..SINC_BINS {
            let next = rows[j + 1].kernel;
            let row = &mut rows[j];
            for i in 0..FIR_WIDTH {
                row.delta[i] = ((next[i] as f64 - row.kernel[i] as f64) / SUB_BIN_STEPS) as f32;
            }
        }

        Self { rows }
    }

    /// The process-wide table, built on first use.
    pub fn shared() -> &'static SincTable {
        SHARED.get_or_init(SincTable::new)
    }

    /// Row for a coarse bin in `0..=SINC_BINS`.
    #[inline]
    pub fn row(&self, bin: usize) -> &SincRow {
        &self.rows[bin.min(SINC_BINS)]
    }

    /// Kernel for a sub-sample offset in `[0, 1)`.
    ///
    /// Interpolates linearly between the two neighbouring bins. Offsets
    /// outside the range are clamped.
    pub fn lookup(&self, fraction: f32) -> [f32; FIR_WIDTH] {
        let scaled = (fraction.clamp(0.0, 1.0) as f64) * SINC_BINS as f64;
        let bin = (scaled.floor() as usize).min(SINC_BINS);
        let lipol = ((scaled - bin as f64) * SUB_BIN_STEPS) as f32;
        let row = self.row(bin);

        let mut out = [0.0; FIR_WIDTH];
        for (i, o) in out.iter_mut().enumerate() {
            *o = row.kernel[i] + lipol * row.delta[i];
        }
        out
    }

    /// Largest absolute coefficient in the table.
    pub fn peak_coefficient(&self) -> f32 {
        self.rows
            .iter()
            .flat_map(|r| r.kernel.iter())
            .fold(0.0f32, |m, &c| m.max(c.abs()))
    }
}

impl Default for SincTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Blackman window centred on `n / 2`, evaluated at a fractional index.
fn symmetric_blackman(i: f64, n: usize) -> f64 {
    let i = i - (n / 2) as f64;
    let n = n as f64;
    0.42 - 0.5 * (2.0 * PI * i / n).cos() + 0.08 * (4.0 * PI * i / n).cos()
}

/// Normalized sinc: `sin(pi x) / (pi x)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}
