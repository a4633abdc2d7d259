//! Level metrics, gathered in one pass over a channel.

/// Samples at or above this magnitude count as clipped.
const CLIPPING_THRESHOLD: f32 = 0.999;

/// Running level statistics of one channel.
#[derive(Debug, Clone, Copy)]
pub(super) struct LevelStats {
    len: usize,
    min: f32,
    max: f32,
    sum: f64,
    sum_sq: f64,
    clipped: usize,
}

impl LevelStats {
    pub(super) fn measure(samples: &[f32]) -> Self {
        samples.iter().fold(
            Self {
                len: 0,
                min: 0.0,
                max: 0.0,
                sum: 0.0,
                sum_sq: 0.0,
                clipped: 0,
            },
            |mut acc, &s| {
                if acc.len == 0 {
                    acc.min = s;
                    acc.max = s;
                } else {
                    acc.min = acc.min.min(s);
                    acc.max = acc.max.max(s);
                }
                let v = s as f64;
                acc.sum += v;
                acc.sum_sq += v * v;
                acc.clipped += usize::from(s.abs() >= CLIPPING_THRESHOLD);
                acc.len += 1;
                acc
            },
        )
    }

    pub(super) fn peak(&self) -> f64 {
        self.min.abs().max(self.max.abs()) as f64
    }

    pub(super) fn rms(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            (self.sum_sq / self.len as f64).sqrt()
        }
    }

    /// Mean of the signal. The engine keeps every shape centred, so anything
    /// far from zero here points at a leaking integrator.
    pub(super) fn dc_offset(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.sum / self.len as f64
        }
    }

    pub(super) fn clipping(&self) -> bool {
        self.clipped > 0
    }

    /// Fraction of `samples` above the midpoint between the extremes. For a
    /// pulse this reads back the pulse width.
    pub(super) fn duty_cycle(&self, samples: &[f32]) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let midpoint = 0.5 * (self.min + self.max);
        samples.iter().filter(|&&s| s > midpoint).count() as f64 / self.len as f64
    }
}

/// Amplitude in dBFS, floored at -120.
pub(super) fn to_db(amplitude: f64) -> f64 {
    if amplitude <= 1e-6 {
        -120.0
    } else {
        20.0 * amplitude.log10()
    }
}
