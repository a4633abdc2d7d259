//! Slow random pitch drift, one generator per unison voice.

use rand_pcg::Pcg32;

use crate::rng;

const DRIFT_FILTER: f32 = 0.00001;

/// Heavily lowpassed noise, rescaled to roughly unit variance.
#[derive(Debug, Clone)]
pub struct DriftLfo {
    state: f32,
    output: f32,
    rng: Pcg32,
}

impl DriftLfo {
    pub fn new(seed: u32) -> Self {
        Self {
            state: 0.0,
            output: 0.0,
            rng: rng::create_rng(seed),
        }
    }

    /// Advances one block and returns the new value.
    pub fn next(&mut self) -> f32 {
        let r = rng::bipolar(&mut self.rng);
        self.state = self.state * (1.0 - DRIFT_FILTER) + DRIFT_FILTER * r;
        self.output = self.state / DRIFT_FILTER.sqrt();
        self.output
    }

    /// Value from the last [`DriftLfo::next`].
    #[inline]
    pub fn val(&self) -> f32 {
        self.output
    }
}
