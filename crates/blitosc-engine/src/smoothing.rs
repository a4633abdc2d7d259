//! Parameter smoothing.

/// Blocks a [`LinearLag`] takes to reach a new target.
pub const LAG_RAMP_BLOCKS: u32 = 20;

/// Per-block linear ramp toward the most recent target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearLag {
    value: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl LinearLag {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Sets a new target. Restarts the ramp only if the target changed.
    pub fn new_value(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        self.step = (target - self.value) / LAG_RAMP_BLOCKS as f32;
        self.remaining = LAG_RAMP_BLOCKS;
    }

    /// Jumps to the target.
    pub fn instantize(&mut self) {
        self.value = self.target;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Advances one block.
    pub fn process(&mut self) {
        if self.remaining == 0 {
            return;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.value = self.target;
        } else {
            self.value += self.step;
        }
    }

    /// Current smoothed value.
    #[inline]
    pub fn v(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

impl Default for LinearLag {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Per-sample linear interpolation across one block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockRamp {
    current: f32,
    target: f32,
}

impl BlockRamp {
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn instantize(&mut self) {
        self.current = self.target;
    }

    /// Value the next ramp starts from.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Writes the ramp from the previous block's value to the target.
    pub fn fill(&mut self, out: &mut [f32]) {
        let n = out.len().max(1) as f32;
        let step = (self.target - self.current) / n;
        for (k, o) in out.iter_mut().enumerate() {
            *o = self.current + step * k as f32;
        }
        self.current = self.target;
    }
}
