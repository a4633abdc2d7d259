//! Reconstruction of the waveform from the impulse train.
//!
//! Each channel runs a leaky integrator over the ring buffer. Ramps are
//! produced by a running DC rate (fed by the DC steps oscillators schedule
//! next to their impulses) that is subtracted every sample. The leak is a
//! one-pole high-pass whose coefficient tracks the fundamental, ramped per
//! sample across each block.

use serde::{Deserialize, Serialize};

use crate::constants::{BLOCK_SIZE_OS, HPF_CYCLE_LOSS, INTEGRATOR_LEAK_HZ, PITCH_ZERO_HZ};
use crate::ring_buffer::OscillatorRingBuffer;
use crate::smoothing::BlockRamp;

/// Magnitudes below this are flushed to zero once per block.
pub const DENORMAL_FLOOR: f32 = 1e-20;

/// Fixed leak used when the coefficient does not otherwise track pitch.
pub fn integrator_leak(sample_rate: f64) -> f32 {
    let leak = 1.0 - INTEGRATOR_LEAK_HZ / sample_rate;
    (leak * leak) as f32
}

/// Leak coefficient for a fundamental of `pitch_ratio` (relative to pitch 0).
///
/// # Arguments
/// * `leak` - Upper bound, usually [`integrator_leak`]
/// * `pitch_ratio` - `note_to_pitch(pitch + sync)`
/// * `sample_rate_os` - Oversampled rate in Hz
pub fn tracking_coefficient(leak: f32, pitch_ratio: f32, sample_rate_os: f64) -> f32 {
    let cycles = PITCH_ZERO_HZ * pitch_ratio as f64 / sample_rate_os;
    let invt = 4.0 * cycles.min(1.0);
    leak.min(HPF_CYCLE_LOSS.powf(invt as f32))
}

#[inline]
fn flush(x: f32) -> f32 {
    if x.abs() < DENORMAL_FLOOR {
        0.0
    } else {
        x
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    dc: f32,
    out: f32,
    shaped: f32,
}

/// Post-integrator tone shaping of the classic oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    /// Gentle high roll-off.
    Warm,
    /// No shaping.
    #[default]
    Neutral,
    /// Gentle high boost, the inverse of `Warm`.
    Bright,
}

/// One-pole/one-zero filter selected by [`Character`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterFilter {
    b0: f32,
    b1: f32,
    a1: f32,
}

impl CharacterFilter {
    /// Coefficients for `character` at the host sample rate.
    pub fn new(character: Character, sample_rate: f64) -> Self {
        let filt = {
            let f = 1.0 - 2.0 * 5000.0 / sample_rate;
            (f * f) as f32
        };
        match character {
            Character::Warm => Self {
                b0: 1.0 - filt,
                b1: 0.0,
                a1: filt,
            },
            Character::Neutral => Self {
                b0: 1.0,
                b1: 0.0,
                a1: 0.0,
            },
            Character::Bright => {
                let a0 = 1.0 / (1.0 - filt);
                Self {
                    b0: a0,
                    b1: -filt * a0,
                    a1: 0.0,
                }
            }
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.b0 == 1.0 && self.b1 == 0.0 && self.a1 == 0.0
    }
}

impl Default for CharacterFilter {
    fn default() -> Self {
        Self::new(Character::Neutral, 44100.0)
    }
}

/// Leaky integrator and DC tracker for a stereo pair.
#[derive(Debug, Clone, Default)]
pub struct DcBlockingIntegrator {
    left: ChannelState,
    right: ChannelState,
    hpf: BlockRamp,
    character: CharacterFilter,
}

impl DcBlockingIntegrator {
    pub fn new(character: CharacterFilter) -> Self {
        Self {
            character,
            ..Self::default()
        }
    }

    /// Clears all channel state. The leak ramp is left to the caller.
    pub fn reset(&mut self) {
        self.left = ChannelState::default();
        self.right = ChannelState::default();
    }

    pub fn set_character(&mut self, character: CharacterFilter) {
        self.character = character;
    }

    /// Sets the leak coefficient the next block ramps to.
    pub fn set_leak_target(&mut self, coefficient: f32) {
        self.hpf.set_target(coefficient);
    }

    /// Jumps the leak coefficient to its target.
    pub fn instantize(&mut self) {
        self.hpf.instantize();
    }

    /// Leak coefficient the current block starts from.
    pub fn leak(&self) -> f32 {
        self.hpf.current()
    }

    /// Reconstructs one block from the ring buffer.
    ///
    /// # Arguments
    /// * `ring` - Impulse and DC-step source, read from its cursor
    /// * `dc_scale` - Output attenuation times pitch multiplier
    /// * `rate` - Per-sample phase rate multiplier (FM), at least one block long
    /// * `stereo` - Whether to produce the right channel
    pub fn process(
        &mut self,
        ring: &OscillatorRingBuffer,
        dc_scale: f32,
        rate: &[f32],
        stereo: bool,
        left: &mut [f32; BLOCK_SIZE_OS],
        right: &mut [f32; BLOCK_SIZE_OS],
    ) {
        let mut hpf = [0.0f32; BLOCK_SIZE_OS];
        self.hpf.fill(&mut hpf);
        let ch = self.character;

        for (k, &r) in rate.iter().take(BLOCK_SIZE_OS).enumerate() {
            let frame = ring.read(k);
            let ramp = dc_scale * r;
            left[k] = run_channel(&mut self.left, &ch, frame.left, frame.dc_left, ramp, hpf[k]);
            if stereo {
                right[k] =
                    run_channel(&mut self.right, &ch, frame.right, frame.dc_right, ramp, hpf[k]);
            }
        }

        for state in [&mut self.left, &mut self.right] {
            state.dc = flush(state.dc);
            state.out = flush(state.out);
            state.shaped = flush(state.shaped);
        }
    }
}

#[inline(always)]
fn run_channel(
    state: &mut ChannelState,
    ch: &CharacterFilter,
    impulse: f32,
    dc_step: f32,
    dc_scale: f32,
    hpf: f32,
) -> f32 {
    state.dc += dc_step;
    let input = impulse - state.dc * dc_scale;
    let previous = state.out;
    state.out = state.out * hpf + input;
    state.shaped = state.shaped * ch.a1 + state.out * ch.b0 + previous * ch.b1;
    state.shaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinc::SincTable;

    #[test]
    fn test_leak_is_below_one() {
        let leak = integrator_leak(44100.0);
        assert!(leak < 1.0 && leak > 0.99);
        let tracked = tracking_coefficient(leak, 1000.0, 88200.0);
        assert!(tracked <= leak);
        let very_high = tracking_coefficient(leak, 1.0e6, 88200.0);
        assert!((very_high - HPF_CYCLE_LOSS.powf(4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_impulse_integrates_to_step() {
        let table = SincTable::new();
        let mut ring = OscillatorRingBuffer::new();
        ring.deposit_at(&table, 4.0, 1.0);

        let mut integ = DcBlockingIntegrator::new(CharacterFilter::default());
        integ.set_leak_target(1.0);
        integ.instantize();

        let mut l = [0.0; BLOCK_SIZE_OS];
        let mut r = [0.0; BLOCK_SIZE_OS];
        integ.process(&ring, 0.0, &[1.0; BLOCK_SIZE_OS], false, &mut l, &mut r);

        let kernel_sum: f32 = table.row(0).kernel.iter().sum();
        assert!(l[0].abs() < 1e-6);
        assert!((l[BLOCK_SIZE_OS - 1] - kernel_sum).abs() < 1e-5);
        assert_eq!(r, [0.0; BLOCK_SIZE_OS]);
    }

    #[test]
    fn test_dc_rate_produces_ramp() {
        let mut ring = OscillatorRingBuffer::new();
        ring.deposit_dc(0, 1.0, 1.0);

        let mut integ = DcBlockingIntegrator::new(CharacterFilter::default());
        integ.set_leak_target(1.0);
        integ.instantize();

        let mut l = [0.0; BLOCK_SIZE_OS];
        let mut r = [0.0; BLOCK_SIZE_OS];
        integ.process(&ring, 0.01, &[1.0; BLOCK_SIZE_OS], true, &mut l, &mut r);

        let start = crate::constants::FIR_OFFSET;
        assert_eq!(l[start - 1], 0.0);
        let slope = l[start + 10] - l[start + 9];
        assert!((slope + 0.01).abs() < 1e-6);
        assert_eq!(l, r);
    }

    #[test]
    fn test_rate_scales_dc_ramp() {
        let mut ring = OscillatorRingBuffer::new();
        ring.deposit_dc(0, 1.0, 1.0);

        let mut integ = DcBlockingIntegrator::new(CharacterFilter::default());
        integ.set_leak_target(1.0);
        integ.instantize();

        let mut rate = [1.0f32; BLOCK_SIZE_OS];
        rate[40..].fill(1.5);
        let mut l = [0.0; BLOCK_SIZE_OS];
        let mut r = [0.0; BLOCK_SIZE_OS];
        integ.process(&ring, 0.01, &rate, false, &mut l, &mut r);

        assert!(((l[30] - l[29]) + 0.01).abs() < 1e-6);
        assert!(((l[50] - l[49]) + 0.015).abs() < 1e-6);
    }

    #[test]
    fn test_warm_and_bright_invert() {
        let warm = CharacterFilter::new(Character::Warm, 44100.0);
        let bright = CharacterFilter::new(Character::Bright, 44100.0);
        assert!(!warm.is_neutral());
        assert!(CharacterFilter::new(Character::Neutral, 44100.0).is_neutral());
        // Both pass DC at unity gain.
        assert!((warm.b0 / (1.0 - warm.a1) - 1.0).abs() < 1e-5);
        assert!((bright.b0 + bright.b1 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_denormal_flush() {
        assert_eq!(flush(1e-30), 0.0);
        assert_eq!(flush(-1e-25), 0.0);
        assert_eq!(flush(0.5), 0.5);
    }
}
