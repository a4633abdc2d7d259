//! Machinery shared by the impulse-train oscillators.
//!
//! [`BlitCore`] owns the unison voices, the ring buffer and the integrator.
//! An oscillator supplies an [`EdgeGenerator`] that deposits the next edge of
//! one voice; the core decides how many edges each voice needs for the block
//! (once per block on the fixed-rate path, once per sample under FM) and then
//! reconstructs the output.

use crate::constants::{
    BLOCK_SIZE_OS, FIR_OFFSET, MAX_PITCH, MAX_UNISON, OSC_OVERSAMPLING, PITCH_ZERO_HZ,
};
use crate::integrator::{integrator_leak, DcBlockingIntegrator};
use crate::oscillator::{BlockRequest, EngineContext};
use crate::ring_buffer::{ImpulsePosition, OscillatorRingBuffer, FIXED_ONE};
use crate::rng::DISPLAY_SEED;
use crate::sinc::SincTable;
use crate::sync::HardSyncController;
use crate::tuning::Tuning;
use crate::unison::UnisonLayout;
use crate::voice::VoiceState;

/// Pitches below this are clamped.
pub(crate) const MIN_PITCH: f32 = -128.0;

/// Scale applied to absolute detune before it is added to the sync offset.
pub(crate) const ABSOLUTE_DETUNE_SCALE: f32 = 16.0 / 0.9443;

/// Shortest sync period, in periods of the played pitch.
pub(crate) const MIN_SYNC_PERIOD: f32 = 0.01;

/// Longest edge or sync period, in periods of the played pitch.
pub(crate) const MAX_PERIOD: f32 = 1024.0;

/// Length of the phase-rate history: one block plus the DC step latency.
const RATE_HISTORY: usize = BLOCK_SIZE_OS + FIR_OFFSET;

/// Period of the sync clock: two periods of the detuned, unsynced pitch.
pub(crate) fn sync_period(tuning: &dyn Tuning, absolute: bool, detune: f32, pitch: f32) -> f32 {
    let period = if absolute {
        let scaled = detune * tuning.note_to_pitch_inv_ignoring_tuning(pitch) * ABSOLUTE_DETUNE_SCALE;
        tuning.note_to_pitch_inv_ignoring_tuning(scaled)
    } else {
        tuning.note_to_pitch_inv(detune)
    };
    (2.0 * period).clamp(MIN_SYNC_PERIOD, MAX_PERIOD)
}

/// Period of the edge clock, including the sync offset.
///
/// In absolute mode the detune is a fixed frequency offset, so it is scaled
/// by the inverse pitch ratio; the result is floored at `absolute_floor`.
/// Either way it never exceeds [`MAX_PERIOD`].
pub(crate) fn edge_period(
    tuning: &dyn Tuning,
    absolute: bool,
    detune: f32,
    pitch: f32,
    sync: f32,
    absolute_floor: f32,
) -> f32 {
    let period = if absolute {
        let scaled = detune * tuning.note_to_pitch_inv_ignoring_tuning(pitch) * ABSOLUTE_DETUNE_SCALE;
        tuning
            .note_to_pitch_inv_ignoring_tuning(scaled + sync)
            .max(absolute_floor)
    } else {
        tuning.note_to_pitch_inv(detune + sync)
    };
    period.min(MAX_PERIOD)
}

/// Where within the block an edge is being deposited.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeTiming {
    /// Output sample the edge belongs to under FM; `None` on the fixed-rate path.
    pub fm_sample: Option<usize>,
    /// Reciprocal of the instantaneous FM rate multiplier.
    pub fm_mul_inv: f32,
}

impl EdgeTiming {
    const FIXED: EdgeTiming = EdgeTiming {
        fm_sample: None,
        fm_mul_inv: 1.0,
    };
}

/// Sub-sample position of an edge at `phase`.
///
/// # Arguments
/// * `phase` - Edge time in periods from the block cursor (or current sample under FM)
/// * `pitch_mult_inv` - Samples per period
/// * `fm_mul_inv` - Reciprocal FM rate multiplier, 1 without FM
/// * `fm_sample` - Whole-sample delay to use instead of the decoded one
pub fn impulse_position(
    phase: f32,
    pitch_mult_inv: f32,
    fm_mul_inv: f32,
    fm_sample: Option<usize>,
) -> ImpulsePosition {
    let ipos = (FIXED_ONE * (phase * pitch_mult_inv * fm_mul_inv)) as u32;
    let position = ImpulsePosition::from_fixed(ipos);
    match fm_sample {
        Some(s) => position.with_delay(s),
        None => position,
    }
}

/// Deposits one edge for one voice.
pub(crate) trait EdgeGenerator {
    /// Smoothed sync amount for the current block.
    fn sync_semitones(&self) -> f32;

    fn convolute(&mut self, core: &mut BlitCore<'_>, voice: usize, timing: EdgeTiming, stereo: bool);
}

/// Unison voices, ring buffer and integrator of one oscillator.
pub(crate) struct BlitCore<'a> {
    pub sinc: &'a SincTable,
    pub tuning: &'a dyn Tuning,
    pub sample_rate: f64,
    pub sample_rate_os: f64,
    pub seed: u32,
    pub pitch: f32,
    pub drift: f32,
    pub pitch_mult: f32,
    pub pitch_mult_inv: f32,
    pub layout: UnisonLayout,
    pub voices: Vec<VoiceState>,
    pub ring: OscillatorRingBuffer,
    pub integrator: DcBlockingIntegrator,
    /// FM rate multiplier per sample. A DC step lands `FIR_OFFSET` samples
    /// after its edge, so the first `FIR_OFFSET` entries belong to the
    /// previous block.
    pub rate: [f32; RATE_HISTORY],
    pub left: [f32; BLOCK_SIZE_OS],
    pub right: [f32; BLOCK_SIZE_OS],
}

impl<'a> BlitCore<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        let mut integrator = DcBlockingIntegrator::default();
        integrator.set_leak_target(integrator_leak(ctx.sample_rate));
        integrator.instantize();
        Self {
            sinc: ctx.sinc,
            tuning: ctx.tuning,
            sample_rate: ctx.sample_rate,
            sample_rate_os: ctx.sample_rate * OSC_OVERSAMPLING as f64,
            seed: ctx.seed,
            pitch: 0.0,
            drift: 0.0,
            pitch_mult: 1.0,
            pitch_mult_inv: 1.0,
            layout: UnisonLayout::default(),
            voices: (0..MAX_UNISON).map(|i| VoiceState::new(ctx.seed, i)).collect(),
            ring: OscillatorRingBuffer::new(),
            integrator,
            rate: [1.0; RATE_HISTORY],
            left: [0.0; BLOCK_SIZE_OS],
            right: [0.0; BLOCK_SIZE_OS],
        }
    }

    /// Number of active unison voices.
    #[inline]
    pub fn voice_count(&self) -> usize {
        self.layout.voices()
    }

    /// Clamps the pitch and derives the samples-per-period scaling.
    pub fn set_pitch(&mut self, pitch: f32, drift: f32) {
        self.pitch = if pitch.is_finite() {
            pitch.clamp(MIN_PITCH, MAX_PITCH)
        } else {
            0.0
        };
        self.drift = if drift.is_finite() {
            drift.abs().min(1.0)
        } else {
            0.0
        };
        let samples_per_period =
            self.sample_rate_os / PITCH_ZERO_HZ * self.tuning.note_to_pitch_inv(self.pitch) as f64;
        self.pitch_mult_inv = samples_per_period.max(1.0) as f32;
        self.pitch_mult = 1.0 / self.pitch_mult_inv;
    }

    /// Clears buffers and lays out `voices` voices with starting phases from `phase_of`.
    ///
    /// `phase_of(core, index, detune_offset)` returns the starting phase.
    pub fn reset(&mut self, voices: usize, is_display: bool, phase_of: impl Fn(&Self, usize, f32) -> f32) {
        let voices = if is_display { 1 } else { voices };
        self.layout = UnisonLayout::new(voices);
        self.ring.clear();
        self.integrator.reset();
        self.rate = [1.0; RATE_HISTORY];
        let seed = self.seed_for(is_display);

        for i in 0..self.layout.voices() {
            let phase = phase_of(self, i, self.layout.detune(i));
            let layout = &self.layout;
            self.voices[i].reset(seed, i, layout, phase);
        }
    }

    /// Seed the random streams use for a note.
    pub fn seed_for(&self, is_display: bool) -> u32 {
        if is_display {
            DISPLAY_SEED
        } else {
            self.seed
        }
    }

    /// Deposits all edges needed for one block.
    pub fn fill<E: EdgeGenerator>(&mut self, edges: &mut E, request: &BlockRequest<'_>) {
        let sync_active = HardSyncController::is_active(edges.sync_semitones());
        let n = self.voice_count();
        self.rate.copy_within(BLOCK_SIZE_OS.., 0);

        match request.fm {
            Some(fm) => {
                for voice in &mut self.voices[..n] {
                    voice.drift.next();
                }
                let depth = if fm.depth.is_finite() { fm.depth } else { 0.0 };

                for (s, &m) in fm.modulator.iter().enumerate() {
                    let mut fm_mul = (1.0 + depth * m).clamp(0.1, 1.9);
                    if !fm_mul.is_finite() {
                        fm_mul = 1.0;
                    }
                    self.rate[FIR_OFFSET + s] = fm_mul;
                    let a = self.pitch_mult * fm_mul;
                    let timing = EdgeTiming {
                        fm_sample: Some(s),
                        fm_mul_inv: 1.0 / fm_mul,
                    };
                    for v in 0..n {
                        self.cover(edges, v, a, sync_active, timing, request.stereo);
                    }
                }
            }
            None => {
                self.rate[FIR_OFFSET..].fill(1.0);
                let a = BLOCK_SIZE_OS as f32 * self.pitch_mult;
                for v in 0..n {
                    self.voices[v].drift.next();
                    self.cover(edges, v, a, sync_active, EdgeTiming::FIXED, request.stereo);
                }
            }
        }
    }

    /// Deposits edges for voice `v` until its clocks cover `a` periods, then consumes them.
    #[inline]
    fn cover<E: EdgeGenerator>(
        &mut self,
        edges: &mut E,
        v: usize,
        a: f32,
        sync_active: bool,
        timing: EdgeTiming,
        stereo: bool,
    ) {
        while (sync_active && self.voices[v].sync_phase < a) || self.voices[v].primary_phase < a {
            edges.convolute(self, v, timing, stereo);
        }
        let voice = &mut self.voices[v];
        voice.primary_phase -= a;
        if sync_active {
            voice.sync_phase -= a;
        }
    }

    /// Integrates the block into the output buffers and advances the ring.
    pub fn reconstruct(&mut self, stereo: bool) {
        let dc_scale = self.layout.attenuation() * self.pitch_mult;
        self.integrator.process(
            &self.ring,
            dc_scale,
            &self.rate,
            stereo,
            &mut self.left,
            &mut self.right,
        );

        let makeup = self.layout.makeup();
        if makeup != 1.0 {
            for s in self.left.iter_mut() {
                *s *= makeup;
            }
            if stereo {
                for s in self.right.iter_mut() {
                    *s *= makeup;
                }
            }
        }
        self.ring.advance(BLOCK_SIZE_OS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> BlitCore<'static> {
        BlitCore::new(EngineContext::new(44100.0).unwrap())
    }

    #[test]
    fn test_pitch_scaling() {
        let mut c = core();
        c.set_pitch(69.0, 0.0);
        // 88.2 kHz / 440 Hz
        assert!((c.pitch_mult_inv - 200.45).abs() < 0.05, "{}", c.pitch_mult_inv);
        assert!((c.pitch_mult * c.pitch_mult_inv - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_new_core_starts_with_full_leak() {
        let c = core();
        assert_eq!(c.integrator.leak(), integrator_leak(44100.0));
        assert!(c.rate.iter().all(|&r| r == 1.0));
    }

    #[test]
    fn test_pitch_clamped() {
        let mut c = core();
        c.set_pitch(1000.0, 5.0);
        assert_eq!(c.pitch, MAX_PITCH);
        assert_eq!(c.drift, 1.0);
        assert!(c.pitch_mult_inv >= 1.0);

        c.set_pitch(f32::NAN, f32::NAN);
        assert_eq!(c.pitch, 0.0);
        assert_eq!(c.drift, 0.0);
    }

    #[test]
    fn test_position_encoding() {
        let p = impulse_position(0.5, 10.0, 1.0, None);
        assert_eq!(p.delay, 5);
        assert_eq!(p.bin, 0);

        let p = impulse_position(0.025, 10.0, 1.0, Some(17));
        assert_eq!(p.delay, 17);
        assert_eq!(p.bin, 64);
    }

    #[test]
    fn test_periods() {
        let t = crate::tuning::EqualTemperament;
        assert!((edge_period(&t, false, 0.0, 60.0, 12.0, 0.01) - 0.5).abs() < 1e-6);
        assert!((sync_period(&t, false, 0.0, 60.0) - 2.0).abs() < 1e-6);
        // Absolute detune of zero is the same as relative.
        assert!((edge_period(&t, true, 0.0, 60.0, 12.0, 0.01) - 0.5).abs() < 1e-6);
        assert_eq!(edge_period(&t, true, 0.0, 60.0, 200.0, 0.01), 0.01);
        assert!(sync_period(&t, true, 1.0e4, -128.0) >= MIN_SYNC_PERIOD);
        // A huge negative absolute offset would otherwise be an infinite period.
        assert_eq!(edge_period(&t, true, -1.0, -128.0, 0.0, 0.01), MAX_PERIOD);
        assert_eq!(sync_period(&t, true, -1.0, -128.0), MAX_PERIOD);
    }

    #[test]
    fn test_display_reset_is_single_voice() {
        let mut c = core();
        c.reset(8, true, |_, _, _| 0.0);
        assert_eq!(c.voice_count(), 1);
        c.reset(8, false, |_, i, _| i as f32);
        assert_eq!(c.voice_count(), 8);
        assert_eq!(c.voices[3].primary_phase, 3.0);
    }
}
