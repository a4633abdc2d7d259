//! Per-unison-voice state.

use rand_pcg::Pcg32;

use crate::drift::DriftLfo;
use crate::rng;
use crate::unison::UnisonLayout;

/// Mutable state of one unison voice.
///
/// Phases are measured in periods of the nominal pitch and always stay
/// non-negative; a block consumes `BLOCK_SIZE_OS * pitch_mult` of them.
#[derive(Debug, Clone)]
pub struct VoiceState {
    /// Time until the next edge.
    pub primary_phase: f32,
    /// Time until the next hard-sync reset.
    pub sync_phase: f32,
    /// Position in the edge cycle.
    pub pulse_segment: u8,
    /// Waveform level the running bookkeeping expects at the next edge.
    pub last_impulse_level: f32,
    /// Current ramp rate scheduled into the DC accumulator.
    pub dc_level: f32,
    /// Primary width latched at segment 0.
    pub pwidth: f32,
    /// Twice the sub width, latched at segment 0.
    pub pwidth2: f32,
    /// Detune offset in `[-1, 1]`, scaled by the spread.
    pub detune_offset: f32,
    pub pan_left: f32,
    pub pan_right: f32,
    pub drift: DriftLfo,
    /// Source of held noise levels.
    pub noise: Pcg32,
}

impl VoiceState {
    pub fn new(seed: u32, index: usize) -> Self {
        Self {
            primary_phase: 0.0,
            sync_phase: 0.0,
            pulse_segment: 0,
            last_impulse_level: 0.0,
            dc_level: 0.0,
            pwidth: 0.5,
            pwidth2: 1.0,
            detune_offset: 0.0,
            pan_left: 1.0,
            pan_right: 1.0,
            drift: DriftLfo::new(rng::derive_voice_seed(seed, index, "drift")),
            noise: rng::create_voice_rng(seed, index, "hold"),
        }
    }

    /// Resets the voice for a new note, reseeding its random streams.
    ///
    /// Both phases start at `phase`; the edge cycle restarts at segment 0.
    pub fn reset(&mut self, seed: u32, index: usize, layout: &UnisonLayout, phase: f32) {
        *self = Self::new(seed, index);
        self.primary_phase = phase;
        self.sync_phase = phase;
        self.detune_offset = layout.detune(index);
        let (l, r) = layout.pan(index);
        self.pan_left = l;
        self.pan_right = r;
    }

    /// Detune in semitones for this block.
    #[inline]
    pub fn detune(&self, drift: f32, spread: f32, unison: bool) -> f32 {
        let mut detune = drift * self.drift.val();
        if unison {
            detune += spread * self.detune_offset;
        }
        detune
    }

    /// Moves the edge clock forward by one segment.
    #[inline]
    pub fn advance(&mut self, rate: f32) {
        self.primary_phase = (self.primary_phase + rate).max(0.0);
    }

    /// Channel gains for an impulse of height `g`.
    #[inline]
    pub fn panned(&self, g: f32, stereo: bool) -> (f32, f32) {
        if stereo {
            (g * self.pan_left, g * self.pan_right)
        } else {
            (g, g)
        }
    }
}

/// Random starting phase for a free-running voice: up to half a period.
pub fn free_running_phase(seed: u32, index: usize, period: f32) -> f32 {
    let mut rng = rng::create_voice_rng(seed, index, "phase");
    0.5 * rng::unipolar(&mut rng) * period
}
