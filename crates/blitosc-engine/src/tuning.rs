//! Pitch-to-frequency conversion.
//!
//! Oscillators never compute `2^(x/12)` directly; they ask a [`Tuning`] so a
//! host with a custom scale can retune the engine. Only the ratio relative to
//! pitch 0 matters: `note_to_pitch(12.0) == 2.0` in equal temperament.

/// Converts pitch offsets in semitones to frequency ratios.
pub trait Tuning: Send + Sync {
    /// Frequency ratio of `note` relative to pitch 0.
    fn note_to_pitch(&self, note: f32) -> f32;

    /// Reciprocal of [`Tuning::note_to_pitch`].
    fn note_to_pitch_inv(&self, note: f32) -> f32 {
        1.0 / self.note_to_pitch(note)
    }

    /// Equal-tempered ratio, bypassing any scale mapping.
    fn note_to_pitch_ignoring_tuning(&self, note: f32) -> f32 {
        (note / 12.0).exp2()
    }

    /// Reciprocal of [`Tuning::note_to_pitch_ignoring_tuning`].
    fn note_to_pitch_inv_ignoring_tuning(&self, note: f32) -> f32 {
        (-note / 12.0).exp2()
    }
}

/// Twelve-tone equal temperament.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EqualTemperament;

impl Tuning for EqualTemperament {
    fn note_to_pitch(&self, note: f32) -> f32 {
        (note / 12.0).exp2()
    }

    fn note_to_pitch_inv(&self, note: f32) -> f32 {
        (-note / 12.0).exp2()
    }
}

/// Converts a MIDI-style pitch to Hz under the given tuning.
pub fn pitch_to_hz(tuning: &dyn Tuning, pitch: f32) -> f64 {
    crate::constants::PITCH_ZERO_HZ * tuning.note_to_pitch(pitch) as f64
}
