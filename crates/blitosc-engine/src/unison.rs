//! Detune and pan layout for a unison stack.
//!
//! Voices are spread evenly over `[-1, 1]` detune units (scaled later by the
//! spread in semitones). Offsets are handed out outside-in with alternating
//! sign, so voice 0 and 1 are the widest pair and an odd centre voice comes
//! last. A voice's pan position equals its detune offset: the widest voices
//! are hard-panned, the centre one is mono.

use crate::constants::MAX_UNISON;

/// Per-voice detune offsets, pan gains and the stack's gain staging.
#[derive(Debug, Clone, PartialEq)]
pub struct UnisonLayout {
    voices: usize,
    detune: [f32; MAX_UNISON],
    pan_left: [f32; MAX_UNISON],
    pan_right: [f32; MAX_UNISON],
    attenuation: f32,
    makeup: f32,
}

impl UnisonLayout {
    /// Layout for `voices` voices, clamped to `1..=MAX_UNISON`.
    pub fn new(voices: usize) -> Self {
        let voices = voices.clamp(1, MAX_UNISON);
        let mut layout = Self {
            voices,
            detune: [0.0; MAX_UNISON],
            pan_left: [1.0; MAX_UNISON],
            pan_right: [1.0; MAX_UNISON],
            attenuation: 1.0 / (voices as f32).sqrt(),
            makeup: (voices as f32).powf(0.125),
        };
        if voices == 1 {
            return layout;
        }

        let spacing = 2.0 / (voices - 1) as f32;
        let (mut low, mut high) = (0usize, voices - 1);
        for v in 0..voices {
            let slot = if v % 2 == 0 {
                let s = low;
                low += 1;
                s
            } else {
                let s = high;
                high -= 1;
                s
            };
            let d = -1.0 + spacing * slot as f32;
            layout.detune[v] = d;
            layout.pan_left[v] = 1.0 - d;
            layout.pan_right[v] = 1.0 + d;
        }
        layout
    }

    pub fn voices(&self) -> usize {
        self.voices
    }

    /// Detune offset of voice `v` in `[-1, 1]`.
    #[inline]
    pub fn detune(&self, v: usize) -> f32 {
        self.detune[v]
    }

    #[inline]
    pub fn pan(&self, v: usize) -> (f32, f32) {
        (self.pan_left[v], self.pan_right[v])
    }

    /// Gain applied to every impulse, `1/sqrt(N)`.
    #[inline]
    pub fn attenuation(&self) -> f32 {
        self.attenuation
    }

    /// Post-mix gain, `N^(1/8)`.
    #[inline]
    pub fn makeup(&self) -> f32 {
        self.makeup
    }
}

impl Default for UnisonLayout {
    fn default() -> Self {
        Self::new(1)
    }
}
