//! Oscillator configuration.
//!
//! One [`OscillatorConfiguration`] drives an oscillator instance. It is
//! rebuilt by the caller every block and smoothed inside the oscillator.
//! Values are never rejected: [`OscillatorConfiguration::sanitized`] replaces
//! non-finite values by their defaults and clamps everything into range.
//!
//! The sample-and-hold oscillator reads `shape` as its correlation and
//! `pulse_width` as its hold-width; it ignores the sub-oscillator fields and
//! `character`. The classic oscillator ignores `low_cut` and `high_cut`.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_UNISON;
use crate::error::EngineResult;
use crate::integrator::Character;

/// Narrowest allowed pulse and sub width.
pub const MIN_WIDTH: f32 = 0.001;
/// Widest allowed pulse and sub width.
pub const MAX_WIDTH: f32 = 0.999;
/// Widest unison spread in semitones.
pub const MAX_UNISON_SPREAD: f32 = 12.0;
/// Lowest accepted cut frequency in Hz.
pub const MIN_CUT_HZ: f32 = 5.0;

/// Per-block oscillator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OscillatorConfiguration {
    /// Waveform morph: -1 pulse, 0 saw, +1 double saw. Correlation for sample-and-hold.
    #[serde(default)]
    pub shape: f32,
    /// Duty cycle of the primary pulse.
    #[serde(default = "default_width")]
    pub pulse_width: f32,
    /// Duty cycle of the sub oscillator.
    #[serde(default = "default_width")]
    pub sub_width: f32,
    /// Mix between main (0) and sub (1) oscillator.
    #[serde(default)]
    pub sub_level: f32,
    /// Hard sync amount in semitones above the played pitch. 0 disables sync.
    #[serde(default)]
    pub sync_semitones: f32,
    /// Detune of the outermost unison voices in semitones.
    #[serde(default = "default_spread")]
    pub unison_spread: f32,
    /// Number of unison voices. Latched when the oscillator is initialized.
    #[serde(default = "default_voices")]
    pub unison_voices: usize,
    /// Detune by a fixed frequency instead of a pitch ratio.
    #[serde(default)]
    pub absolute_detune: bool,
    /// Start every voice at phase zero instead of a random phase.
    #[serde(default)]
    pub retrigger: bool,
    /// Post-integrator tone of the classic oscillator.
    #[serde(default)]
    pub character: Character,
    /// Sample-and-hold high-pass corner in Hz. `None` deactivates it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_cut: Option<f32>,
    /// Sample-and-hold low-pass corner in Hz. `None` deactivates it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_cut: Option<f32>,
}

fn default_width() -> f32 {
    0.5
}

fn default_spread() -> f32 {
    0.1
}

fn default_voices() -> usize {
    1
}

impl Default for OscillatorConfiguration {
    fn default() -> Self {
        Self {
            shape: 0.0,
            pulse_width: default_width(),
            sub_width: default_width(),
            sub_level: 0.0,
            sync_semitones: 0.0,
            unison_spread: default_spread(),
            unison_voices: default_voices(),
            absolute_detune: false,
            retrigger: false,
            character: Character::default(),
            low_cut: None,
            high_cut: None,
        }
    }
}

fn finite_or(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

impl OscillatorConfiguration {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy with every value forced into its valid range.
    pub fn sanitized(&self) -> Self {
        let cut = |v: Option<f32>| v.filter(|f| f.is_finite()).map(|f| f.max(MIN_CUT_HZ));
        Self {
            shape: finite_or(self.shape, 0.0).clamp(-1.0, 1.0),
            pulse_width: finite_or(self.pulse_width, default_width()).clamp(MIN_WIDTH, MAX_WIDTH),
            sub_width: finite_or(self.sub_width, default_width()).clamp(MIN_WIDTH, MAX_WIDTH),
            sub_level: finite_or(self.sub_level, 0.0).clamp(0.0, 1.0),
            sync_semitones: finite_or(self.sync_semitones, 0.0).max(0.0),
            unison_spread: finite_or(self.unison_spread, default_spread())
                .clamp(0.0, MAX_UNISON_SPREAD),
            unison_voices: self.unison_voices.clamp(1, MAX_UNISON),
            absolute_detune: self.absolute_detune,
            retrigger: self.retrigger,
            character: self.character,
            low_cut: cut(self.low_cut),
            high_cut: cut(self.high_cut),
        }
    }
}
