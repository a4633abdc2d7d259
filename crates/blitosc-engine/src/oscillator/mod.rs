//! Oscillator voices.
//!
//! Every oscillator implements [`OscillatorVoice`] and is created through
//! [`spawn_oscillator`] from an [`OscillatorKind`], a shared
//! [`EngineContext`] and an initial configuration.
//!
//! ```
//! use blitosc_engine::{spawn_oscillator, BlockRequest, EngineContext, OscillatorConfiguration, OscillatorKind};
//!
//! let ctx = EngineContext::new(44100.0).unwrap();
//! let mut osc = spawn_oscillator(OscillatorKind::Classic, ctx, &OscillatorConfiguration::default());
//! osc.init(69.0, false);
//! osc.process_block(&BlockRequest::new(69.0));
//! assert!(osc.output_left().iter().all(|s| s.is_finite()));
//! ```

mod blit;
mod classic;
mod sample_and_hold;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::OscillatorConfiguration;
use crate::constants::BLOCK_SIZE_OS;
use crate::error::{EngineError, EngineResult};
use crate::sinc::SincTable;
use crate::tuning::{EqualTemperament, Tuning};

pub use blit::impulse_position;
pub use classic::{pulse_edge, ClassicOscillator, EdgeHeight};
pub use sample_and_hold::{correlated_level, SampleAndHoldOscillator};

static EQUAL_TEMPERAMENT: EqualTemperament = EqualTemperament;

/// Lowest accepted host sample rate in Hz.
pub const MIN_SAMPLE_RATE: f64 = 8000.0;
/// Highest accepted host sample rate in Hz.
pub const MAX_SAMPLE_RATE: f64 = 768000.0;

/// Available oscillator algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OscillatorKind {
    /// Pulse/saw morph with sub oscillator.
    Classic,
    /// Correlated sample-and-hold noise.
    SampleAndHold,
}

impl OscillatorKind {
    /// All kinds, in display order.
    pub const ALL: [OscillatorKind; 2] = [OscillatorKind::Classic, OscillatorKind::SampleAndHold];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            OscillatorKind::Classic => "classic",
            OscillatorKind::SampleAndHold => "sample-and-hold",
        }
    }
}

impl fmt::Display for OscillatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OscillatorKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "classic" => Ok(OscillatorKind::Classic),
            "sample-and-hold" | "s&h" | "snh" => Ok(OscillatorKind::SampleAndHold),
            _ => Err(EngineError::UnknownKind {
                name: s.to_string(),
                expected: OscillatorKind::ALL
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// How a control is presented and ranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    /// `-1..1`.
    PercentBipolar,
    /// `0..1`.
    Percent,
    /// Semitones above the played pitch.
    SyncPitch,
    /// Semitones of unison detune.
    UnisonSpread,
    /// Integer voice count.
    VoiceCount,
    /// Frequency in Hz that can be switched off.
    FrequencyDeactivatable,
}

/// Metadata for one user-facing control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Field of [`OscillatorConfiguration`] the control drives.
    pub field: &'static str,
    pub control_type: ControlType,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Whether the control starts deactivated.
    pub deactivated: bool,
}

/// FM input for one block.
#[derive(Debug, Clone, Copy)]
pub struct FmInput<'a> {
    /// Modulation depth. The instantaneous rate is `1 + depth * modulator[k]`,
    /// limited to `0.1..1.9`.
    pub depth: f32,
    /// Modulator signal at the oversampled rate.
    pub modulator: &'a [f32; BLOCK_SIZE_OS],
}

/// Inputs of one `process_block` call.
#[derive(Debug, Clone, Copy)]
pub struct BlockRequest<'a> {
    /// Pitch in semitones, 69 = A440.
    pub pitch: f32,
    /// Amount of random slow detune, `0..1`.
    pub drift: f32,
    /// Produce a right channel too.
    pub stereo: bool,
    /// Through-zero FM, `None` for the fixed-rate path.
    pub fm: Option<FmInput<'a>>,
}

impl<'a> BlockRequest<'a> {
    pub fn new(pitch: f32) -> Self {
        Self {
            pitch,
            drift: 0.0,
            stereo: false,
            fm: None,
        }
    }

    pub fn with_drift(mut self, drift: f32) -> Self {
        self.drift = drift;
        self
    }

    pub fn stereo(mut self, stereo: bool) -> Self {
        self.stereo = stereo;
        self
    }

    pub fn with_fm(mut self, depth: f32, modulator: &'a [f32; BLOCK_SIZE_OS]) -> Self {
        self.fm = Some(FmInput { depth, modulator });
        self
    }
}

/// Shared, read-only resources an oscillator is built against.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    pub sinc: &'a SincTable,
    pub tuning: &'a dyn Tuning,
    /// Host sample rate in Hz; oscillators run at twice this rate.
    pub sample_rate: f64,
    /// Base seed for every random stream of the oscillator.
    pub seed: u32,
}

impl EngineContext<'static> {
    /// Context with the shared sinc table and equal temperament.
    pub fn new(sample_rate: f64) -> EngineResult<Self> {
        if !sample_rate.is_finite() || !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate)
        {
            return Err(EngineError::InvalidSampleRate { rate: sample_rate });
        }
        Ok(Self {
            sinc: SincTable::shared(),
            tuning: &EQUAL_TEMPERAMENT,
            sample_rate,
            seed: 0,
        })
    }
}

impl<'a> EngineContext<'a> {
    pub fn with_seed(self, seed: u32) -> Self {
        Self { seed, ..self }
    }

    pub fn with_tuning<'b>(self, tuning: &'b dyn Tuning) -> EngineContext<'b>
    where
        'a: 'b,
    {
        EngineContext {
            sinc: self.sinc,
            tuning,
            sample_rate: self.sample_rate,
            seed: self.seed,
        }
    }
}

impl fmt::Debug for EngineContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("sample_rate", &self.sample_rate)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// A band-limited oscillator instance.
pub trait OscillatorVoice: Send {
    fn kind(&self) -> OscillatorKind;

    /// Replaces the configuration read by subsequent blocks.
    ///
    /// The unison voice count is only picked up by [`OscillatorVoice::init`].
    fn configure(&mut self, config: &OscillatorConfiguration);

    /// Resets all voice, ring buffer and integrator state for a new note.
    ///
    /// Display mode forces a single voice and a fixed random seed.
    fn init(&mut self, pitch: f32, is_display: bool);

    /// Renders [`BLOCK_SIZE_OS`] samples into the output buffers.
    ///
    /// In mono only the left buffer is written.
    fn process_block(&mut self, request: &BlockRequest<'_>);

    fn output_left(&self) -> &[f32; BLOCK_SIZE_OS];

    fn output_right(&self) -> &[f32; BLOCK_SIZE_OS];

    /// Controls this oscillator exposes.
    fn control_metadata(&self) -> &'static [ControlDescriptor];
}

/// Controls exposed by `kind`.
pub fn control_metadata(kind: OscillatorKind) -> &'static [ControlDescriptor] {
    match kind {
        OscillatorKind::Classic => classic::CONTROLS,
        OscillatorKind::SampleAndHold => sample_and_hold::CONTROLS,
    }
}

/// Creates an oscillator of the given kind.
pub fn spawn_oscillator<'a>(
    kind: OscillatorKind,
    ctx: EngineContext<'a>,
    config: &OscillatorConfiguration,
) -> Box<dyn OscillatorVoice + 'a> {
    match kind {
        OscillatorKind::Classic => Box::new(ClassicOscillator::new(ctx, config)),
        OscillatorKind::SampleAndHold => Box::new(SampleAndHoldOscillator::new(ctx, config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("classic".parse::<OscillatorKind>().unwrap(), OscillatorKind::Classic);
        assert_eq!(
            "Sample_And_Hold".parse::<OscillatorKind>().unwrap(),
            OscillatorKind::SampleAndHold
        );
        let err = "wavetable".parse::<OscillatorKind>().unwrap_err();
        assert_eq!(err.code(), "ENGINE_002");
        assert!(err.to_string().contains("classic, sample-and-hold"));
    }

    #[test]
    fn test_kind_name_roundtrip() {
        for kind in OscillatorKind::ALL {
            assert_eq!(kind.name().parse::<OscillatorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_context_rejects_bad_rates() {
        assert!(EngineContext::new(f64::NAN).is_err());
        assert!(EngineContext::new(100.0).is_err());
        assert!(EngineContext::new(48000.0).is_ok());
    }

    #[test]
    fn test_spawn_reports_kind_and_controls() {
        let ctx = EngineContext::new(44100.0).unwrap();
        for kind in OscillatorKind::ALL {
            let osc = spawn_oscillator(kind, ctx, &OscillatorConfiguration::default());
            assert_eq!(osc.kind(), kind);
            assert_eq!(osc.control_metadata(), control_metadata(kind));
            assert_eq!(osc.control_metadata().len(), 7);
        }
    }

    #[test]
    fn test_request_builder() {
        let modulator = [0.5f32; BLOCK_SIZE_OS];
        let req = BlockRequest::new(60.0)
            .with_drift(0.2)
            .stereo(true)
            .with_fm(0.3, &modulator);
        assert_eq!(req.pitch, 60.0);
        assert_eq!(req.drift, 0.2);
        assert!(req.stereo);
        assert_eq!(req.fm.map(|fm| fm.depth), Some(0.3));
    }
}
