//! Sample-and-hold noise oscillator.
//!
//! Each voice alternates between two segments, split by the hold width, and
//! jumps to a fresh random level at every boundary. The jump is a
//! band-limited step, so the held noise is alias-free. Correlation feeds the
//! previous level back into the draw: positive values push consecutive levels
//! toward opposite signs, negative values keep them on the same side.

use crate::config::OscillatorConfiguration;
use crate::constants::{BLOCK_SIZE_OS, MAX_UNISON, OSC_OVERSAMPLING, SYNC_CEILING};
use crate::filter::{Biquad, BiquadCoeffs, BUTTERWORTH_Q};
use crate::integrator::tracking_coefficient;
use crate::oscillator::blit::{
    edge_period, impulse_position, sync_period, BlitCore, EdgeGenerator, EdgeTiming,
};
use crate::oscillator::{
    BlockRequest, ControlDescriptor, ControlType, EngineContext, OscillatorKind, OscillatorVoice,
};
use crate::rng;
use crate::smoothing::LinearLag;
use crate::sync::HardSyncController;
use crate::voice::free_running_phase;

/// Upper bound of the integrator leak.
const SAMPLE_AND_HOLD_LEAK: f32 = 0.999;

/// Lowest period in absolute-detune mode.
const ABSOLUTE_PERIOD_FLOOR: f32 = 0.1;

/// Largest magnitude of a held level.
const LEVEL_LIMIT: f32 = 0.5;

/// Portion of the correlation control applied to the noise.
const CORRELATION_SCALE: f32 = 0.8;

/// Highest cut frequency as a fraction of the host sample rate.
const MAX_CUT_RATIO: f64 = 0.45;

pub(crate) const CONTROLS: &[ControlDescriptor] = &[
    ControlDescriptor {
        name: "Correlation",
        field: "shape",
        control_type: ControlType::PercentBipolar,
        min: -1.0,
        max: 1.0,
        default: 0.0,
        deactivated: false,
    },
    ControlDescriptor {
        name: "Width",
        field: "pulse_width",
        control_type: ControlType::Percent,
        min: 0.0,
        max: 1.0,
        default: 0.5,
        deactivated: false,
    },
    ControlDescriptor {
        name: "Low Cut",
        field: "low_cut",
        control_type: ControlType::FrequencyDeactivatable,
        min: 5.0,
        max: 20000.0,
        default: 20.0,
        deactivated: true,
    },
    ControlDescriptor {
        name: "High Cut",
        field: "high_cut",
        control_type: ControlType::FrequencyDeactivatable,
        min: 5.0,
        max: 20000.0,
        default: 18000.0,
        deactivated: true,
    },
    ControlDescriptor {
        name: "Sync",
        field: "sync_semitones",
        control_type: ControlType::SyncPitch,
        min: 0.0,
        max: 60.0,
        default: 0.0,
        deactivated: false,
    },
    ControlDescriptor {
        name: "Unison Detune",
        field: "unison_spread",
        control_type: ControlType::UnisonSpread,
        min: 0.0,
        max: 12.0,
        default: 0.1,
        deactivated: false,
    },
    ControlDescriptor {
        name: "Unison Voices",
        field: "unison_voices",
        control_type: ControlType::VoiceCount,
        min: 1.0,
        max: MAX_UNISON as f32,
        default: 1.0,
        deactivated: false,
    },
];

/// Next held level from a uniform draw `r` in `[-1, 1)`.
///
/// `correlation` in `[-1, 1]` is scaled by 0.8 before mixing in the
/// previous level `last`; the result is limited to `±0.5`.
pub fn correlated_level(r: f32, correlation: f32, last: f32) -> f32 {
    let wf = correlation * CORRELATION_SCALE;
    let keep = 1.0 - wf.abs();
    let level = (r * keep - wf * last) / keep;
    level.clamp(-LEVEL_LIMIT, LEVEL_LIMIT)
}

struct HoldEdges {
    correlation: LinearLag,
    width: LinearLag,
    sync: LinearLag,
    spread: LinearLag,
    absolute: bool,
}

impl HoldEdges {
    fn new() -> Self {
        Self {
            correlation: LinearLag::new(0.0),
            width: LinearLag::new(0.5),
            sync: LinearLag::new(0.0),
            spread: LinearLag::new(0.1),
            absolute: false,
        }
    }

    fn update(&mut self, config: &OscillatorConfiguration) {
        self.correlation.new_value(config.shape);
        self.width.new_value(config.pulse_width);
        self.sync.new_value(config.sync_semitones);
        self.spread.new_value(config.unison_spread);
        self.absolute = config.absolute_detune;
    }

    fn lags(&mut self) -> [&mut LinearLag; 4] {
        [
            &mut self.correlation,
            &mut self.width,
            &mut self.sync,
            &mut self.spread,
        ]
    }
}

impl EdgeGenerator for HoldEdges {
    fn sync_semitones(&self) -> f32 {
        self.sync.v()
    }

    fn convolute(&mut self, core: &mut BlitCore<'_>, v: usize, timing: EdgeTiming, stereo: bool) {
        let unison = core.voice_count() > 1;
        let tuning = core.tuning;
        let pitch = core.pitch;
        let absolute = self.absolute;
        let sync = self.sync.v();

        let voice = &mut core.voices[v];
        let detune = voice.detune(core.drift, self.spread.v(), unison);

        let (phase, polarity) = match HardSyncController::check(voice, sync, || {
            sync_period(tuning, absolute, detune, pitch)
        }) {
            Some(event) if event.inverts_polarity() => (event.phase, -1.0),
            Some(event) => (event.phase, 1.0),
            None => (voice.primary_phase, 1.0),
        };
        let position = impulse_position(phase, core.pitch_mult_inv, timing.fm_mul_inv, timing.fm_sample);

        let sync = sync.min(SYNC_CEILING - pitch);
        let t = edge_period(tuning, absolute, detune, pitch, sync, ABSOLUTE_PERIOD_FLOOR);

        let segment = voice.pulse_segment;
        if segment == 0 {
            voice.pwidth = self.width.v();
        }

        let r = rng::bipolar(&mut voice.noise);
        let level = correlated_level(r, self.correlation.v() * polarity, voice.last_impulse_level);
        let g = (level - voice.last_impulse_level) * core.layout.attenuation();
        voice.last_impulse_level = level;

        let (gl, gr) = voice.panned(g, stereo);
        core.ring.deposit(core.sinc, position, gl, gr, stereo);

        let rate = if segment & 1 == 1 {
            t * (1.0 - voice.pwidth)
        } else {
            t * voice.pwidth
        };
        voice.advance(rate);
        voice.pulse_segment = (segment + 1) & 1;
    }
}

/// High-pass and low-pass stage for one channel pair.
#[derive(Debug, Clone, Copy)]
struct CutFilter {
    cutoff: f32,
    channels: [Biquad; 2],
}

impl CutFilter {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], stereo: bool) {
        self.channels[0].process_block(left);
        if stereo {
            self.channels[1].process_block(right);
        }
    }
}

/// Creates, retunes or removes `slot` so it matches `cutoff`.
fn retune(
    slot: &mut Option<CutFilter>,
    cutoff: Option<f32>,
    sample_rate: f64,
    design: fn(f64, f64, f64) -> BiquadCoeffs,
) {
    let Some(hz) = cutoff else {
        *slot = None;
        return;
    };
    let limited = (hz as f64).min(sample_rate * MAX_CUT_RATIO);
    let coeffs = design(limited, BUTTERWORTH_Q, sample_rate * OSC_OVERSAMPLING as f64);
    match slot {
        Some(filter) if filter.cutoff == hz => {}
        Some(filter) => {
            filter.cutoff = hz;
            for ch in &mut filter.channels {
                ch.set_coeffs(coeffs);
            }
        }
        None => {
            *slot = Some(CutFilter {
                cutoff: hz,
                channels: [Biquad::new(coeffs); 2],
            });
        }
    }
}

/// Band-limited sample-and-hold noise oscillator.
pub struct SampleAndHoldOscillator<'a> {
    core: BlitCore<'a>,
    edges: HoldEdges,
    config: OscillatorConfiguration,
    low_cut: Option<CutFilter>,
    high_cut: Option<CutFilter>,
}

impl<'a> SampleAndHoldOscillator<'a> {
    pub fn new(ctx: EngineContext<'a>, config: &OscillatorConfiguration) -> Self {
        let mut osc = Self {
            core: BlitCore::new(ctx),
            edges: HoldEdges::new(),
            config: config.sanitized(),
            low_cut: None,
            high_cut: None,
        };
        osc.apply_filters();
        osc
    }

    fn apply_filters(&mut self) {
        let sr = self.core.sample_rate;
        retune(&mut self.low_cut, self.config.low_cut, sr, BiquadCoeffs::highpass);
        retune(&mut self.high_cut, self.config.high_cut, sr, BiquadCoeffs::lowpass);
    }

    fn update_lags(&mut self) {
        self.edges.update(&self.config);
        let pitch_ratio = self.core.tuning.note_to_pitch(self.core.pitch + self.edges.sync.v());
        let coefficient =
            tracking_coefficient(SAMPLE_AND_HOLD_LEAK, pitch_ratio, self.core.sample_rate_os);
        self.core.integrator.set_leak_target(coefficient);
    }
}

impl OscillatorVoice for SampleAndHoldOscillator<'_> {
    fn kind(&self) -> OscillatorKind {
        OscillatorKind::SampleAndHold
    }

    fn configure(&mut self, config: &OscillatorConfiguration) {
        self.config = config.sanitized();
        self.apply_filters();
    }

    fn init(&mut self, pitch: f32, is_display: bool) {
        self.core.set_pitch(pitch, 0.0);
        self.update_lags();
        for lag in self.edges.lags() {
            lag.instantize();
        }
        self.core.integrator.instantize();

        let retrigger = self.config.retrigger || is_display;
        let spread = self.edges.spread.v();
        let seed = self.core.seed_for(is_display);
        self.core.reset(self.config.unison_voices, is_display, |core, i, offset| {
            if retrigger {
                0.0
            } else {
                free_running_phase(seed, i, core.tuning.note_to_pitch(spread * offset))
            }
        });

        let width = self.edges.width.v();
        let n = self.core.voice_count();
        for voice in &mut self.core.voices[..n] {
            voice.pwidth = width;
        }
        for filter in self.low_cut.iter_mut().chain(self.high_cut.iter_mut()) {
            for ch in &mut filter.channels {
                ch.reset();
            }
        }
    }

    fn process_block(&mut self, request: &BlockRequest<'_>) {
        self.core.set_pitch(request.pitch, request.drift);
        self.update_lags();
        for lag in self.edges.lags() {
            lag.process();
        }
        self.core.fill(&mut self.edges, request);
        self.core.reconstruct(request.stereo);

        let core = &mut self.core;
        for filter in self.low_cut.iter_mut().chain(self.high_cut.iter_mut()) {
            filter.process(&mut core.left, &mut core.right, request.stereo);
        }
    }

    fn output_left(&self) -> &[f32; BLOCK_SIZE_OS] {
        &self.core.left
    }

    fn output_right(&self) -> &[f32; BLOCK_SIZE_OS] {
        &self.core.right
    }

    fn control_metadata(&self) -> &'static [ControlDescriptor] {
        CONTROLS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncorrelated_level_is_clamped_draw() {
        assert_eq!(correlated_level(0.25, 0.0, 0.4), 0.25);
        assert_eq!(correlated_level(0.9, 0.0, 0.0), 0.5);
        assert_eq!(correlated_level(-0.9, 0.0, 0.0), -0.5);
    }

    #[test]
    fn test_correlation_direction() {
        // Positive correlation pushes away from the last level, negative toward it.
        let last = 0.4;
        assert!(correlated_level(0.0, 1.0, last) < 0.0);
        assert!(correlated_level(0.0, -1.0, last) > 0.0);
    }

    #[test]
    fn test_levels_bounded() {
        let mut rng = rng::create_rng(3);
        let mut last = 0.0;
        for i in 0..1000 {
            let c = (i as f32 / 500.0) - 1.0;
            last = correlated_level(rng::bipolar(&mut rng), c, last);
            assert!(last.abs() <= LEVEL_LIMIT);
        }
    }

    #[test]
    fn test_filters_follow_configuration() {
        let ctx = EngineContext::new(48000.0).unwrap();
        let mut osc = SampleAndHoldOscillator::new(ctx, &OscillatorConfiguration::default());
        assert!(osc.low_cut.is_none());
        assert!(osc.high_cut.is_none());

        let config = OscillatorConfiguration {
            low_cut: Some(100.0),
            high_cut: Some(50000.0),
            ..Default::default()
        };
        osc.configure(&config);
        assert_eq!(osc.low_cut.map(|f| f.cutoff), Some(100.0));
        assert_eq!(osc.high_cut.map(|f| f.cutoff), Some(50000.0));

        osc.configure(&OscillatorConfiguration::default());
        assert!(osc.low_cut.is_none());
    }

    #[test]
    fn test_output_stays_within_level_range() {
        let ctx = EngineContext::new(44100.0).unwrap().with_seed(9);
        let mut osc = SampleAndHoldOscillator::new(ctx, &OscillatorConfiguration::default());
        osc.init(72.0, false);
        let mut peak = 0.0f32;
        for _ in 0..200 {
            osc.process_block(&BlockRequest::new(72.0));
            for &s in osc.output_left() {
                assert!(s.is_finite());
                peak = peak.max(s.abs());
            }
        }
        assert!(peak > 0.05, "peak {peak}");
        assert!(peak < 1.5, "peak {peak}");
    }
}
