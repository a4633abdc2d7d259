//! Classic pulse/saw oscillator with sub oscillator.
//!
//! A voice walks a four-segment cycle spanning two periods of the played
//! pitch. Bit 0 of the segment picks the primary duty split (`w` / `1-w`),
//! bit 1 the sub oscillator split (`w2` / `2-w2`). Each segment boundary is
//! one band-limited edge. Ramps between edges come from the DC rate
//! `(1 + shape)(1 - sub)` per period, so `shape = -1` has no ramp at all
//! (pure pulse), `shape = 0` ramps down by one per period (saw) and
//! `shape = 1` twice that (double saw).
//!
//! The edge heights are closed-form. Each one also accounts for the ramp the
//! following segment will add, so the running level lands on the same
//! baseline at the start of every cycle.

use crate::config::OscillatorConfiguration;
use crate::constants::{BLOCK_SIZE_OS, MAX_UNISON, SYNC_CEILING};
use crate::integrator::{integrator_leak, tracking_coefficient, CharacterFilter};
use crate::oscillator::blit::{
    edge_period, impulse_position, sync_period, BlitCore, EdgeGenerator, EdgeTiming,
};
use crate::oscillator::{
    BlockRequest, ControlDescriptor, ControlType, EngineContext, OscillatorKind, OscillatorVoice,
};
use crate::smoothing::LinearLag;
use crate::sync::HardSyncController;
use crate::voice::free_running_phase;

/// Lowest period in absolute-detune mode.
const ABSOLUTE_PERIOD_FLOOR: f32 = 0.01;

pub(crate) const CONTROLS: &[ControlDescriptor] = &[
    ControlDescriptor {
        name: "Shape",
        field: "shape",
        control_type: ControlType::PercentBipolar,
        min: -1.0,
        max: 1.0,
        default: 0.0,
        deactivated: false,
    },
    ControlDescriptor {
        name: "Width 1",
        field: "pulse_width",
        control_type: ControlType::Percent,
        min: 0.0,
        max: 1.0,
        default: 0.5,
        deactivated: false,
    },
    ControlDescriptor {
        name: "Width 2",
        field: "sub_width",
        control_type: ControlType::Percent,
        min: 0.0,
        max: 1.0,
        default: 0.5,
        deactivated: false,
    },
    ControlDescriptor {
        name: "Sub Mix",
        field: "sub_level",
        control_type: ControlType::Percent,
        min: 0.0,
        max: 1.0,
        default: 0.0,
        deactivated: false,
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

/// Impulse height of an edge and the level bookkeeping after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHeight {
    /// Signed height of the deposited impulse.
    pub impulse: f32,
    /// Level expected at the next edge, after the following ramp.
    pub level: f32,
}

/// Edge entering `segment`.
///
/// # Arguments
/// * `segment` - Segment being entered, `0..4`
/// * `shape` - Waveform morph in `[-1, 1]`
/// * `sub` - Sub oscillator mix in `[0, 1]`
/// * `pw` - Primary width
/// * `pw2` - Twice the sub width
/// * `level` - Running level before the edge
pub fn pulse_edge(segment: u8, shape: f32, sub: f32, pw: f32, pw2: f32, level: f32) -> EdgeHeight {
    let ramp = (1.0 + shape) * (1.0 - sub);
    match segment & 3 {
        0 => {
            let target = ((1.0 + shape) * 0.5 + (1.0 - pw) * -shape) * (1.0 - sub)
                + 0.5 * sub * (2.0 - pw2);
            EdgeHeight {
                impulse: target - level,
                level: target - pw * pw2 * ramp,
            }
        }
        1 => {
            let g = shape * (1.0 - sub) - sub;
            EdgeHeight {
                impulse: g,
                level: level + g - (1.0 - pw) * (2.0 - pw2) * ramp,
            }
        }
        2 => {
            let g = 1.0 - sub;
            EdgeHeight {
                impulse: g,
                level: level + g - pw * (2.0 - pw2) * ramp,
            }
        }
        _ => {
            let g = shape * (1.0 - sub) + sub;
            EdgeHeight {
                impulse: g,
                level: level + g - (1.0 - pw) * pw2 * ramp,
            }
        }
    }
}

/// Segment length in periods for a cycle of period `t`.
#[inline]
fn segment_length(segment: u8, t: f32, pw: f32, pw2: f32) -> f32 {
    let primary = if segment & 1 == 1 { 1.0 - pw } else { pw };
    let secondary = if (segment + 1) & 2 != 0 { 2.0 - pw2 } else { pw2 };
    t * primary * secondary
}

struct ClassicEdges {
    shape: LinearLag,
    pulse_width: LinearLag,
    sub_width: LinearLag,
    sub_level: LinearLag,
    sync: LinearLag,
    spread: LinearLag,
    absolute: bool,
}

impl ClassicEdges {
    fn new() -> Self {
        Self {
            shape: LinearLag::new(0.0),
            pulse_width: LinearLag::new(0.5),
            sub_width: LinearLag::new(0.5),
            sub_level: LinearLag::new(0.0),
            sync: LinearLag::new(0.0),
            spread: LinearLag::new(0.1),
            absolute: false,
        }
    }

    fn update(&mut self, config: &OscillatorConfiguration) {
        self.shape.new_value(config.shape);
        self.pulse_width.new_value(config.pulse_width);
        self.sub_width.new_value(config.sub_width);
        self.sub_level.new_value(config.sub_level);
        self.sync.new_value(config.sync_semitones);
        self.spread.new_value(config.unison_spread);
        self.absolute = config.absolute_detune;
    }

    fn lags(&mut self) -> [&mut LinearLag; 6] {
        [
            &mut self.shape,
            &mut self.pulse_width,
            &mut self.sub_width,
            &mut self.sub_level,
            &mut self.sync,
            &mut self.spread,
        ]
    }
}

impl EdgeGenerator for ClassicEdges {
    fn sync_semitones(&self) -> f32 {
        self.sync.v()
    }

    fn convolute(&mut self, core: &mut BlitCore<'_>, v: usize, timing: EdgeTiming, stereo: bool) {
        let unison = core.voice_count() > 1;
        let tuning = core.tuning;
        let pitch = core.pitch;
        let absolute = self.absolute;
        let shape = self.shape.v();
        let sub = self.sub_level.v();
        let sync = self.sync.v();

        let voice = &mut core.voices[v];
        let detune = voice.detune(core.drift, self.spread.v(), unison);

        let phase = match HardSyncController::check(voice, sync, || {
            sync_period(tuning, absolute, detune, pitch)
        }) {
            Some(event) => {
                // The interrupted ramp never ran to completion.
                voice.last_impulse_level += voice.dc_level * event.skipped;
                event.phase
            }
            None => voice.primary_phase,
        };
        let position = impulse_position(phase, core.pitch_mult_inv, timing.fm_mul_inv, timing.fm_sample);

        let sync = sync.min(SYNC_CEILING - pitch);
        let t = edge_period(tuning, absolute, detune, pitch, sync, ABSOLUTE_PERIOD_FLOOR);

        let segment = voice.pulse_segment;
        if segment == 0 {
            voice.pwidth = self.pulse_width.v();
            voice.pwidth2 = 2.0 * self.sub_width.v();
        }
        let edge = pulse_edge(segment, shape, sub, voice.pwidth, voice.pwidth2, voice.last_impulse_level);
        voice.last_impulse_level = edge.level;

        let (gl, gr) = voice.panned(edge.impulse * core.layout.attenuation(), stereo);
        core.ring.deposit(core.sinc, position, gl, gr, stereo);

        let previous_dc = voice.dc_level;
        voice.dc_level = (1.0 / t) * (1.0 + shape) * (1.0 - sub);
        let (dl, dr) = voice.panned(voice.dc_level - previous_dc, stereo);
        core.ring.deposit_dc(position.delay, dl, dr);

        voice.advance(segment_length(segment, t, voice.pwidth, voice.pwidth2));
        voice.pulse_segment = (segment + 1) & 3;
    }
}

/// Band-limited pulse/saw oscillator.
pub struct ClassicOscillator<'a> {
    core: BlitCore<'a>,
    edges: ClassicEdges,
    config: OscillatorConfiguration,
    leak: f32,
}

impl<'a> ClassicOscillator<'a> {
    pub fn new(ctx: EngineContext<'a>, config: &OscillatorConfiguration) -> Self {
        let mut osc = Self {
            core: BlitCore::new(ctx),
            edges: ClassicEdges::new(),
            config: config.sanitized(),
            leak: integrator_leak(ctx.sample_rate),
        };
        osc.apply_character();
        osc
    }

    fn apply_character(&mut self) {
        let filter = CharacterFilter::new(self.config.character, self.core.sample_rate);
        self.core.integrator.set_character(filter);
    }

    /// Updates the lag targets and the tracking leak for this block.
    fn update_lags(&mut self) {
        self.edges.update(&self.config);
        let pitch_ratio = self.core.tuning.note_to_pitch(self.core.pitch + self.edges.sync.v());
        let coefficient = tracking_coefficient(self.leak, pitch_ratio, self.core.sample_rate_os);
        self.core.integrator.set_leak_target(coefficient);
    }
}

impl OscillatorVoice for ClassicOscillator<'_> {
    fn kind(&self) -> OscillatorKind {
        OscillatorKind::Classic
    }

    fn configure(&mut self, config: &OscillatorConfiguration) {
        let character = self.config.character;
        self.config = config.sanitized();
        if self.config.character != character {
            self.apply_character();
        }
    }

    fn init(&mut self, pitch: f32, is_display: bool) {
        self.apply_character();
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
                free_running_phase(seed, i, core.tuning.note_to_pitch_inv(spread * offset))
            }
        });

        let (pw, pw2) = (self.edges.pulse_width.v(), 2.0 * self.edges.sub_width.v());
        let n = self.core.voice_count();
        for voice in &mut self.core.voices[..n] {
            voice.pwidth = pw;
            voice.pwidth2 = pw2;
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

    fn cycle(shape: f32, sub: f32, pw: f32, pw2: f32, level: f32) -> (Vec<f32>, f32) {
        let mut level = level;
        let mut impulses = Vec::new();
        for segment in 0..4 {
            let edge = pulse_edge(segment, shape, sub, pw, pw2, level);
            impulses.push(edge.impulse);
            level = edge.level;
        }
        (impulses, level)
    }

    #[test]
    fn test_pulse_edges() {
        // shape -1: no ramp, edges alternate between 1 - w and -w.
        let (impulses, _) = cycle(-1.0, 0.0, 0.25, 1.0, 0.0);
        assert_eq!(impulses, vec![0.75, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_level_returns_to_baseline() {
        for &(shape, sub, pw, pw2) in &[(0.0, 0.0, 0.5, 1.0), (0.6, 0.3, 0.2, 0.7), (-0.4, 0.9, 0.8, 1.5)] {
            let (_, first) = cycle(shape, sub, pw, pw2, 0.0);
            let (impulses, second) = cycle(shape, sub, pw, pw2, first);
            assert!((first - second).abs() < 1e-5);
            // A settled cycle opens with the full main-oscillator jump.
            assert!((impulses[0] - (1.0 - sub)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_segments_span_two_periods() {
        for &(pw, pw2) in &[(0.5, 1.0), (0.1, 0.3), (0.9, 1.9)] {
            let total: f32 = (0..4).map(|s| segment_length(s, 1.0, pw, pw2)).sum();
            assert!((total - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_init_latches_voice_count() {
        let ctx = EngineContext::new(44100.0).unwrap();
        let config = OscillatorConfiguration {
            unison_voices: 4,
            ..Default::default()
        };
        let mut osc = ClassicOscillator::new(ctx, &config);
        osc.init(60.0, false);
        assert_eq!(osc.core.voice_count(), 4);

        osc.configure(&OscillatorConfiguration::default());
        osc.process_block(&BlockRequest::new(60.0));
        assert_eq!(osc.core.voice_count(), 4);

        osc.init(60.0, true);
        assert_eq!(osc.core.voice_count(), 1);
    }

    #[test]
    fn test_retrigger_starts_at_zero_phase() {
        let ctx = EngineContext::new(44100.0).unwrap().with_seed(5);
        let config = OscillatorConfiguration {
            retrigger: true,
            unison_voices: 3,
            ..Default::default()
        };
        let mut osc = ClassicOscillator::new(ctx, &config);
        osc.init(60.0, false);
        for v in 0..3 {
            assert_eq!(osc.core.voices[v].primary_phase, 0.0);
        }

        let free = OscillatorConfiguration {
            unison_voices: 3,
            ..Default::default()
        };
        let mut osc = ClassicOscillator::new(ctx, &free);
        osc.init(60.0, false);
        let phases: Vec<f32> = (0..3).map(|v| osc.core.voices[v].primary_phase).collect();
        assert!(phases.iter().any(|&p| p > 0.0));
        assert_ne!(phases[0], phases[1]);
    }
}
