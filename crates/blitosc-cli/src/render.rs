//! Offline rendering of an oscillator into sample buffers.

use blitosc_engine::tuning::pitch_to_hz;
use blitosc_engine::{
    spawn_oscillator, BlockRequest, EngineContext, EngineError, EngineResult,
    OscillatorConfiguration, OscillatorKind, BLOCK_SIZE_OS, OSC_OVERSAMPLING,
};

/// Longest render accepted, in seconds.
pub const MAX_RENDER_SECONDS: f64 = 600.0;

/// Everything needed to render one note.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub kind: OscillatorKind,
    pub config: OscillatorConfiguration,
    /// Pitch in semitones, 69 = A440.
    pub pitch: f32,
    pub seconds: f64,
    /// Host sample rate; the output runs at twice this rate.
    pub sample_rate: f64,
    pub stereo: bool,
    /// Depth of a sine modulator applied as through-zero FM.
    pub fm_depth: f32,
    /// Modulator frequency as a multiple of the carrier.
    pub fm_ratio: f32,
    pub drift: f32,
    pub seed: u32,
    /// Initialize in display mode (single voice, fixed seed).
    pub preview: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            kind: OscillatorKind::Classic,
            config: OscillatorConfiguration::default(),
            pitch: 69.0,
            seconds: 1.0,
            sample_rate: 44100.0,
            stereo: false,
            fm_depth: 0.0,
            fm_ratio: 1.0,
            drift: 0.0,
            seed: 0,
            preview: false,
        }
    }
}

/// Rendered samples at the oversampled rate.
#[derive(Debug, Clone)]
pub struct RenderedAudio {
    pub sample_rate: u32,
    pub left: Vec<f32>,
    /// Present for stereo renders.
    pub right: Option<Vec<f32>>,
}

impl RenderedAudio {
    pub fn channels(&self) -> u16 {
        if self.right.is_some() {
            2
        } else {
            1
        }
    }

    pub fn num_samples(&self) -> usize {
        self.left.len()
    }
}

/// Checks the request before any oscillator is built.
pub fn validate(options: &RenderOptions) -> EngineResult<()> {
    let seconds = options.seconds;
    if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_RENDER_SECONDS {
        return Err(EngineError::InvalidDuration { seconds });
    }
    if !options.pitch.is_finite() {
        return Err(EngineError::invalid_param("pitch", "must be finite"));
    }
    if !options.fm_depth.is_finite() {
        return Err(EngineError::invalid_param("fm_depth", "must be finite"));
    }
    if !options.fm_ratio.is_finite() || options.fm_ratio <= 0.0 {
        return Err(EngineError::invalid_param("fm_ratio", "must be a positive number"));
    }
    if !options.drift.is_finite() || !(0.0..=1.0).contains(&options.drift) {
        return Err(EngineError::invalid_param("drift", "must be between 0 and 1"));
    }
    Ok(())
}

/// Renders `options.seconds` of audio.
pub fn render(options: &RenderOptions) -> EngineResult<RenderedAudio> {
    validate(options)?;
    let ctx = EngineContext::new(options.sample_rate)?.with_seed(options.seed);

    let sample_rate_os = options.sample_rate * OSC_OVERSAMPLING as f64;
    let total = (options.seconds * sample_rate_os).round() as usize;
    let blocks = total.div_ceil(BLOCK_SIZE_OS);

    let mut osc = spawn_oscillator(options.kind, ctx, &options.config);
    osc.init(options.pitch, options.preview);

    let modulator_hz = pitch_to_hz(ctx.tuning, options.pitch) * options.fm_ratio as f64;
    let phase_step = modulator_hz / sample_rate_os;
    let mut phase = 0.0f64;
    let mut modulator = [0.0f32; BLOCK_SIZE_OS];

    let mut left = Vec::with_capacity(blocks * BLOCK_SIZE_OS);
    let mut right = options
        .stereo
        .then(|| Vec::with_capacity(blocks * BLOCK_SIZE_OS));

    for _ in 0..blocks {
        let mut request = BlockRequest::new(options.pitch)
            .with_drift(options.drift)
            .stereo(options.stereo);
        if options.fm_depth != 0.0 {
            for m in modulator.iter_mut() {
                *m = (phase * std::f64::consts::TAU).sin() as f32;
                phase = (phase + phase_step).fract();
            }
            request = request.with_fm(options.fm_depth, &modulator);
        }

        osc.process_block(&request);
        left.extend_from_slice(osc.output_left());
        if let Some(right) = right.as_mut() {
            right.extend_from_slice(osc.output_right());
        }
    }

    left.truncate(total);
    if let Some(right) = right.as_mut() {
        right.truncate(total);
    }

    Ok(RenderedAudio {
        sample_rate: sample_rate_os.round() as u32,
        left,
        right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_length_and_rate() {
        let options = RenderOptions {
            seconds: 0.1,
            ..Default::default()
        };
        let audio = render(&options).unwrap();
        assert_eq!(audio.sample_rate, 88200);
        assert_eq!(audio.num_samples(), 8820);
        assert_eq!(audio.channels(), 1);
        assert!(audio.left.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_stereo_render_has_right_channel() {
        let options = RenderOptions {
            seconds: 0.05,
            stereo: true,
            ..Default::default()
        };
        let audio = render(&options).unwrap();
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.right.as_ref().map(Vec::len), Some(audio.left.len()));
    }

    #[test]
    fn test_rejects_bad_duration() {
        for seconds in [0.0, -1.0, f64::NAN, MAX_RENDER_SECONDS + 1.0] {
            let options = RenderOptions {
                seconds,
                ..Default::default()
            };
            assert_eq!(render(&options).unwrap_err().code(), "ENGINE_004");
        }
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        let options = RenderOptions {
            sample_rate: 10.0,
            ..Default::default()
        };
        assert_eq!(render(&options).unwrap_err().code(), "ENGINE_003");
    }

    #[test]
    fn test_rejects_bad_fm_ratio() {
        let options = RenderOptions {
            fm_depth: 0.5,
            fm_ratio: 0.0,
            ..Default::default()
        };
        assert_eq!(render(&options).unwrap_err().code(), "ENGINE_005");
    }

    #[test]
    fn test_fm_render_is_finite_and_differs() {
        let plain = render(&RenderOptions {
            seconds: 0.05,
            ..Default::default()
        })
        .unwrap();
        let fm = render(&RenderOptions {
            seconds: 0.05,
            fm_depth: 0.5,
            fm_ratio: 2.0,
            ..Default::default()
        })
        .unwrap();
        assert!(fm.left.iter().all(|s| s.is_finite()));
        assert_ne!(plain.left, fm.left);
    }
}
