//! Shared helpers for the engine integration tests.

#![allow(dead_code)]

use blitosc_engine::{
    spawn_oscillator, BlockRequest, EngineContext, OscillatorConfiguration, OscillatorKind,
    BLOCK_SIZE_OS,
};

/// Host rate used by most tests.
pub const SAMPLE_RATE: f64 = 44100.0;

/// Oversampled rate the output is produced at.
pub const SAMPLE_RATE_OS: f64 = SAMPLE_RATE * 2.0;

/// Stereo render result.
pub struct Rendered {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

/// Renders `blocks` blocks of a freshly initialized oscillator.
pub fn render(
    kind: OscillatorKind,
    config: &OscillatorConfiguration,
    pitch: f32,
    blocks: usize,
) -> Vec<f32> {
    render_with(kind, config, 0, blocks, |_| BlockRequest::new(pitch), pitch).left
}

/// Renders with a per-block request builder.
pub fn render_with<'m>(
    kind: OscillatorKind,
    config: &OscillatorConfiguration,
    seed: u32,
    blocks: usize,
    mut request: impl FnMut(usize) -> BlockRequest<'m>,
    init_pitch: f32,
) -> Rendered {
    let ctx = EngineContext::new(SAMPLE_RATE).unwrap().with_seed(seed);
    let mut osc = spawn_oscillator(kind, ctx, config);
    osc.init(init_pitch, false);

    let mut out = Rendered {
        left: Vec::with_capacity(blocks * BLOCK_SIZE_OS),
        right: Vec::with_capacity(blocks * BLOCK_SIZE_OS),
    };
    for b in 0..blocks {
        let req = request(b);
        osc.process_block(&req);
        out.left.extend_from_slice(osc.output_left());
        if req.stereo {
            out.right.extend_from_slice(osc.output_right());
        }
    }
    out
}

/// Fraction of samples above the midpoint of the signal's range.
pub fn duty_cycle(samples: &[f32]) -> f32 {
    let max = samples.iter().copied().fold(f32::MIN, f32::max);
    let min = samples.iter().copied().fold(f32::MAX, f32::min);
    let threshold = (max + min) / 2.0;
    samples.iter().filter(|&&s| s > threshold).count() as f32 / samples.len() as f32
}

/// Number of upward zero crossings.
pub fn rising_crossings(samples: &[f32]) -> usize {
    samples.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count()
}

pub fn mean(samples: &[f32]) -> f32 {
    samples.iter().map(|&s| s as f64).sum::<f64>() as f32 / samples.len() as f32
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}
