//! Metrics over rendered or decoded oscillator audio.
//!
//! All values are rounded to six decimals so JSON output is byte-identical
//! across runs on the same input.

mod quality;
mod spectral;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::render::RenderedAudio;

use quality::{to_db, LevelStats};
use spectral::{calculate_dominant_frequency, calculate_zero_crossing_rate};

const FLOAT_PRECISION: i32 = 6;

fn round_f64(value: f64, decimals: i32) -> f64 {
    let multiplier = 10_f64.powi(decimals);
    (value * multiplier).round() / multiplier
}

/// Metrics of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub peak: f64,
    pub peak_db: f64,
    pub rms: f64,
    pub rms_db: f64,
    /// Mean of the signal.
    pub dc_offset: f64,
    pub clipping_detected: bool,
    /// Strongest frequency above 20 Hz.
    pub dominant_frequency_hz: f64,
    /// Fraction of samples above the midpoint of the range.
    pub duty_cycle: f64,
    pub zero_crossing_rate: f64,
}

/// Metrics of a whole render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetrics {
    pub sample_rate: u32,
    pub channels: u16,
    pub num_samples: usize,
    pub duration_ms: f64,
    pub left: ChannelMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<ChannelMetrics>,
}

/// Measures a single channel.
pub fn analyze_channel(samples: &[f32], sample_rate: u32) -> ChannelMetrics {
    let levels = LevelStats::measure(samples);
    let peak = levels.peak();
    let rms = levels.rms();
    ChannelMetrics {
        peak: round_f64(peak, FLOAT_PRECISION),
        peak_db: round_f64(to_db(peak), FLOAT_PRECISION),
        rms: round_f64(rms, FLOAT_PRECISION),
        rms_db: round_f64(to_db(rms), FLOAT_PRECISION),
        dc_offset: round_f64(levels.dc_offset(), FLOAT_PRECISION),
        clipping_detected: levels.clipping(),
        dominant_frequency_hz: round_f64(
            calculate_dominant_frequency(samples, sample_rate),
            FLOAT_PRECISION,
        ),
        duty_cycle: round_f64(levels.duty_cycle(samples), FLOAT_PRECISION),
        zero_crossing_rate: round_f64(calculate_zero_crossing_rate(samples), FLOAT_PRECISION),
    }
}

/// Measures every channel of `audio`.
pub fn analyze(audio: &RenderedAudio) -> AudioMetrics {
    let duration_ms = if audio.sample_rate == 0 {
        0.0
    } else {
        audio.num_samples() as f64 * 1000.0 / audio.sample_rate as f64
    };
    AudioMetrics {
        sample_rate: audio.sample_rate,
        channels: audio.channels(),
        num_samples: audio.num_samples(),
        duration_ms: round_f64(duration_ms, FLOAT_PRECISION),
        left: analyze_channel(&audio.left, audio.sample_rate),
        right: audio
            .right
            .as_deref()
            .map(|right| analyze_channel(right, audio.sample_rate)),
    }
}

/// Flattens metrics into a sorted map for JSON output.
pub fn metrics_to_btree(metrics: &AudioMetrics) -> BTreeMap<String, serde_json::Value> {
    let mut map = BTreeMap::new();
    if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(metrics) {
        for (key, value) in fields {
            map.insert(key, value);
        }
    }
    map
}
