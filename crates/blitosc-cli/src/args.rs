//! Render options shared by the `render` and `analyze` subcommands.

use std::fs;

use anyhow::{Context, Result};
use clap::Args;

use blitosc_engine::{OscillatorConfiguration, OscillatorKind};

use crate::render::RenderOptions;

/// Oscillator and note settings for an offline render.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Oscillator kind (classic, sample-and-hold)
    #[arg(short, long, default_value = "classic")]
    pub kind: String,

    /// Path to an oscillator configuration JSON file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Pitch in semitones (69 = A440)
    #[arg(short, long, default_value_t = 69.0, allow_negative_numbers = true)]
    pub pitch: f32,

    /// Duration in seconds
    #[arg(long, default_value_t = 1.0)]
    pub seconds: f64,

    /// Host sample rate in Hz (the output runs at twice this rate)
    #[arg(long, default_value_t = 44100.0)]
    pub sample_rate: f64,

    /// Render left and right channels
    #[arg(long)]
    pub stereo: bool,

    /// Through-zero FM depth of a sine modulator
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub fm_depth: f32,

    /// Modulator frequency as a multiple of the carrier
    #[arg(long, default_value_t = 1.0)]
    pub fm_ratio: f32,

    /// Random slow detune amount (0..1)
    #[arg(long, default_value_t = 0.0)]
    pub drift: f32,

    /// Seed for start phases, drift and held noise
    #[arg(long, default_value_t = 0)]
    pub seed: u32,

    /// Render in display mode (single voice, fixed seed)
    #[arg(long)]
    pub preview: bool,
}

impl RenderArgs {
    /// Parses the kind and loads the configuration file, if any.
    pub fn to_options(&self) -> Result<RenderOptions> {
        let kind: OscillatorKind = self.kind.parse()?;
        let config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path))?;
                OscillatorConfiguration::from_json(&json)
                    .with_context(|| format!("Failed to parse config file: {}", path))?
            }
            None => OscillatorConfiguration::default(),
        };

        Ok(RenderOptions {
            kind,
            config,
            pitch: self.pitch,
            seconds: self.seconds,
            sample_rate: self.sample_rate,
            stereo: self.stereo,
            fm_depth: self.fm_depth,
            fm_ratio: self.fm_ratio,
            drift: self.drift,
            seed: self.seed,
            preview: self.preview,
        })
    }
}
