//! Analyze command implementation
//!
//! Measures a fresh render, or an existing WAV with `--input`, and prints
//! deterministic level, pitch and waveform metrics.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analysis::{analyze, metrics_to_btree, AudioMetrics, ChannelMetrics};
use crate::args::RenderArgs;
use crate::render::{render, RenderedAudio};
use crate::wav::{compute_pcm_hash, encode_pcm, read_wav_file};

use super::json_output::{error_codes, AnalyzeOutput, AnalyzeResult, JsonError};

/// Run the analyze command
///
/// # Arguments
/// * `args` - Render settings, ignored when `input_path` is given
/// * `input_path` - Optional WAV file to analyze instead of rendering
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(args: &RenderArgs, input_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(args, input_path)
    } else {
        run_human(args, input_path)
    }
}

fn load(args: &RenderArgs, input_path: Option<&str>) -> Result<(String, RenderedAudio)> {
    match input_path {
        Some(path) => Ok((path.to_string(), read_wav_file(Path::new(path))?)),
        None => {
            let options = args.to_options()?;
            let audio = render(&options).context("Render failed")?;
            Ok((format!("render:{}", options.kind), audio))
        }
    }
}

fn measure(source: String, audio: &RenderedAudio) -> (AnalyzeResult, AudioMetrics) {
    let (_, pcm) = encode_pcm(audio);
    let metrics = analyze(audio);
    let result = AnalyzeResult {
        source,
        pcm_hash: compute_pcm_hash(&pcm),
        metrics: metrics_to_btree(&metrics),
    };
    (result, metrics)
}

fn print_channel(label: &str, channel: &ChannelMetrics) {
    println!("{}", label.bold());
    println!("  {} {:.6} ({:.2} dB)", "Peak:".dimmed(), channel.peak, channel.peak_db);
    println!("  {} {:.6} ({:.2} dB)", "RMS:".dimmed(), channel.rms, channel.rms_db);
    println!("  {} {:.6}", "DC offset:".dimmed(), channel.dc_offset);
    println!(
        "  {} {:.2} Hz",
        "Dominant frequency:".dimmed(),
        channel.dominant_frequency_hz
    );
    println!("  {} {:.4}", "Duty cycle:".dimmed(), channel.duty_cycle);
    if channel.clipping_detected {
        println!("  {}", "Clipping detected".yellow());
    }
}

fn run_human(args: &RenderArgs, input_path: Option<&str>) -> Result<ExitCode> {
    let (source, audio) = load(args, input_path)?;
    println!("{} {}", "Analyzing:".cyan().bold(), source);

    let (result, metrics) = measure(source, &audio);
    println!("{} {}", "Hash:".dimmed(), &result.pcm_hash[..16]);
    println!(
        "{} {} Hz, {} channel(s), {:.1} ms",
        "Format:".dimmed(),
        metrics.sample_rate,
        metrics.channels,
        metrics.duration_ms
    );

    print_channel("Left", &metrics.left);
    if let Some(right) = &metrics.right {
        print_channel("Right", right);
    }

    Ok(ExitCode::SUCCESS)
}

fn run_json(args: &RenderArgs, input_path: Option<&str>) -> Result<ExitCode> {
    let loaded = load(args, input_path);
    let (output, code) = match loaded {
        Ok((source, audio)) => {
            let (result, _) = measure(source, &audio);
            (AnalyzeOutput::success(result), ExitCode::SUCCESS)
        }
        Err(err) => {
            let fallback = if input_path.is_some() {
                error_codes::FILE_READ
            } else {
                error_codes::AUDIO_ANALYSIS
            };
            let mut error = JsonError::from_anyhow(fallback, &err);
            if let Some(path) = input_path {
                error = error.with_file(path);
            }
            (AnalyzeOutput::failure(vec![error]), ExitCode::from(1))
        }
    };

    let json = serde_json::to_string_pretty(&output)?;
    println!("{}", json);
    Ok(code)
}
