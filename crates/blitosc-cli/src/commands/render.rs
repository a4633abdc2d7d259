//! Render command implementation
//!
//! Renders a note to a 16-bit WAV at the oversampled rate.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::args::RenderArgs;
use crate::render::render;
use crate::wav::write_wav_file;

use super::json_output::{error_codes, JsonError, RenderOutput, RenderResult};

/// Run the render command
///
/// # Arguments
/// * `args` - Oscillator and note settings
/// * `out_path` - WAV file to write
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(args: &RenderArgs, out_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(args, out_path)
    } else {
        run_human(args, out_path)
    }
}

fn render_to_file(args: &RenderArgs, out_path: &str) -> Result<RenderResult> {
    let options = args.to_options()?;
    let audio = render(&options).context("Render failed")?;
    let pcm_hash = write_wav_file(Path::new(out_path), &audio)?;
    Ok(RenderResult {
        output: out_path.to_string(),
        kind: options.kind.to_string(),
        sample_rate: audio.sample_rate,
        channels: audio.channels(),
        num_samples: audio.num_samples(),
        pcm_hash,
    })
}

fn run_human(args: &RenderArgs, out_path: &str) -> Result<ExitCode> {
    println!(
        "{} {} at pitch {} for {}s",
        "Rendering:".cyan().bold(),
        args.kind,
        args.pitch,
        args.seconds
    );

    let result = render_to_file(args, out_path)?;

    println!(
        "{} {} Hz, {} channel(s), {} samples",
        "Format:".dimmed(),
        result.sample_rate,
        result.channels,
        result.num_samples
    );
    println!("{} {}", "PCM hash:".dimmed(), result.pcm_hash);
    println!("{} {}", "Written:".green().bold(), result.output);

    Ok(ExitCode::SUCCESS)
}

fn run_json(args: &RenderArgs, out_path: &str) -> Result<ExitCode> {
    let (output, code) = match render_to_file(args, out_path) {
        Ok(result) => (RenderOutput::success(result), ExitCode::SUCCESS),
        Err(err) => {
            let error =
                JsonError::from_anyhow(error_codes::FILE_WRITE, &err).with_file(out_path);
            (RenderOutput::failure(vec![error]), ExitCode::from(1))
        }
    };

    let json = serde_json::to_string_pretty(&output)?;
    println!("{}", json);
    Ok(code)
}
