//! Controls command implementation
//!
//! Lists the user-facing controls of an oscillator kind.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;

use blitosc_engine::{control_metadata, OscillatorKind};

use super::json_output::{ControlsOutput, JsonError};

/// Run the controls command
///
/// # Arguments
/// * `kind` - Oscillator kind name
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(kind: &str, json_output: bool) -> Result<ExitCode> {
    let parsed = kind.parse::<OscillatorKind>();

    if json_output {
        let (output, code) = match parsed {
            Ok(kind) => (
                ControlsOutput {
                    success: true,
                    errors: Vec::new(),
                    kind: Some(kind.to_string()),
                    controls: control_metadata(kind).to_vec(),
                },
                ExitCode::SUCCESS,
            ),
            Err(err) => (
                ControlsOutput {
                    success: false,
                    errors: vec![JsonError::new(err.code(), err.to_string())],
                    kind: None,
                    controls: Vec::new(),
                },
                ExitCode::from(1),
            ),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(code);
    }

    let kind = parsed?;
    println!("{} {}", "Controls:".cyan().bold(), kind);
    for control in control_metadata(kind) {
        let state = if control.deactivated {
            " (off)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<16} {:>8} .. {:<8} default {}{}",
            control.name.bold(),
            control.min,
            control.max,
            control.default,
            state
        );
    }

    Ok(ExitCode::SUCCESS)
}
