//! blitosc CLI - Offline renderer for band-limited oscillators
//!
//! Renders notes to WAV, measures them, and lists oscillator controls.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use blitosc_cli::args::RenderArgs;
use blitosc_cli::commands;

/// blitosc - Band-limited impulse train oscillators
#[derive(Parser)]
#[command(name = "blitosc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a note to a 16-bit WAV file
    Render {
        #[command(flatten)]
        render: RenderArgs,

        /// Output WAV path
        #[arg(short, long)]
        out: String,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Render a note (or read a WAV) and print level, pitch and duty metrics
    Analyze {
        #[command(flatten)]
        render: RenderArgs,

        /// Analyze an existing WAV file instead of rendering
        #[arg(short, long)]
        input: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// List the controls of an oscillator kind
    Controls {
        /// Oscillator kind (classic, sample-and-hold)
        #[arg(short, long, default_value = "classic")]
        kind: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render { render, out, json } => commands::render::run(&render, &out, json),
        Commands::Analyze {
            render,
            input,
            json,
        } => commands::analyze::run(&render, input.as_deref(), json),
        Commands::Controls { kind, json } => commands::controls::run(&kind, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_render_defaults() {
        let cli = Cli::try_parse_from(["blitosc", "render", "--out", "a.wav"]).unwrap();
        match cli.command {
            Commands::Render { render, out, json } => {
                assert_eq!(out, "a.wav");
                assert!(!json);
                assert_eq!(render.kind, "classic");
                assert_eq!(render.pitch, 69.0);
                assert_eq!(render.seconds, 1.0);
                assert_eq!(render.sample_rate, 44100.0);
                assert!(!render.stereo);
                assert!(render.config.is_none());
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_parses_render_options() {
        let cli = Cli::try_parse_from([
            "blitosc",
            "render",
            "--kind",
            "sample-and-hold",
            "--pitch",
            "-12",
            "--stereo",
            "--fm-depth",
            "0.5",
            "--fm-ratio",
            "2",
            "--seed",
            "9",
            "--preview",
            "--out",
            "b.wav",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Render { render, out, json } => {
                assert_eq!(out, "b.wav");
                assert!(json);
                assert_eq!(render.kind, "sample-and-hold");
                assert_eq!(render.pitch, -12.0);
                assert!(render.stereo);
                assert_eq!(render.fm_depth, 0.5);
                assert_eq!(render.fm_ratio, 2.0);
                assert_eq!(render.seed, 9);
                assert!(render.preview);
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_requires_out_for_render() {
        assert!(Cli::try_parse_from(["blitosc", "render"]).is_err());
    }

    #[test]
    fn test_cli_parses_analyze_input() {
        let cli = Cli::try_parse_from(["blitosc", "analyze", "--input", "x.wav", "--json"]).unwrap();
        match cli.command {
            Commands::Analyze { input, json, .. } => {
                assert_eq!(input.as_deref(), Some("x.wav"));
                assert!(json);
            }
            _ => panic!("expected analyze command"),
        }
    }

    #[test]
    fn test_cli_parses_controls() {
        let cli = Cli::try_parse_from(["blitosc", "controls", "--kind", "classic"]).unwrap();
        match cli.command {
            Commands::Controls { kind, json } => {
                assert_eq!(kind, "classic");
                assert!(!json);
            }
            _ => panic!("expected controls command"),
        }
    }
}
