//! JSON output types for machine-readable CLI output.
//!
//! Every command accepts `--json`; the shapes below are what it prints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use blitosc_engine::{ControlDescriptor, EngineError};

/// Error codes for CLI operations.
///
/// Engine errors keep their own `ENGINE_xxx` codes.
pub mod error_codes {
    /// File could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// File could not be written
    pub const FILE_WRITE: &str = "CLI_002";
    /// JSON serialization error
    pub const JSON_SERIALIZE: &str = "CLI_003";
    /// Audio analysis error
    pub const AUDIO_ANALYSIS: &str = "CLI_004";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "ENGINE_003")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl JsonError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            file: None,
        }
    }

    /// Sets the file path for this error.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Uses the code of the first engine error in the chain, or `fallback`.
    pub fn from_anyhow(fallback: &str, err: &anyhow::Error) -> Self {
        let code = err
            .chain()
            .find_map(|e| e.downcast_ref::<EngineError>())
            .map(EngineError::code)
            .unwrap_or(fallback);
        Self::new(code, format!("{:#}", err))
    }
}

/// Output of `render --json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RenderResult>,
}

/// Details of a written render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderResult {
    /// Written WAV path
    pub output: String,
    pub kind: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub num_samples: usize,
    /// BLAKE3 hash of the PCM data
    pub pcm_hash: String,
}

impl RenderOutput {
    pub fn success(result: RenderResult) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}

/// Output of `analyze --json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalyzeResult>,
}

/// Analysis result details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResult {
    /// Input file, or `render:<kind>` for a fresh render
    pub source: String,
    /// BLAKE3 hash of the 16-bit PCM data that was measured
    pub pcm_hash: String,
    pub metrics: BTreeMap<String, serde_json::Value>,
}

impl AnalyzeOutput {
    pub fn success(result: AnalyzeResult) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    pub fn failure(errors: Vec<JsonError>) -> Self {
        Self {
            success: false,
            errors,
            result: None,
        }
    }
}

/// Output of `controls --json`.
#[derive(Debug, Clone, Serialize)]
pub struct ControlsOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub controls: Vec<ControlDescriptor>,
}
