//! Band-limited impulse train oscillators
//!
//! This crate renders antialiased oscillator waveforms by depositing a
//! windowed-sinc impulse at the exact sub-sample position of every waveform
//! discontinuity and integrating the resulting impulse train:
//! - `classic` - Pulse/saw morph with sub oscillator, hard sync and unison
//! - `sample-and-hold` - Correlated held noise with low and high cut
//!
//! # Overview
//!
//! Oscillators run at twice the host sample rate and produce blocks of
//! [`BLOCK_SIZE_OS`] samples. Each instance owns up to [`MAX_UNISON`] voices,
//! a ring buffer the impulses are summed into, and a leaky integrator that
//! turns the impulses back into a waveform. Parameters are smoothed across
//! blocks, so a new [`OscillatorConfiguration`] can be supplied every block.
//!
//! # Determinism
//!
//! Given the same seed, configuration and block requests the output is
//! bit-identical across runs on the same platform. Random streams (start
//! phases, drift, held noise) use PCG32 with per-voice seeds derived via
//! BLAKE3 hashing. Display mode always uses a fixed seed.
//!
//! # Example
//!
//! ```
//! use blitosc_engine::{spawn_oscillator, BlockRequest, EngineContext, OscillatorConfiguration, OscillatorKind};
//!
//! let ctx = EngineContext::new(48000.0).unwrap().with_seed(7);
//! let config = OscillatorConfiguration::from_json(r#"{"shape": -1.0, "pulse_width": 0.25}"#).unwrap();
//! let mut osc = spawn_oscillator(OscillatorKind::Classic, ctx, &config);
//! osc.init(57.0, false);
//! for _ in 0..10 {
//!     osc.process_block(&BlockRequest::new(57.0));
//! }
//! assert!(osc.output_left().iter().any(|s| *s != 0.0));
//! ```
//!
//! # Crate Structure
//!
//! - [`oscillator`] - Oscillator kinds, context and block requests
//! - [`config`] - Serializable per-block parameters
//! - [`sinc`] - Windowed-sinc impulse table
//! - [`ring_buffer`] - Impulse accumulation buffer
//! - [`integrator`] - DC-blocking integrator and character filter
//! - [`rng`] - Deterministic RNG with seed derivation

pub mod config;
pub mod constants;
pub mod drift;
pub mod error;
pub mod filter;
pub mod integrator;
pub mod oscillator;
pub mod ring_buffer;
pub mod rng;
pub mod simd;
pub mod sinc;
pub mod smoothing;
pub mod sync;
pub mod tuning;
pub mod unison;
pub mod voice;

// Re-export main types at crate root
pub use config::OscillatorConfiguration;
pub use constants::{BLOCK_SIZE, BLOCK_SIZE_OS, MAX_UNISON, OSC_OVERSAMPLING};
pub use error::{EngineError, EngineResult};
pub use integrator::Character;
pub use oscillator::{
    control_metadata, spawn_oscillator, BlockRequest, ControlDescriptor, ControlType,
    EngineContext, FmInput, OscillatorKind, OscillatorVoice,
};
pub use sinc::SincTable;
pub use tuning::{EqualTemperament, Tuning};
