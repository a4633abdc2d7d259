//! Fixed sizes shared by every oscillator in the engine.

/// Host-rate samples per processing block.
pub const BLOCK_SIZE: usize = 32;

/// Oversampling factor the oscillators run at.
pub const OSC_OVERSAMPLING: usize = 2;

/// Oversampled samples produced by one `process_block` call.
pub const BLOCK_SIZE_OS: usize = BLOCK_SIZE * OSC_OVERSAMPLING;

/// Length of the ring buffer body. Must be a power of two.
pub const OB_LENGTH: usize = BLOCK_SIZE_OS << 1;

/// Number of taps in the windowed-sinc kernel.
pub const FIR_WIDTH: usize = 12;

/// Tap at which an impulse's DC step is scheduled.
pub const FIR_OFFSET: usize = FIR_WIDTH >> 1;

/// Coarse fractional-sample bins in the sinc table.
pub const SINC_BINS: usize = 256;

/// Maximum number of unison voices per oscillator.
pub const MAX_UNISON: usize = 16;

/// Frequency in Hz of pitch 0 (MIDI note 0).
pub const PITCH_ZERO_HZ: f64 = 8.175798915;

/// Pitch values above this are clamped before processing.
pub const MAX_PITCH: f32 = 148.0;

/// Hard sync is limited to this many semitones above the played pitch.
pub const SYNC_CEILING: f32 = 12.0 + 72.0 + 72.0;

/// Per-sample decay the integrator high-pass never goes above (before pitch tracking).
pub const HPF_CYCLE_LOSS: f32 = 0.995;

/// Corner of the fixed integrator leak in Hz.
pub const INTEGRATOR_LEAK_HZ: f64 = 40.0;
