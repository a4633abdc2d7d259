//! Deterministic RNG using PCG32 with BLAKE3 seed derivation.
//!
//! All randomness in the engine (free-running phase offsets, drift, held
//! noise levels) flows through this module, so a render is reproducible for
//! a given base seed.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Seed used by display previews so thumbnails are stable.
pub const DISPLAY_SEED: u32 = 2;

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The 32-bit seed is expanded to 64 bits by duplicating the value in both
/// halves, as required by PCG32's state initialization.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Derives an independent seed for one unison voice.
///
/// Hashes the base seed, the voice index and a stream key with BLAKE3 and
/// keeps the first four bytes.
///
/// # Arguments
/// * `base_seed` - The oscillator's base seed
/// * `voice` - Unison voice index
/// * `stream` - Which random stream of the voice ("phase", "drift", "hold")
pub fn derive_voice_seed(base_seed: u32, voice: usize, stream: &str) -> u32 {
    let mut input = Vec::with_capacity(8 + stream.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(&(voice as u32).to_le_bytes());
    input.extend_from_slice(stream.as_bytes());

    let hash = blake3::hash(&input);
    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Creates the RNG for one voice stream.
pub fn create_voice_rng(base_seed: u32, voice: usize, stream: &str) -> Pcg32 {
    create_rng(derive_voice_seed(base_seed, voice, stream))
}

/// Uniform value in `[0, 1)`.
#[inline]
pub fn unipolar(rng: &mut Pcg32) -> f32 {
    rng.gen::<f32>()
}

/// Uniform value in `[-1, 1)`.
#[inline]
pub fn bipolar(rng: &mut Pcg32) -> f32 {
    rng.gen_range(-1.0f32..1.0f32)
}
