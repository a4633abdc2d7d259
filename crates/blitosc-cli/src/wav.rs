//! 16-bit PCM WAV encoding and decoding.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::render::RenderedAudio;

/// Size of the canonical RIFF/WAVE header.
pub const HEADER_LEN: usize = 44;

/// WAV format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// 16-bit PCM with the given layout.
    pub fn pcm16(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// Canonical PCM header for `data_len` bytes of sample data.
    pub fn header(&self, data_len: u32) -> [u8; HEADER_LEN] {
        let mut h = [0u8; HEADER_LEN];
        let mut put = |at: usize, bytes: &[u8]| h[at..at + bytes.len()].copy_from_slice(bytes);
        put(0, b"RIFF");
        put(4, &(HEADER_LEN as u32 - 8).saturating_add(data_len).to_le_bytes());
        put(8, b"WAVEfmt ");
        put(16, &16u32.to_le_bytes());
        put(20, &1u16.to_le_bytes());
        put(22, &self.channels.to_le_bytes());
        put(24, &self.sample_rate.to_le_bytes());
        put(28, &self.byte_rate().to_le_bytes());
        put(32, &self.block_align().to_le_bytes());
        put(34, &self.bits_per_sample.to_le_bytes());
        put(36, b"data");
        put(40, &data_len.to_le_bytes());
        h
    }
}

/// Writes the header followed by `pcm_data`.
pub fn write_wav<W: Write>(writer: &mut W, format: &WavFormat, pcm_data: &[u8]) -> io::Result<()> {
    let data_len = u32::try_from(pcm_data.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "PCM data exceeds 4 GiB"))?;
    writer.write_all(&format.header(data_len))?;
    writer.write_all(pcm_data)
}

fn to_pcm16(sample: f32) -> [u8; 2] {
    ((sample.clamp(-1.0, 1.0) * 32767.0).round() as i16).to_le_bytes()
}

/// Interleaves frames of one or more channels into little-endian 16-bit PCM.
/// Values outside `-1..1` are clipped; the shortest channel sets the length.
pub fn interleave_pcm16(channels: &[&[f32]]) -> Vec<u8> {
    let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    let mut pcm = Vec::with_capacity(frames * channels.len() * 2);
    for frame in 0..frames {
        for channel in channels {
            pcm.extend_from_slice(&to_pcm16(channel[frame]));
        }
    }
    pcm
}

/// Format and PCM bytes for a render.
pub fn encode_pcm(audio: &RenderedAudio) -> (WavFormat, Vec<u8>) {
    let format = WavFormat::pcm16(audio.channels(), audio.sample_rate);
    let pcm = match &audio.right {
        Some(right) => interleave_pcm16(&[audio.left.as_slice(), right.as_slice()]),
        None => interleave_pcm16(&[audio.left.as_slice()]),
    };
    (format, pcm)
}

/// BLAKE3 hash of PCM data.
pub fn compute_pcm_hash(pcm: &[u8]) -> String {
    blake3::hash(pcm).to_hex().to_string()
}

/// Writes `audio` to `path` and returns the PCM hash.
pub fn write_wav_file(path: &Path, audio: &RenderedAudio) -> Result<String> {
    let (format, pcm) = encode_pcm(audio);
    let mut file = io::BufWriter::new(
        std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?,
    );
    write_wav(&mut file, &format, &pcm)
        .and_then(|_| file.flush())
        .with_context(|| format!("Failed to write WAV: {}", path.display()))?;
    Ok(compute_pcm_hash(&pcm))
}

/// Reads a PCM or float WAV file into per-channel `f32` buffers.
pub fn read_wav_file(path: &Path) -> Result<RenderedAudio> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV: {}", path.display()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("Failed to decode float samples")?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("Failed to decode integer samples")?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let left: Vec<f32> = interleaved.iter().step_by(channels).copied().collect();
    let right = (channels > 1).then(|| interleaved.iter().skip(1).step_by(channels).copied().collect());

    Ok(RenderedAudio {
        sample_rate: spec.sample_rate,
        left,
        right,
    })
}
