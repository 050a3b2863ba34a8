//! Stateless audio transport decoding
//!
//! The synthesis contract delivers base64-encoded raw PCM (signed 16-bit
//! little-endian). These functions turn that payload into normalized f32
//! sample planes; no resampling or channel mixing happens here.

use crate::{ConfideError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Decoded audio ready for playback: one normalized sample plane per channel
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub planes: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of channels
    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.planes.first().map_or(0, Vec::len)
    }

    pub fn duration_seconds(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}

/// Decode a base64 transport payload into raw bytes
pub fn decode_transport_payload(payload: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(payload)
        .map_err(|e| ConfideError::DecodeError(format!("invalid base64 payload: {e}")))
}

/// Interpret `bytes` as interleaved PCM16LE and de-interleave into
/// `channel_count` normalized sample planes.
///
/// Normalization divides by 32768, so the result lies in [-1.0, 1.0).
/// Sample index `i` belongs to channel `i % channel_count`.
pub fn pcm16_to_samples(bytes: &[u8], sample_rate: u32, channel_count: usize) -> Result<DecodedAudio> {
    if channel_count == 0 {
        return Err(ConfideError::FormatError("channel count must be non-zero".to_string()));
    }
    if bytes.len() % (2 * channel_count) != 0 {
        return Err(ConfideError::FormatError(format!(
            "{} bytes is not a whole number of {}-channel PCM16 frames",
            bytes.len(),
            channel_count
        )));
    }

    let frames = bytes.len() / (2 * channel_count);
    let mut planes: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(frames))
        .collect();

    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        planes[i % channel_count].push(f32::from(sample) / 32768.0);
    }

    Ok(DecodedAudio { planes, sample_rate })
}
