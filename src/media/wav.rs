//! Minimal WAV encoding for finalized voice recordings.
//!
//! Recordings capture PCM16 mono frames; wrapping them in a RIFF/WAVE header
//! makes the finalized attachment a playable artifact.

/// Size of the RIFF/fmt/data headers preceding the sample data.
const HEADER_LEN: usize = 44;

/// Encode PCM16 mono samples as a WAV file.
pub fn encode_pcm16_mono(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = sample_rate * 2; // mono, 16-bit
    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * 2);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk: PCM, mono, 16-bit
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // audio format: PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // channels
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }

    out
}

/// Duration of a PCM16 mono sample buffer, in seconds.
pub fn duration_secs(samples: &[i16], sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples.len() as f64 / sample_rate as f64
}
