//! Minimal RIFF/WAVE container support for raw provider PCM.
//!
//! Speech providers stream bare little-endian PCM described only by a MIME type such as
//! `audio/L16;codec=pcm;rate=24000`. Players (and ffmpeg) need a container, so a canonical
//! 44-byte PCM header is prepended.

use std::path::Path;

use crate::foundation::error::{RecapError, RecapResult};

/// Size of the canonical PCM WAV header.
pub const WAV_HEADER_LEN: usize = 44;

/// Bit depth assumed when the MIME type does not say.
pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// Sample rate assumed when the MIME type does not say.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Raw PCM layout as described by a provider MIME type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcmFormat {
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Samples per second.
    pub sample_rate: u32,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Extract bit depth and rate from e.g. `audio/L16;codec=pcm;rate=24000`.
///
/// Unparseable parameters keep their defaults.
pub fn parse_audio_mime_type(mime: &str) -> PcmFormat {
    let mut fmt = PcmFormat::default();
    for param in mime.split(';') {
        let param = param.trim();
        if let Some(rate) = strip_prefix_ignore_case(param, "rate=") {
            if let Ok(rate) = rate.trim().parse::<u32>() {
                fmt.sample_rate = rate;
            }
        } else if let Some(bits) = param.strip_prefix("audio/L")
            && let Ok(bits) = bits.parse::<u16>()
        {
            fmt.bits_per_sample = bits;
        }
    }
    fmt
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Build the 44-byte PCM header for `data_len` bytes of sample data.
///
/// Fails when the format's byte rate or the RIFF size does not fit in 32 bits.
pub fn wav_header(
    data_len: u32,
    fmt: PcmFormat,
    channels: u16,
) -> RecapResult<[u8; WAV_HEADER_LEN]> {
    let bytes_per_sample = fmt.bits_per_sample / 8;
    let block_align = channels
        .checked_mul(bytes_per_sample)
        .ok_or_else(|| RecapError::validation("WAV block align overflows 16 bits"))?;
    let byte_rate = fmt
        .sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| {
            RecapError::validation(format!(
                "WAV byte rate overflows 32 bits at {} Hz",
                fmt.sample_rate
            ))
        })?;
    let riff_len = data_len
        .checked_add(36)
        .ok_or_else(|| RecapError::validation("PCM payload too large for a WAV container"))?;

    let mut h = [0u8; WAV_HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&riff_len.to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&16u32.to_le_bytes());
    h[20..22].copy_from_slice(&1u16.to_le_bytes());
    h[22..24].copy_from_slice(&channels.to_le_bytes());
    h[24..28].copy_from_slice(&fmt.sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    h[32..34].copy_from_slice(&block_align.to_le_bytes());
    h[34..36].copy_from_slice(&fmt.bits_per_sample.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_len.to_le_bytes());
    Ok(h)
}

/// Prepend a mono PCM header to raw provider audio.
pub fn wrap_pcm_in_wav(pcm: &[u8], fmt: PcmFormat) -> RecapResult<Vec<u8>> {
    if fmt.bits_per_sample == 0 || !fmt.bits_per_sample.is_multiple_of(8) {
        return Err(RecapError::validation(format!(
            "unsupported PCM bit depth {}",
            fmt.bits_per_sample
        )));
    }
    if fmt.sample_rate == 0 {
        return Err(RecapError::validation("PCM sample rate must be non-zero"));
    }
    let data_len = u32::try_from(pcm.len())
        .map_err(|_| RecapError::validation("PCM payload too large for a WAV container"))?;
    let header = wav_header(data_len, fmt, 1)?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(pcm);
    Ok(out)
}

/// `true` when the provider payload must be wrapped before writing to `out_path`.
pub fn needs_wav_container(mime: &str, out_path: &Path) -> bool {
    let is_wav_path = out_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    mime.contains("audio/L16") || !is_wav_path
}

#[cfg(test)]
#[path = "../../tests/unit/audio/wav.rs"]
mod tests;
