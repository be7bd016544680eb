use std::path::Path;

use crate::audio::media::AudioPcm;
use crate::foundation::core::TimeSpan;
use crate::foundation::error::{RecapError, RecapResult};

/// Lay `music` under `narration`, looped or truncated to the narration's exact length.
///
/// The result has exactly as many samples as `narration`; music is scaled by `gain` and the
/// sum is clamped to `[-1, 1]`.
pub fn mix_music_under(narration: &AudioPcm, music: &AudioPcm, gain: f32) -> RecapResult<AudioPcm> {
    if narration.sample_rate != music.sample_rate || narration.channels != music.channels {
        return Err(RecapError::validation(format!(
            "music format {} Hz/{} ch does not match narration {} Hz/{} ch",
            music.sample_rate, music.channels, narration.sample_rate, narration.channels
        )));
    }

    let bed = music.interleaved_f32.as_slice();
    if bed.is_empty() || gain == 0.0 {
        return Ok(narration.clone());
    }

    // The bed length is a whole number of frames, so wrapping keeps channels aligned.
    let mixed = narration
        .interleaved_f32
        .iter()
        .zip(bed.iter().cycle())
        .map(|(v, m)| (v + m * gain).clamp(-1.0, 1.0))
        .collect();

    Ok(AudioPcm {
        sample_rate: narration.sample_rate,
        channels: narration.channels,
        interleaved_f32: mixed,
    })
}

/// Split `[0, total_secs)` into `n` contiguous spans of equal length.
///
/// The last span ends at exactly `total_secs`.
pub fn split_equal(total_secs: f64, n: usize) -> RecapResult<Vec<TimeSpan>> {
    if n == 0 {
        return Err(RecapError::validation("cannot split audio into zero parts"));
    }
    if !total_secs.is_finite() || total_secs < 0.0 {
        return Err(RecapError::validation(format!(
            "invalid audio duration {total_secs}"
        )));
    }
    let step = total_secs / n as f64;
    Ok((0..n)
        .map(|i| TimeSpan {
            start: step * i as f64,
            end: if i + 1 == n {
                total_secs
            } else {
                step * (i + 1) as f64
            },
        })
        .collect())
}

/// Write interleaved `f32` PCM samples to raw little-endian `.f32le` file.
pub fn write_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> RecapResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            RecapError::media(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        RecapError::media(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
