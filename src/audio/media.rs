use std::path::Path;

use crate::foundation::core::TimeSpan;
use crate::foundation::error::{RecapError, RecapResult};

/// Internal audio mixing sample rate used across decode/mix/encode pipeline.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Internal channel count used across decode/mix/encode pipeline.
pub const MIX_CHANNELS: u16 = 2;

#[derive(Clone, Debug, PartialEq)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Empty buffer in the mix format.
    pub fn empty() -> Self {
        Self {
            sample_rate: MIX_SAMPLE_RATE,
            channels: MIX_CHANNELS,
            interleaved_f32: Vec::new(),
        }
    }

    /// Silent buffer of `secs` seconds.
    #[cfg(test)]
    pub(crate) fn silence(sample_rate: u32, channels: u16, secs: f64) -> Self {
        let frames = (secs * f64::from(sample_rate)).round().max(0.0) as usize;
        Self {
            sample_rate,
            channels,
            interleaved_f32: vec![0.0; frames * usize::from(channels)],
        }
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Exact duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Frame index nearest to `secs`, clamped to the buffer.
    pub fn frame_at(&self, secs: f64) -> usize {
        let f = (secs * f64::from(self.sample_rate)).round();
        if !f.is_finite() || f <= 0.0 {
            return 0;
        }
        (f as usize).min(self.frames())
    }

    /// Copy of the samples inside `span`.
    ///
    /// Boundaries are rounded to the nearest frame, so adjacent spans tile the buffer without
    /// gaps or overlap.
    pub fn slice(&self, span: TimeSpan) -> AudioPcm {
        let a = self.frame_at(span.start);
        let b = self.frame_at(span.end).max(a);
        let ch = usize::from(self.channels);
        AudioPcm {
            sample_rate: self.sample_rate,
            channels: self.channels,
            interleaved_f32: self.interleaved_f32[a * ch..b * ch].to_vec(),
        }
    }

    /// Append `other`, which must share rate and channel count.
    pub fn append(&mut self, other: &AudioPcm) -> RecapResult<()> {
        if other.sample_rate != self.sample_rate || other.channels != self.channels {
            return Err(RecapError::validation(format!(
                "cannot append {} Hz/{} ch audio to {} Hz/{} ch buffer",
                other.sample_rate, other.channels, self.sample_rate, self.channels
            )));
        }
        self.interleaved_f32.extend_from_slice(&other.interleaved_f32);
        Ok(())
    }

    /// Convert to `sample_rate`/`channels` with linear interpolation.
    ///
    /// Mono is duplicated to every output channel; multi-channel input keeps its first
    /// `channels` channels (stereo to mono averages L/R).
    pub fn converted(&self, sample_rate: u32, channels: u16) -> AudioPcm {
        if self.sample_rate == sample_rate && self.channels == channels {
            return self.clone();
        }
        let src_frames = self.frames();
        let src_ch = usize::from(self.channels);
        let dst_ch = usize::from(channels);
        if src_frames == 0 || self.sample_rate == 0 || dst_ch == 0 {
            return AudioPcm {
                sample_rate,
                channels,
                interleaved_f32: Vec::new(),
            };
        }

        let dst_frames = ((src_frames as u128 * u128::from(sample_rate)
            + u128::from(self.sample_rate) / 2)
            / u128::from(self.sample_rate)) as usize;
        let step = f64::from(self.sample_rate) / f64::from(sample_rate);
        let mut out = Vec::with_capacity(dst_frames * dst_ch);

        let sample = |frame: usize, ch: usize| -> f32 {
            let base = frame * src_ch;
            if src_ch == 1 {
                self.interleaved_f32[base]
            } else if dst_ch == 1 {
                let sum: f32 = self.interleaved_f32[base..base + src_ch].iter().sum();
                sum / src_ch as f32
            } else {
                self.interleaved_f32[base + ch.min(src_ch - 1)]
            }
        };

        for i in 0..dst_frames {
            let pos = i as f64 * step;
            let f0 = (pos.floor() as usize).min(src_frames - 1);
            let f1 = (f0 + 1).min(src_frames - 1);
            let frac = (pos - f0 as f64) as f32;
            for ch in 0..dst_ch {
                let v0 = sample(f0, ch);
                let v1 = sample(f1, ch);
                out.push(v0 + (v1 - v0) * frac);
            }
        }

        AudioPcm {
            sample_rate,
            channels,
            interleaved_f32: out,
        }
    }
}

/// Loads audio files as mix-format PCM.
///
/// The assembler depends on this seam so timelines can be planned against synthetic audio.
pub trait AudioSource {
    /// Decode `path` to [`MIX_SAMPLE_RATE`] stereo PCM.
    fn load(&self, path: &Path) -> RecapResult<AudioPcm>;
}

/// Default [`AudioSource`]: `hound` for WAV, the system `ffmpeg` for everything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegAudioSource;

impl AudioSource for FfmpegAudioSource {
    fn load(&self, path: &Path) -> RecapResult<AudioPcm> {
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if is_wav {
            return Ok(read_wav(path)?.converted(MIX_SAMPLE_RATE, MIX_CHANNELS));
        }
        decode_audio_f32_stereo(path, MIX_SAMPLE_RATE)
    }
}

/// Read a WAV file into interleaved `f32` at its native rate and channel count.
pub fn read_wav(path: &Path) -> RecapResult<AudioPcm> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| RecapError::media(format!("open wav '{}': {e}", path.display())))?;
    let spec = reader.spec();
    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect()
        }
    };
    let interleaved_f32 = samples
        .map_err(|e| RecapError::media(format!("decode wav '{}': {e}", path.display())))?;
    Ok(AudioPcm {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        interleaved_f32,
    })
}

/// Decode audio from media source to stereo interleaved `f32` PCM.
#[tracing::instrument]
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> RecapResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| RecapError::media(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(RecapError::media(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(RecapError::media(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let interleaved_f32 = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok(AudioPcm {
        sample_rate,
        channels: MIX_CHANNELS,
        interleaved_f32,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/media.rs"]
mod tests;
