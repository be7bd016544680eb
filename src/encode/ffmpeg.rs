use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{debug, info, warn};

use crate::config::EncodeConfig;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{RecapError, RecapResult};
use crate::render::backend::FrameRGBA;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 path.
    pub out_path: PathBuf,
    /// Overwrite an existing file.
    pub overwrite: bool,
    /// Video codec, `libx264` by default.
    pub video_codec: String,
    /// Audio codec, `aac` by default.
    pub audio_codec: String,
    /// Encoder preset.
    pub preset: String,
}

impl FfmpegSinkOpts {
    /// Options writing `out_path` with the codecs and preset of `encode`.
    pub fn new(out_path: impl Into<PathBuf>, encode: &EncodeConfig) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            video_codec: encode.video_codec.clone(),
            audio_codec: encode.audio_codec.clone(),
            preset: encode.preset.clone(),
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// Frames are opaque, so no alpha flattening happens before the write.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    frames_written: u64,
}

impl FfmpegSink {
    /// Create a sink; `ffmpeg` is spawned in `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
            frames_written: 0,
        }
    }
}

/// Arguments between the overwrite flag and the output path.
pub(crate) fn encode_args(opts: &FfmpegSinkOpts, cfg: &SinkConfig) -> RecapResult<Vec<String>> {
    let mut args: Vec<String> = ["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba", "-s"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(format!("{}x{}", cfg.width, cfg.height));
    // Rational rate before `-i` sets the rawvideo input clock.
    args.push("-r".to_string());
    args.push(format!("{}/{}", cfg.fps.num, cfg.fps.den));
    args.extend(["-i".to_string(), "pipe:0".to_string()]);

    let video = [
        "-c:v".to_string(),
        opts.video_codec.clone(),
        "-preset".to_string(),
        opts.preset.clone(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ];

    if let Some(audio) = cfg.audio.as_ref() {
        if audio.sample_rate == 0 {
            return Err(RecapError::validation(
                "audio sample_rate must be non-zero when audio is enabled",
            ));
        }
        if audio.channels == 0 {
            return Err(RecapError::validation(
                "audio channels must be non-zero when audio is enabled",
            ));
        }
        args.extend([
            "-f".to_string(),
            "f32le".to_string(),
            "-ar".to_string(),
            audio.sample_rate.to_string(),
            "-ac".to_string(),
            audio.channels.to_string(),
            "-i".to_string(),
            audio.path.to_string_lossy().into_owned(),
        ]);
        args.extend(video);
        args.extend([
            "-c:a".to_string(),
            opts.audio_codec.clone(),
            "-shortest".to_string(),
        ]);
    } else {
        args.push("-an".to_string());
        args.extend(video);
    }
    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    Ok(args)
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> RecapResult<()> {
        Fps::new(cfg.fps.num, cfg.fps.den)?;
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RecapError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(RecapError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        let args = encode_args(&self.opts, &cfg)?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(RecapError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(RecapError::media(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .arg(if self.opts.overwrite { "-y" } else { "-n" })
            .args(&args)
            .arg(&self.opts.out_path);
        debug!(?args, "spawning ffmpeg");

        let mut child = cmd.spawn().map_err(|e| {
            RecapError::media(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RecapError::media("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RecapError::media("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames_written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RecapResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| RecapError::media("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(RecapError::validation(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(RecapError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        let canvas = Canvas {
            width: cfg.width,
            height: cfg.height,
        };
        if frame.data.len() != canvas.rgba_len() {
            return Err(RecapError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        self.last_idx = Some(idx);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RecapError::media("ffmpeg sink is already finalized"));
        };
        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            RecapError::media(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn end(&mut self) -> RecapResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| RecapError::media("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| RecapError::media(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RecapError::media("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| RecapError::media(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(RecapError::media(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }

        info!(
            path = %self.opts.out_path.display(),
            frames = self.frames_written,
            "video encoded"
        );
        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        self.cfg = None;
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(e) = child.kill() {
            debug!(error = %e, "ffmpeg already exited");
        }
        if let Err(e) = child.wait() {
            warn!(error = %e, "failed to reap ffmpeg");
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        if self.opts.out_path.exists()
            && let Err(e) = std::fs::remove_file(&self.opts.out_path)
        {
            warn!(
                path = %self.opts.out_path.display(),
                error = %e,
                "could not remove partial output"
            );
        }
        warn!(
            path = %self.opts.out_path.display(),
            frames = self.frames_written,
            "encoding aborted"
        );
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Dropped between `begin` and `end`: discard the partial output.
        if self.child.is_some() {
            self.abort();
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> RecapResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
