//! Sequence assembly: batches to a timeline of clips, then frames and audio to a sink.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::audio::media::{AudioPcm, AudioSource, MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::audio::mix::{mix_music_under, split_equal, write_f32le_file};
use crate::audio::music::MusicLibrary;
use crate::config::{EncodeConfig, RecapConfig};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, TimeSpan};
use crate::foundation::error::{RecapError, RecapResult};
use crate::plan::batch::Batch;
use crate::render::backend::FrameRGBA;
use crate::render::compositor::{ClipCompositor, PreparedClip};

const RENDER_CHUNK_FRAMES: u64 = 48;

/// One page image on the output timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineClip {
    /// Page image to composite.
    pub image_path: PathBuf,
    /// Index of the source batch.
    pub batch_index: usize,
    /// Start on the output timeline, in seconds.
    pub start_secs: f64,
    /// Clip length, equal to its audio slice.
    pub duration_secs: f64,
    /// Slice of the batch's mixed track assigned to this clip.
    pub audio_span: TimeSpan,
}

impl TimelineClip {
    /// End on the output timeline, in seconds.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Ordered clips plus the concatenated soundtrack of the kept audio slices.
#[derive(Clone, Debug)]
pub struct Timeline {
    /// Clips in playback order.
    pub clips: Vec<TimelineClip>,
    /// Mix-format soundtrack.
    pub audio: AudioPcm,
    /// Batches dropped entirely (missing audio or no items).
    pub skipped_batches: usize,
    /// Items dropped for a missing image.
    pub skipped_items: usize,
}

impl Timeline {
    /// Total length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.clips.last().map(TimelineClip::end_secs).unwrap_or(0.0)
    }

    /// `true` when no clip survived the skip rules.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Counters reported after a render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Clips that received at least one frame.
    pub clips_rendered: usize,
    /// Frames pushed to the sink.
    pub frames: u64,
}

/// Result of a full assembly to disk.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembleReport {
    /// Rendered MP4.
    pub output_path: PathBuf,
    /// Clip count.
    pub clips: usize,
    /// Video length in seconds.
    pub duration_secs: f64,
    /// Frame counters.
    pub stats: RenderStats,
}

/// `<output_dir>/<pdf_name>_recap.mp4`.
pub fn recap_output_path(output_dir: &Path, pdf_name: &str) -> PathBuf {
    output_dir.join(format!("{pdf_name}_recap.mp4"))
}

/// Turns batches into a rendered recap.
pub struct Assembler<'a> {
    fps: Fps,
    compositor: ClipCompositor,
    music: Option<MusicLibrary>,
    music_gain: f32,
    encode: EncodeConfig,
    audio: &'a dyn AudioSource,
    parallel: bool,
}

impl<'a> Assembler<'a> {
    /// Build an assembler from config, decoding audio through `audio`.
    pub fn new(cfg: &RecapConfig, audio: &'a dyn AudioSource) -> RecapResult<Self> {
        cfg.validate()?;
        let music = cfg
            .music
            .enabled
            .then(|| MusicLibrary::new(&cfg.music.dir, cfg.music.default_mood));
        Ok(Self {
            fps: cfg.fps,
            compositor: ClipCompositor::new(cfg.canvas, cfg.compositor.clone())?,
            music,
            music_gain: cfg.music.gain,
            encode: cfg.encode.clone(),
            audio,
            parallel: true,
        })
    }

    /// Render frames on the calling thread only.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.compositor.canvas()
    }

    /// Apply the skip rules, mix music, and split each batch's track equally over its items.
    ///
    /// A missing image drops only its own clip and audio slice; the other slices keep their
    /// positions within the batch track.
    #[tracing::instrument(skip_all, fields(batches = batches.len()))]
    pub fn plan(&self, batches: &[Batch]) -> RecapResult<Timeline> {
        let mut timeline = Timeline {
            clips: Vec::new(),
            audio: AudioPcm::empty(),
            skipped_batches: 0,
            skipped_items: 0,
        };
        let mut cursor = 0.0;

        for (batch_index, batch) in batches.iter().enumerate() {
            if !batch.audio_path.exists() {
                warn!(audio = %batch.audio_path.display(), "skipping batch, missing audio");
                timeline.skipped_batches += 1;
                continue;
            }
            if batch.items.is_empty() {
                warn!(batch = batch_index, "skipping batch without images");
                timeline.skipped_batches += 1;
                continue;
            }

            let track = self.batch_track(batch)?;
            let spans = split_equal(track.duration_secs(), batch.items.len())?;
            for (item, span) in batch.items.iter().zip(spans) {
                if !item.image_path.exists() {
                    warn!(image = %item.image_path.display(), "skipping item, missing image");
                    timeline.skipped_items += 1;
                    continue;
                }
                timeline.audio.append(&track.slice(span))?;
                timeline.clips.push(TimelineClip {
                    image_path: item.image_path.clone(),
                    batch_index,
                    start_secs: cursor,
                    duration_secs: span.duration(),
                    audio_span: span,
                });
                cursor += span.duration();
            }
        }

        info!(
            clips = timeline.clips.len(),
            duration_secs = timeline.duration_secs(),
            skipped_batches = timeline.skipped_batches,
            skipped_items = timeline.skipped_items,
            "timeline planned"
        );
        Ok(timeline)
    }

    fn batch_track(&self, batch: &Batch) -> RecapResult<AudioPcm> {
        let narration = self
            .audio
            .load(&batch.audio_path)?
            .converted(MIX_SAMPLE_RATE, MIX_CHANNELS);
        let Some(track) = self.music.as_ref().and_then(|m| m.resolve(batch.mood)) else {
            return Ok(narration);
        };
        match self.audio.load(&track) {
            Ok(music) => {
                let music = music.converted(MIX_SAMPLE_RATE, MIX_CHANNELS);
                mix_music_under(&narration, &music, self.music_gain)
            }
            Err(e) => {
                warn!(track = %track.display(), error = %e, "music unreadable, narration only");
                Ok(narration)
            }
        }
    }

    /// Push every frame of `timeline` to `sink` on a global `fps` clock.
    ///
    /// Frame `k` shows the clip whose span contains `k / fps`, at local time
    /// `k / fps - clip.start_secs`.
    #[tracing::instrument(skip_all, fields(clips = timeline.clips.len()))]
    pub fn render(
        &self,
        timeline: &Timeline,
        sink: &mut dyn FrameSink,
        audio: Option<AudioInputConfig>,
    ) -> RecapResult<RenderStats> {
        if timeline.is_empty() {
            return Err(RecapError::EmptyTimeline);
        }
        let canvas = self.canvas();
        sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.fps,
            audio,
        })?;

        let finished = self
            .push_clips(timeline, sink)
            .and_then(|stats| sink.end().map(|()| stats));
        if let Err(e) = &finished {
            warn!(error = %e, "render failed, aborting sink");
            sink.abort();
        }
        finished
    }

    fn push_clips(
        &self,
        timeline: &Timeline,
        sink: &mut dyn FrameSink,
    ) -> RecapResult<RenderStats> {
        let total_frames = self.fps.secs_to_frames_ceil(timeline.duration_secs());
        let last = timeline.clips.len() - 1;
        let mut stats = RenderStats::default();
        for (i, clip) in timeline.clips.iter().enumerate() {
            let first = self.fps.secs_to_frames_ceil(clip.start_secs);
            let end = if i == last {
                total_frames
            } else {
                self.fps.secs_to_frames_ceil(clip.end_secs())
            };
            if first >= end {
                continue;
            }

            let prepared = self.compositor.prepare_path(&clip.image_path)?;
            let mut chunk_start = first;
            while chunk_start < end {
                let chunk_end = (chunk_start + RENDER_CHUNK_FRAMES).min(end);
                for (k, frame) in self.render_chunk(&prepared, clip, chunk_start, chunk_end)? {
                    sink.push_frame(FrameIndex(k), &frame)?;
                    stats.frames += 1;
                }
                chunk_start = chunk_end;
            }
            stats.clips_rendered += 1;
        }
        Ok(stats)
    }

    fn render_chunk(
        &self,
        prepared: &PreparedClip,
        clip: &TimelineClip,
        start: u64,
        end: u64,
    ) -> RecapResult<Vec<(u64, FrameRGBA)>> {
        let fps = self.fps;
        let render_one = |k: u64| -> RecapResult<(u64, FrameRGBA)> {
            let t = fps.frame_time_secs(FrameIndex(k)) - clip.start_secs;
            let frame = prepared.render_frame(t.max(0.0), clip.duration_secs)?;
            Ok((k, frame))
        };
        if self.parallel {
            (start..end).into_par_iter().map(render_one).collect()
        } else {
            (start..end).map(render_one).collect()
        }
    }

    /// Plan, render, and encode `batches` to `out_path`.
    ///
    /// The soundtrack is staged as raw `f32le` next to the output and removed afterwards.
    /// Nothing is left at `out_path` when the timeline is empty or any step fails.
    pub fn assemble(&self, batches: &[Batch], out_path: &Path) -> RecapResult<AssembleReport> {
        let timeline = self.plan(batches)?;
        if timeline.is_empty() {
            return Err(RecapError::EmptyTimeline);
        }
        info!(clips = timeline.clips.len(), "finalizing video assembly");

        let audio_path = out_path.with_extension("f32le");
        let _staged = TempFileGuard(Some(audio_path.clone()));
        let mut output = TempFileGuard(Some(out_path.to_path_buf()));
        write_f32le_file(&timeline.audio.interleaved_f32, &audio_path)?;
        let audio = AudioInputConfig {
            path: audio_path,
            sample_rate: timeline.audio.sample_rate,
            channels: timeline.audio.channels,
        };

        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(out_path, &self.encode));
        let stats = self.render(&timeline, &mut sink, Some(audio))?;
        output.keep();

        info!(path = %out_path.display(), "video saved");
        Ok(AssembleReport {
            output_path: out_path.to_path_buf(),
            clips: timeline.clips.len(),
            duration_secs: timeline.duration_secs(),
            stats,
        })
    }
}

/// Removes its file on drop unless [`TempFileGuard::keep`] was called.
struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn keep(&mut self) {
        self.0 = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take()
            && path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            warn!(path = %path.display(), error = %e, "could not remove file");
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/assemble.rs"]
mod tests;
