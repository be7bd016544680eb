//! manga-recap turns a manga chapter PDF into a narrated recap video.
//!
//! The pipeline:
//!
//! - Rasterize the PDF into page images ([`PageRasterizer`])
//! - Ask a vision model to split the chapter into narrated beats ([`SegmentPlanner`])
//! - Synthesize one narration track per beat ([`NarrationSynthesizer`], [`Narrator`])
//! - Composite every page into a moving clip timed to an equal slice of its beat's audio
//!   ([`ClipCompositor`], [`Assembler`]) and encode the result with `ffmpeg` ([`FfmpegSink`])
//!
//! Provider access sits behind narrow traits so everything past the network can run against
//! fakes. API keys are passed in explicitly through [`ApiCredentials`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Sequence assembly: batches to timeline to frames.
pub mod assemble;
/// Narration decoding, music mixing, and WAV framing.
pub mod audio;
/// Configuration file and credentials.
pub mod config;
/// Frame sinks.
pub mod encode;
/// Retry and throttling around speech synthesis.
pub mod narration;
/// End-to-end orchestration.
pub mod pipeline;
/// Segments, batches, and persisted project state.
pub mod plan;
/// External capability interfaces and their hosted implementations.
pub mod providers;
/// Clip layout and compositing.
pub mod render;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Size, TimeSpan, Vec2};
pub use crate::foundation::error::{RecapError, RecapResult};

pub use crate::assemble::{
    AssembleReport, Assembler, RenderStats, Timeline, TimelineClip, recap_output_path,
};
pub use crate::audio::media::{AudioPcm, AudioSource, FfmpegAudioSource};
pub use crate::audio::music::MusicLibrary;
pub use crate::config::{ApiCredentials, RecapConfig};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::narration::{
    FixedDelay, Narrator, RateLimiter, RetryPolicy, Sleeper, ThreadSleeper, Unthrottled,
};
pub use crate::pipeline::{
    AnalysisReport, ProjectAssembler, Providers, RecapPipeline, RecapReport,
};
pub use crate::plan::batch::{Batch, BatchItem};
pub use crate::plan::project::{AudioMatch, ProjectState};
pub use crate::plan::segment::{Mood, Segment};
pub use crate::providers::gemini::GeminiClient;
pub use crate::providers::pdftoppm::{PdftoppmRasterizer, is_pdftoppm_on_path};
pub use crate::providers::tavily::TavilyClient;
pub use crate::providers::{
    AudioBuffer, ContextSearch, NarrationSynthesizer, NoContext, PageRasterizer, SegmentPlanner,
};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::compositor::{ClipCompositor, PreparedClip};
pub use crate::render::layout::{ClipLayout, CompositorOpts};
