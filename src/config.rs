use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{RecapError, RecapResult};
use crate::plan::segment::Mood;
use crate::render::layout::CompositorOpts;

/// Full pipeline configuration.
///
/// Every field has a default, so an empty JSON object (or no file at all) is a valid config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecapConfig {
    /// Output screen size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Working and output locations.
    pub paths: PathsConfig,
    /// Clip compositor parameters.
    pub compositor: CompositorOpts,
    /// Background music mixing.
    pub music: MusicConfig,
    /// Model ids and voice for the hosted providers.
    pub providers: ProviderConfig,
    /// Retry and throttle policy for speech synthesis.
    pub narration: NarrationConfig,
    /// PDF rasterization.
    pub raster: RasterConfig,
    /// Final MP4 encoding.
    pub encode: EncodeConfig,
}

/// Working and output locations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory receiving rasterized page images.
    pub images_dir: PathBuf,
    /// Directory receiving per-segment narration WAVs.
    pub audio_dir: PathBuf,
    /// Directory receiving the rendered MP4 and scratch audio.
    pub output_dir: PathBuf,
    /// Persisted project state for the assembly-only entry point.
    pub project_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("data/images"),
            audio_dir: PathBuf::from("data/audio"),
            output_dir: PathBuf::from("output"),
            project_path: PathBuf::from("config/recap_project.json"),
        }
    }
}

/// Background music mixing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    /// Mix music under the narration at all.
    pub enabled: bool,
    /// Directory holding `<mood>.mp3` / `<mood>.wav` tracks.
    pub dir: PathBuf,
    /// Linear gain applied to the music bed.
    pub gain: f32,
    /// Track used when the segment's own mood has no file.
    pub default_mood: Mood,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("assets/music"),
            gain: 0.2,
            default_mood: Mood::Neutral,
        }
    }
}

/// Model ids and voice for the hosted providers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the Gemini REST API.
    pub gemini_base_url: String,
    /// Model used to segment the chapter.
    pub vision_model: String,
    /// Model used for speech synthesis.
    pub tts_model: String,
    /// Prebuilt voice name.
    pub voice_name: String,
    /// Base URL of the Tavily search API.
    pub tavily_base_url: String,
    /// Look up web context for the chapter before planning.
    pub use_web_context: bool,
    /// HTTP timeout for a single provider request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            vision_model: "gemini-flash-latest".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Achird".to_string(),
            tavily_base_url: "https://api.tavily.com".to_string(),
            use_web_context: false,
            request_timeout_secs: 300,
        }
    }
}

/// Retry and throttle policy for speech synthesis.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Total attempts per segment (first try included).
    pub max_attempts: u32,
    /// Linear backoff step; the k-th retry waits `k * step`.
    pub backoff_step_secs: u64,
    /// Delay between consecutive segment syntheses.
    pub throttle_secs: u64,
}

impl NarrationConfig {
    /// Backoff step as a [`Duration`].
    pub fn backoff_step(&self) -> Duration {
        Duration::from_secs(self.backoff_step_secs)
    }

    /// Inter-segment throttle as a [`Duration`].
    pub fn throttle(&self) -> Duration {
        Duration::from_secs(self.throttle_secs)
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step_secs: 10,
            throttle_secs: 5,
        }
    }
}

/// PDF rasterization.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Render resolution in dots per inch.
    pub dpi: u32,
    /// Page image format: `jpeg` or `png`.
    pub format: String,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            format: "jpeg".to_string(),
        }
    }
}

/// Final MP4 encoding.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// ffmpeg video codec.
    pub video_codec: String,
    /// ffmpeg audio codec.
    pub audio_codec: String,
    /// x264 preset.
    pub preset: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "fast".to_string(),
        }
    }
}

impl RecapConfig {
    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> RecapResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| RecapError::serde(format!("config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges that would otherwise fail deep inside rendering.
    pub fn validate(&self) -> RecapResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(RecapError::validation("canvas width/height must be non-zero"));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            return Err(RecapError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        self.compositor.validate()?;
        if !(0.0..=1.0).contains(&self.music.gain) {
            return Err(RecapError::validation("music gain must be within [0, 1]"));
        }
        if self.narration.max_attempts == 0 {
            return Err(RecapError::validation("narration max_attempts must be >= 1"));
        }
        if self.raster.dpi == 0 {
            return Err(RecapError::validation("raster dpi must be non-zero"));
        }
        if !matches!(self.raster.format.as_str(), "jpeg" | "png") {
            return Err(RecapError::validation(format!(
                "unsupported raster format '{}'",
                self.raster.format
            )));
        }
        Ok(())
    }
}

/// API keys handed to provider clients at construction.
///
/// The library never reads the process environment; the binary fills this from flags or
/// environment variables at the edge.
#[derive(Clone, Default)]
pub struct ApiCredentials {
    /// Key for the Gemini planning and speech models.
    pub gemini_api_key: Option<String>,
    /// Key for the optional Tavily context search.
    pub tavily_api_key: Option<String>,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "***"))
            .field("tavily_api_key", &self.tavily_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
