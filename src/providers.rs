//! Narrow interfaces to the external services the pipeline depends on.
//!
//! Each trait is the whole contract the orchestrator relies on; the concrete clients live in
//! the submodules and tests substitute in-memory fakes.

use std::path::{Path, PathBuf};

use crate::audio::wav::{needs_wav_container, parse_audio_mime_type, wrap_pcm_in_wav};
use crate::foundation::error::RecapResult;
use crate::plan::segment::Segment;

/// Gemini planning and speech client.
pub mod gemini;
/// `pdftoppm` page rasterizer.
pub mod pdftoppm;
/// Tavily context search.
pub mod tavily;

/// Splits a chapter PDF into narrated beats.
pub trait SegmentPlanner {
    /// Plan the chapter. `context` is optional background text (may be empty).
    fn plan(&self, pdf: &Path, context: &str) -> RecapResult<Vec<Segment>>;
}

/// Turns a script into speech.
pub trait NarrationSynthesizer {
    /// Synthesize `script` read in the manner described by `style`.
    fn synthesize(&self, script: &str, style: &str) -> RecapResult<AudioBuffer>;
}

/// Looks up background knowledge for a chapter.
pub trait ContextSearch {
    /// Return context text for `query`; empty when nothing useful was found.
    fn search(&self, query: &str) -> String;
}

/// Renders every page of a PDF to an image file.
pub trait PageRasterizer {
    /// Rasterize `pdf` into `out_dir`, returning page images in page order.
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> RecapResult<Vec<PathBuf>>;
}

/// Context search that always returns nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoContext;

impl ContextSearch for NoContext {
    fn search(&self, _query: &str) -> String {
        String::new()
    }
}

/// Encoded or raw audio returned by a synthesizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioBuffer {
    /// Audio payload bytes.
    pub data: Vec<u8>,
    /// Provider MIME type, e.g. `audio/L16;codec=pcm;rate=24000` or `audio/wav`.
    pub mime_type: String,
}

impl AudioBuffer {
    /// Bytes ready to be written to `out_path`, wrapped in a WAV header when required.
    pub fn into_file_bytes(self, out_path: &Path) -> RecapResult<Vec<u8>> {
        if needs_wav_container(&self.mime_type, out_path) {
            let fmt = parse_audio_mime_type(&self.mime_type);
            return wrap_pcm_in_wav(&self.data, fmt);
        }
        Ok(self.data)
    }
}
