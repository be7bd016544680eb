use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::foundation::error::{RecapError, RecapResult};
use crate::plan::batch::Batch;

/// Audio file extensions accepted by the assembly-only entry point.
pub const AUDIO_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Persisted analysis result, enough to re-run assembly without calling any provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Base name of the source PDF (no directory, no extension).
    pub pdf_name: String,
    /// Batches in playback order.
    pub batches: Vec<Batch>,
}

/// Outcome of matching an audio directory against a project's batches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioMatch {
    /// Batches that received an audio file.
    pub matched: usize,
    /// Batches dropped for lack of an audio file.
    pub missing: usize,
    /// Audio files left over after every batch was matched.
    pub unused: usize,
}

impl ProjectState {
    /// Write pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> RecapResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create project directory '{}'", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write project state '{}'", path.display()))?;
        info!(path = %path.display(), batches = self.batches.len(), "saved project state");
        Ok(())
    }

    /// Read a project file written by [`ProjectState::save`].
    pub fn load(path: &Path) -> RecapResult<Self> {
        if !path.exists() {
            return Err(RecapError::missing_input(path));
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read project state '{}'", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| RecapError::serde(format!("project '{}': {e}", path.display())))
    }

    /// Replace every batch's audio with the files of `dir`, matched by lexicographic file name.
    ///
    /// File `i` goes to batch `i`. Batches without a file are dropped.
    pub fn attach_audio_dir(&mut self, dir: &Path) -> RecapResult<AudioMatch> {
        if !dir.is_dir() {
            return Err(RecapError::missing_input(dir));
        }
        let files = list_audio_files(dir)?;
        if files.len() < self.batches.len() {
            warn!(
                found = files.len(),
                batches = self.batches.len(),
                "fewer audio files than batches"
            );
        }

        let total = self.batches.len();
        let mut files = files.into_iter();
        let mut kept = Vec::with_capacity(total);
        for mut batch in self.batches.drain(..) {
            match files.next() {
                Some(audio) => {
                    batch.audio_path = audio;
                    kept.push(batch);
                }
                None => {
                    let first = batch
                        .items
                        .first()
                        .map(|i| i.image_path.display().to_string())
                        .unwrap_or_default();
                    warn!(first_image = %first, "missing audio for batch");
                }
            }
        }
        let unused = files.count();
        let matched = kept.len();
        self.batches = kept;
        Ok(AudioMatch {
            matched,
            missing: total - matched,
            unused,
        })
    }
}

fn list_audio_files(dir: &Path) -> RecapResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("list audio dir '{}'", dir.display()))?
    {
        let path = entry.context("read audio dir entry")?.path();
        let is_audio = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| AUDIO_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(e)));
        if path.is_file() && is_audio {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Base name of a PDF path: file name without directory or extension.
pub fn pdf_base_name(pdf: &Path) -> String {
    pdf.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recap".to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/plan/project.rs"]
mod tests;
