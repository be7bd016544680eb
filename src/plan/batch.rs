use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::plan::segment::{Mood, Segment};

/// One page image inside a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Page image on disk.
    pub image_path: PathBuf,
    /// Script of the owning segment.
    #[serde(default)]
    pub script: String,
}

/// The unit of assembly: one narration track shared by an ordered run of page images.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Narration audio for the whole batch.
    pub audio_path: PathBuf,
    /// Page images in reading order.
    pub items: Vec<BatchItem>,
    /// Scene mood used for music selection.
    #[serde(default)]
    pub mood: Mood,
    /// Full segment script.
    #[serde(default)]
    pub segment_script: String,
}

impl Batch {
    /// Build the batch for `segment` given all rasterized pages of the document.
    ///
    /// Returns `None` when the segment's clamped page range selects no images.
    pub fn from_segment(segment: &Segment, pages: &[PathBuf], audio_path: &Path) -> Option<Self> {
        let span = segment.page_span(pages.len());
        if span.is_empty() {
            return None;
        }
        let items = pages[span]
            .iter()
            .map(|p| BatchItem {
                image_path: p.clone(),
                script: segment.script.clone(),
            })
            .collect();
        Some(Self {
            audio_path: audio_path.to_path_buf(),
            items,
            mood: segment.mood,
            segment_script: segment.script.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/batch.rs"]
mod tests;
