use std::ops::Range;

use serde::{Deserialize, Deserializer, Serialize};

/// Scene mood, used to pick the background music bed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Mood {
    /// Fights, chases.
    Action,
    /// Tension, reveals.
    Suspense,
    /// Loss, grief.
    Sad,
    /// Light-hearted scenes.
    Happy,
    /// Anything else.
    #[default]
    Neutral,
}

impl Mood {
    /// All moods in declaration order.
    pub const ALL: [Mood; 5] = [
        Mood::Action,
        Mood::Suspense,
        Mood::Sad,
        Mood::Happy,
        Mood::Neutral,
    ];

    /// Parse a planner label. Matching is case-insensitive; unknown labels become `Neutral`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }

    /// Canonical label as written by the planner.
    pub fn label(self) -> &'static str {
        match self {
            Mood::Action => "Action",
            Mood::Suspense => "Suspense",
            Mood::Sad => "Sad",
            Mood::Happy => "Happy",
            Mood::Neutral => "Neutral",
        }
    }

    /// Lowercase file stem of the matching music track.
    pub fn file_stem(self) -> String {
        self.label().to_ascii_lowercase()
    }
}

impl<'de> Deserialize<'de> for Mood {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.map(|l| Mood::from_label(&l)).unwrap_or_default())
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One narrative beat returned by the segment planner.
///
/// Page numbers are 1-based and inclusive, exactly as the planner writes them. They are not
/// trusted: use [`Segment::page_span`] before indexing page images.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First page of the beat (1-based).
    #[serde(default = "first_page")]
    pub start_page: i64,
    /// Last page of the beat (1-based, inclusive).
    #[serde(default = "first_page")]
    pub end_page: i64,
    /// Narration script (Arabic).
    #[serde(default)]
    pub script: String,
    /// Scene mood.
    #[serde(default)]
    pub mood: Mood,
    /// Voice-acting instructions (English).
    #[serde(default)]
    pub style_instructions: String,
}

fn first_page() -> i64 {
    1
}

impl Segment {
    /// Clamp the page range into 0-based image indices for a document of `page_count` pages.
    ///
    /// Returns an empty range when nothing of the segment lies inside the document.
    pub fn page_span(&self, page_count: usize) -> Range<usize> {
        let start = self.start_page.saturating_sub(1).max(0);
        let end = self
            .end_page
            .min(i64::try_from(page_count).unwrap_or(i64::MAX))
            .max(0);
        let start = usize::try_from(start).unwrap_or(usize::MAX).min(page_count);
        let end = usize::try_from(end).unwrap_or(0);
        if start >= end {
            return start..start;
        }
        start..end
    }
}

/// Parse a planner response body into segments.
///
/// Models sometimes wrap JSON in Markdown fences even when asked not to; those are stripped.
pub fn parse_segments(text: &str) -> crate::RecapResult<Vec<Segment>> {
    let json = strip_code_fence(text);
    serde_json::from_str(json)
        .map_err(|e| crate::RecapError::provider(format!("planner returned invalid JSON: {e}")))
}

pub(crate) fn strip_code_fence(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
#[path = "../../tests/unit/plan/segment.rs"]
mod tests;
