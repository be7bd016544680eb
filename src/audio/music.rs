use std::path::PathBuf;

use crate::plan::segment::Mood;

/// Mood-keyed background music tracks stored as `<dir>/<mood>.{mp3,wav}`.
#[derive(Clone, Debug)]
pub struct MusicLibrary {
    dir: PathBuf,
    default_mood: Mood,
}

impl MusicLibrary {
    /// Library rooted at `dir`, falling back to `default_mood`'s track.
    pub fn new(dir: impl Into<PathBuf>, default_mood: Mood) -> Self {
        Self {
            dir: dir.into(),
            default_mood,
        }
    }

    /// Track for `mood`, else the default mood's track, else `None` (narration only).
    pub fn resolve(&self, mood: Mood) -> Option<PathBuf> {
        self.track_for(mood)
            .or_else(|| self.track_for(self.default_mood))
    }

    fn track_for(&self, mood: Mood) -> Option<PathBuf> {
        let stem = mood.file_stem();
        ["mp3", "wav"]
            .iter()
            .map(|ext| self.dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/music.rs"]
mod tests;
