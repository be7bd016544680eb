/// PCM buffers and decoding.
pub mod media;
/// Music bed mixing and equal splits.
pub mod mix;
/// Mood-keyed music tracks.
pub mod music;
/// WAV framing for raw provider PCM.
pub mod wav;
