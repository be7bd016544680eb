use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use super::*;
use crate::encode::sink::InMemorySink;
use crate::plan::batch::BatchItem;
use crate::plan::segment::Mood;

/// Returns a constant-valued mix-format buffer of a fixed length per path.
#[derive(Default)]
struct FakeAudio {
    tracks: HashMap<PathBuf, (f64, f32)>,
}

impl FakeAudio {
    fn with(mut self, path: &Path, secs: f64, level: f32) -> Self {
        self.tracks.insert(path.to_path_buf(), (secs, level));
        self
    }
}

impl AudioSource for FakeAudio {
    fn load(&self, path: &Path) -> RecapResult<AudioPcm> {
        let (secs, level) = self
            .tracks
            .get(path)
            .copied()
            .ok_or_else(|| RecapError::media(format!("unknown track {}", path.display())))?;
        let mut pcm = AudioPcm::silence(MIX_SAMPLE_RATE, MIX_CHANNELS, secs);
        pcm.interleaved_f32.iter_mut().for_each(|s| *s = level);
        Ok(pcm)
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "manga_recap_assemble_{name}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn page(dir: &Path, n: usize) -> PathBuf {
    let path = dir.join(format!("ch_page_{n:03}.png"));
    RgbaImage::from_pixel(8, 12, Rgba([200, 180, 160, 255]))
        .save(&path)
        .unwrap();
    path
}

fn touch(path: &Path) -> PathBuf {
    std::fs::write(path, b"").unwrap();
    path.to_path_buf()
}

fn batch(audio: &Path, images: &[PathBuf], mood: Mood) -> Batch {
    Batch {
        audio_path: audio.to_path_buf(),
        items: images
            .iter()
            .map(|p| BatchItem {
                image_path: p.clone(),
                script: "s".to_string(),
            })
            .collect(),
        mood,
        segment_script: "s".to_string(),
    }
}

fn small_config(music_dir: &Path) -> RecapConfig {
    let mut cfg = RecapConfig::default();
    cfg.canvas = Canvas {
        width: 64,
        height: 36,
    };
    cfg.music.dir = music_dir.to_path_buf();
    cfg
}

#[test]
fn missing_image_drops_one_slice_of_the_batch() {
    let dir = temp_dir("missing_image");
    let audio = touch(&dir.join("segment_001.wav"));
    let pages: Vec<_> = (1..=3).map(|n| page(&dir, n)).collect();
    std::fs::remove_file(&pages[1]).unwrap();

    let source = FakeAudio::default().with(&audio, 3.0, 0.0);
    let cfg = small_config(&dir.join("no_music"));
    let asm = Assembler::new(&cfg, &source).unwrap();
    let timeline = asm.plan(&[batch(&audio, &pages, Mood::Action)]).unwrap();

    assert_eq!(timeline.clips.len(), 2);
    assert_eq!(timeline.skipped_items, 1);
    assert!((timeline.duration_secs() - 2.0).abs() < 1e-9);
    assert_eq!(timeline.audio.frames(), 2 * MIX_SAMPLE_RATE as usize);
    // The surviving third page keeps its own slice of the batch track.
    assert_eq!(timeline.clips[1].image_path, pages[2]);
    assert!((timeline.clips[1].audio_span.start - 2.0).abs() < 1e-9);
    assert!((timeline.clips[1].start_secs - 1.0).abs() < 1e-9);
}

#[test]
fn batch_without_audio_is_skipped_whole() {
    let dir = temp_dir("missing_audio");
    let audio = touch(&dir.join("segment_002.wav"));
    let pages: Vec<_> = (1..=2).map(|n| page(&dir, n)).collect();

    let source = FakeAudio::default().with(&audio, 4.0, 0.0);
    let cfg = small_config(&dir.join("no_music"));
    let asm = Assembler::new(&cfg, &source).unwrap();
    let batches = [
        batch(&dir.join("segment_001.wav"), &pages[..1], Mood::Sad),
        batch(&audio, &pages, Mood::Sad),
    ];
    let timeline = asm.plan(&batches).unwrap();

    assert_eq!(timeline.skipped_batches, 1);
    assert_eq!(timeline.clips.len(), 2);
    assert!(timeline.clips.iter().all(|c| c.batch_index == 1));
    assert!((timeline.clips[0].duration_secs - 2.0).abs() < 1e-9);
}

#[test]
fn ten_page_segment_gives_each_page_a_tenth() {
    let dir = temp_dir("ten_pages");
    let audio = touch(&dir.join("segment_001.wav"));
    let pages: Vec<_> = (1..=10).map(|n| page(&dir, n)).collect();

    let source = FakeAudio::default().with(&audio, 5.0, 0.0);
    let cfg = small_config(&dir.join("no_music"));
    let asm = Assembler::new(&cfg, &source).unwrap();
    let timeline = asm.plan(&[batch(&audio, &pages, Mood::Neutral)]).unwrap();

    assert_eq!(timeline.clips.len(), 10);
    let total: f64 = timeline.clips.iter().map(|c| c.duration_secs).sum();
    assert!((total - 5.0).abs() < 1e-9);
    assert!(
        timeline
            .clips
            .iter()
            .all(|c| (c.duration_secs - 0.5).abs() < 1e-9)
    );
}

#[test]
fn mood_music_is_mixed_under_narration() {
    let dir = temp_dir("music");
    let music_dir = dir.join("music");
    std::fs::create_dir_all(&music_dir).unwrap();
    let track = touch(&music_dir.join("action.mp3"));
    let audio = touch(&dir.join("segment_001.wav"));
    let pages = vec![page(&dir, 1)];

    let source = FakeAudio::default()
        .with(&audio, 1.0, 0.0)
        .with(&track, 0.25, 0.5);
    let cfg = small_config(&music_dir);
    let asm = Assembler::new(&cfg, &source).unwrap();
    let timeline = asm.plan(&[batch(&audio, &pages, Mood::Action)]).unwrap();

    assert_eq!(timeline.audio.frames(), MIX_SAMPLE_RATE as usize);
    assert!(
        timeline
            .audio
            .interleaved_f32
            .iter()
            .all(|s| (s - 0.1).abs() < 1e-6)
    );
}

#[test]
fn render_pushes_contiguous_frames_on_a_global_clock() {
    let dir = temp_dir("render");
    let audio = touch(&dir.join("segment_001.wav"));
    let pages: Vec<_> = (1..=2).map(|n| page(&dir, n)).collect();

    let source = FakeAudio::default().with(&audio, 1.0, 0.0);
    let cfg = small_config(&dir.join("no_music"));
    let asm = Assembler::new(&cfg, &source).unwrap();
    let timeline = asm.plan(&[batch(&audio, &pages, Mood::Happy)]).unwrap();

    let mut sink = InMemorySink::new();
    let stats = asm.render(&timeline, &mut sink, None).unwrap();

    assert_eq!(stats.frames, 24);
    assert_eq!(stats.clips_rendered, 2);
    assert!(sink.is_ended());
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..24).collect::<Vec<_>>());
    // Each clip opens on black because of its own fade-in.
    for k in [0usize, 12] {
        let frame = &sink.frames()[k].1;
        assert!(frame.data.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }
    assert_ne!(sink.frames()[11].1.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn undecodable_page_aborts_the_sink() {
    let dir = temp_dir("corrupt_page");
    let audio = touch(&dir.join("segment_001.wav"));
    let good = page(&dir, 1);
    let corrupt = dir.join("ch_page_002.png");
    std::fs::write(&corrupt, b"not a png").unwrap();

    let source = FakeAudio::default().with(&audio, 1.0, 0.0);
    let cfg = small_config(&dir.join("no_music"));
    let asm = Assembler::new(&cfg, &source).unwrap();
    let timeline = asm
        .plan(&[batch(&audio, &[good, corrupt], Mood::Sad)])
        .unwrap();
    assert_eq!(timeline.clips.len(), 2);

    let mut sink = InMemorySink::new();
    let err = asm.render(&timeline, &mut sink, None).unwrap_err();
    assert!(matches!(err, RecapError::Media(_)));
    assert!(sink.is_aborted());
    assert!(!sink.is_ended());
    assert_eq!(sink.frames().len(), 12);
}

#[test]
fn successful_render_ends_without_abort() {
    let dir = temp_dir("clean_end");
    let audio = touch(&dir.join("segment_001.wav"));
    let pages = vec![page(&dir, 1)];

    let source = FakeAudio::default().with(&audio, 0.5, 0.0);
    let cfg = small_config(&dir.join("no_music"));
    let asm = Assembler::new(&cfg, &source).unwrap();
    let timeline = asm.plan(&[batch(&audio, &pages, Mood::Sad)]).unwrap();

    let mut sink = InMemorySink::new();
    asm.render(&timeline, &mut sink, None).unwrap();
    assert!(sink.is_ended());
    assert!(!sink.is_aborted());
}

#[test]
fn temp_file_guard_removes_unless_kept() {
    let dir = temp_dir("guard");
    let dropped = touch(&dir.join("a.f32le"));
    let kept = touch(&dir.join("b.mp4"));

    drop(TempFileGuard(Some(dropped.clone())));
    let mut guard = TempFileGuard(Some(kept.clone()));
    guard.keep();
    drop(guard);

    assert!(!dropped.exists());
    assert!(kept.exists());
}

#[test]
fn parallel_and_sequential_renders_match() {
    let dir = temp_dir("parity");
    let audio = touch(&dir.join("segment_001.wav"));
    let pages = vec![page(&dir, 1)];

    let source = FakeAudio::default().with(&audio, 2.5, 0.0);
    let cfg = small_config(&dir.join("no_music"));
    let batches = [batch(&audio, &pages, Mood::Suspense)];

    let par = Assembler::new(&cfg, &source).unwrap();
    let seq = Assembler::new(&cfg, &source).unwrap().sequential();
    let timeline = par.plan(&batches).unwrap();

    let mut a = InMemorySink::new();
    let mut b = InMemorySink::new();
    par.render(&timeline, &mut a, None).unwrap();
    seq.render(&timeline, &mut b, None).unwrap();
    assert_eq!(a.frames().len(), 60);
    assert_eq!(a.frames(), b.frames());
}

#[test]
fn empty_timeline_renders_nothing() {
    let dir = temp_dir("empty");
    let source = FakeAudio::default();
    let cfg = small_config(&dir.join("no_music"));
    let asm = Assembler::new(&cfg, &source).unwrap();
    let batches = [batch(&dir.join("absent.wav"), &[dir.join("p.png")], Mood::Neutral)];

    let out = recap_output_path(&dir.join("output"), "ch1");
    let err = asm.assemble(&batches, &out).unwrap_err();
    assert!(matches!(err, RecapError::EmptyTimeline));
    assert!(!out.exists());
    assert!(!out.with_extension("f32le").exists());

    let mut sink = InMemorySink::new();
    let timeline = asm.plan(&[]).unwrap();
    assert!(matches!(
        asm.render(&timeline, &mut sink, None),
        Err(RecapError::EmptyTimeline)
    ));
    assert!(sink.config().is_none());
}

#[test]
fn output_name_follows_pdf() {
    assert_eq!(
        recap_output_path(Path::new("output"), "one_piece_1100"),
        PathBuf::from("output/one_piece_1100_recap.mp4")
    );
}
