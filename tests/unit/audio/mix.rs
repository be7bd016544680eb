use super::*;

fn pcm(rate: u32, channels: u16, samples: Vec<f32>) -> AudioPcm {
    AudioPcm {
        sample_rate: rate,
        channels,
        interleaved_f32: samples,
    }
}

#[test]
fn music_is_looped_to_narration_length_and_scaled() {
    let narration = pcm(4, 2, vec![0.0; 10]);
    let music = pcm(4, 2, vec![1.0, -1.0, 0.5, -0.5]);
    let out = mix_music_under(&narration, &music, 0.2).unwrap();
    assert_eq!(out.interleaved_f32.len(), 10);
    let expect = [0.2, -0.2, 0.1, -0.1, 0.2, -0.2, 0.1, -0.1, 0.2, -0.2];
    for (got, want) in out.interleaved_f32.iter().zip(expect) {
        assert!((got - want).abs() < 1e-6);
    }
}

#[test]
fn long_music_is_truncated_and_sum_clamped() {
    let narration = pcm(4, 1, vec![0.95, -0.95]);
    let music = pcm(4, 1, vec![1.0, -1.0, 1.0, 1.0, 1.0]);
    let out = mix_music_under(&narration, &music, 0.2).unwrap();
    assert_eq!(out.interleaved_f32, vec![1.0, -1.0]);
}

#[test]
fn empty_music_leaves_narration_untouched() {
    let narration = pcm(4, 1, vec![0.3, 0.4]);
    let out = mix_music_under(&narration, &pcm(4, 1, Vec::new()), 0.2).unwrap();
    assert_eq!(out, narration);
}

#[test]
fn mismatched_formats_are_rejected() {
    let narration = pcm(48_000, 2, vec![0.0; 4]);
    let music = pcm(44_100, 2, vec![0.0; 4]);
    assert!(mix_music_under(&narration, &music, 0.2).is_err());
}

#[test]
fn equal_split_sums_to_total_exactly() {
    let total = 7.3;
    let spans = split_equal(total, 3).unwrap();
    assert_eq!(spans.len(), 3);
    assert_eq!(spans[0].start, 0.0);
    assert_eq!(spans[2].end, total);
    for w in spans.windows(2) {
        assert_eq!(w[0].end, w[1].start);
    }
    for s in &spans {
        assert!((s.duration() - total / 3.0).abs() < 1e-12);
    }
    let sum: f64 = spans.iter().map(|s| s.duration()).sum();
    assert!((sum - total).abs() < 1e-12);
}

#[test]
fn ten_way_split_gives_tenth_each() {
    let spans = split_equal(20.0, 10).unwrap();
    assert!(spans.iter().all(|s| (s.duration() - 2.0).abs() < 1e-12));
    assert!(split_equal(1.0, 0).is_err());
}
