use super::*;

fn frame() -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
    }
}

#[test]
fn in_memory_sink_records_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::default(),
        audio: None,
    })
    .unwrap();
    sink.push_frame(FrameIndex(0), &frame()).unwrap();
    sink.push_frame(FrameIndex(1), &frame()).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &frame()).is_err());
    sink.end().unwrap();

    assert!(sink.is_ended());
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.config().map(|c| c.fps), Some(Fps::default()));
}

#[test]
fn abort_is_recorded_and_cleared_by_begin() {
    let cfg = SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::default(),
        audio: None,
    };
    let mut sink = InMemorySink::new();
    sink.begin(cfg.clone()).unwrap();
    sink.push_frame(FrameIndex(0), &frame()).unwrap();
    sink.abort();
    assert!(sink.is_aborted());
    assert!(!sink.is_ended());

    sink.begin(cfg).unwrap();
    assert!(!sink.is_aborted());
    assert!(sink.frames().is_empty());
}
