use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(24, 0).is_err());
    assert_eq!(Fps::new(24, 1).unwrap(), Fps::default());
}

#[test]
fn fps_frame_time_and_ceiling() {
    let fps = Fps::new(24, 1).unwrap();
    assert_eq!(fps.frame_time_secs(FrameIndex(48)), 2.0);
    assert_eq!(fps.secs_to_frames_ceil(2.0), 48);
    assert_eq!(fps.secs_to_frames_ceil(2.01), 49);
    assert_eq!(fps.secs_to_frames_ceil(0.1 + 0.2 + 0.7), 24);
}

#[test]
fn canvas_center_and_len() {
    let c = Canvas::default();
    assert_eq!(c.center(), Point::new(960.0, 540.0));
    assert_eq!(c.rgba_len(), 1920 * 1080 * 4);
}

#[test]
fn time_span_rejects_reversed_bounds() {
    assert!(TimeSpan::new(2.0, 1.0).is_err());
    assert!(TimeSpan::new(0.0, f64::NAN).is_err());
    assert_eq!(TimeSpan::new(1.0, 3.5).unwrap().duration(), 2.5);
}
