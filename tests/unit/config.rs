use super::*;

#[test]
fn empty_json_yields_defaults() {
    let cfg: RecapConfig = serde_json::from_str("{}").unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.canvas, Canvas::default());
    assert_eq!(cfg.fps, Fps::new(24, 1).unwrap());
    assert_eq!(cfg.narration.max_attempts, 3);
    assert_eq!(cfg.narration.backoff_step(), Duration::from_secs(10));
    assert_eq!(cfg.narration.throttle(), Duration::from_secs(5));
    assert_eq!(cfg.music.default_mood, Mood::Neutral);
    assert_eq!(cfg.encode.video_codec, "libx264");
    assert_eq!(cfg.encode.audio_codec, "aac");
}

#[test]
fn partial_json_overrides_only_named_fields() {
    let cfg: RecapConfig =
        serde_json::from_str(r#"{"canvas":{"width":640,"height":360},"music":{"gain":0.5}}"#)
            .unwrap();
    assert_eq!(cfg.canvas.width, 640);
    assert_eq!(cfg.music.gain, 0.5);
    assert!(cfg.music.enabled);
    assert_eq!(cfg.paths.output_dir, PathBuf::from("output"));
}

#[test]
fn validate_rejects_odd_canvas_and_zero_attempts() {
    let mut cfg = RecapConfig::default();
    cfg.canvas.width = 641;
    assert!(cfg.validate().is_err());

    let mut cfg = RecapConfig::default();
    cfg.narration.max_attempts = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = RecapConfig::default();
    cfg.raster.format = "tiff".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn credentials_debug_hides_keys() {
    let creds = ApiCredentials {
        gemini_api_key: Some("secret-key".to_string()),
        tavily_api_key: None,
    };
    let dbg = format!("{creds:?}");
    assert!(!dbg.contains("secret-key"));
    assert!(dbg.contains("***"));
}
