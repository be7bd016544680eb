use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        RecapError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        RecapError::provider("x")
            .to_string()
            .contains("provider error:")
    );
    assert!(RecapError::media("x").to_string().contains("media error:"));
    assert!(
        RecapError::missing_credential("GEMINI_API_KEY")
            .to_string()
            .contains("GEMINI_API_KEY must be set")
    );
    assert!(
        RecapError::missing_input("chapter.pdf")
            .to_string()
            .contains("'chapter.pdf' not found")
    );
}

#[test]
fn only_quota_errors_are_retryable() {
    assert!(RecapError::quota("429").is_quota_exhausted());
    assert!(!RecapError::provider("500").is_quota_exhausted());
    assert!(!RecapError::EmptyTimeline.is_quota_exhausted());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RecapError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let err: RecapError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, RecapError::Serde(_)));
}
