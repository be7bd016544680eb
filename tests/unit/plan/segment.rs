use super::*;

fn seg(start: i64, end: i64) -> Segment {
    Segment {
        start_page: start,
        end_page: end,
        script: String::new(),
        mood: Mood::Neutral,
        style_instructions: String::new(),
    }
}

#[test]
fn page_span_converts_one_based_inclusive() {
    assert_eq!(seg(1, 10).page_span(10), 0..10);
    assert_eq!(seg(3, 4).page_span(10), 2..4);
    assert_eq!(seg(5, 5).page_span(10), 4..5);
}

#[test]
fn page_span_clamps_out_of_range_pages() {
    assert_eq!(seg(0, 3).page_span(10), 0..3);
    assert_eq!(seg(-4, 2).page_span(10), 0..2);
    assert_eq!(seg(8, 40).page_span(10), 7..10);
    assert!(seg(11, 12).page_span(10).is_empty());
    assert!(seg(4, 2).page_span(10).is_empty());
    assert!(seg(1, 3).page_span(0).is_empty());
}

#[test]
fn page_span_survives_extreme_page_numbers() {
    let parsed =
        parse_segments(r#"[{"start_page": -9223372036854775808, "end_page": 3}]"#).unwrap();
    assert_eq!(parsed[0].page_span(10), 0..3);
    assert_eq!(seg(i64::MIN, i64::MAX).page_span(10), 0..10);
    assert!(seg(i64::MAX, i64::MAX).page_span(10).is_empty());
    assert!(seg(i64::MIN, i64::MIN).page_span(10).is_empty());
}

#[test]
fn mood_labels_are_case_insensitive_with_neutral_fallback() {
    assert_eq!(Mood::from_label("action"), Mood::Action);
    assert_eq!(Mood::from_label(" SUSPENSE "), Mood::Suspense);
    assert_eq!(Mood::from_label("Romantic"), Mood::Neutral);
    assert_eq!(Mood::Sad.file_stem(), "sad");
}

#[test]
fn parse_segments_applies_defaults_and_strips_fences() {
    let text = "```json\n[{\"start_page\": 2, \"end_page\": 3, \"script\": \"نص\", \"mood\": \"happy\", \"style_instructions\": \"warm\"}, {\"mood\": null}]\n```";
    let segs = parse_segments(text).unwrap();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].start_page, 2);
    assert_eq!(segs[0].mood, Mood::Happy);
    assert_eq!(segs[0].script, "نص");
    assert_eq!(segs[1].start_page, 1);
    assert_eq!(segs[1].end_page, 1);
    assert_eq!(segs[1].mood, Mood::Neutral);
}

#[test]
fn parse_segments_rejects_non_array() {
    let err = parse_segments("{\"oops\": true}").unwrap_err();
    assert!(matches!(err, crate::RecapError::Provider(_)));
}
