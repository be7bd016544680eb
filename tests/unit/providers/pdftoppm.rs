use super::*;

#[test]
fn scratch_names_parse_with_and_without_padding() {
    assert_eq!(scratch_page_number("page-1", "page"), Some(1));
    assert_eq!(scratch_page_number("page-007", "page"), Some(7));
    assert_eq!(scratch_page_number("page-12", "page"), Some(12));
    assert_eq!(scratch_page_number("cover", "page"), None);
    assert_eq!(scratch_page_number("page-x", "page"), None);
}

#[test]
fn page_names_are_zero_padded_and_keep_format() {
    assert_eq!(page_image_name("ch1", 1, "jpeg"), "ch1_page_001.jpeg");
    assert_eq!(page_image_name("ch1", 120, "png"), "ch1_page_120.png");
}

#[test]
fn unknown_format_is_rejected() {
    let cfg = RasterConfig {
        dpi: 200,
        format: "tiff".to_string(),
    };
    assert!(matches!(
        PdftoppmRasterizer::new(&cfg),
        Err(RecapError::Validation(_))
    ));
}

#[test]
fn missing_pdf_is_missing_input() {
    let r = PdftoppmRasterizer::new(&RasterConfig::default()).unwrap();
    let dir = std::env::temp_dir().join("manga_recap_pdftoppm_missing");
    let err = r
        .rasterize(Path::new("/definitely/not/here.pdf"), &dir)
        .unwrap_err();
    assert!(matches!(err, RecapError::MissingInput(_)));
}

#[test]
fn sorted_pages_follow_numeric_order() {
    let mut names = ["page-10", "page-2", "page-1"]
        .iter()
        .filter_map(|s| scratch_page_number(s, "page"))
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec![1, 2, 10]);
}
