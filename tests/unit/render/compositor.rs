use image::Rgba;

use super::*;

fn small() -> Canvas {
    Canvas {
        width: 64,
        height: 36,
    }
}

fn white_page() -> RgbaImage {
    RgbaImage::from_pixel(10, 20, Rgba([255, 255, 255, 255]))
}

fn compositor(ax: f64, ay: f64) -> ClipCompositor {
    let opts = CompositorOpts {
        amplitude_x: ax,
        amplitude_y: ay,
        ..CompositorOpts::default()
    };
    ClipCompositor::new(small(), opts).unwrap()
}

#[test]
fn first_frame_is_black_from_fade() {
    let clip = compositor(80.0, 40.0).prepare(&white_page()).unwrap();
    let frame = clip.render_frame(0.0, 4.0).unwrap();
    assert!(
        frame
            .data
            .chunks_exact(4)
            .all(|px| px == [0, 0, 0, 255])
    );
}

#[test]
fn settled_frame_shows_dim_background_and_full_foreground() {
    let clip = compositor(80.0, 40.0).prepare(&white_page()).unwrap();
    // Half way through one loop the figure-eight is back at the centre.
    let frame = clip.render_frame(2.0, 4.0).unwrap();
    assert_eq!(frame.width, 64);
    assert_eq!(frame.height, 36);
    assert_eq!(frame.data.len(), small().rgba_len());
    assert_eq!(frame.pixel(0, 0), Some([77, 77, 77, 255]));
    assert_eq!(frame.pixel(32, 18), Some([255, 255, 255, 255]));
}

#[test]
fn mid_fade_is_half_brightness() {
    let clip = compositor(0.0, 0.0).prepare(&white_page()).unwrap();
    let frame = clip.render_frame(0.25, 4.0).unwrap();
    assert_eq!(frame.pixel(0, 0), Some([39, 39, 39, 255]));
}

#[test]
fn foreground_follows_motion() {
    let clip = compositor(10.0, 5.0).prepare(&white_page()).unwrap();
    assert_eq!(clip.layout().foreground_size, (19, 39));
    let centred = clip.render_frame(2.0, 4.0).unwrap();
    let shifted = clip.render_frame(1.0, 4.0).unwrap();
    assert_eq!(centred.pixel(30, 18), Some([255, 255, 255, 255]));
    assert_eq!(shifted.pixel(30, 18), Some([77, 77, 77, 255]));
    assert_eq!(shifted.pixel(45, 18), Some([255, 255, 255, 255]));
}

#[test]
fn background_crop_matches_canvas_for_any_aspect() {
    let comp = compositor(80.0, 40.0);
    for (w, h) in [(3, 200), (200, 3), (64, 36), (7, 5)] {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let clip = comp.prepare(&img).unwrap();
        let frame = clip.render_frame(1.0, 2.0).unwrap();
        assert_eq!(frame.data.len(), small().rgba_len(), "{w}x{h}");
    }
}

#[test]
fn missing_image_is_a_media_error() {
    let err = compositor(0.0, 0.0)
        .prepare_path(Path::new("/no/such/page.jpeg"))
        .unwrap_err();
    assert!(matches!(err, RecapError::Media(_)));
}
