use std::path::Path;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::Canvas;
use crate::foundation::error::{RecapError, RecapResult};
use crate::render::backend::FrameRGBA;
use crate::render::composite::{PremulImage, blit_over, fade_from_black_in_place, over_black};
use crate::render::layout::{ClipLayout, CompositorOpts};

const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Turns page images into [`PreparedClip`]s for a fixed canvas.
#[derive(Clone, Debug)]
pub struct ClipCompositor {
    canvas: Canvas,
    opts: CompositorOpts,
}

impl ClipCompositor {
    /// Create a compositor after validating `opts`.
    pub fn new(canvas: Canvas, opts: CompositorOpts) -> RecapResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(RecapError::validation("canvas width/height must be non-zero"));
        }
        opts.validate()?;
        Ok(Self { canvas, opts })
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Decode the image at `path` and prepare it.
    #[tracing::instrument(skip(self))]
    pub fn prepare_path(&self, path: &Path) -> RecapResult<PreparedClip> {
        let img = image::open(path)
            .map_err(|e| RecapError::media(format!("decode image '{}': {e}", path.display())))?
            .to_rgba8();
        self.prepare(&img)
    }

    /// Build the static layers of a clip: darkened cover background and fitted foreground.
    pub fn prepare(&self, img: &RgbaImage) -> RecapResult<PreparedClip> {
        let layout = ClipLayout::new(self.canvas, img.width(), img.height(), &self.opts)?;

        let (bg_w, bg_h) = layout.background_size;
        let (crop_x, crop_y) = layout.background_crop_origin;
        let scaled = imageops::resize(img, bg_w, bg_h, RESIZE_FILTER);
        let cropped =
            imageops::crop_imm(&scaled, crop_x, crop_y, self.canvas.width, self.canvas.height)
                .to_image();
        let background =
            PremulImage::from_straight(self.canvas.width, self.canvas.height, cropped.into_raw())?;
        let backdrop = over_black(&background.data, self.opts.background_opacity);

        let (fg_w, fg_h) = layout.foreground_size;
        let fg = imageops::resize(img, fg_w, fg_h, RESIZE_FILTER);
        let foreground = PremulImage::from_straight(fg_w, fg_h, fg.into_raw())?;

        Ok(PreparedClip {
            layout,
            backdrop,
            foreground,
            fade_in_secs: self.opts.fade_in_secs,
        })
    }
}

/// Static layers of one clip, ready to render any local time.
#[derive(Clone, Debug)]
pub struct PreparedClip {
    layout: ClipLayout,
    backdrop: Vec<u8>,
    foreground: PremulImage,
    fade_in_secs: f64,
}

impl PreparedClip {
    /// Geometry this clip was prepared with.
    pub fn layout(&self) -> &ClipLayout {
        &self.layout
    }

    /// Render the frame at local time `t` of a clip lasting `duration` seconds.
    pub fn render_frame(&self, t: f64, duration: f64) -> RecapResult<FrameRGBA> {
        let canvas = self.layout.canvas;
        let mut frame = FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: self.backdrop.clone(),
        };

        let origin = self.layout.foreground_origin(t, duration);
        blit_over(
            &mut frame,
            &self.foreground,
            origin.x.round() as i64,
            origin.y.round() as i64,
        )?;

        if self.fade_in_secs > 0.0 && t < self.fade_in_secs {
            fade_from_black_in_place(&mut frame.data, (t.max(0.0) / self.fade_in_secs) as f32);
        }
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
