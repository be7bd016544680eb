//! Clip geometry: background cover crop, foreground fit, and the figure-eight motion path.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Point, Size, Vec2};
use crate::foundation::error::{RecapError, RecapResult};

/// Tunables of the clip compositor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorOpts {
    /// Opacity of the cover-cropped background over black.
    pub background_opacity: f32,
    /// Extra scale applied to the fitted foreground so motion never shows its edges.
    pub foreground_overscan: f64,
    /// Horizontal motion amplitude in pixels.
    pub amplitude_x: f64,
    /// Vertical motion amplitude in pixels.
    pub amplitude_y: f64,
    /// Fade-in from black at the start of each clip, in seconds.
    pub fade_in_secs: f64,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            background_opacity: 0.3,
            foreground_overscan: 1.10,
            amplitude_x: 80.0,
            amplitude_y: 40.0,
            fade_in_secs: 0.5,
        }
    }
}

impl CompositorOpts {
    /// Reject values that cannot produce a frame.
    pub fn validate(&self) -> RecapResult<()> {
        if !(0.0..=1.0).contains(&self.background_opacity) {
            return Err(RecapError::validation(
                "background_opacity must be within [0, 1]",
            ));
        }
        if !self.foreground_overscan.is_finite() || self.foreground_overscan <= 0.0 {
            return Err(RecapError::validation("foreground_overscan must be > 0"));
        }
        if !self.amplitude_x.is_finite() || !self.amplitude_y.is_finite() {
            return Err(RecapError::validation("motion amplitudes must be finite"));
        }
        if !self.fade_in_secs.is_finite() || self.fade_in_secs < 0.0 {
            return Err(RecapError::validation("fade_in_secs must be >= 0"));
        }
        Ok(())
    }
}

/// Pixel geometry of one clip, derived from the canvas and the source image size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipLayout {
    /// Output screen.
    pub canvas: Canvas,
    /// Cover scale factor for the background.
    pub background_scale: f64,
    /// Background size after scaling (never smaller than the canvas).
    pub background_size: (u32, u32),
    /// Top-left of the canvas-sized crop inside the scaled background.
    pub background_crop_origin: (u32, u32),
    /// Fit scale times overscan for the foreground.
    pub foreground_scale: f64,
    /// Foreground size after scaling.
    pub foreground_size: (u32, u32),
    amplitude: Vec2,
}

impl ClipLayout {
    /// Compute the layout of an `image_w x image_h` image on `canvas`.
    pub fn new(
        canvas: Canvas,
        image_w: u32,
        image_h: u32,
        opts: &CompositorOpts,
    ) -> RecapResult<Self> {
        if image_w == 0 || image_h == 0 {
            return Err(RecapError::validation("image has zero width or height"));
        }
        let screen = canvas.size();
        let (iw, ih) = (f64::from(image_w), f64::from(image_h));
        let rx = screen.width / iw;
        let ry = screen.height / ih;

        let background_scale = rx.max(ry);
        // Float error can leave the cover size a pixel short of the screen.
        let bg_w = ((iw * background_scale) as u32).max(canvas.width);
        let bg_h = ((ih * background_scale) as u32).max(canvas.height);
        let crop = ((bg_w - canvas.width) / 2, (bg_h - canvas.height) / 2);

        let foreground_scale = rx.min(ry) * opts.foreground_overscan;
        let fg_w = ((iw * foreground_scale) as u32).max(1);
        let fg_h = ((ih * foreground_scale) as u32).max(1);

        Ok(Self {
            canvas,
            background_scale,
            background_size: (bg_w, bg_h),
            background_crop_origin: crop,
            foreground_scale,
            foreground_size: (fg_w, fg_h),
            amplitude: Vec2::new(opts.amplitude_x, opts.amplitude_y),
        })
    }

    /// Figure-eight displacement at local time `t` of a clip lasting `duration` seconds.
    ///
    /// One full loop per clip: the path is periodic in `duration` and zero at both ends.
    pub fn motion(&self, t: f64, duration: f64) -> Vec2 {
        if duration <= 0.0 {
            return Vec2::ZERO;
        }
        let u = TAU * t / duration;
        Vec2::new(self.amplitude.x * u.sin(), self.amplitude.y * (2.0 * u).sin())
    }

    /// Foreground top-left at local time `t`.
    pub fn foreground_origin(&self, t: f64, duration: f64) -> Point {
        let c = self.canvas.center();
        let fg = Size::new(
            f64::from(self.foreground_size.0),
            f64::from(self.foreground_size.1),
        );
        Point::new(c.x - fg.width / 2.0, c.y - fg.height / 2.0) + self.motion(t, duration)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
