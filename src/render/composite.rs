use crate::foundation::error::{RecapError, RecapResult};
use crate::foundation::math::{mul_div255_u16, mul_div255_u8, unit_to_u8_weight};
use crate::render::backend::FrameRGBA;

pub(crate) type PremulRgba8 = [u8; 4];

/// A decoded, resized, premultiplied RGBA8 layer.
#[derive(Clone, Debug)]
pub(crate) struct PremulImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

impl PremulImage {
    /// Wrap straight-alpha RGBA8 bytes, premultiplying them.
    pub(crate) fn from_straight(width: u32, height: u32, mut data: Vec<u8>) -> RecapResult<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(RecapError::validation(
                "image buffer does not match width*height*4",
            ));
        }
        premultiply_rgba8_in_place(&mut data);
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = unit_to_u8_weight(opacity);
    if op == 0 || src[3] == 0 {
        return dst;
    }
    let sa = mul_div255_u16(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - sa;

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255_u16(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u16(u16::from(src[i]), op);
        let dc = mul_div255_u16(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Convert straight-alpha RGBA8 to premultiplied in place.
pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

/// Composite premultiplied `src` over an opaque black buffer of the same size.
pub(crate) fn over_black(src: &[u8], opacity: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    for s in src.chunks_exact(4) {
        let px = over([0, 0, 0, 255], [s[0], s[1], s[2], s[3]], opacity);
        out.extend_from_slice(&px);
    }
    out
}

/// Composite `src` onto `dst` with its top-left at `(x, y)`; parts outside `dst` are clipped.
pub(crate) fn blit_over(dst: &mut FrameRGBA, src: &PremulImage, x: i64, y: i64) -> RecapResult<()> {
    let (dst_w, dst_h) = (dst.width, dst.height);
    let (src_w, src_h) = (src.width, src.height);
    if dst.data.len() != dst_w as usize * dst_h as usize * 4
        || src.data.len() != src_w as usize * src_h as usize * 4
    {
        return Err(RecapError::validation(
            "blit_over expects buffers matching width*height*4",
        ));
    }

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src_w)).min(i64::from(dst_w));
    let y1 = (y + i64::from(src_h)).min(i64::from(dst_h));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let span = (x1 - x0) as usize;
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        let sx = (x0 - x) as usize;
        let s_start = (sy * src_w as usize + sx) * 4;
        let d_start = (dy as usize * dst_w as usize + x0 as usize) * 4;
        let s_row = &src.data[s_start..s_start + span * 4];
        let d_row = &mut dst.data[d_start..d_start + span * 4];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            if s[3] == 255 {
                d.copy_from_slice(s);
            } else {
                let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], 1.0);
                d.copy_from_slice(&out);
            }
        }
    }
    Ok(())
}

/// Blend an opaque buffer toward black: `factor = 0` is black, `factor = 1` is unchanged.
pub(crate) fn fade_from_black_in_place(rgba: &mut [u8], factor: f32) {
    let w = unit_to_u8_weight(factor);
    if w == 255 {
        return;
    }
    for px in rgba.chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), w);
        }
    }
}

fn add_sat_u8(a: u16, b: u16) -> u8 {
    (a + b).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
