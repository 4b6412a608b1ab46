//! Alpha blending math for watermark compositing.
//!
//! Watermarks are applied with the Porter-Duff "over" operator:
//! `out_alpha = src_alpha + dst_alpha * (1 - src_alpha)` and
//! `out = (src * src_alpha + dst * dst_alpha * (1 - src_alpha)) / out_alpha`.
//!
//! Channels are blended as plain sRGB bytes; no linearization.

use image::{Rgba, RgbaImage};

/// Output alpha below this is treated as fully transparent.
const MIN_OUT_ALPHA: f32 = 1.0 / 512.0;

/// Composite `src` over `dst` in place.
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    if src[3] == 0 {
        return;
    }
    if src[3] == u8::MAX {
        *dst = src;
        return;
    }

    let src_alpha = f32::from(src[3]) / 255.0;
    let dst_alpha = f32::from(dst[3]) / 255.0;
    let dst_weight = dst_alpha * (1.0 - src_alpha);
    let out_alpha = src_alpha + dst_weight;

    if out_alpha < MIN_OUT_ALPHA {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    for ch in 0..3 {
        let value = (f32::from(src[ch]) * src_alpha + f32::from(dst[ch]) * dst_weight) / out_alpha;
        dst[ch] = to_channel(value);
    }
    dst[3] = to_channel(out_alpha * 255.0);
}

/// Scale every pixel's alpha by `opacity / 255`.
///
/// The scaling is multiplicative, so existing per-pixel transparency is kept:
/// a half-transparent pixel at opacity 128 ends up a quarter opaque.
pub fn scale_alpha(image: &mut RgbaImage, opacity: u8) {
    if opacity == u8::MAX {
        return;
    }
    let opacity = u32::from(opacity);
    for px in image.pixels_mut() {
        let scaled = (u32::from(px[3]) * opacity + 127) / 255;
        #[allow(clippy::cast_possible_truncation)]
        {
            px[3] = scaled as u8;
        }
    }
}

/// Composite `overlay` onto `base` with its top-left corner at `(pos_x, pos_y)`.
///
/// Overlay pixels that fall outside `base` are discarded; `base` never grows.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn composite(base: &mut RgbaImage, overlay: &RgbaImage, pos_x: i32, pos_y: i32) {
    let base_w = i64::from(base.width());
    let base_h = i64::from(base.height());
    let (pos_x, pos_y) = (i64::from(pos_x), i64::from(pos_y));

    // Clip to base bounds
    let x1 = pos_x.max(0);
    let y1 = pos_y.max(0);
    let x2 = (pos_x + i64::from(overlay.width())).min(base_w);
    let y2 = (pos_y + i64::from(overlay.height())).min(base_h);

    if x1 >= x2 || y1 >= y2 {
        return;
    }

    for y in y1..y2 {
        for x in x1..x2 {
            let src = *overlay.get_pixel((x - pos_x) as u32, (y - pos_y) as u32);
            blend_over(base.get_pixel_mut(x as u32, y as u32), src);
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
