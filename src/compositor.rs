//! Watermark compositing.
//!
//! A watermark is painted onto a transparent overlay the size of the base
//! image, the overlay is rotated about its center (growing to fit), and the
//! result is composited over the base at the origin.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::debug;

use crate::blending;
use crate::color::with_opacity;
use crate::config::{WatermarkConfig, WatermarkKind, MAX_ROTATION, MAX_SIZE};
use crate::error::{Error, Result};
use crate::font::FontBackend;
use crate::position::{anchor_position, tile_origins};

/// Apply a watermark to `base` in place.
///
/// Everything that can fail (font lookup, logo loading) runs before `base` is
/// touched, so on error `base` is left exactly as it was.
///
/// # Errors
///
/// Returns [`Error::FontNotFound`] for an unavailable font family,
/// [`Error::ResourceNotFound`] for a missing logo file and
/// [`Error::InvalidConfig`] for a size outside `1..=MAX_SIZE`.
pub fn apply_watermark(
    base: &mut RgbaImage,
    config: &WatermarkConfig,
    fonts: &dyn FontBackend,
) -> Result<()> {
    debug_assert!(config.rotation_degrees <= MAX_ROTATION);

    let overlay = build_overlay(base.width(), base.height(), config, fonts)?;
    let overlay = rotate(overlay, config.rotation_degrees);
    debug!(
        "compositing {}x{} overlay onto {}x{} image",
        overlay.width(),
        overlay.height(),
        base.width(),
        base.height()
    );
    blending::composite(base, &overlay, 0, 0);
    Ok(())
}

/// Paint the unrotated watermark onto a transparent `width`x`height` layer.
///
/// # Errors
///
/// See [`apply_watermark`].
pub fn build_overlay(
    width: u32,
    height: u32,
    config: &WatermarkConfig,
    fonts: &dyn FontBackend,
) -> Result<RgbaImage> {
    // `size_px` is a pub field, so builders are not the only way in.
    if config.size_px == 0 || config.size_px > MAX_SIZE {
        return Err(Error::InvalidConfig(format!(
            "watermark size {} is outside 1..={MAX_SIZE}",
            config.size_px
        )));
    }

    let stamp = match &config.kind {
        WatermarkKind::Text { text, font_family } => {
            let fill = with_opacity(config.color, config.opacity);
            render_stamp(text, font_family, config.size_px, fill, fonts)?
        }
        WatermarkKind::Logo { path } => load_logo(path, config.size_px, config.opacity)?,
    };

    let mut overlay = RgbaImage::new(width, height);
    let (stamp_w, stamp_h) = stamp.dimensions();
    if stamp_w == 0 || stamp_h == 0 {
        debug!("watermark has no visible extent, nothing to paint");
        return Ok(overlay);
    }

    if config.tiled {
        let mut count = 0usize;
        for (x, y) in tile_origins(stamp_w, stamp_h, width, height) {
            blending::composite(&mut overlay, &stamp, x, y);
            count += 1;
        }
        debug!("tiled {stamp_w}x{stamp_h} watermark {count} times");
    } else {
        let (x, y) = anchor_position(config.anchor, stamp_w, stamp_h, width, height);
        debug!("placing {stamp_w}x{stamp_h} watermark at ({x}, {y}) [{}]", config.anchor);
        blending::composite(&mut overlay, &stamp, x, y);
    }

    Ok(overlay)
}

/// Render `text` into an image exactly the size of its ink box.
fn render_stamp(
    text: &str,
    family: &str,
    size_px: u32,
    fill: Rgba<u8>,
    fonts: &dyn FontBackend,
) -> Result<RgbaImage> {
    let (w, h) = fonts.measure_text(family, size_px, text)?;
    let mut stamp = RgbaImage::new(w, h);
    if w > 0 && h > 0 {
        fonts.render_text(&mut stamp, (0, 0), text, family, size_px, fill)?;
    }
    Ok(stamp)
}

/// Load a logo, resize it to a `size_px` square and scale its alpha by
/// `opacity / 255`.
///
/// # Errors
///
/// Returns [`Error::ResourceNotFound`] if `path` is not a file, or an image
/// error if it cannot be decoded.
pub fn load_logo(path: &Path, size_px: u32, opacity: u8) -> Result<RgbaImage> {
    if !path.is_file() {
        return Err(Error::ResourceNotFound(path.to_path_buf()));
    }
    let logo = image::open(path)?.to_rgba8();
    debug!(
        "resizing {}x{} logo {} to {size_px}x{size_px}",
        logo.width(),
        logo.height(),
        path.display()
    );
    let mut logo = imageops::resize(&logo, size_px, size_px, FilterType::Lanczos3);
    blending::scale_alpha(&mut logo, opacity);
    Ok(logo)
}

/// Rotate counter-clockwise by `degrees` about the center, expanding the
/// canvas so no corner is clipped.
///
/// Quarter turns are exact; other angles are resampled bilinearly.
#[must_use]
pub fn rotate(image: RgbaImage, degrees: u16) -> RgbaImage {
    match degrees % 360 {
        0 => image,
        90 => imageops::rotate270(&image),
        180 => imageops::rotate180(&image),
        270 => imageops::rotate90(&image),
        d => rotate_bilinear(&image, f32::from(d)),
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn rotate_bilinear(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let src_w = image.width() as f32;
    let src_h = image.height() as f32;

    // Expanded bounding box; the epsilon keeps exact fits from rounding up.
    // PIL's expand=True can come out one pixel larger (86 vs 85 for 100x20 at 45).
    let dst_w = (src_w * cos.abs() + src_h * sin.abs() - 1e-3).ceil().max(1.0) as u32;
    let dst_h = (src_w * sin.abs() + src_h * cos.abs() - 1e-3).ceil().max(1.0) as u32;

    let (src_cx, src_cy) = (src_w / 2.0, src_h / 2.0);
    let (dst_cx, dst_cy) = (dst_w as f32 / 2.0, dst_h as f32 / 2.0);

    RgbaImage::from_fn(dst_w, dst_h, |dx, dy| {
        // Inverse map the destination pixel center into the source
        let rx = dx as f32 + 0.5 - dst_cx;
        let ry = dy as f32 + 0.5 - dst_cy;
        let sx = rx * cos - ry * sin + src_cx - 0.5;
        let sy = rx * sin + ry * cos + src_cy - 0.5;
        sample_bilinear(image, sx, sy)
    })
}

/// Bilinear sample with premultiplied alpha; outside pixels are transparent.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
fn sample_bilinear(image: &RgbaImage, sx: f32, sy: f32) -> Rgba<u8> {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let (w, h) = (i64::from(image.width()), i64::from(image.height()));

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let mut rgb = [0.0_f32; 3];
    let mut alpha = 0.0_f32;
    for (x, y, weight) in taps {
        if weight <= 0.0 || x < 0 || y < 0 || x >= w || y >= h {
            continue;
        }
        let px = image.get_pixel(x as u32, y as u32);
        let a = f32::from(px[3]) * weight;
        for (sum, &value) in rgb.iter_mut().zip(&px.0[..3]) {
            *sum += f32::from(value) * a;
        }
        alpha += a;
    }

    if alpha < 0.5 {
        return Rgba([0, 0, 0, 0]);
    }

    let unpremultiply = |v: f32| (v / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([
        unpremultiply(rgb[0]),
        unpremultiply(rgb[1]),
        unpremultiply(rgb[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{tile_count, Anchor};
    use image::Rgb;

    /// Renders every string as a solid block `size/2` px per char by `size` px.
    struct BlockFont;

    impl FontBackend for BlockFont {
        fn list_available_fonts(&self) -> Vec<String> {
            vec!["Block".to_string()]
        }

        #[allow(clippy::cast_possible_truncation)]
        fn measure_text(&self, family: &str, size_px: u32, text: &str) -> Result<(u32, u32)> {
            if family != "Block" {
                return Err(Error::FontNotFound(family.to_string()));
            }
            Ok((text.chars().count() as u32 * size_px / 2, size_px))
        }

        #[allow(clippy::cast_possible_wrap)]
        fn render_text(
            &self,
            surface: &mut RgbaImage,
            position: (i32, i32),
            text: &str,
            family: &str,
            size_px: u32,
            color: Rgba<u8>,
        ) -> Result<()> {
            let (w, h) = self.measure_text(family, size_px, text)?;
            let block = RgbaImage::from_pixel(w, h, color);
            blending::composite(surface, &block, position.0, position.1);
            Ok(())
        }
    }

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn centered_text_lands_at_anchor() {
        // "TEST" at size 40 measures 80x40
        let config = WatermarkConfig::text("TEST", "Block")
            .with_size(40)
            .with_color(Rgb([255, 0, 0]))
            .with_opacity(128)
            .with_anchor(Anchor::Center);
        let overlay = build_overlay(600, 400, &config, &BlockFont).unwrap();

        assert_eq!(overlay.get_pixel(260, 180), &Rgba([255, 0, 0, 128]));
        assert_eq!(overlay.get_pixel(339, 219), &Rgba([255, 0, 0, 128]));
        assert_eq!(overlay.get_pixel(259, 180)[3], 0);
        assert_eq!(overlay.get_pixel(340, 219)[3], 0);
    }

    #[test]
    fn unknown_font_aborts_without_touching_base() {
        let mut base = white(50, 50);
        let config = WatermarkConfig::text("hi", "Missing");
        let err = apply_watermark(&mut base, &config, &BlockFont).unwrap_err();
        assert!(matches!(err, Error::FontNotFound(_)));
        assert_eq!(base, white(50, 50));
    }

    #[test]
    fn missing_logo_aborts_without_touching_base() {
        let mut base = white(50, 50);
        let config = WatermarkConfig::logo("/definitely/not/here/logo.png");
        let err = apply_watermark(&mut base, &config, &BlockFont).unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
        assert_eq!(base, white(50, 50));
    }

    #[test]
    fn oversized_size_is_rejected_before_allocating() {
        let mut base = white(50, 50);
        let mut config = WatermarkConfig::text("hi", "Block");
        config.size_px = u32::MAX;
        let err = apply_watermark(&mut base, &config, &BlockFont).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(base, white(50, 50));

        config.size_px = 0;
        let err = build_overlay(50, 50, &config, &BlockFont).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn largest_size_is_accepted() {
        let config = WatermarkConfig::text("A", "Block").with_size(u32::MAX);
        assert_eq!(config.size_px, MAX_SIZE);
        // One char measures MAX_SIZE/2 x MAX_SIZE, centered on a small layer
        let overlay = build_overlay(20, 20, &config, &BlockFont).unwrap();
        assert_eq!(overlay.dimensions(), (20, 20));
        assert!(overlay.pixels().all(|p| p[3] == config.opacity));
    }

    #[test]
    fn tiling_paints_one_stamp_per_grid_cell() {
        // "AB" at size 10 measures 10x10, pitch 20
        let config = WatermarkConfig::text("AB", "Block")
            .with_size(10)
            .with_opacity(255)
            .with_tiling(true);
        let overlay = build_overlay(95, 45, &config, &BlockFont).unwrap();

        let mut painted_origins = 0;
        for y in (0..45).step_by(20) {
            for x in (0..95).step_by(20) {
                assert_eq!(overlay.get_pixel(x, y)[3], 255, "tile at ({x},{y})");
                painted_origins += 1;
            }
        }
        assert_eq!(painted_origins, tile_count(10, 10, 95, 45));
        // Gaps stay clear
        assert_eq!(overlay.get_pixel(15, 5)[3], 0);
        assert_eq!(overlay.get_pixel(5, 15)[3], 0);
    }

    #[test]
    fn empty_text_paints_nothing() {
        let config = WatermarkConfig::text("", "Block");
        let overlay = build_overlay(20, 20, &config, &BlockFont).unwrap();
        assert!(overlay.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn zero_rotation_is_identity() {
        let mut img = RgbaImage::new(7, 3);
        img.put_pixel(1, 2, Rgba([1, 2, 3, 4]));
        let rotated = rotate(img.clone(), 0);
        assert_eq!(rotated, img);
        assert_eq!(rotate(img.clone(), 360), img);
    }

    #[test]
    fn half_turn_twice_restores_overlay() {
        let mut img = RgbaImage::new(6, 4);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(5, 1, Rgba([0, 255, 0, 100]));
        let back = rotate(rotate(img.clone(), 180), 180);
        assert_eq!(back, img);
    }

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        let mut img = RgbaImage::new(4, 2);
        // Top-right corner
        img.put_pixel(3, 0, Rgba([9, 9, 9, 255]));
        let rotated = rotate(img, 90);
        assert_eq!(rotated.dimensions(), (2, 4));
        // Counter-clockwise: top-right moves to top-left
        assert_eq!(rotated.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn arbitrary_rotation_expands_canvas() {
        let img = RgbaImage::from_pixel(100, 20, Rgba([0, 0, 0, 255]));
        let rotated = rotate(img, 45);
        // 100*cos45 + 20*sin45 ~= 84.85
        assert_eq!(rotated.dimensions(), (85, 85));
        // Center stays opaque, corners are transparent
        assert_eq!(rotated.get_pixel(42, 42)[3], 255);
        assert_eq!(rotated.get_pixel(0, 0)[3], 0);
        assert_eq!(rotated.get_pixel(84, 84)[3], 0);
    }

    #[test]
    fn rotated_overlay_is_clipped_to_base() {
        let mut base = white(30, 10);
        let config = WatermarkConfig::text("ABCDEF", "Block")
            .with_size(10)
            .with_color(Rgb([0, 0, 0]))
            .with_opacity(255)
            .with_anchor(Anchor::TopLeft)
            .with_rotation(30);
        apply_watermark(&mut base, &config, &BlockFont).unwrap();
        assert_eq!(base.dimensions(), (30, 10));
        assert!(base.pixels().all(|p| p[3] == 255));
    }
}
