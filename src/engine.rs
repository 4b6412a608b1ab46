//! Watermark engine and image file handling.

use std::path::{Path, PathBuf};

use image::imageops;
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, info};

use crate::compositor;
use crate::config::WatermarkConfig;
use crate::error::{Error, Result};
use crate::font::{FontBackend, FontDirectory};

/// Longest side of a preview image, in pixels.
pub const PREVIEW_MAX_SIDE: u32 = 400;

/// JPEG encoding quality for saved images.
const JPEG_QUALITY: u8 = 100;

/// Applies watermarks using a font backend.
///
/// The engine holds no per-image state: each call borrows the image it
/// modifies and the config describing the watermark.
#[derive(Debug, Clone)]
pub struct WatermarkEngine<F = FontDirectory> {
    fonts: F,
}

impl Default for WatermarkEngine<FontDirectory> {
    fn default() -> Self {
        Self::new(FontDirectory::system())
    }
}

impl<F: FontBackend> WatermarkEngine<F> {
    /// Create an engine that renders text through `fonts`.
    pub fn new(fonts: F) -> Self {
        Self { fonts }
    }

    /// The font backend.
    pub fn fonts(&self) -> &F {
        &self.fonts
    }

    /// Font families available for text watermarks.
    #[must_use]
    pub fn list_available_fonts(&self) -> Vec<String> {
        self.fonts.list_available_fonts()
    }

    /// Apply a watermark to `image` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontNotFound`] or [`Error::ResourceNotFound`] when the
    /// font or logo is unavailable; `image` is unchanged in that case.
    pub fn apply(&self, image: &mut RgbaImage, config: &WatermarkConfig) -> Result<()> {
        compositor::apply_watermark(image, config, &self.fonts)
    }

    /// Load `input`, watermark it, and save it to `output`.
    ///
    /// Returns the watermarked image so callers can preview it.
    ///
    /// # Errors
    ///
    /// Fails if the input cannot be loaded, the watermark cannot be applied,
    /// or the output cannot be written. Nothing is written on failure.
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        config: &WatermarkConfig,
    ) -> Result<RgbaImage> {
        let mut image = load_image(input)?;
        self.apply(&mut image, config)?;
        save_image(&image, output)?;
        info!("watermarked {} -> {}", input.display(), output.display());
        Ok(image)
    }
}

/// Load an image file as RGBA.
///
/// # Errors
///
/// Returns [`Error::ResourceNotFound`] if `path` is not a file, or an image
/// error if decoding fails.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    if !path.is_file() {
        return Err(Error::ResourceNotFound(path.to_path_buf()));
    }
    let image = image::open(path)?.to_rgba8();
    debug!(
        "loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Save an image, choosing the format from the file extension.
///
/// Paths without an extension are written as PNG. JPEG output drops the alpha
/// channel. Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format = if path.extension().is_none() {
        ImageFormat::Png
    } else {
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let file = std::io::BufWriter::new(std::fs::File::create(path)?);
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, JPEG_QUALITY);
            encoder.encode_image(&DynamicImage::ImageRgb8(rgb))?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    debug!("saved {} as {format:?}", path.display());
    Ok(())
}

/// Dimensions of the preview for a `width`x`height` image.
///
/// The longest side is scaled down to [`PREVIEW_MAX_SIDE`] keeping the aspect
/// ratio; smaller images keep their size.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn preview_dimensions(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= PREVIEW_MAX_SIDE {
        return (width, height);
    }
    let scale = |side: u32| {
        let scaled = (u64::from(side) * u64::from(PREVIEW_MAX_SIDE) + u64::from(longest) / 2)
            / u64::from(longest);
        (scaled as u32).max(1)
    };
    (scale(width), scale(height))
}

/// Downscaled copy of `img` for display.
#[must_use]
pub fn preview(img: &RgbaImage) -> RgbaImage {
    let (w, h) = preview_dimensions(img.width(), img.height());
    if (w, h) == img.dimensions() {
        return img.clone();
    }
    imageops::thumbnail(img, w, h)
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"),
        None => false,
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_watermarked.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    match input.extension() {
        Some(ext) => parent.join(format!("{stem}_watermarked.{}", ext.to_string_lossy())),
        None => parent.join(format!("{stem}_watermarked.png")),
    }
}
