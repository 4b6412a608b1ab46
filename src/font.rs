//! Font discovery, text measurement and text rasterization.
//!
//! The compositor only talks to the [`FontBackend`] trait. [`FontDirectory`]
//! is the stock backend: it resolves a family name to a `<family>.ttf` or
//! `<family>.otf` file under a list of search directories and rasterizes
//! glyphs with `ab_glyph`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ab_glyph::{point, Font, FontVec, OutlinedGlyph, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use log::{debug, trace};

use crate::blending::blend_over;
use crate::error::{Error, Result};

/// Font file extensions recognized by [`FontDirectory`].
const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Source of fonts for text watermarks.
pub trait FontBackend {
    /// Names of every font family this backend can render, sorted.
    fn list_available_fonts(&self) -> Vec<String>;

    /// Size `(width, height)` of the ink box of `text` when rendered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontNotFound`] if `family` is unavailable.
    fn measure_text(&self, family: &str, size_px: u32, text: &str) -> Result<(u32, u32)>;

    /// Paint `text` onto `surface` so its ink box starts at `position`.
    ///
    /// Glyph coverage scales the alpha of `color`; pixels are composited over
    /// what is already on `surface` and clipped to its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontNotFound`] if `family` is unavailable.
    fn render_text(
        &self,
        surface: &mut RgbaImage,
        position: (i32, i32),
        text: &str,
        family: &str,
        size_px: u32,
        color: Rgba<u8>,
    ) -> Result<()>;
}

/// Filesystem-backed font source.
///
/// Parsed fonts are cached per family, so measuring and then rendering the
/// same text scans the directories and parses the file only once.
#[derive(Default)]
pub struct FontDirectory {
    dirs: Vec<PathBuf>,
    loaded: Mutex<HashMap<String, Arc<FontVec>>>,
}

impl Clone for FontDirectory {
    fn clone(&self) -> Self {
        let loaded = self.loaded.lock().map(|l| l.clone()).unwrap_or_default();
        Self {
            dirs: self.dirs.clone(),
            loaded: Mutex::new(loaded),
        }
    }
}

impl fmt::Debug for FontDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.loaded.lock().map_or(0, |l| l.len());
        f.debug_struct("FontDirectory")
            .field("dirs", &self.dirs)
            .field("cached", &cached)
            .finish()
    }
}

impl FontDirectory {
    /// Search the given directories, in order.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
            loaded: Mutex::default(),
        }
    }

    /// Search the platform's standard font directories.
    #[must_use]
    pub fn system() -> Self {
        Self::new(system_font_dirs())
    }

    /// Search `dir` before any directory already configured.
    #[must_use]
    pub fn with_dir_first(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.insert(0, dir.into());
        // A new directory can shadow fonts resolved earlier
        self.loaded = Mutex::default();
        self
    }

    /// The configured search directories.
    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find the font file for `family`.
    ///
    /// Matching is on the file stem, ignoring ASCII case. Earlier search
    /// directories win.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontNotFound`] if no directory holds a matching file.
    pub fn locate(&self, family: &str) -> Result<PathBuf> {
        self.dirs
            .iter()
            .flat_map(|dir| font_files(dir))
            .find(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| stem.eq_ignore_ascii_case(family))
            })
            .ok_or_else(|| Error::FontNotFound(family.to_string()))
    }

    /// Locate and parse the font for `family`, reusing an earlier parse.
    ///
    /// Family names are cached ignoring ASCII case, matching [`Self::locate`].
    /// Failures are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontNotFound`] if the family is unavailable and
    /// [`Error::FontLoad`] if the file is not a valid font.
    pub fn load(&self, family: &str) -> Result<Arc<FontVec>> {
        let key = family.to_ascii_lowercase();
        if let Ok(loaded) = self.loaded.lock() {
            if let Some(font) = loaded.get(&key) {
                trace!("font {family:?} served from cache");
                return Ok(Arc::clone(font));
            }
        }

        let path = self.locate(family)?;
        debug!("loading font {family:?} from {}", path.display());
        let data = std::fs::read(&path)?;
        let font = Arc::new(FontVec::try_from_vec(data).map_err(|e| Error::FontLoad {
            path,
            reason: e.to_string(),
        })?);

        if let Ok(mut loaded) = self.loaded.lock() {
            loaded.insert(key, Arc::clone(&font));
        }
        Ok(font)
    }
}

impl FontBackend for FontDirectory {
    fn list_available_fonts(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dirs
            .iter()
            .flat_map(|dir| font_files(dir))
            .filter_map(|path| Some(path.file_stem()?.to_str()?.to_string()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    fn measure_text(&self, family: &str, size_px: u32, text: &str) -> Result<(u32, u32)> {
        let font = self.load(family)?;
        Ok(layout(&font, size_px, text).size())
    }

    fn render_text(
        &self,
        surface: &mut RgbaImage,
        position: (i32, i32),
        text: &str,
        family: &str,
        size_px: u32,
        color: Rgba<u8>,
    ) -> Result<()> {
        let font = self.load(family)?;
        layout(&font, size_px, text).draw(surface, position, color);
        Ok(())
    }
}

/// Glyphs of one line of text, positioned on a shared baseline.
struct TextLayout {
    glyphs: Vec<OutlinedGlyph>,
    min_x: f32,
    min_y: f32,
    width: u32,
    height: u32,
}

#[allow(clippy::cast_precision_loss)]
fn layout(font: &FontVec, size_px: u32, text: &str) -> TextLayout {
    let scale = PxScale::from(size_px as f32);
    let scaled = font.as_scaled(scale);

    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0_f32;
    let mut prev = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(cursor_x, scaled.ascent()));
        if let Some(outlined) = font.outline_glyph(glyph) {
            glyphs.push(outlined);
        }
        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }

    if glyphs.is_empty() {
        // Whitespace only: fall back to the advance box
        return TextLayout {
            glyphs,
            min_x: 0.0,
            min_y: 0.0,
            width: ceil_px(cursor_x),
            height: ceil_px(scaled.height()),
        };
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for g in &glyphs {
        let b = g.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    TextLayout {
        glyphs,
        min_x,
        min_y,
        width: ceil_px(max_x - min_x),
        height: ceil_px(max_y - min_y),
    }
}

impl TextLayout {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    fn draw(&self, surface: &mut RgbaImage, position: (i32, i32), color: Rgba<u8>) {
        let (surf_w, surf_h) = (i64::from(surface.width()), i64::from(surface.height()));
        let alpha = f32::from(color[3]);
        trace!("drawing {} glyphs at {position:?}", self.glyphs.len());

        for glyph in &self.glyphs {
            let bounds = glyph.px_bounds();
            let origin_x = i64::from(position.0) + (bounds.min.x - self.min_x).round() as i64;
            let origin_y = i64::from(position.1) + (bounds.min.y - self.min_y).round() as i64;

            glyph.draw(|gx, gy, coverage| {
                let x = origin_x + i64::from(gx);
                let y = origin_y + i64::from(gy);
                if x < 0 || y < 0 || x >= surf_w || y >= surf_h {
                    return;
                }
                let a = (coverage.clamp(0.0, 1.0) * alpha).round() as u8;
                if a > 0 {
                    let src = Rgba([color[0], color[1], color[2], a]);
                    blend_over(surface.get_pixel_mut(x as u32, y as u32), src);
                }
            });
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_px(value: f32) -> u32 {
    value.ceil().max(0.0) as u32
}

/// Every font file under `dir`, recursively, sorted by path.
///
/// Unreadable directories are skipped.
fn font_files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.filter_map(std::result::Result::ok) {
            let path = entry.path();
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => pending.push(path),
                Ok(_) if is_font_file(&path) => found.push(path),
                _ => {}
            }
        }
    }

    found.sort();
    found
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| FONT_EXTENSIONS.iter().any(|f| ext.eq_ignore_ascii_case(f)))
}

/// Standard font directories for the current platform.
#[must_use]
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts/Supplemental"));
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    } else if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR").map_or_else(|| PathBuf::from(r"C:\Windows"), PathBuf::from);
        dirs.push(windir.join("Fonts"));
    } else {
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            dirs.push(home.join(".local/share/fonts"));
            dirs.push(home.join(".fonts"));
        }
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        dirs.push(PathBuf::from("/usr/share/fonts"));
    }

    dirs
}
