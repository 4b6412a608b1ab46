//! Watermark configuration.
//!
//! [`WatermarkConfig`] is the immutable request handed to the compositor.
//! [`WatermarkSettings`] is the editable form a front end keeps around while
//! the user adjusts values; it clamps out-of-range numbers and rejects bad
//! colors without losing the previous valid state.

use std::path::PathBuf;

use image::Rgb;

use crate::color::parse_color;
use crate::error::{Error, Result};
use crate::position::Anchor;

/// Largest accepted rotation, in degrees.
pub const MAX_ROTATION: u16 = 360;

/// Largest accepted font size or logo side, in pixels.
pub const MAX_SIZE: u32 = 1000;

/// What gets painted: rendered text or a bitmap logo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkKind {
    /// Text rendered with a named font family.
    Text {
        /// The text to render.
        text: String,
        /// Font family name resolved by the font backend.
        font_family: String,
    },
    /// A logo image, resized to a `size_px` square.
    Logo {
        /// Path of the logo image file.
        path: PathBuf,
    },
}

/// A single, validated watermark request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkConfig {
    /// Text or logo.
    pub kind: WatermarkKind,
    /// Font size for text, side length for logos, in `1..=MAX_SIZE`.
    pub size_px: u32,
    /// Fill color for text watermarks.
    pub color: Rgb<u8>,
    /// Global opacity (alpha) in `0..=255`.
    pub opacity: u8,
    /// Counter-clockwise rotation in `0..=360` degrees.
    pub rotation_degrees: u16,
    /// Placement used when not tiled.
    pub anchor: Anchor,
    /// Repeat the watermark across the whole image.
    pub tiled: bool,
}

impl WatermarkConfig {
    /// Text watermark with default styling.
    #[must_use]
    pub fn text(text: impl Into<String>, font_family: impl Into<String>) -> Self {
        Self {
            kind: WatermarkKind::Text {
                text: text.into(),
                font_family: font_family.into(),
            },
            ..WatermarkSettings::default().base()
        }
    }

    /// Logo watermark with default styling.
    #[must_use]
    pub fn logo(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatermarkKind::Logo { path: path.into() },
            ..WatermarkSettings::default().base()
        }
    }

    /// Set the font size / logo side, clamped to `1..=MAX_SIZE`.
    #[must_use]
    pub fn with_size(mut self, size_px: u32) -> Self {
        self.size_px = size_px.clamp(1, MAX_SIZE);
        self
    }

    /// Set the fill color.
    #[must_use]
    pub fn with_color(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }

    /// Set the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the rotation, clamped to `0..=360`.
    #[must_use]
    pub fn with_rotation(mut self, degrees: u16) -> Self {
        self.rotation_degrees = degrees.min(MAX_ROTATION);
        self
    }

    /// Set the anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Enable or disable tiling.
    #[must_use]
    pub fn with_tiling(mut self, tiled: bool) -> Self {
        self.tiled = tiled;
        self
    }
}

/// Which kind of watermark [`WatermarkSettings`] will build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindChoice {
    /// Build a text watermark.
    #[default]
    Text,
    /// Build a logo watermark.
    Logo,
}

/// Editable watermark settings with clamping setters.
///
/// Numeric setters accept any integer and clamp it into range. Color input is
/// parsed; a malformed color is rejected and the previous color kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkSettings {
    kind: KindChoice,
    text: String,
    font_family: String,
    logo_path: Option<PathBuf>,
    size_px: u32,
    color: Rgb<u8>,
    opacity: u8,
    rotation_degrees: u16,
    anchor: Anchor,
    tiled: bool,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            kind: KindChoice::Text,
            text: "Enter Watermark Text".to_string(),
            font_family: "Arial".to_string(),
            logo_path: None,
            size_px: 24,
            color: Rgb([0xfe, 0xff, 0xff]),
            opacity: 64,
            rotation_degrees: 0,
            anchor: Anchor::Center,
            tiled: false,
        }
    }
}

impl WatermarkSettings {
    /// Create settings holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose between text and logo watermarks.
    pub fn set_kind(&mut self, kind: KindChoice) {
        self.kind = kind;
    }

    /// Set the watermark text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Set the font family.
    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.font_family = family.into();
    }

    /// Set the logo file.
    pub fn set_logo_path(&mut self, path: impl Into<PathBuf>) {
        self.logo_path = Some(path.into());
    }

    /// Set the size, clamped to `1..=MAX_SIZE`.
    pub fn set_size(&mut self, size_px: i64) {
        self.size_px =
            u32::try_from(size_px.clamp(1, i64::from(MAX_SIZE))).unwrap_or(MAX_SIZE);
    }

    /// Set the opacity, clamped to `0..=255`.
    pub fn set_opacity(&mut self, opacity: i64) {
        self.opacity = u8::try_from(opacity.clamp(0, 255)).unwrap_or(u8::MAX);
    }

    /// Set the rotation, clamped to `0..=360`.
    pub fn set_rotation(&mut self, degrees: i64) {
        self.rotation_degrees =
            u16::try_from(degrees.clamp(0, i64::from(MAX_ROTATION))).unwrap_or(MAX_ROTATION);
    }

    /// Set the anchor by name; unknown names select top-left.
    pub fn set_anchor_name(&mut self, name: &str) {
        self.anchor = Anchor::from_name(name);
    }

    /// Set the anchor.
    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
    }

    /// Enable or disable tiling.
    pub fn set_tiled(&mut self, tiled: bool) {
        self.tiled = tiled;
    }

    /// Set the fill color from a hex string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColorFormat`] and keeps the current color if
    /// `hex` is malformed.
    pub fn set_color(&mut self, hex: &str) -> Result<()> {
        self.color = parse_color(hex)?;
        Ok(())
    }

    /// The current fill color.
    #[must_use]
    pub fn color(&self) -> Rgb<u8> {
        self.color
    }

    /// The current opacity.
    #[must_use]
    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// The current rotation.
    #[must_use]
    pub fn rotation_degrees(&self) -> u16 {
        self.rotation_degrees
    }

    /// The current size.
    #[must_use]
    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    /// The current anchor.
    #[must_use]
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Snapshot the settings into an immutable [`WatermarkConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a text watermark has empty text or
    /// a logo watermark has no logo file selected.
    pub fn to_config(&self) -> Result<WatermarkConfig> {
        let kind = match self.kind {
            KindChoice::Text => {
                if self.text.is_empty() {
                    return Err(Error::InvalidConfig("watermark text is empty".to_string()));
                }
                WatermarkKind::Text {
                    text: self.text.clone(),
                    font_family: self.font_family.clone(),
                }
            }
            KindChoice::Logo => {
                let path = self
                    .logo_path
                    .clone()
                    .ok_or_else(|| Error::InvalidConfig("no logo file selected".to_string()))?;
                WatermarkKind::Logo { path }
            }
        };

        Ok(WatermarkConfig {
            kind,
            ..self.base()
        })
    }

    /// Styling fields with a placeholder kind.
    fn base(&self) -> WatermarkConfig {
        WatermarkConfig {
            kind: WatermarkKind::Text {
                text: self.text.clone(),
                font_family: self.font_family.clone(),
            },
            size_px: self.size_px,
            color: self.color,
            opacity: self.opacity,
            rotation_degrees: self.rotation_degrees,
            anchor: self.anchor,
            tiled: self.tiled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_application_state() {
        let config = WatermarkSettings::default().to_config().unwrap();
        assert_eq!(
            config.kind,
            WatermarkKind::Text {
                text: "Enter Watermark Text".to_string(),
                font_family: "Arial".to_string(),
            }
        );
        assert_eq!(config.size_px, 24);
        assert_eq!(config.color, Rgb([254, 255, 255]));
        assert_eq!(config.opacity, 64);
        assert_eq!(config.rotation_degrees, 0);
        assert_eq!(config.anchor, Anchor::Center);
        assert!(!config.tiled);
    }

    #[test]
    fn numeric_setters_clamp() {
        let mut settings = WatermarkSettings::new();

        settings.set_opacity(300);
        assert_eq!(settings.opacity(), 255);
        settings.set_opacity(-5);
        assert_eq!(settings.opacity(), 0);
        settings.set_opacity(128);
        assert_eq!(settings.opacity(), 128);

        settings.set_rotation(720);
        assert_eq!(settings.rotation_degrees(), 360);
        settings.set_rotation(-45);
        assert_eq!(settings.rotation_degrees(), 0);

        settings.set_size(0);
        assert_eq!(settings.size_px(), 1);
        settings.set_size(99_999_999_999);
        assert_eq!(settings.size_px(), MAX_SIZE);
        settings.set_size(i64::MAX);
        assert_eq!(settings.size_px(), MAX_SIZE);
    }

    #[test]
    fn bad_color_keeps_previous_color() {
        let mut settings = WatermarkSettings::new();
        settings.set_color("#102030").unwrap();
        assert!(matches!(
            settings.set_color("#zzzzzz"),
            Err(Error::InvalidColorFormat(_))
        ));
        assert_eq!(settings.color(), Rgb([0x10, 0x20, 0x30]));
    }

    #[test]
    fn unknown_anchor_name_selects_top_left() {
        let mut settings = WatermarkSettings::new();
        settings.set_anchor_name("bottom-right");
        assert_eq!(settings.anchor(), Anchor::BottomRight);
        settings.set_anchor_name("nowhere");
        assert_eq!(settings.anchor(), Anchor::TopLeft);
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut settings = WatermarkSettings::new();
        settings.set_text("");
        assert!(matches!(settings.to_config(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn logo_kind_requires_a_path() {
        let mut settings = WatermarkSettings::new();
        settings.set_kind(KindChoice::Logo);
        assert!(matches!(settings.to_config(), Err(Error::InvalidConfig(_))));

        settings.set_logo_path("assets/logo.png");
        let config = settings.to_config().unwrap();
        assert_eq!(
            config.kind,
            WatermarkKind::Logo {
                path: PathBuf::from("assets/logo.png")
            }
        );
    }

    #[test]
    fn builder_methods_clamp_and_keep_kind() {
        let config = WatermarkConfig::logo("logo.png")
            .with_size(0)
            .with_rotation(400)
            .with_opacity(10)
            .with_anchor(Anchor::TopRight)
            .with_tiling(true);
        assert_eq!(config.size_px, 1);
        assert_eq!(WatermarkConfig::logo("logo.png").with_size(u32::MAX).size_px, MAX_SIZE);
        assert_eq!(config.rotation_degrees, 360);
        assert_eq!(config.opacity, 10);
        assert_eq!(config.anchor, Anchor::TopRight);
        assert!(config.tiled);
        assert!(matches!(config.kind, WatermarkKind::Logo { .. }));
    }
}
