//! Watermark placement geometry.
//!
//! Single watermarks snap to one of nine anchors with a fixed margin from the
//! image edges. Tiled watermarks repeat on a grid whose pitch is the
//! watermark size plus a fixed gap, starting at the image origin.

use std::fmt;
use std::str::FromStr;

/// Distance between an anchored watermark and the image edges, in pixels.
pub const MARGIN: i32 = 10;

/// Gap between neighbouring tiles, in pixels.
pub const TILE_GAP: u32 = 10;

/// One of the nine named watermark anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Anchor {
    /// Top-left corner.
    TopLeft,
    /// Top edge, horizontally centered.
    TopCenter,
    /// Top-right corner.
    TopRight,
    /// Left edge, vertically centered.
    CenterLeft,
    /// Image center.
    #[default]
    Center,
    /// Right edge, vertically centered.
    CenterRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom edge, horizontally centered.
    BottomCenter,
    /// Bottom-right corner.
    BottomRight,
}

impl Anchor {
    /// All anchors in reading order.
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// The kebab-case name of this anchor, e.g. `"bottom-right"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::CenterLeft => "center-left",
            Anchor::Center => "center",
            Anchor::CenterRight => "center-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }

    /// Look up an anchor by name, falling back to [`Anchor::TopLeft`] for
    /// unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Anchor {
        name.parse().unwrap_or(Anchor::TopLeft)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown anchor name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAnchor(pub String);

impl fmt::Display for UnknownAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown anchor: {}", self.0)
    }
}

impl std::error::Error for UnknownAnchor {}

impl FromStr for Anchor {
    type Err = UnknownAnchor;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim();
        Anchor::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownAnchor(s.to_string()))
    }
}

/// Top-left corner for a `(wm_w, wm_h)` watermark placed at `anchor` on a
/// `(img_w, img_h)` image.
///
/// Centering uses floor division. Coordinates go negative when the watermark
/// is larger than the image.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn anchor_position(anchor: Anchor, wm_w: u32, wm_h: u32, img_w: u32, img_h: u32) -> (i32, i32) {
    let (w, h) = (wm_w as i32, wm_h as i32);
    let (img_w, img_h) = (img_w as i32, img_h as i32);

    let left = MARGIN;
    let center_x = (img_w - w).div_euclid(2);
    let right = img_w - w - MARGIN;
    let top = MARGIN;
    let center_y = (img_h - h).div_euclid(2);
    let bottom = img_h - h - MARGIN;

    match anchor {
        Anchor::TopLeft => (left, top),
        Anchor::TopCenter => (center_x, top),
        Anchor::TopRight => (right, top),
        Anchor::CenterLeft => (left, center_y),
        Anchor::Center => (center_x, center_y),
        Anchor::CenterRight => (right, center_y),
        Anchor::BottomLeft => (left, bottom),
        Anchor::BottomCenter => (center_x, bottom),
        Anchor::BottomRight => (right, bottom),
    }
}

/// Origins of every tile needed to cover an `(img_w, img_h)` image with a
/// `(wm_w, wm_h)` watermark, in row-major order.
///
/// The grid starts at `(0, 0)` and steps by the watermark size plus
/// [`TILE_GAP`] in each direction.
#[allow(clippy::cast_possible_wrap)]
pub fn tile_origins(
    wm_w: u32,
    wm_h: u32,
    img_w: u32,
    img_h: u32,
) -> impl Iterator<Item = (i32, i32)> {
    let step_x = (wm_w + TILE_GAP) as usize;
    let step_y = (wm_h + TILE_GAP) as usize;
    (0..img_h)
        .step_by(step_y)
        .flat_map(move |y| (0..img_w).step_by(step_x).map(move |x| (x as i32, y as i32)))
}

/// Number of tiles [`tile_origins`] yields.
#[must_use]
pub fn tile_count(wm_w: u32, wm_h: u32, img_w: u32, img_h: u32) -> usize {
    let cols = img_w.div_ceil(wm_w + TILE_GAP);
    let rows = img_h.div_ceil(wm_h + TILE_GAP);
    cols as usize * rows as usize
}
