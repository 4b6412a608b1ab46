//! Apply text or logo watermarks to raster images.
//!
//! A watermark is painted onto a transparent overlay the size of the image,
//! either once at one of nine anchors or tiled across the whole image. The
//! overlay is rotated about its center and alpha-composited over the image.
//!
//! # Quick Start
//!
//! ```no_run
//! use image_watermark::{Anchor, WatermarkConfig, WatermarkEngine};
//!
//! let engine: WatermarkEngine = WatermarkEngine::default();
//! let config = WatermarkConfig::text("© 2025 Example", "DejaVuSans")
//!     .with_size(32)
//!     .with_opacity(96)
//!     .with_anchor(Anchor::BottomRight);
//!
//! let mut img = image_watermark::load_image("photo.jpg".as_ref()).unwrap();
//! engine.apply(&mut img, &config).unwrap();
//! image_watermark::save_image(&img, "photo_watermarked.png".as_ref()).unwrap();
//! ```
//!
//! # Logos
//!
//! Logo watermarks are resized to a `size_px` square. Opacity scales the
//! logo's own alpha channel, so transparent regions of the logo stay
//! transparent.
//!
//! ```no_run
//! use image_watermark::{WatermarkConfig, WatermarkEngine};
//!
//! let engine: WatermarkEngine = WatermarkEngine::default();
//! let config = WatermarkConfig::logo("logo.png").with_size(64).with_tiling(true);
//! engine
//!     .process_file("photo.png".as_ref(), "tiled.png".as_ref(), &config)
//!     .unwrap();
//! ```

#![deny(missing_docs)]

pub mod blending;
pub mod color;
pub mod compositor;
pub mod config;
mod engine;
pub mod error;
pub mod font;
pub mod position;

pub use color::{hex_to_rgba, parse_color, to_hex};
pub use compositor::apply_watermark;
pub use config::{KindChoice, WatermarkConfig, WatermarkKind, WatermarkSettings};
pub use engine::{
    default_output_path, is_supported_image, load_image, preview, preview_dimensions, save_image,
    WatermarkEngine, PREVIEW_MAX_SIDE,
};
pub use error::{Error, Result};
pub use font::{FontBackend, FontDirectory};
pub use position::{anchor_position, Anchor};
