//! Error types for the image-watermark crate.

use std::path::PathBuf;

/// Errors that can occur while configuring or applying a watermark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A color string is not a 3- or 6-digit hex value.
    #[error("invalid color format: {0:?} (expected #RGB or #RRGGBB)")]
    InvalidColorFormat(String),

    /// An input image or logo file does not exist.
    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// The requested font family is not available from the font backend.
    #[error("font not found: {0}")]
    FontNotFound(String),

    /// A font file was found but could not be parsed.
    #[error("failed to load font {}: {reason}", path.display())]
    FontLoad {
        /// Path of the font file.
        path: PathBuf,
        /// Parser error message.
        reason: String,
    },

    /// The watermark configuration cannot be used as given.
    #[error("invalid watermark configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
