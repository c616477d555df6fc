//! Color-key transparency for raster images
//!
//! Turns every pixel whose red, green and blue channels are each within
//! `tolerance` of a target color fully transparent, leaving its color
//! channels untouched. Everything else passes through unchanged.
//!
//! # Examples
//! ```no_run
//! use chroma_key::{load_rgba, ChromaKeyConfig, Effect};
//! use image::Rgb;
//!
//! fn main() -> chroma_key::Result<()> {
//!     let mut img = load_rgba("photo.png")?;
//!     ChromaKeyConfig::new()
//!         .with_target(Rgb([255, 255, 255]))
//!         .with_tolerance(10)
//!         .apply(&mut img)?;
//!     Ok(())
//! }
//! ```

pub mod chroma_key;

pub use chroma_key::{ChromaKeyConfig, MAX_TOLERANCE, is_keyed, render, render_raw};

use image::RgbaImage;
use std::path::{Path, PathBuf};

/// File extensions offered when picking a source image
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to load image {}: {reason}", path.display())]
    ImageLoad { path: PathBuf, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub trait Effect {
    fn apply(&self, image: &mut RgbaImage) -> Result<()>;
}

/// Returns true when `path` points at an existing regular file
pub fn is_readable_image(path: impl AsRef<Path>) -> bool {
    match std::fs::metadata(path) {
        Ok(md) => md.is_file(),
        _ => false,
    }
}

/// Decode `path` and convert it to 8-bit RGBA
///
/// Opaque formats (JPEG, 24-bit BMP) come back with alpha 255.
pub fn load_rgba(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let path = path.as_ref();

    if !is_readable_image(path) {
        return Err(Error::ImageLoad {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }

    let img = image::open(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    log::debug!(
        "decoded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );

    Ok(img.to_rgba8())
}
