//! Painting for moji
//!
//! This crate provides:
//! - The [`Canvas`] capability the compositor draws through
//! - [`RasterCanvas`], a canvas over an RGBA image (rustybuzz shaping,
//!   swash rasterization, fontdb default font)
//! - Emoji bitmap decoding and resizing
//! - The compositor interleaving one text draw per line with bitmap pastes

pub mod bitmap;
pub mod canvas;
pub mod compositor;
pub mod font;
pub mod raster;

pub use bitmap::{paste_with_alpha, prepare_bitmap, prepare_bitmaps};
pub use canvas::{Canvas, TextStyle};
pub use compositor::{composite, CompositeStats};
pub use font::{FontFace, FontMetrics};
pub use image::{Rgba, RgbaImage};
pub use raster::RasterCanvas;

use thiserror::Error;

/// Painting errors
#[derive(Error, Debug)]
pub enum PaintError {
    #[error("Failed to load font: {0}")]
    FontLoad(String),

    #[error("Failed to parse font: {0}")]
    FontParse(String),

    #[error("No default system font available")]
    NoSystemFont,

    #[error("Failed to decode emoji image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Emoji image has no pixels")]
    EmptyBitmap,
}

pub type Result<T> = std::result::Result<T, PaintError>;
