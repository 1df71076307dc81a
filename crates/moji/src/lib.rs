//! moji: text with inline emoji on raster images
//!
//! A [`Session`] tokenizes a string into text, unicode emoji and custom
//! emoji, lays it out the way a native multi-line text draw would, fetches
//! emoji images through a layered cache and composites them over space
//! placeholders left in the drawn text.
//!
//! # Example
//!
//! ```ignore
//! use moji::{DrawOptions, RasterCanvas, RgbaImage, Session, SessionConfig};
//!
//! let mut session = Session::open(SessionConfig::default())?;
//! let mut canvas = RasterCanvas::with_system_font(RgbaImage::new(300, 80), 24.0)?;
//!
//! let report = session
//!     .draw_text(&mut canvas, (10.0, 10.0), "Hello \u{1F44B}", &DrawOptions::default())
//!     .await?;
//! assert!(report.is_complete());
//!
//! session.close()?;
//! canvas.into_image().save("hello.png")?;
//! ```

mod config;
mod options;
mod report;
mod session;

pub use config::SessionConfig;
pub use options::DrawOptions;
pub use report::{AssetFailure, FailureReason, RenderReport};
pub use session::Session;

pub use moji_paint::{Canvas, FontFace, PaintError, RasterCanvas, Rgba, RgbaImage, TextStyle};
pub use moji_source::{
    AssetCache, Bytes, DurableStore, EmojiCdnSource, EmojiSource, EmojiStyle, Fetcher, FsStore,
    HttpFetcher, SourceError,
};
pub use moji_text::{
    parse, parse_with, Anchor, Document, LayoutError, Node, NodeKind, Shaping, TextMeasure,
};

use thiserror::Error;

/// Session errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("session is closed")]
    SessionClosed,

    #[error("session was already closed")]
    AlreadyClosed,

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Paint(#[from] PaintError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("bitmap worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, Error>;
