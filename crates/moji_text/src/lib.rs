//! Emoji-aware text tokenizing and layout for moji
//!
//! This crate provides:
//! - Tokenizing strings into lines of text, unicode emoji and custom emoji nodes
//! - The measurement capability a raster backend must offer
//! - Line layout (placeholder substitution, anchor/alignment, node cursors)
//! - Whole-text size estimation

pub mod layout;
pub mod matcher;
pub mod measure;
pub mod node;

pub use layout::{
    layout, round_half_even, Align, Anchor, Direction, HorizontalAnchor, LayoutLine,
    LayoutParams, NodeCursor, ResolvedParams, Shaping, TextLayout, TextMeasure, VerticalAnchor,
};
pub use matcher::EmojiMatcher;
pub use measure::text_size;
pub use node::{parse, parse_with, split_lines, Document, Line, Node, NodeKind};

use thiserror::Error;

/// Layout validation errors
///
/// These are raised before anything is drawn, so a failing call never
/// touches the canvas.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("anchor must be a 2 character string, got {0:?}")]
    AnchorLength(String),

    #[error("unknown anchor {0:?}")]
    UnknownAnchor(String),

    #[error("anchor {0:?} not supported for multiline text")]
    MultilineAnchor(String),

    #[error("ttb direction is unsupported for multiline text")]
    MultilineVertical,

    #[error("unknown direction {0:?}")]
    UnknownDirection(String),

    #[error("align must be \"left\", \"center\" or \"right\", got {0:?}")]
    InvalidAlign(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
