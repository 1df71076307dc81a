//! Whole-text size estimation
//!
//! Cheaper than a full layout: emoji count as a square of the scaled font
//! size and lines advance by `font_size + spacing`.

use crate::layout::{Shaping, TextMeasure};
use crate::node::Document;

/// Width and height of `doc` when rendered
///
/// Widths of text nodes and emoji are truncated to whole pixels before
/// summing. Empty documents measure `(0, 0)`.
pub fn text_size<M: TextMeasure + ?Sized>(
    doc: &Document,
    measure: &M,
    font: &M::Font,
    spacing: i32,
    emoji_scale_factor: f32,
) -> (u32, u32) {
    if doc.lines.is_empty() {
        return (0, 0);
    }

    let font_size = measure.font_size(font);
    let emoji_width = (emoji_scale_factor * font_size).trunc().max(0.0) as i64;
    let shaping = Shaping::default();

    let width = doc
        .lines
        .iter()
        .map(|line| {
            line.nodes
                .iter()
                .map(|node| {
                    if node.is_text() {
                        measure.text_length(font, node.content(), &shaping).trunc() as i64
                    } else {
                        emoji_width
                    }
                })
                .sum::<i64>()
        })
        .max()
        .unwrap_or(0);

    let line_count = doc.lines.len() as i64;
    let height = line_count * (spacing as i64 + font_size.trunc() as i64) - spacing as i64;

    (width.max(0) as u32, height.max(0) as u32)
}
