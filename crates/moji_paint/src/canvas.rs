//! Canvas capability

use image::{Rgba, RgbaImage};
use moji_text::{Align, Anchor, Shaping, TextMeasure};

/// Style of one native text draw, passed through to the backend unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub fill: Rgba<u8>,
    pub anchor: Anchor,
    /// Line spacing, meaningful only to backends drawing multi-line strings
    pub spacing: f32,
    pub align: Align,
    pub shaping: Shaping,
    pub stroke_width: u32,
    /// Stroke colour, the fill colour when unset
    pub stroke_fill: Option<Rgba<u8>>,
    /// Draw colour glyphs (emoji fonts) with their own colours
    pub embedded_color: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: Rgba([255, 255, 255, 255]),
            anchor: Anchor::default(),
            spacing: 4.0,
            align: Align::default(),
            shaping: Shaping::default(),
            stroke_width: 0,
            stroke_fill: None,
            embedded_color: false,
        }
    }
}

/// Raster surface the compositor draws on
pub trait Canvas: TextMeasure {
    /// Offset from the anchor point to the top-left corner of the ink mask
    /// the backend would render for `text`
    fn ink_offset(
        &self,
        font: &Self::Font,
        text: &str,
        anchor: Anchor,
        shaping: &Shaping,
    ) -> (i32, i32);

    /// Draw a single line of text with `position` at the style's anchor
    fn draw_text(&mut self, position: (f32, f32), text: &str, font: &Self::Font, style: &TextStyle);

    /// Paste `bitmap` with its top-left at `position`, using its alpha as mask
    fn paste(&mut self, bitmap: &RgbaImage, position: (i32, i32));
}
