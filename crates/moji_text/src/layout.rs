//! Line layout
//!
//! Computes, for every line of a [`Document`], the string handed to the
//! backend's native text draw (emoji replaced by runs of spaces), its origin
//! after anchor and alignment, and the cursor offset of every node so that
//! bitmaps can be pasted over their placeholders.
//!
//! The placement rules reproduce the multiline text rules of the reference
//! raster backend: the line advance formula, the anchor shifts and the
//! alignment adjustments are applied exactly as that backend applies them.

use crate::node::{Document, NodeKind};
use crate::{LayoutError, Result};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Measurement capability
// ============================================================================

/// Measurement calls a raster backend must answer for layout
pub trait TextMeasure {
    /// Sized font handle
    type Font: Clone + Send + Sync + 'static;

    /// Font used when a call does not name one
    fn default_font(&self) -> Self::Font;

    /// Nominal font size in pixels
    fn font_size(&self, font: &Self::Font) -> f32;

    /// Advance width of `text` in pixels
    fn text_length(&self, font: &Self::Font, text: &str, shaping: &Shaping) -> f32;

    /// Bottom edge of the ink box of `text` anchored at its ascender ("la")
    fn text_height(&self, font: &Self::Font, text: &str, stroke_width: u32) -> f32;
}

// ============================================================================
// Style parameters
// ============================================================================

/// Text direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
    TopToBottom,
}

impl FromStr for Direction {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ltr" => Ok(Self::LeftToRight),
            "rtl" => Ok(Self::RightToLeft),
            "ttb" => Ok(Self::TopToBottom),
            other => Err(LayoutError::UnknownDirection(other.to_string())),
        }
    }
}

/// Shaping inputs passed through to the backend unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shaping {
    pub direction: Option<Direction>,
    /// OpenType feature tags, e.g. `"liga"` or `"-kern"`
    pub features: Vec<String>,
    /// BCP 47 language tag
    pub language: Option<String>,
}

/// Horizontal anchor component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAnchor {
    #[default]
    Left,
    Middle,
    Right,
}

/// Vertical anchor component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAnchor {
    /// Top of the ascender line
    #[default]
    Ascender,
    /// Top of the ink box (single line only)
    Top,
    /// Halfway between ascender and descender
    Middle,
    Baseline,
    /// Bottom of the ink box (single line only)
    Bottom,
    Descender,
}

/// Two-character anchor code, e.g. `"la"` or `"mm"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

impl FromStr for Anchor {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        let [h, v] = chars[..] else {
            return Err(LayoutError::AnchorLength(s.to_string()));
        };

        let horizontal = match h {
            'l' => HorizontalAnchor::Left,
            'm' => HorizontalAnchor::Middle,
            'r' => HorizontalAnchor::Right,
            _ => return Err(LayoutError::UnknownAnchor(s.to_string())),
        };
        let vertical = match v {
            'a' => VerticalAnchor::Ascender,
            't' => VerticalAnchor::Top,
            'm' => VerticalAnchor::Middle,
            's' => VerticalAnchor::Baseline,
            'b' => VerticalAnchor::Bottom,
            'd' => VerticalAnchor::Descender,
            _ => return Err(LayoutError::UnknownAnchor(s.to_string())),
        };

        Ok(Self {
            horizontal,
            vertical,
        })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = match self.horizontal {
            HorizontalAnchor::Left => 'l',
            HorizontalAnchor::Middle => 'm',
            HorizontalAnchor::Right => 'r',
        };
        let v = match self.vertical {
            VerticalAnchor::Ascender => 'a',
            VerticalAnchor::Top => 't',
            VerticalAnchor::Middle => 'm',
            VerticalAnchor::Baseline => 's',
            VerticalAnchor::Bottom => 'b',
            VerticalAnchor::Descender => 'd',
        };
        write!(f, "{h}{v}")
    }
}

/// Alignment of lines within the block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Align {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(LayoutError::InvalidAlign(other.to_string())),
        }
    }
}

/// Unvalidated layout parameters, as the caller supplied them
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Pixels between lines
    pub spacing: f32,
    /// Pixels between nodes of a line
    pub node_spacing: f32,
    pub emoji_scale_factor: f32,
    pub emoji_position_offset: (i32, i32),
    pub anchor: String,
    pub align: String,
    pub direction: Option<String>,
    pub features: Vec<String>,
    pub language: Option<String>,
    pub stroke_width: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            spacing: 4.0,
            node_spacing: 0.0,
            emoji_scale_factor: 1.0,
            emoji_position_offset: (0, 0),
            anchor: "la".to_string(),
            align: "left".to_string(),
            direction: None,
            features: Vec::new(),
            language: None,
            stroke_width: 0,
        }
    }
}

/// Layout parameters that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    pub spacing: f32,
    pub node_spacing: f32,
    pub emoji_scale_factor: f32,
    pub emoji_position_offset: (i32, i32),
    pub anchor: Anchor,
    pub align: Align,
    pub shaping: Shaping,
    pub stroke_width: u32,
}

impl LayoutParams {
    /// Check the parameters against the text to be drawn
    ///
    /// Fails on anchors that are not two known characters, top/bottom
    /// anchors or `ttb` direction with multi-line text, and unknown align
    /// values.
    pub fn validate(&self, text: &str) -> Result<ResolvedParams> {
        let anchor: Anchor = self.anchor.parse()?;
        // Only '\n' counts here; other line breaks still split lines in layout
        let multiline = text.contains('\n');

        if multiline && matches!(anchor.vertical, VerticalAnchor::Top | VerticalAnchor::Bottom) {
            return Err(LayoutError::MultilineAnchor(self.anchor.clone()));
        }

        let direction = self
            .direction
            .as_deref()
            .map(Direction::from_str)
            .transpose()?;
        if multiline && direction == Some(Direction::TopToBottom) {
            return Err(LayoutError::MultilineVertical);
        }

        let align: Align = self.align.parse()?;

        Ok(ResolvedParams {
            spacing: self.spacing,
            node_spacing: self.node_spacing,
            emoji_scale_factor: self.emoji_scale_factor,
            emoji_position_offset: self.emoji_position_offset,
            anchor,
            align,
            shaping: Shaping {
                direction,
                features: self.features.clone(),
                language: self.language.clone(),
            },
            stroke_width: self.stroke_width,
        })
    }
}

// ============================================================================
// Layout output
// ============================================================================

/// Cursor entry for one node of a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeCursor {
    /// Distance from the line's paste origin to the node's left edge
    pub offset: f32,
    /// Measured width of the node's text or placeholder run
    pub advance: f32,
}

/// One laid out line
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    /// Text for the native draw call, emoji replaced by spaces
    pub draw_string: String,
    /// Measured width of `draw_string`
    pub width: f32,
    /// Draw position after anchor and alignment adjustments
    pub origin: (f32, f32),
    /// One entry per node, in node order
    pub cursors: Vec<NodeCursor>,
}

/// Result of laying out a document
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<LayoutLine>,
    /// Vertical distance between consecutive line origins
    pub line_advance: f32,
    /// Widest line
    pub max_width: f32,
    /// Pixel width emoji bitmaps are resized to
    pub emoji_size: u32,
    /// Placeholder run substituted for each emoji
    pub placeholder: String,
}

/// Round half to even, the rounding rule of the reference backend
pub fn round_half_even(value: f32) -> f32 {
    if (value - value.trunc()).abs() == 0.5 {
        2.0 * (value / 2.0).round()
    } else {
        value.round()
    }
}

/// Lay out `doc` at `position`
pub fn layout<M: TextMeasure + ?Sized>(
    doc: &Document,
    measure: &M,
    font: &M::Font,
    position: (f32, f32),
    params: &ResolvedParams,
) -> TextLayout {
    let shaping = &params.shaping;
    let font_size = measure.font_size(font);

    let line_advance = measure.text_height(font, "A", params.stroke_width)
        + params.stroke_width as f32
        + params.spacing;

    let emoji_size = round_half_even(params.emoji_scale_factor * font_size).max(0.0);
    let substitution_width = round_half_even(
        emoji_size + params.emoji_position_offset.0 as f32 + 2.0 * params.node_spacing,
    );
    let space_width = measure.text_length(font, " ", shaping);
    let space_count = if space_width > 0.0 {
        round_half_even(substitution_width / space_width).max(0.0) as usize
    } else {
        tracing::warn!("Space has no advance width, emoji placeholders will be empty");
        0
    };
    let placeholder = " ".repeat(space_count);
    let placeholder_width = measure.text_length(font, &placeholder, shaping);

    // First pass: draw strings and their widths
    let mut draw_strings = Vec::with_capacity(doc.lines.len());
    let mut max_width = 0.0f32;
    for line in &doc.lines {
        let draw_string: String = line
            .nodes
            .iter()
            .map(|node| match node.kind() {
                NodeKind::Text => node.content(),
                NodeKind::UnicodeEmoji | NodeKind::DiscordEmoji => placeholder.as_str(),
            })
            .collect();
        let width = measure.text_length(font, &draw_string, shaping);
        max_width = max_width.max(width);
        draw_strings.push((draw_string, width));
    }

    let (start_x, mut y) = position;
    let extra_lines = doc.lines.len().saturating_sub(1) as f32;
    match params.anchor.vertical {
        VerticalAnchor::Middle => y -= extra_lines * line_advance / 2.0,
        VerticalAnchor::Descender => y -= extra_lines * line_advance,
        _ => {}
    }

    // Second pass: origins and node cursors
    let mut lines = Vec::with_capacity(doc.lines.len());
    for (line, (draw_string, width)) in doc.lines.iter().zip(draw_strings) {
        let difference = max_width - width;
        let mut x = start_x;

        match params.anchor.horizontal {
            HorizontalAnchor::Left => {}
            HorizontalAnchor::Middle => x -= difference / 2.0,
            HorizontalAnchor::Right => x -= difference,
        }
        match params.align {
            Align::Left => {}
            Align::Center => x += difference / 2.0,
            Align::Right => x += difference,
        }

        let mut offset = 0.0f32;
        let cursors = line
            .nodes
            .iter()
            .map(|node| {
                // Text advances in whole pixels, as the native draw places glyph runs
                let advance = if node.is_text() {
                    measure.text_length(font, node.content(), shaping).trunc()
                } else {
                    placeholder_width
                };
                let cursor = NodeCursor { offset, advance };
                offset += params.node_spacing + advance;
                cursor
            })
            .collect();

        tracing::trace!(
            "layout line: origin=({:.1}, {:.1}) width={:.1} nodes={}",
            x,
            y,
            width,
            line.nodes.len()
        );

        lines.push(LayoutLine {
            draw_string,
            width,
            origin: (x, y),
            cursors,
        });
        y += line_advance;
    }

    TextLayout {
        lines,
        line_advance,
        max_width,
        emoji_size: emoji_size as u32,
        placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::parse;

    /// Every char is 10px wide, a space 5px; "A" is 15px tall
    struct FixedMeasure;

    impl TextMeasure for FixedMeasure {
        type Font = f32;

        fn default_font(&self) -> f32 {
            20.0
        }

        fn font_size(&self, font: &f32) -> f32 {
            *font
        }

        fn text_length(&self, _font: &f32, text: &str, _shaping: &Shaping) -> f32 {
            text.chars().map(|c| if c == ' ' { 5.0 } else { 10.0 }).sum()
        }

        fn text_height(&self, _font: &f32, _text: &str, stroke_width: u32) -> f32 {
            15.0 + stroke_width as f32
        }
    }

    fn resolve(text: &str, params: LayoutParams) -> ResolvedParams {
        params.validate(text).unwrap()
    }

    #[test]
    fn test_anchor_parse() {
        assert_eq!("la".parse::<Anchor>().unwrap(), Anchor::default());
        assert_eq!("mm".parse::<Anchor>().unwrap().to_string(), "mm");
        assert!(matches!("l".parse::<Anchor>(), Err(LayoutError::AnchorLength(_))));
        assert!(matches!("lax".parse::<Anchor>(), Err(LayoutError::AnchorLength(_))));
        assert!(matches!("xa".parse::<Anchor>(), Err(LayoutError::UnknownAnchor(_))));
    }

    #[test]
    fn test_validation_rules() {
        let params = |anchor: &str| LayoutParams {
            anchor: anchor.to_string(),
            ..Default::default()
        };

        assert!(params("la").validate("a\nb").is_ok());
        assert!(params("ms").validate("a\nb").is_ok());
        assert_eq!(
            params("mb").validate("a\nb"),
            Err(LayoutError::MultilineAnchor("mb".to_string()))
        );
        assert!(params("lt").validate("a\nb").is_err());
        assert!(params("mb").validate("single").is_ok());

        let ttb = LayoutParams {
            direction: Some("ttb".to_string()),
            ..Default::default()
        };
        assert_eq!(ttb.validate("a\nb"), Err(LayoutError::MultilineVertical));
        assert!(ttb.validate("ab").is_ok());

        let justify = LayoutParams {
            align: "justify".to_string(),
            ..Default::default()
        };
        assert!(matches!(justify.validate("a"), Err(LayoutError::InvalidAlign(_))));
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(3.5), 4.0);
        assert_eq!(round_half_even(-2.5), -2.0);
        assert_eq!(round_half_even(2.4), 2.0);
        assert_eq!(round_half_even(2.6), 3.0);
    }

    #[test]
    fn test_line_advance_formula() {
        let doc = parse("a\nb");
        let params = resolve(
            "a\nb",
            LayoutParams {
                stroke_width: 2,
                ..Default::default()
            },
        );
        let layout = layout(&doc, &FixedMeasure, &20.0, (0.0, 0.0), &params);

        // text_height("A", 2) + 2 + spacing
        assert_eq!(layout.line_advance, 17.0 + 2.0 + 4.0);
        assert_eq!(layout.lines[1].origin.1, 23.0);
    }

    #[test]
    fn test_emoji_substitution() {
        let text = "Hi \u{1F600}";
        let doc = parse(text);
        let params = resolve(text, LayoutParams::default());
        let layout = layout(&doc, &FixedMeasure, &20.0, (0.0, 0.0), &params);

        // 20px emoji / 5px space = 4 spaces
        assert_eq!(layout.emoji_size, 20);
        assert_eq!(layout.placeholder, "    ");
        assert_eq!(layout.lines[0].draw_string, "Hi     ");
        assert_eq!(layout.lines[0].width, 45.0);

        let cursors = &layout.lines[0].cursors;
        assert_eq!(cursors[0], NodeCursor { offset: 0.0, advance: 25.0 });
        assert_eq!(cursors[1], NodeCursor { offset: 25.0, advance: 20.0 });
    }

    #[test]
    fn test_substitution_includes_offset_and_node_spacing() {
        let text = "\u{1F600}x";
        let doc = parse(text);
        let params = resolve(
            text,
            LayoutParams {
                node_spacing: 3.0,
                emoji_position_offset: (4, 0),
                emoji_scale_factor: 1.5,
                ..Default::default()
            },
        );
        let layout = layout(&doc, &FixedMeasure, &20.0, (0.0, 0.0), &params);

        // round(30 + 4 + 6) = 40px -> 8 spaces
        assert_eq!(layout.emoji_size, 30);
        assert_eq!(layout.placeholder.len(), 8);

        let cursors = &layout.lines[0].cursors;
        assert_eq!(cursors[1].offset, 40.0 + 3.0);
    }

    #[test]
    fn test_center_align_centers_short_line() {
        let text = "abcd\nab";
        let doc = parse(text);
        let params = resolve(
            text,
            LayoutParams {
                align: "center".to_string(),
                ..Default::default()
            },
        );
        let layout = layout(&doc, &FixedMeasure, &20.0, (100.0, 0.0), &params);

        let expected = (layout.max_width - layout.lines[1].width) / 2.0;
        assert!((layout.lines[1].origin.0 - 100.0 - expected).abs() <= 1.0);
        assert_eq!(layout.lines[0].origin.0, 100.0);
    }

    #[test]
    fn test_anchor_then_align_applied_in_order() {
        let text = "abcd\nab";
        let doc = parse(text);
        let params = resolve(
            text,
            LayoutParams {
                anchor: "ra".to_string(),
                align: "right".to_string(),
                ..Default::default()
            },
        );
        let layout = layout(&doc, &FixedMeasure, &20.0, (100.0, 0.0), &params);

        // anchor subtracts the difference, align adds it back
        assert_eq!(layout.lines[1].origin.0, 100.0);
    }

    #[test]
    fn test_vertical_anchor_shifts_block() {
        let text = "a\nb\nc";
        let doc = parse(text);

        let middle = resolve(
            text,
            LayoutParams {
                anchor: "lm".to_string(),
                ..Default::default()
            },
        );
        let layout_m = layout(&doc, &FixedMeasure, &20.0, (0.0, 100.0), &middle);
        assert_eq!(layout_m.lines[0].origin.1, 100.0 - layout_m.line_advance);

        let descender = resolve(
            text,
            LayoutParams {
                anchor: "ld".to_string(),
                ..Default::default()
            },
        );
        let layout_d = layout(&doc, &FixedMeasure, &20.0, (0.0, 100.0), &descender);
        assert_eq!(layout_d.lines[2].origin.1, 100.0);
    }

    #[test]
    fn test_empty_document() {
        let doc = parse("");
        let params = resolve("", LayoutParams::default());
        let layout = layout(&doc, &FixedMeasure, &20.0, (0.0, 0.0), &params);
        assert!(layout.lines.is_empty());
        assert_eq!(layout.max_width, 0.0);
    }

    /// Every char, space included, is 6.3px wide
    struct FractionalMeasure;

    impl TextMeasure for FractionalMeasure {
        type Font = f32;

        fn default_font(&self) -> f32 {
            20.0
        }

        fn font_size(&self, font: &f32) -> f32 {
            *font
        }

        fn text_length(&self, _font: &f32, text: &str, _shaping: &Shaping) -> f32 {
            text.chars().count() as f32 * 6.3
        }

        fn text_height(&self, _font: &f32, _text: &str, _stroke_width: u32) -> f32 {
            15.0
        }
    }

    #[test]
    fn test_text_advance_truncated_to_whole_pixels() {
        let text = "Hi \u{1F600}!";
        let doc = parse(text);
        let params = resolve(text, LayoutParams::default());
        let layout = layout(&doc, &FractionalMeasure, &20.0, (0.0, 0.0), &params);

        // "Hi " measures 18.9px; 20 / 6.3 rounds to 3 spaces
        assert_eq!(layout.placeholder, "   ");
        let cursors = &layout.lines[0].cursors;
        assert_eq!(cursors[0].advance, 18.0);
        assert_eq!(cursors[1].offset, 18.0);
        assert_eq!(cursors[2].offset, 18.0 + cursors[1].advance);
    }

    #[test]
    fn test_non_newline_breaks_skip_multiline_checks() {
        let text = "a\rb";
        let params = LayoutParams {
            anchor: "mb".to_string(),
            ..Default::default()
        };
        let resolved = params.validate(text).unwrap();

        let doc = parse(text);
        let layout = layout(&doc, &FixedMeasure, &20.0, (0.0, 50.0), &resolved);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].origin.1, 50.0);
        assert_eq!(layout.lines[1].origin.1, 50.0 + layout.line_advance);

        assert!(params.validate("a\nb").is_err());
    }
}
