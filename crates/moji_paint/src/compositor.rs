//! Interleaves native text draws with emoji bitmap pastes
//!
//! Each non-empty line is drawn once with its placeholder string, then the
//! line's bitmaps are pasted over their placeholders in node order. Paste
//! positions start from the truncated line origin plus the backend's ink
//! offset for that line, so bitmaps land where the backend put the text.

use crate::canvas::{Canvas, TextStyle};
use image::RgbaImage;
use moji_text::{round_half_even, TextLayout};

/// Counts of what a composite pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    pub text_draws: usize,
    pub pastes: usize,
}

/// Draw `layout` onto `canvas`
///
/// `bitmaps[line][node]` holds the prepared bitmap of each emoji node; text
/// nodes and emoji without an image are `None` and leave their placeholder
/// blank.
pub fn composite<C: Canvas + ?Sized>(
    canvas: &mut C,
    layout: &TextLayout,
    font: &C::Font,
    style: &TextStyle,
    bitmaps: &[Vec<Option<RgbaImage>>],
    emoji_position_offset: (i32, i32),
) -> CompositeStats {
    let mut stats = CompositeStats::default();
    let (offset_x, offset_y) = emoji_position_offset;

    for (index, line) in layout.lines.iter().enumerate() {
        if !line.draw_string.is_empty() {
            canvas.draw_text(line.origin, &line.draw_string, font, style);
            stats.text_draws += 1;
        }

        let Some(line_bitmaps) = bitmaps.get(index) else {
            continue;
        };
        if line_bitmaps.iter().all(Option::is_none) {
            continue;
        }

        let (ink_x, ink_y) =
            canvas.ink_offset(font, &line.draw_string, style.anchor, &style.shaping);
        let base_x = line.origin.0.trunc() + ink_x as f32;
        let base_y = line.origin.1.trunc() + ink_y as f32;

        for (cursor, bitmap) in line.cursors.iter().zip(line_bitmaps) {
            let Some(bitmap) = bitmap else {
                continue;
            };
            let x = round_half_even(base_x + cursor.offset + offset_x as f32) as i32;
            let y = round_half_even(base_y + offset_y as f32) as i32;
            canvas.paste(bitmap, (x, y));
            stats.pastes += 1;
        }
    }

    tracing::trace!(
        "composite: {} text draws, {} pastes",
        stats.text_draws,
        stats.pastes
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use moji_text::{layout, parse, Anchor, LayoutParams, Shaping, TextMeasure};

    #[derive(Debug, PartialEq)]
    enum Call {
        Draw((f32, f32), String),
        Paste((i32, i32), u32),
    }

    /// Every char 10px wide, a space 5px, ink starting 2px below the anchor
    #[derive(Default)]
    struct RecordingCanvas {
        calls: Vec<Call>,
    }

    impl TextMeasure for RecordingCanvas {
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

    impl Canvas for RecordingCanvas {
        fn ink_offset(
            &self,
            _font: &f32,
            _text: &str,
            _anchor: Anchor,
            _shaping: &Shaping,
        ) -> (i32, i32) {
            (0, 2)
        }

        fn draw_text(&mut self, position: (f32, f32), text: &str, _font: &f32, _style: &TextStyle) {
            self.calls.push(Call::Draw(position, text.to_string()));
        }

        fn paste(&mut self, bitmap: &RgbaImage, position: (i32, i32)) {
            self.calls.push(Call::Paste(position, bitmap.width()));
        }
    }

    /// 20px emoji over 5px spaces
    const PLACEHOLDER: &str = "    ";

    fn run(text: &str, params: LayoutParams, present: bool) -> Vec<Call> {
        let mut canvas = RecordingCanvas::default();
        let doc = parse(text);
        let resolved = params.validate(text).unwrap();
        let laid_out = layout(&doc, &canvas, &20.0, (3.7, 10.0), &resolved);

        let bitmaps: Vec<Vec<Option<RgbaImage>>> = doc
            .lines
            .iter()
            .map(|line| {
                line.nodes
                    .iter()
                    .map(|node| {
                        (present && !node.is_text())
                            .then(|| RgbaImage::new(laid_out.emoji_size, laid_out.emoji_size))
                    })
                    .collect()
            })
            .collect();

        composite(
            &mut canvas,
            &laid_out,
            &20.0,
            &TextStyle::default(),
            &bitmaps,
            resolved.emoji_position_offset,
        );
        canvas.calls
    }

    #[test]
    fn test_text_then_pastes_in_node_order() {
        let calls = run("Hi \u{1F600} x \u{1F600}", LayoutParams::default(), true);

        // "Hi " is 25px, placeholder is 4 spaces (20px), " x " is 20px
        assert_eq!(
            calls,
            vec![
                Call::Draw((3.7, 10.0), format!("Hi {PLACEHOLDER} x {PLACEHOLDER}")),
                Call::Paste((28, 12), 20),
                Call::Paste((68, 12), 20),
            ]
        );
    }

    #[test]
    fn test_missing_bitmaps_leave_placeholders_blank() {
        let calls = run("a \u{1F600}\nb", LayoutParams::default(), false);
        assert_eq!(
            calls,
            vec![
                Call::Draw((3.7, 10.0), format!("a {PLACEHOLDER}")),
                Call::Draw((3.7, 29.0), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_emoji_only_line_still_draws_placeholder() {
        let calls = run("\u{1F600}", LayoutParams::default(), true);
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], Call::Draw(_, s) if s == PLACEHOLDER));
        assert_eq!(calls[1], Call::Paste((3, 12), 20));
    }

    #[test]
    fn test_position_offset_and_node_spacing() {
        let params = LayoutParams {
            node_spacing: 5.0,
            emoji_position_offset: (2, -3),
            ..LayoutParams::default()
        };
        let calls = run("a\u{1F600}", params, true);
        // "a" 10px + node spacing 5; x = 3 + 15 + 2, y = 10 + 2 - 3
        assert_eq!(calls.last(), Some(&Call::Paste((20, 9), 20)));
    }

    #[test]
    fn test_empty_lines_are_skipped() {
        let calls = run("a\n\nb", LayoutParams::default(), true);
        assert_eq!(
            calls,
            vec![
                Call::Draw((3.7, 10.0), "a".to_string()),
                Call::Draw((3.7, 48.0), "b".to_string()),
            ]
        );
    }
}
