//! RGBA image canvas
//!
//! Shapes with rustybuzz, rasterizes glyphs with swash and composites onto an
//! [`RgbaImage`]. Anchors follow the two-letter convention of
//! [`moji_text::Anchor`]: the horizontal letter picks a point on the advance,
//! the vertical letter a font line (ascender, middle, baseline, descender) or
//! an edge of the ink box (top, bottom).

use crate::bitmap::{blend_coverage, paste_with_alpha};
use crate::canvas::{Canvas, TextStyle};
use crate::font::{FontFace, FontMetrics};
use crate::Result;
use image::{Rgba, RgbaImage};
use moji_text::{Anchor, Direction, HorizontalAnchor, Shaping, TextMeasure, VerticalAnchor};
use rustybuzz::{Feature, Language, UnicodeBuffer};
use std::fmt;
use std::str::FromStr;
use swash::scale::image::{Content, Image as GlyphImage};
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::{Format, Stroke};

// ============================================================================
// Shaping
// ============================================================================

/// Ink box relative to the pen origin on the baseline, y pointing down
#[derive(Debug, Clone, Copy, PartialEq)]
struct InkBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl InkBox {
    fn union(self, other: InkBox) -> InkBox {
        InkBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PositionedGlyph {
    id: u16,
    /// Pen position relative to the run origin, y pointing down
    x: f32,
    y: f32,
}

#[derive(Debug, Default)]
struct ShapedRun {
    glyphs: Vec<PositionedGlyph>,
    advance: f32,
    ink: Option<InkBox>,
}

fn shape_run(font: &FontFace, text: &str, shaping: &Shaping) -> ShapedRun {
    if text.is_empty() {
        return ShapedRun::default();
    }
    let Some(face) = font.shaper() else {
        tracing::warn!("Font data cannot be shaped, drawing nothing");
        return ShapedRun::default();
    };
    let scale = font.scale(face.units_per_em());

    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    if let Some(direction) = shaping.direction {
        buffer.set_direction(match direction {
            Direction::LeftToRight => rustybuzz::Direction::LeftToRight,
            Direction::RightToLeft => rustybuzz::Direction::RightToLeft,
            Direction::TopToBottom => rustybuzz::Direction::TopToBottom,
        });
    }
    if let Some(language) = &shaping.language {
        match Language::from_str(language) {
            Ok(language) => buffer.set_language(language),
            Err(e) => tracing::debug!("Ignoring language {:?}: {}", language, e),
        }
    }
    buffer.guess_segment_properties();

    let features: Vec<Feature> = shaping
        .features
        .iter()
        .filter_map(|tag| match Feature::from_str(tag) {
            Ok(feature) => Some(feature),
            Err(e) => {
                tracing::debug!("Ignoring font feature {:?}: {}", tag, e);
                None
            }
        })
        .collect();

    let output = rustybuzz::shape(&face, &features, buffer);

    let mut pen_x = 0.0f32;
    let mut pen_y = 0.0f32;
    let mut ink: Option<InkBox> = None;
    let mut glyphs = Vec::with_capacity(output.len());

    for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
        let id = info.glyph_id as u16;
        let x = pen_x + pos.x_offset as f32 * scale;
        let y = pen_y - pos.y_offset as f32 * scale;

        if let Some(rect) = face.glyph_bounding_box(rustybuzz::ttf_parser::GlyphId(id)) {
            let glyph_box = InkBox {
                left: x + rect.x_min as f32 * scale,
                top: y - rect.y_max as f32 * scale,
                right: x + rect.x_max as f32 * scale,
                bottom: y - rect.y_min as f32 * scale,
            };
            ink = Some(ink.map_or(glyph_box, |b| b.union(glyph_box)));
        }

        glyphs.push(PositionedGlyph { id, x, y });
        pen_x += pos.x_advance as f32 * scale;
        pen_y -= pos.y_advance as f32 * scale;
    }

    let advance = match shaping.direction {
        Some(Direction::TopToBottom) => pen_y.abs(),
        _ => pen_x,
    };

    ShapedRun {
        glyphs,
        advance,
        ink,
    }
}

/// Pen origin on the baseline relative to the anchor point
fn pen_origin(
    advance: f32,
    ink: Option<InkBox>,
    metrics: &FontMetrics,
    anchor: Anchor,
) -> (f32, f32) {
    let x = match anchor.horizontal {
        HorizontalAnchor::Left => 0.0,
        HorizontalAnchor::Middle => -advance / 2.0,
        HorizontalAnchor::Right => -advance,
    };
    let y = match anchor.vertical {
        VerticalAnchor::Ascender => metrics.ascender,
        VerticalAnchor::Top => ink.map_or(metrics.ascender, |ink| -ink.top),
        VerticalAnchor::Middle => (metrics.ascender + metrics.descender) / 2.0,
        VerticalAnchor::Baseline => 0.0,
        VerticalAnchor::Bottom => ink.map_or(metrics.descender, |ink| -ink.bottom),
        VerticalAnchor::Descender => metrics.descender,
    };
    (x, y)
}

/// Composite one rasterized glyph with its pen at `pen`
fn blit(canvas: &mut RgbaImage, glyph: &GlyphImage, pen: (f32, f32), color: Rgba<u8>) {
    let left = pen.0.round() as i64 + glyph.placement.left as i64;
    let top = pen.1.round() as i64 - glyph.placement.top as i64;
    let width = glyph.placement.width as usize;
    let height = glyph.placement.height as usize;

    for row in 0..height {
        for col in 0..width {
            let i = row * width + col;
            let (x, y) = (left + col as i64, top + row as i64);
            match glyph.content {
                Content::Mask => {
                    if let Some(&coverage) = glyph.data.get(i) {
                        blend_coverage(canvas, x, y, coverage, color);
                    }
                }
                Content::SubpixelMask => {
                    if let Some(px) = glyph.data.get(i * 4..i * 4 + 3) {
                        let coverage = px[0].max(px[1]).max(px[2]);
                        blend_coverage(canvas, x, y, coverage, color);
                    }
                }
                Content::Color => {
                    if let Some(px) = glyph.data.get(i * 4..i * 4 + 4) {
                        blend_coverage(canvas, x, y, px[3], Rgba([px[0], px[1], px[2], 255]));
                    }
                }
            }
        }
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// [`Canvas`] over an owned RGBA image
pub struct RasterCanvas {
    image: RgbaImage,
    default_font: FontFace,
    scale_context: ScaleContext,
}

impl RasterCanvas {
    pub fn new(image: RgbaImage, default_font: FontFace) -> Self {
        Self {
            image,
            default_font,
            scale_context: ScaleContext::new(),
        }
    }

    /// Canvas whose default font is the system sans-serif at `size` pixels
    pub fn with_system_font(image: RgbaImage, size: f32) -> Result<Self> {
        Ok(Self::new(image, FontFace::system_default(size)?))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl fmt::Debug for RasterCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterCanvas")
            .field("size", &self.image.dimensions())
            .field("default_font", &self.default_font)
            .finish()
    }
}

impl TextMeasure for RasterCanvas {
    type Font = FontFace;

    fn default_font(&self) -> FontFace {
        self.default_font.clone()
    }

    fn font_size(&self, font: &FontFace) -> f32 {
        font.size()
    }

    fn text_length(&self, font: &FontFace, text: &str, shaping: &Shaping) -> f32 {
        shape_run(font, text, shaping).advance
    }

    fn text_height(&self, font: &FontFace, text: &str, stroke_width: u32) -> f32 {
        let run = shape_run(font, text, &Shaping::default());
        let metrics = font.metrics();
        let bottom = run
            .ink
            .map_or(metrics.ascender, |ink| metrics.ascender + ink.bottom);
        bottom.ceil() + stroke_width as f32
    }
}

impl Canvas for RasterCanvas {
    fn ink_offset(
        &self,
        font: &FontFace,
        text: &str,
        anchor: Anchor,
        shaping: &Shaping,
    ) -> (i32, i32) {
        let run = shape_run(font, text, shaping);
        let metrics = font.metrics();
        let (x, y) = pen_origin(run.advance, run.ink, &metrics, anchor);
        match run.ink {
            Some(ink) => ((x + ink.left).floor() as i32, (y + ink.top).floor() as i32),
            None => (x.floor() as i32, (y - metrics.ascender).floor() as i32),
        }
    }

    fn draw_text(&mut self, position: (f32, f32), text: &str, font: &FontFace, style: &TextStyle) {
        let run = shape_run(font, text, &style.shaping);
        if run.glyphs.is_empty() {
            return;
        }

        let metrics = font.metrics();
        let (dx, dy) = pen_origin(run.advance, run.ink, &metrics, style.anchor);
        let origin = (position.0 + dx, position.1 + dy);

        let Some(font_ref) = swash::FontRef::from_index(font.data(), font.index() as usize) else {
            tracing::warn!("Font data cannot be rasterized, drawing nothing");
            return;
        };

        let Self {
            image,
            scale_context,
            ..
        } = self;
        let mut scaler = scale_context
            .builder(font_ref)
            .size(font.size())
            .hint(false)
            .build();

        // Stroke is drawn first so the fill sits on top of it
        if style.stroke_width > 0 {
            let stroke_color = style.stroke_fill.unwrap_or(style.fill);
            let mut render = Render::new(&[Source::Outline]);
            render
                .format(Format::Alpha)
                .style(Stroke::new(style.stroke_width as f32 * 2.0));
            for glyph in &run.glyphs {
                if let Some(rendered) = render.render(&mut scaler, glyph.id) {
                    blit(image, &rendered, (origin.0 + glyph.x, origin.1 + glyph.y), stroke_color);
                }
            }
        }

        let color_sources = [
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ];
        let outline_only = [Source::Outline];
        let sources: &[Source] = if style.embedded_color && style.stroke_width == 0 {
            &color_sources
        } else {
            &outline_only
        };

        let mut render = Render::new(sources);
        render.format(Format::Alpha);
        for glyph in &run.glyphs {
            if let Some(rendered) = render.render(&mut scaler, glyph.id) {
                blit(image, &rendered, (origin.0 + glyph.x, origin.1 + glyph.y), style.fill);
            }
        }
    }

    fn paste(&mut self, bitmap: &RgbaImage, position: (i32, i32)) {
        paste_with_alpha(&mut self.image, bitmap, position.0, position.1);
    }
}
