//! Per-call drawing options

use crate::config::SessionConfig;
use moji_paint::{Rgba, TextStyle};
use moji_text::{LayoutParams, ResolvedParams};

/// Options of one `draw_text` or `measure_text` call
///
/// `F` is the canvas font type. Emoji scale and offset fall back to the
/// session configuration when unset.
#[derive(Debug, Clone)]
pub struct DrawOptions<F> {
    /// Font to draw with, the canvas default when unset
    pub font: Option<F>,
    pub fill: Rgba<u8>,
    /// Extra pixels between lines
    pub spacing: i32,
    /// Extra pixels around every node
    pub node_spacing: i32,
    /// `"left"`, `"center"` or `"right"`
    pub align: String,
    /// Two-letter anchor code
    pub anchor: String,
    /// `"ltr"`, `"rtl"` or `"ttb"`
    pub direction: Option<String>,
    pub features: Vec<String>,
    pub language: Option<String>,
    pub stroke_width: u32,
    pub stroke_fill: Option<Rgba<u8>>,
    pub embedded_color: bool,
    pub emoji_scale_factor: Option<f32>,
    pub emoji_position_offset: Option<(i32, i32)>,
}

impl<F> Default for DrawOptions<F> {
    fn default() -> Self {
        Self {
            font: None,
            fill: Rgba([255, 255, 255, 255]),
            spacing: 4,
            node_spacing: 0,
            align: "left".to_string(),
            anchor: "la".to_string(),
            direction: None,
            features: Vec::new(),
            language: None,
            stroke_width: 0,
            stroke_fill: None,
            embedded_color: false,
            emoji_scale_factor: None,
            emoji_position_offset: None,
        }
    }
}

impl<F> DrawOptions<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, font: F) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_fill(mut self, fill: Rgba<u8>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_spacing(mut self, spacing: i32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_node_spacing(mut self, node_spacing: i32) -> Self {
        self.node_spacing = node_spacing;
        self
    }

    pub fn with_align(mut self, align: impl Into<String>) -> Self {
        self.align = align.into();
        self
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = anchor.into();
        self
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_stroke(mut self, width: u32, fill: Option<Rgba<u8>>) -> Self {
        self.stroke_width = width;
        self.stroke_fill = fill;
        self
    }

    pub fn with_embedded_color(mut self, enabled: bool) -> Self {
        self.embedded_color = enabled;
        self
    }

    pub fn with_emoji_scale_factor(mut self, factor: f32) -> Self {
        self.emoji_scale_factor = Some(factor);
        self
    }

    pub fn with_emoji_position_offset(mut self, offset: (i32, i32)) -> Self {
        self.emoji_position_offset = Some(offset);
        self
    }

    pub(crate) fn emoji_scale_factor_or(&self, config: &SessionConfig) -> f32 {
        self.emoji_scale_factor.unwrap_or(config.emoji_scale_factor)
    }

    pub(crate) fn layout_params(&self, config: &SessionConfig) -> LayoutParams {
        LayoutParams {
            spacing: self.spacing as f32,
            node_spacing: self.node_spacing as f32,
            emoji_scale_factor: self.emoji_scale_factor_or(config),
            emoji_position_offset: self
                .emoji_position_offset
                .unwrap_or(config.emoji_position_offset),
            anchor: self.anchor.clone(),
            align: self.align.clone(),
            direction: self.direction.clone(),
            features: self.features.clone(),
            language: self.language.clone(),
            stroke_width: self.stroke_width,
        }
    }

    /// Style of the native text draw for validated parameters
    pub(crate) fn text_style(&self, params: &ResolvedParams) -> TextStyle {
        TextStyle {
            fill: self.fill,
            anchor: params.anchor,
            spacing: params.spacing,
            align: params.align,
            shaping: params.shaping.clone(),
            stroke_width: params.stroke_width,
            stroke_fill: self.stroke_fill,
            embedded_color: self.embedded_color,
        }
    }
}
