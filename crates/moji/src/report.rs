//! Outcome of a draw call

use moji_paint::PaintError;
use moji_source::SourceError;

/// Why an emoji was left blank
#[derive(Debug)]
pub enum FailureReason {
    /// The fetch failed (network, timeout, bad status)
    Fetch(SourceError),
    /// The bytes could not be decoded or resized
    Decode(PaintError),
    /// The source has no image for this emoji
    Missing,
}

/// One emoji that was not pasted
#[derive(Debug)]
pub struct AssetFailure {
    pub line: usize,
    /// Node index within the line
    pub node: usize,
    /// The emoji as written, custom emoji as `<:_:id>`
    pub emoji: String,
    pub reason: FailureReason,
}

/// What a `draw_text` call did
#[derive(Debug, Default)]
pub struct RenderReport {
    pub text_draws: usize,
    pub pastes: usize,
    pub failures: Vec<AssetFailure>,
}

impl RenderReport {
    /// Every emoji was pasted
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn fail(&mut self, line: usize, node: usize, emoji: String, reason: FailureReason) {
        self.failures.push(AssetFailure {
            line,
            node,
            emoji,
            reason,
        });
    }
}
