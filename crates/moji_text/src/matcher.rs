//! Longest-match lookup over the unicode emoji table
//!
//! Many emoji are multi-codepoint sequences (ZWJ families, skin tones,
//! keycaps, tag flags) whose prefixes are emoji themselves. The matcher
//! always tries the longest candidate at a position first so a shorter
//! prefix never shadows a valid longer sequence.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::OnceLock;

/// Standalone component emoji: skin tone modifiers and hair styles
const COMPONENTS: [&str; 9] = [
    "\u{1F3FB}",
    "\u{1F3FC}",
    "\u{1F3FD}",
    "\u{1F3FE}",
    "\u{1F3FF}",
    "\u{1F9B0}",
    "\u{1F9B1}",
    "\u{1F9B2}",
    "\u{1F9B3}",
];

/// Set of known emoji sequences with longest-first matching
pub struct EmojiMatcher {
    sequences: FxHashSet<&'static str>,
    /// Longest sequence (in chars) starting with a given char
    longest_by_first: FxHashMap<char, usize>,
}

impl EmojiMatcher {
    /// Build a matcher from an explicit list of sequences
    pub fn from_sequences<I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        let mut set = FxHashSet::default();
        let mut longest_by_first: FxHashMap<char, usize> = FxHashMap::default();

        for seq in sequences {
            let Some(first) = seq.chars().next() else {
                continue;
            };
            let len = seq.chars().count();
            let entry = longest_by_first.entry(first).or_insert(0);
            *entry = (*entry).max(len);
            set.insert(seq);
        }

        Self {
            sequences: set,
            longest_by_first,
        }
    }

    /// Shared matcher over every fully-qualified and component emoji,
    /// skin tone variants included
    pub fn global() -> &'static EmojiMatcher {
        static MATCHER: OnceLock<EmojiMatcher> = OnceLock::new();
        MATCHER.get_or_init(|| {
            let qualified = emojis::iter().flat_map(|emoji| {
                let variants = emoji.skin_tones().into_iter().flatten();
                std::iter::once(emoji.as_str()).chain(variants.map(|e| e.as_str()))
            });
            let matcher =
                EmojiMatcher::from_sequences(qualified.chain(COMPONENTS.iter().copied()));
            tracing::debug!("Loaded {} emoji sequences", matcher.len());
            matcher
        })
    }

    /// Number of known sequences
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Whether `s` is exactly one known emoji sequence
    pub fn contains(&self, s: &str) -> bool {
        self.sequences.contains(s)
    }

    /// Byte length of the longest emoji sequence at the start of `s`
    pub fn longest_prefix(&self, s: &str) -> Option<usize> {
        let first = s.chars().next()?;
        let max_chars = *self.longest_by_first.get(&first)?;

        // Candidate end offsets, one per char boundary, up to the longest sequence
        let ends: Vec<usize> = s
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain(std::iter::once(s.len()))
            .take(max_chars)
            .collect();

        ends.into_iter()
            .rev()
            .find(|&end| self.sequences.contains(&s[..end]))
    }
}
