//! Tokenizer
//!
//! Splits a string into lines, and each line into text, unicode emoji and
//! custom emoji nodes. Tokenization is total: every input char ends up in
//! exactly one node, in order.

use crate::matcher::EmojiMatcher;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Custom emoji wire token: `<` [`a`] `:` name `:` id `>`
fn custom_emoji_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^<a?:[a-zA-Z0-9_]{1,32}:([0-9]{17,22})>")
            .expect("custom emoji grammar is valid")
    })
}

/// Kind of a parsed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Raw text run
    Text,
    /// Unicode emoji sequence
    UnicodeEmoji,
    /// Custom (Discord) emoji reference, content is the numeric id
    DiscordEmoji,
}

/// Smallest parsed unit of a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    content: String,
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            content: content.into(),
        }
    }

    pub fn emoji(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::UnicodeEmoji,
            content: content.into(),
        }
    }

    pub fn discord(id: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::DiscordEmoji,
            content: id.into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Text, emoji sequence, or custom emoji id
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Text this node stands for, with custom emoji re-wrapped as `<:_:id>`
    ///
    /// The custom emoji name is not kept, so the wrapped form only matches
    /// the source token up to the name.
    pub fn source_text(&self) -> Cow<'_, str> {
        match self.kind {
            NodeKind::DiscordEmoji => Cow::Owned(format!("<:_:{}>", self.content)),
            _ => Cow::Borrowed(&self.content),
        }
    }
}

/// Nodes between two line breaks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub nodes: Vec<Node>,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn emoji_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_text()).count()
    }
}

/// Tokenized form of one draw call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub lines: Vec<Line>,
}

impl Document {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// All nodes in source order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.lines.iter().flat_map(|line| line.nodes.iter())
    }

    /// Rebuild the text from nodes, lines joined by `\n`
    pub fn reconstruct(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.nodes.iter().map(|n| n.source_text()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse text, recognising both unicode and custom emoji
pub fn parse(text: &str) -> Document {
    parse_with(text, true)
}

/// Parse text; with `custom_emoji` off, custom tokens stay literal text
pub fn parse_with(text: &str, custom_emoji: bool) -> Document {
    let matcher = EmojiMatcher::global();
    Document {
        lines: split_lines(text)
            .into_iter()
            .map(|line| parse_line(line, matcher, custom_emoji))
            .collect(),
    }
}

fn parse_line(line: &str, matcher: &EmojiMatcher, custom_emoji: bool) -> Line {
    let mut nodes = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < line.len() {
        let rest = &line[i..];

        let matched = if custom_emoji && rest.starts_with('<') {
            custom_emoji_regex()
                .captures(rest)
                .map(|caps| (caps[0].len(), Node::discord(&caps[1])))
        } else {
            None
        };

        let matched = matched.or_else(|| {
            matcher
                .longest_prefix(rest)
                .map(|len| (len, Node::emoji(&rest[..len])))
        });

        match matched {
            Some((len, node)) => {
                if text_start < i {
                    nodes.push(Node::text(&line[text_start..i]));
                }
                nodes.push(node);
                i += len;
                text_start = i;
            }
            None => {
                i += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if text_start < line.len() {
        nodes.push(Node::text(&line[text_start..]));
    }

    Line { nodes }
}

/// Split on line boundaries
///
/// Recognises `\n`, `\r\n`, `\r`, vertical tab, form feed, the file/group/
/// record separators, NEL and the unicode line/paragraph separators. A
/// trailing break does not open an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let is_break = matches!(
            c,
            '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{1C}' | '\u{1D}' | '\u{1E}' | '\u{85}'
                | '\u{2028}' | '\u{2029}'
        );
        if !is_break {
            continue;
        }

        lines.push(&text[start..i]);
        start = i + c.len_utf8();

        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}
