//! Emoji style providers

use crate::fetch::Fetcher;
use crate::{Result, SourceError};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// CDN serving unicode emoji images in many styles
pub const EMOJI_CDN_BASE_URL: &str = "https://emojicdn.elk.sh/";

/// CDN serving custom (Discord) emoji by id
pub const DISCORD_EMOJI_BASE_URL: &str = "https://cdn.discordapp.com/emojis/";

/// URL of the PNG image for a custom emoji id
pub fn discord_emoji_url(id: &str) -> String {
    format!("{DISCORD_EMOJI_BASE_URL}{id}.png")
}

/// `application/x-www-form-urlencoded` style quoting (spaces become `+`)
fn quote_plus(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}

/// Source of emoji images for one visual style
#[async_trait]
pub trait EmojiSource: Send + Sync {
    /// Style identity, used to key cached images
    fn style_id(&self) -> &str;

    /// Image bytes for a unicode emoji sequence
    async fn get_emoji(&self, net: &dyn Fetcher, emoji: &str) -> Result<Option<Bytes>>;

    /// Image bytes for a custom emoji id
    async fn get_discord_emoji(&self, net: &dyn Fetcher, id: &str) -> Result<Option<Bytes>> {
        let url = discord_emoji_url(id);
        match net.get(&url).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                tracing::warn!("Failed to fetch Discord emoji with ID {} from {}: {}", id, url, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<T: EmojiSource + ?Sized> EmojiSource for Arc<T> {
    fn style_id(&self) -> &str {
        (**self).style_id()
    }

    async fn get_emoji(&self, net: &dyn Fetcher, emoji: &str) -> Result<Option<Bytes>> {
        (**self).get_emoji(net, emoji).await
    }

    async fn get_discord_emoji(&self, net: &dyn Fetcher, id: &str) -> Result<Option<Bytes>> {
        (**self).get_discord_emoji(net, id).await
    }
}

// ============================================================================
// Emoji CDN styles
// ============================================================================

/// Visual styles served by the emoji CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmojiStyle {
    /// Twitter style, also the one Discord uses
    #[default]
    Twitter,
    Apple,
    Google,
    Microsoft,
    Samsung,
    WhatsApp,
    Facebook,
    Messenger,
    JoyPixels,
    Openmoji,
    Emojidex,
    Mozilla,
}

impl EmojiStyle {
    pub const ALL: [EmojiStyle; 12] = [
        Self::Twitter,
        Self::Apple,
        Self::Google,
        Self::Microsoft,
        Self::Samsung,
        Self::WhatsApp,
        Self::Facebook,
        Self::Messenger,
        Self::JoyPixels,
        Self::Openmoji,
        Self::Emojidex,
        Self::Mozilla,
    ];

    /// Style name as the CDN expects it
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Apple => "apple",
            Self::Google => "google",
            Self::Microsoft => "microsoft",
            Self::Samsung => "samsung",
            Self::WhatsApp => "whatsapp",
            Self::Facebook => "facebook",
            Self::Messenger => "messenger",
            Self::JoyPixels => "joypixels",
            Self::Openmoji => "openmoji",
            Self::Emojidex => "emojidex",
            Self::Mozilla => "mozilla",
        }
    }
}

impl fmt::Display for EmojiStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmojiStyle {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "" => return Err(SourceError::MissingStyle),
            "twemoji" => return Ok(Self::Twitter),
            "facebook_messenger" => return Ok(Self::Messenger),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == name)
            .ok_or_else(|| SourceError::UnknownStyle(s.to_string()))
    }
}

/// Provider fetching one style from the emoji CDN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiCdnSource {
    style: String,
}

impl EmojiCdnSource {
    pub fn new(style: EmojiStyle) -> Self {
        Self {
            style: style.as_str().to_string(),
        }
    }

    /// Provider for a style name the CDN knows but [`EmojiStyle`] does not list
    pub fn custom(style: impl Into<String>) -> Result<Self> {
        let style = style.into();
        if style.trim().is_empty() {
            return Err(SourceError::MissingStyle);
        }
        Ok(Self { style })
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    /// CDN URL for an emoji sequence in this style
    pub fn emoji_url(&self, emoji: &str) -> String {
        format!(
            "{EMOJI_CDN_BASE_URL}{}?style={}",
            quote_plus(emoji),
            quote_plus(&self.style)
        )
    }
}

impl Default for EmojiCdnSource {
    fn default() -> Self {
        Self::new(EmojiStyle::default())
    }
}

#[async_trait]
impl EmojiSource for EmojiCdnSource {
    fn style_id(&self) -> &str {
        &self.style
    }

    async fn get_emoji(&self, net: &dyn Fetcher, emoji: &str) -> Result<Option<Bytes>> {
        let url = self.emoji_url(emoji);
        match net.get(&url).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                tracing::warn!("Failed to fetch emoji {:?} from {}: {}", emoji, url, e);
                Err(e)
            }
        }
    }
}
