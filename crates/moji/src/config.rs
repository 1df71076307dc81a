//! Session configuration (moji.toml)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings fixed for the lifetime of a [`Session`](crate::Session)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Emoji style name, e.g. `"twitter"` or `"apple"`
    #[serde(default = "default_source")]
    pub source: String,
    /// Keep fetched images in memory for the session
    #[serde(default = "default_true")]
    pub cache: bool,
    /// Treat `<:name:id>` tokens as custom emoji instead of text
    #[serde(default = "default_true")]
    pub render_custom_emoji: bool,
    /// Emoji size as a multiple of the font size
    #[serde(default = "default_scale_factor")]
    pub emoji_scale_factor: f32,
    /// Pixel shift applied to every pasted emoji
    #[serde(default)]
    pub emoji_position_offset: (i32, i32),
    /// Directory of the durable image cache; empty disables it
    #[serde(
        default = "default_cache_dir",
        serialize_with = "cache_dir_serde::serialize",
        deserialize_with = "cache_dir_serde::deserialize"
    )]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_source() -> String {
    "twitter".to_string()
}

fn default_true() -> bool {
    true
}

fn default_scale_factor() -> f32 {
    1.0
}

fn default_cache_dir() -> Option<PathBuf> {
    Some(PathBuf::from(".cache"))
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            cache: true,
            render_custom_emoji: true,
            emoji_scale_factor: default_scale_factor(),
            emoji_position_offset: (0, 0),
            cache_dir: default_cache_dir(),
            request_timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl SessionConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    pub fn with_render_custom_emoji(mut self, enabled: bool) -> Self {
        self.render_custom_emoji = enabled;
        self
    }

    pub fn with_emoji_scale_factor(mut self, factor: f32) -> Self {
        self.emoji_scale_factor = factor;
        self
    }

    pub fn with_emoji_position_offset(mut self, offset: (i32, i32)) -> Self {
        self.emoji_position_offset = offset;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Disable the durable cache tier
    pub fn without_cache_dir(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Per-request timeout, never shorter than a millisecond
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    /// Durable cache directory, if the tier is enabled
    pub fn durable_dir(&self) -> Option<&Path> {
        self.cache_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

/// TOML has no null, so a disabled durable tier is written as `cache_dir = ""`
mod cache_dir_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::path::PathBuf;

    pub fn serialize<S: Serializer>(
        dir: &Option<PathBuf>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dir {
            Some(dir) => serializer.serialize_str(&dir.to_string_lossy()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PathBuf>, D::Error> {
        let dir = PathBuf::deserialize(deserializer)?;
        Ok(Some(dir).filter(|dir| !dir.as_os_str().is_empty()))
    }
}
