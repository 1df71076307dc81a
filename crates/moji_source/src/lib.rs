//! Emoji image sources for moji
//!
//! An [`EmojiSource`] turns an emoji key into image bytes for one visual
//! style. [`AssetCache`] wraps any source and consults a memory map and a
//! [`DurableStore`] before going to the network, writing through on a fill.
//!
//! # Example
//!
//! ```ignore
//! use moji_source::{AssetCache, EmojiCdnSource, EmojiSource, EmojiStyle, FsStore, HttpFetcher};
//! use std::sync::Arc;
//!
//! let net = HttpFetcher::new()?;
//! let cache = AssetCache::new(EmojiCdnSource::new(EmojiStyle::Twitter))
//!     .with_durable(Arc::new(FsStore::open(".cache").await?));
//!
//! let png = cache.get_emoji(&net, "\u{1F600}").await?;
//! ```

mod cache;
mod fetch;
mod source;
mod store;

pub use bytes::Bytes;
pub use cache::{AssetCache, AssetKey};
pub use fetch::{Fetcher, HttpFetcher};
pub use source::{
    discord_emoji_url, EmojiCdnSource, EmojiSource, EmojiStyle, DISCORD_EMOJI_BASE_URL,
    EMOJI_CDN_BASE_URL,
};
pub use store::{DurableStore, FsStore};

use thiserror::Error;

/// Asset fetch and storage errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Server answered with a non-success status
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// Request exceeded the fetcher's time bound
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection, TLS or body read failure
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Durable store read or write failure
    #[error("durable store I/O failed for {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A style provider was built without a style identifier
    #[error("emoji style identifier is not set")]
    MissingStyle,

    /// A name was given where a style provider was required
    #[error("{0:?} is not an emoji style provider")]
    UnknownStyle(String),

    /// HTTP client could not be created
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl SourceError {
    /// Whether this is a network failure that should degrade to a missing asset
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::Timeout { .. } | Self::Transport { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
