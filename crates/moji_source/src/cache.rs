//! Layered asset cache
//!
//! [`AssetCache`] decorates any [`EmojiSource`]. Lookups go memory, then
//! durable store, then the wrapped source; a successful network fill is
//! written through to the durable store and then to memory, once.
//!
//! Concurrent lookups of the same key are not coalesced: a burst of the same
//! emoji that all miss may each reach the network.

use crate::fetch::Fetcher;
use crate::source::EmojiSource;
use crate::store::DurableStore;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Identity of one cached image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    /// Unicode emoji sequence in a given style
    Emoji { style: String, emoji: String },
    /// Custom emoji id (style independent)
    Discord(String),
}

impl AssetKey {
    pub fn emoji(style: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self::Emoji {
            style: style.into(),
            emoji: emoji.into(),
        }
    }

    pub fn discord(id: impl Into<String>) -> Self {
        Self::Discord(id.into())
    }

    /// Stable key in the durable store
    ///
    /// Unicode emoji hash to `{style}_{sha256(emoji)}.png`; custom emoji
    /// keep their literal id as `discord_{id}.png`.
    pub fn durable_key(&self) -> String {
        match self {
            Self::Emoji { style, emoji } => {
                let digest = Sha256::digest(emoji.as_bytes());
                format!("{}_{}.png", sanitize(style), hex::encode(digest))
            }
            Self::Discord(id) => format!("discord_{}.png", sanitize(id)),
        }
    }
}

/// Keep file names to `[A-Za-z0-9_-]`
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Memory → durable → network cache around an [`EmojiSource`]
pub struct AssetCache<S> {
    inner: S,
    memory: Option<RwLock<FxHashMap<AssetKey, Bytes>>>,
    durable: Option<Arc<dyn DurableStore>>,
}

impl<S: EmojiSource> AssetCache<S> {
    /// Cache with a memory tier and no durable tier
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            memory: Some(RwLock::new(FxHashMap::default())),
            durable: None,
        }
    }

    /// Enable or disable the memory tier
    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.memory = enabled.then(|| RwLock::new(FxHashMap::default()));
        self
    }

    /// Add a durable tier
    pub fn with_durable(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of images held in memory
    pub fn memory_len(&self) -> usize {
        self.memory
            .as_ref()
            .map_or(0, |m| m.read().map(|m| m.len()).unwrap_or(0))
    }

    /// Drop every image held in memory; the durable tier is untouched
    pub fn clear_memory(&self) {
        if let Some(memory) = &self.memory {
            if let Ok(mut map) = memory.write() {
                map.clear();
            }
        }
    }

    fn memory_get(&self, key: &AssetKey) -> Option<Bytes> {
        let memory = self.memory.as_ref()?;
        let map = memory.read().ok()?;
        map.get(key).cloned()
    }

    fn memory_put(&self, key: AssetKey, bytes: Bytes) {
        if let Some(memory) = &self.memory {
            if let Ok(mut map) = memory.write() {
                map.insert(key, bytes);
            }
        }
    }

    async fn resolve<F>(&self, key: AssetKey, fetch: F) -> Result<Option<Bytes>>
    where
        F: Future<Output = Result<Option<Bytes>>> + Send,
    {
        if let Some(bytes) = self.memory_get(&key) {
            tracing::debug!("Memory cache hit for {:?}", key);
            return Ok(Some(bytes));
        }

        let durable_key = key.durable_key();
        if let Some(store) = &self.durable {
            match store.read(&durable_key).await {
                Ok(Some(bytes)) => {
                    tracing::debug!("Durable cache hit for {:?} ({})", key, durable_key);
                    self.memory_put(key, bytes.clone());
                    return Ok(Some(bytes));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Unreadable durable entry {}, refetching: {}", durable_key, e);
                }
            }
        }

        let Some(bytes) = fetch.await? else {
            return Ok(None);
        };

        if let Some(store) = &self.durable {
            if let Err(e) = store.write(&durable_key, &bytes).await {
                tracing::warn!("Failed to persist {}: {}", durable_key, e);
            }
        }
        self.memory_put(key, bytes.clone());

        Ok(Some(bytes))
    }
}

#[async_trait]
impl<S: EmojiSource> EmojiSource for AssetCache<S> {
    fn style_id(&self) -> &str {
        self.inner.style_id()
    }

    async fn get_emoji(&self, net: &dyn Fetcher, emoji: &str) -> Result<Option<Bytes>> {
        let key = AssetKey::emoji(self.inner.style_id(), emoji);
        self.resolve(key, self.inner.get_emoji(net, emoji)).await
    }

    async fn get_discord_emoji(&self, net: &dyn Fetcher, id: &str) -> Result<Option<Bytes>> {
        self.resolve(AssetKey::discord(id), self.inner.get_discord_emoji(net, id))
            .await
    }
}
