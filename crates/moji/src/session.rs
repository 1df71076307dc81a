//! Session lifecycle and draw orchestration

use crate::config::SessionConfig;
use crate::options::DrawOptions;
use crate::report::{FailureReason, RenderReport};
use crate::{Error, Result};
use futures::future::join_all;
use moji_paint::{composite, prepare_bitmaps, Canvas, RgbaImage};
use moji_source::{
    AssetCache, Bytes, EmojiCdnSource, EmojiSource, EmojiStyle, Fetcher, FsStore, HttpFetcher,
};
use moji_text::{layout, parse_with, text_size, Document, Node, NodeKind, TextMeasure};
use std::fmt;
use std::sync::Arc;

type SharedCache = AssetCache<Arc<dyn EmojiSource>>;

/// Network client and caches, dropped on close
struct OpenState {
    net: Arc<dyn Fetcher>,
    cache: SharedCache,
}

/// Rendering session
///
/// Owns the HTTP client and the image caches. Open it once, draw any number
/// of times, then close it; closing twice is an error.
pub struct Session {
    config: SessionConfig,
    state: Option<OpenState>,
}

impl Session {
    /// Open a session for the style named in `config.source`
    pub fn open(config: SessionConfig) -> Result<Self> {
        let style: EmojiStyle = config.source.parse()?;
        Self::open_with_source(config, EmojiCdnSource::new(style))
    }

    /// Open a session fetching through `source` instead of a named style
    pub fn open_with_source(
        config: SessionConfig,
        source: impl EmojiSource + 'static,
    ) -> Result<Self> {
        let net = HttpFetcher::with_options(config.request_timeout(), &config.user_agent)?;

        let source: Arc<dyn EmojiSource> = Arc::new(source);
        let mut cache = AssetCache::new(source).with_memory(config.cache);
        if let Some(dir) = config.durable_dir() {
            cache = cache.with_durable(Arc::new(FsStore::new(dir)));
        }

        tracing::debug!(
            "Opened session: style={} memory_cache={} durable_cache={:?}",
            cache.style_id(),
            config.cache,
            config.durable_dir()
        );

        Ok(Self {
            config,
            state: Some(OpenState {
                net: Arc::new(net),
                cache,
            }),
        })
    }

    /// Replace the network client
    pub fn with_fetcher(mut self, net: Arc<dyn Fetcher>) -> Self {
        if let Some(state) = &mut self.state {
            state.net = net;
        }
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_none()
    }

    /// Images held in the memory tier
    pub fn cached_images(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.cache.memory_len())
    }

    /// Release the network client and the memory tier
    pub fn close(&mut self) -> Result<()> {
        let state = self.state.take().ok_or(Error::AlreadyClosed)?;
        state.cache.clear_memory();
        drop(state);
        tracing::debug!("Closed session");
        Ok(())
    }

    fn state(&self) -> Result<&OpenState> {
        self.state.as_ref().ok_or(Error::SessionClosed)
    }

    /// Draw `text` with `position` at the anchor
    ///
    /// Parameters are validated before anything is drawn. Emoji that cannot
    /// be fetched or decoded are left blank and listed in the report.
    pub async fn draw_text<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        position: (f32, f32),
        text: &str,
        options: &DrawOptions<C::Font>,
    ) -> Result<RenderReport> {
        let state = self.state()?;
        let params = options.layout_params(&self.config).validate(text)?;

        let font = options.font.clone().unwrap_or_else(|| canvas.default_font());
        let doc = parse_with(text, self.config.render_custom_emoji);
        let laid_out = layout(&doc, &*canvas, &font, position, &params);

        tracing::debug!(
            "draw_text: {} lines, {} emoji, emoji size {}px",
            doc.line_count(),
            doc.nodes().filter(|node| !node.is_text()).count(),
            laid_out.emoji_size
        );

        let mut report = RenderReport::default();
        let assets = fetch_assets(state, &doc, &mut report).await;
        let bitmaps = decode_assets(&doc, assets, laid_out.emoji_size, &mut report).await?;

        let style = options.text_style(&params);
        let stats = composite(
            canvas,
            &laid_out,
            &font,
            &style,
            &bitmaps,
            params.emoji_position_offset,
        );

        report.text_draws = stats.text_draws;
        report.pastes = stats.pastes;
        Ok(report)
    }

    /// Width and height `text` would occupy
    ///
    /// Emoji count as a square of the scaled font size and lines advance by
    /// the font size plus `options.spacing`.
    pub fn measure_text<M: TextMeasure + ?Sized>(
        &self,
        measure: &M,
        text: &str,
        options: &DrawOptions<M::Font>,
    ) -> Result<(u32, u32)> {
        self.state()?;
        let font = options.font.clone().unwrap_or_else(|| measure.default_font());
        let doc = parse_with(text, self.config.render_custom_emoji);
        Ok(text_size(
            &doc,
            measure,
            &font,
            options.spacing,
            options.emoji_scale_factor_or(&self.config),
        ))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// Fetch and decode
// ============================================================================

async fn fetch_node(
    cache: &SharedCache,
    net: &dyn Fetcher,
    node: &Node,
) -> Option<moji_source::Result<Option<Bytes>>> {
    match node.kind() {
        NodeKind::Text => None,
        NodeKind::UnicodeEmoji => Some(cache.get_emoji(net, node.content()).await),
        NodeKind::DiscordEmoji => Some(cache.get_discord_emoji(net, node.content()).await),
    }
}

/// Fetch every emoji of `doc`, nodes of a line and lines concurrently
async fn fetch_assets(
    state: &OpenState,
    doc: &Document,
    report: &mut RenderReport,
) -> Vec<Vec<Option<Bytes>>> {
    let net = state.net.as_ref();
    let cache = &state.cache;

    let fetched = join_all(doc.lines.iter().map(|line| {
        join_all(line.nodes.iter().map(|node| fetch_node(cache, net, node)))
    }))
    .await;

    let mut assets = Vec::with_capacity(fetched.len());
    for (line_index, (results, line)) in fetched.into_iter().zip(&doc.lines).enumerate() {
        let mut line_assets = Vec::with_capacity(results.len());
        for (node_index, (result, node)) in results.into_iter().zip(&line.nodes).enumerate() {
            let asset = match result {
                None => None,
                Some(Ok(Some(bytes))) => Some(bytes),
                Some(Ok(None)) => {
                    tracing::debug!("No image for {}", node.source_text());
                    report.fail(
                        line_index,
                        node_index,
                        node.source_text().into_owned(),
                        FailureReason::Missing,
                    );
                    None
                }
                Some(Err(e)) => {
                    tracing::debug!("Leaving {} blank: {}", node.source_text(), e);
                    report.fail(
                        line_index,
                        node_index,
                        node.source_text().into_owned(),
                        FailureReason::Fetch(e),
                    );
                    None
                }
            };
            line_assets.push(asset);
        }
        assets.push(line_assets);
    }
    assets
}

/// Decode and resize fetched images on the blocking pool
async fn decode_assets(
    doc: &Document,
    assets: Vec<Vec<Option<Bytes>>>,
    emoji_px: u32,
    report: &mut RenderReport,
) -> Result<Vec<Vec<Option<RgbaImage>>>> {
    if !assets.iter().flatten().any(Option::is_some) {
        return Ok(Vec::new());
    }

    let prepared = tokio::task::spawn_blocking(move || prepare_bitmaps(&assets, emoji_px))
        .await
        .map_err(|e| Error::Worker(e.to_string()))?;

    let mut bitmaps = Vec::with_capacity(prepared.len());
    for (line_index, (results, line)) in prepared.into_iter().zip(&doc.lines).enumerate() {
        let mut line_bitmaps = Vec::with_capacity(results.len());
        for (node_index, (result, node)) in results.into_iter().zip(&line.nodes).enumerate() {
            let bitmap = match result {
                None => None,
                Some(Ok(bitmap)) => Some(bitmap),
                Some(Err(e)) => {
                    tracing::warn!("Failed to decode image for {}: {}", node.source_text(), e);
                    report.fail(
                        line_index,
                        node_index,
                        node.source_text().into_owned(),
                        FailureReason::Decode(e),
                    );
                    None
                }
            };
            line_bitmaps.push(bitmap);
        }
        bitmaps.push(line_bitmaps);
    }
    Ok(bitmaps)
}
