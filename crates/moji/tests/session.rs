use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use moji::{
    Anchor, Bytes, Canvas, DrawOptions, Error, FailureReason, Fetcher, LayoutError, Rgba,
    RgbaImage, Session, SessionConfig, Shaping, SourceError, TextMeasure, TextStyle,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Fakes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Draw((f32, f32), String),
    Paste((i32, i32), (u32, u32)),
}

/// Every char 10px wide, a space 5px, 20px font, ink 2px below the anchor
#[derive(Default)]
struct FakeCanvas {
    calls: Vec<Call>,
}

impl TextMeasure for FakeCanvas {
    type Font = f32;

    fn default_font(&self) -> f32 {
        20.0
    }

    fn font_size(&self, font: &f32) -> f32 {
        *font
    }

    fn text_length(&self, _font: &f32, text: &str, _shaping: &Shaping) -> f32 {
        text.chars().map(|c| if c == ' ' { 5.0 } else { 10.0 }).sum()
    }

    fn text_height(&self, _font: &f32, _text: &str, stroke_width: u32) -> f32 {
        15.0 + stroke_width as f32
    }
}

impl Canvas for FakeCanvas {
    fn ink_offset(
        &self,
        _font: &f32,
        _text: &str,
        _anchor: Anchor,
        _shaping: &Shaping,
    ) -> (i32, i32) {
        (0, 2)
    }

    fn draw_text(&mut self, position: (f32, f32), text: &str, _font: &f32, _style: &TextStyle) {
        self.calls.push(Call::Draw(position, text.to_string()));
    }

    fn paste(&mut self, bitmap: &RgbaImage, position: (i32, i32)) {
        self.calls.push(Call::Paste(position, bitmap.dimensions()));
    }
}

/// Serves a 72x72 PNG for every URL unless offline or serving garbage
#[derive(Default)]
struct FakeNet {
    offline: AtomicBool,
    garbage: AtomicBool,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl FakeNet {
    fn offline() -> Self {
        let net = Self::default();
        net.offline.store(true, Ordering::SeqCst);
        net
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([255, 200, 0, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[async_trait]
impl Fetcher for FakeNet {
    async fn get(&self, url: &str) -> Result<Bytes, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(SourceError::Timeout {
                url: url.to_string(),
            });
        }
        if self.garbage.load(Ordering::SeqCst) {
            return Ok(Bytes::from_static(b"<html>oops</html>"));
        }
        Ok(Bytes::from(png(72, 72)))
    }
}

fn session(net: Arc<FakeNet>) -> Session {
    init_tracing();
    Session::open(SessionConfig::default().without_cache_dir())
        .unwrap()
        .with_fetcher(net)
}

const GRIN: &str = "\u{1F600}";
const PLACEHOLDER: &str = "    ";

// ============================================================================
// draw_text
// ============================================================================

#[tokio::test]
async fn draws_text_once_then_pastes_emoji() {
    let net = Arc::new(FakeNet::default());
    let session = session(net.clone());
    let mut canvas = FakeCanvas::default();

    let report = session
        .draw_text(&mut canvas, (0.0, 0.0), &format!("Hi {GRIN}"), &DrawOptions::default())
        .await
        .unwrap();

    assert_eq!(
        canvas.calls,
        vec![
            Call::Draw((0.0, 0.0), format!("Hi {PLACEHOLDER}")),
            Call::Paste((25, 2), (20, 20)),
        ]
    );
    assert_eq!(report.text_draws, 1);
    assert_eq!(report.pastes, 1);
    assert!(report.is_complete());
    assert_eq!(net.calls(), 1);
    assert!(net.urls.lock().unwrap()[0].starts_with("https://emojicdn.elk.sh/"));
}

#[tokio::test]
async fn network_down_still_draws_text() {
    let net = Arc::new(FakeNet::offline());
    let session = session(net.clone());
    let mut canvas = FakeCanvas::default();

    let text = format!("a {GRIN}\nb {GRIN}");
    let report = session
        .draw_text(&mut canvas, (0.0, 0.0), &text, &DrawOptions::default())
        .await
        .unwrap();

    assert_eq!(report.text_draws, 2);
    assert_eq!(report.pastes, 0);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[1].line, 1);
    assert_eq!(report.failures[1].node, 1);
    assert_eq!(report.failures[1].emoji, GRIN);
    assert!(matches!(
        &report.failures[0].reason,
        FailureReason::Fetch(e) if e.is_transport()
    ));
    assert!(canvas.calls.iter().all(|c| matches!(c, Call::Draw(..))));
    assert_eq!(session.cached_images(), 0);
}

#[tokio::test]
async fn undecodable_image_is_reported() {
    let net = Arc::new(FakeNet::default());
    net.garbage.store(true, Ordering::SeqCst);
    let session = session(net);
    let mut canvas = FakeCanvas::default();

    let report = session
        .draw_text(&mut canvas, (0.0, 0.0), GRIN, &DrawOptions::default())
        .await
        .unwrap();

    assert_eq!(report.pastes, 0);
    assert!(matches!(report.failures[0].reason, FailureReason::Decode(_)));
}

#[tokio::test]
async fn invalid_parameters_touch_nothing() {
    let net = Arc::new(FakeNet::default());
    let session = session(net.clone());
    let mut canvas = FakeCanvas::default();
    let text = format!("one {GRIN}\ntwo");

    let cases = [
        (DrawOptions::default().with_anchor("l"), "x"),
        (DrawOptions::default().with_anchor("zz"), "x"),
        (DrawOptions::default().with_anchor("mb"), text.as_str()),
        (DrawOptions::default().with_direction("ttb"), text.as_str()),
        (DrawOptions::default().with_align("justify"), "x"),
    ];

    for (options, text) in cases {
        let err = session
            .draw_text(&mut canvas, (0.0, 0.0), text, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Layout(_)), "{err}");
    }

    let err = session
        .draw_text(&mut canvas, (0.0, 0.0), "x", &DrawOptions::default().with_anchor("l"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Layout(LayoutError::AnchorLength(_))));

    assert!(canvas.calls.is_empty());
    assert_eq!(net.calls(), 0);
}

#[tokio::test]
async fn multiline_ascender_anchor_is_accepted() {
    let session = session(Arc::new(FakeNet::default()));
    let mut canvas = FakeCanvas::default();

    let report = session
        .draw_text(&mut canvas, (5.0, 5.0), "top\nbottom", &DrawOptions::default())
        .await
        .unwrap();

    assert_eq!(report.text_draws, 2);
    // line advance = 15 + 0 + 4
    assert_eq!(canvas.calls[1], Call::Draw((5.0, 24.0), "bottom".to_string()));
}

#[tokio::test]
async fn custom_emoji_fetch_from_fixed_endpoint() {
    let net = Arc::new(FakeNet::default());
    let session = session(net.clone());
    let mut canvas = FakeCanvas::default();

    let report = session
        .draw_text(
            &mut canvas,
            (0.0, 0.0),
            "<a:party:123456789012345678>!",
            &DrawOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.pastes, 1);
    assert_eq!(
        net.urls.lock().unwrap().as_slice(),
        ["https://cdn.discordapp.com/emojis/123456789012345678.png"]
    );
}

#[tokio::test]
async fn custom_emoji_stay_text_when_disabled() {
    init_tracing();
    let net = Arc::new(FakeNet::default());
    let config = SessionConfig::default()
        .without_cache_dir()
        .with_render_custom_emoji(false);
    let session = Session::open(config).unwrap().with_fetcher(net.clone());
    let mut canvas = FakeCanvas::default();

    let text = "<:wave:123456789012345678>";
    let report = session
        .draw_text(&mut canvas, (0.0, 0.0), text, &DrawOptions::default())
        .await
        .unwrap();

    assert_eq!(report.pastes, 0);
    assert_eq!(canvas.calls, vec![Call::Draw((0.0, 0.0), text.to_string())]);
    assert_eq!(net.calls(), 0);
}

#[tokio::test]
async fn scale_and_offset_from_session_and_options() {
    init_tracing();
    let net = Arc::new(FakeNet::default());
    let config = SessionConfig::default()
        .without_cache_dir()
        .with_emoji_scale_factor(0.5)
        .with_emoji_position_offset((0, 3));
    let session = Session::open(config).unwrap().with_fetcher(net);

    let mut canvas = FakeCanvas::default();
    session
        .draw_text(&mut canvas, (0.0, 0.0), GRIN, &DrawOptions::default())
        .await
        .unwrap();
    assert_eq!(canvas.calls[1], Call::Paste((0, 5), (10, 10)));

    let mut canvas = FakeCanvas::default();
    let options = DrawOptions::default()
        .with_emoji_scale_factor(1.0)
        .with_emoji_position_offset((0, 0));
    session
        .draw_text(&mut canvas, (0.0, 0.0), GRIN, &options)
        .await
        .unwrap();
    assert_eq!(canvas.calls[1], Call::Paste((0, 2), (20, 20)));
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn repeated_emoji_hit_memory() {
    let net = Arc::new(FakeNet::default());
    let mut session = session(net.clone());
    let mut canvas = FakeCanvas::default();

    for _ in 0..2 {
        session
            .draw_text(&mut canvas, (0.0, 0.0), GRIN, &DrawOptions::default())
            .await
            .unwrap();
    }

    assert_eq!(net.calls(), 1);
    assert_eq!(session.cached_images(), 1);

    session.close().unwrap();
    assert_eq!(session.cached_images(), 0);
}

#[tokio::test]
async fn durable_cache_survives_sessions() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::default().with_cache_dir(dir.path());

    let online = Arc::new(FakeNet::default());
    let mut first = Session::open(config.clone())
        .unwrap()
        .with_fetcher(online.clone());
    first
        .draw_text(&mut FakeCanvas::default(), (0.0, 0.0), GRIN, &DrawOptions::default())
        .await
        .unwrap();
    first.close().unwrap();

    let offline = Arc::new(FakeNet::offline());
    let second = Session::open(config).unwrap().with_fetcher(offline.clone());
    let report = second
        .draw_text(&mut FakeCanvas::default(), (0.0, 0.0), GRIN, &DrawOptions::default())
        .await
        .unwrap();

    assert_eq!(report.pastes, 1);
    assert!(report.is_complete());
    assert_eq!(online.calls(), 1);
    assert_eq!(offline.calls(), 0);
}

// ============================================================================
// Lifecycle and measuring
// ============================================================================

#[tokio::test]
async fn close_twice_fails_and_closed_session_refuses_work() {
    let mut session = session(Arc::new(FakeNet::default()));
    let mut canvas = FakeCanvas::default();

    session.close().unwrap();
    assert!(session.is_closed());
    assert!(matches!(session.close(), Err(Error::AlreadyClosed)));

    let err = session
        .draw_text(&mut canvas, (0.0, 0.0), "x", &DrawOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionClosed));
    assert!(matches!(
        session.measure_text(&canvas, "x", &DrawOptions::default()),
        Err(Error::SessionClosed)
    ));
    assert!(canvas.calls.is_empty());
}

#[test]
fn unknown_style_is_rejected() {
    let err = Session::open(SessionConfig::default().with_source("comic-sans")).unwrap_err();
    assert!(matches!(err, Error::Source(SourceError::UnknownStyle(_))));

    let err = Session::open(SessionConfig::default().with_source("")).unwrap_err();
    assert!(matches!(err, Error::Source(SourceError::MissingStyle)));
}

#[test]
fn measure_is_idempotent() {
    let session = session(Arc::new(FakeNet::default()));
    let canvas = FakeCanvas::default();
    let options = DrawOptions::default();

    let text = format!("Hi {GRIN}\nlonger line");
    let first = session.measure_text(&canvas, &text, &options).unwrap();
    let second = session.measure_text(&canvas, &text, &options).unwrap();

    // widths: "Hi " + emoji = 25 + 20, "longer line" = 105; height 2 * 24 - 4
    assert_eq!(first, (105, 44));
    assert_eq!(first, second);
    assert_eq!(session.measure_text(&canvas, "", &options).unwrap(), (0, 0));
}
