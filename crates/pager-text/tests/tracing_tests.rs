#![forbid(unsafe_code)]

//! Tracing integration tests.
//!
//! Verifies that draws and index extensions are wrapped in spans and that
//! recovered anomalies are reported as warnings.
//!
//!   cargo test -p pager-text --test tracing_tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pager_core::{ReaderCells, Rect};
use pager_text::{
    CellMeasurer, LayoutConfig, PageCache, RecordingSurface, RedrawRequests, VerifyPolicy,
};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// A captured span with its fields and parent.
#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

/// A captured event.
#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
}

/// A tracing Layer that records spans and events.
struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl SpanCapture {
    fn new() -> (Self, CaptureHandle) {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));

        let handle = CaptureHandle {
            spans: spans.clone(),
            events: events.clone(),
        };

        (Self { spans, events }, handle)
    }
}

/// Handle to read captured data after the closure ran.
struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn named(&self, name: &str) -> Vec<CapturedSpan> {
        self.spans().into_iter().filter(|s| s.name == name).collect()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }
}

/// Visitor that extracts fields as strings.
struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);

        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .into_iter()
            .find(|(name, _)| name == "message")
            .map(|(_, value)| value)
            .unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
        });
    }
}

/// Set up a tracing subscriber with span capture and run a closure.
fn with_captured_spans<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let (layer, handle) = SpanCapture::new();
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

fn numbered(count: usize) -> String {
    (0..count).map(|i| format!("line {i:03}\n")).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn draw_page_opens_a_span_per_call() {
    let text = numbered(50);
    let handle = with_captured_spans(|| {
        let mut host = RedrawRequests::new();
        let mut cache = PageCache::new();
        cache.set_text(&text, ReaderCells::shared(0, 0, 0), &mut host);
        cache.set_rect(Rect::from_size(20, 5));
        let mut surface = RecordingSurface::new(CellMeasurer::terminal());
        for _ in 0..3 {
            cache.draw_page(&mut surface);
            cache.page_down(&mut host);
        }
    });

    let draws = handle.named("page_cache.draw_page");
    assert_eq!(draws.len(), 3);
    assert!(draws.iter().all(|s| s.fields.contains_key("cursor")));
}

#[test]
fn extension_is_nested_in_draw() {
    let text = numbered(50);
    let handle = with_captured_spans(|| {
        let mut host = RedrawRequests::new();
        let mut cache = PageCache::new();
        cache.set_text(&text, ReaderCells::shared(0, 0, 0), &mut host);
        cache.set_rect(Rect::from_size(20, 5));
        let mut surface = RecordingSurface::new(CellMeasurer::terminal());
        cache.draw_page(&mut surface);
    });

    let extends = handle.named("page_cache.extend");
    assert_eq!(extends.len(), 1, "spans: {:?}", handle.spans());
    assert_eq!(extends[0].parent_name.as_deref(), Some("page_cache.draw_page"));
    assert_eq!(extends[0].fields.get("max_width").map(String::as_str), Some("20"));
}

#[test]
fn redraw_of_covered_page_does_not_extend() {
    let text = numbered(50);
    let handle = with_captured_spans(|| {
        let mut host = RedrawRequests::new();
        let mut cache = PageCache::new();
        cache.set_text(&text, ReaderCells::shared(0, 0, 0), &mut host);
        cache.set_rect(Rect::from_size(20, 5));
        let mut surface = RecordingSurface::new(CellMeasurer::terminal());
        cache.draw_page(&mut surface);
        cache.draw_page(&mut surface);
        cache.draw_page(&mut surface);
    });

    assert_eq!(handle.named("page_cache.draw_page").len(), 3);
    assert_eq!(handle.named("page_cache.extend").len(), 1);
}

#[test]
fn invalid_viewport_skips_extension() {
    let handle = with_captured_spans(|| {
        let mut host = RedrawRequests::new();
        let mut cache = PageCache::new();
        cache.set_text("hello", ReaderCells::shared(0, 0, 0), &mut host);
        cache.set_rect(Rect::from_size(20, 0));
        let mut surface = RecordingSurface::new(CellMeasurer::terminal());
        cache.draw_page(&mut surface);
    });

    assert_eq!(handle.named("page_cache.draw_page").len(), 1);
    assert!(handle.named("page_cache.extend").is_empty());
}

#[test]
fn recovered_violation_is_a_warning() {
    let text = numbered(20);
    let handle = with_captured_spans(|| {
        let mut host = RedrawRequests::new();
        let cells = ReaderCells::shared(0, 0, 0);
        let config = LayoutConfig::new().verify(VerifyPolicy::Recover);
        let mut cache = PageCache::with_config(config);
        cache.set_text(&text, cells.clone(), &mut host);
        cache.set_rect(Rect::from_size(20, 3));
        let mut surface = RecordingSurface::new(CellMeasurer::terminal());
        cache.draw_page(&mut surface);

        // Shrink the buffer behind the cache's back: the indexed lines now
        // run past its end.
        cache.set_text(&text[..20], cells.clone(), &mut host);
        cache.append_or_insert_line(pager_text::LineRecord::new(0, 60), None);
        cache.draw_page(&mut surface);
        assert!(cache.check_invariants().is_ok());
    });

    let warnings: Vec<_> = handle
        .events()
        .into_iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1, "events: {:?}", handle.events());
    assert!(warnings[0].message.contains("rebuilding"));
}
