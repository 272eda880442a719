#![forbid(unsafe_code)]

//! Incremental line breaking and pagination for large texts.
//!
//! This crate lays out an immutable text buffer one page at a time:
//! - [`PageCache`] - the cache itself: scrolling, lazy discovery, drawing
//! - [`LineIndex`] / [`LineRecord`] - the window of discovered lines
//! - [`LineBreaks`] - forced-wrap line discovery over a byte range
//! - [`GlyphWidthCache`] - LRU cache of per-character advance widths
//! - [`TextMeasurer`], [`Surface`], [`Invalidate`] - host seams
//! - [`CellMeasurer`], [`RecordingSurface`] - ready-made host pieces
//!
//! # Example
//! ```
//! use pager_core::{ReaderCells, Rect};
//! use pager_text::{CellMeasurer, LayoutConfig, PageCache, RecordingSurface, ScanMode};
//!
//! let book = "Chapter 1\n".repeat(100);
//! let cells = ReaderCells::shared(0, 0, 0);
//! let mut repaint = Vec::new();
//!
//! let mut cache = PageCache::with_config(LayoutConfig::new().scan_mode(ScanMode::Eager));
//! cache.set_text(&book, cells.clone(), &mut |rect: Rect| repaint.push(rect));
//! cache.set_rect(Rect::from_size(20, 5));
//!
//! let mut surface = RecordingSurface::new(CellMeasurer::terminal());
//! cache.draw_page(&mut surface);
//! assert_eq!(surface.rows().len(), 5);
//!
//! cache.page_down(&mut |rect: Rect| repaint.push(rect));
//! surface.clear();
//! cache.draw_page(&mut surface);
//! assert_eq!(cells.position(), 50);
//! assert_eq!(repaint.len(), 2);
//! ```

pub mod config;
pub mod discover;
pub mod line_index;
pub mod measure;
pub mod page_cache;
pub mod surface;
pub mod width_cache;

pub use config::{
    DEFAULT_MIN_SCAN_BUDGET, DEFAULT_PROBE_GLYPH, DEFAULT_REFERENCE_GLYPHS, DEFAULT_RETAIN_LINES,
    LayoutConfig, ParseScanModeError, ScanMode, VerifyPolicy,
};
pub use discover::{BreakKind, LineBreak, LineBreaks, TailPolicy, layout_all};
pub use line_index::{ClearMode, IndexViolation, LINE_BLOCK, LineIndex, LineRecord};
pub use measure::{CellMeasurer, TextMeasurer};
pub use page_cache::PageCache;
pub use surface::{DrawCall, Invalidate, RecordingSurface, RedrawRequests, RenderContext, Surface};
pub use width_cache::{CacheStats, DEFAULT_CACHE_CAPACITY, GlyphWidthCache};
