#![forbid(unsafe_code)]

//! Reference host for the page cache.
//!
//! Drives a [`PageCache`] over a UTF-8 buffer on a terminal-style cell grid,
//! paging forward from a start offset and recording every page that reached
//! the surface. The result is written as JSONL so runs can be diffed.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"start","text_len":1234,"checksum":"fxhash:...","cols":80,"rows":24,"scan_mode":"logical-line"}
//! {"event":"page","index":0,"position":0,"page_size":812,"rows":["...","..."]}
//! {"event":"complete","pages":2,"lines_indexed":48,"at_end":true,"width_cache":{"hits":..,"misses":..,"size":..,"hit_rate":..}}
//! ```
//!
//! # Environment
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `PAGER_HARNESS_COLS` | viewport width in cells | 80 |
//! | `PAGER_HARNESS_ROWS` | viewport height in cells | 24 |
//! | `PAGER_HARNESS_LINE_GAP` | blank cells between rows | 0 |
//! | `PAGER_HARNESS_BORDER` | inset on every side | 0 |
//! | `PAGER_HARNESS_PAGES` | page count, or `all` | all |
//! | `PAGER_HARNESS_SCAN_MODE` | `eager`, `logical-line`, `budget` | logical-line |
//! | `PAGER_HARNESS_START` | starting byte offset | 0 |

use std::hash::Hasher;
use std::io::{self, Write};

use pager_core::{ReaderCells, Rect};
use pager_text::{
    CacheStats, CellMeasurer, LayoutConfig, PageCache, RecordingSurface, RedrawRequests, ScanMode,
};
use rustc_hash::FxHasher;
use serde_json::json;
use tracing::{debug, info_span};

/// Prefix on text checksums so the hash family is visible in reports.
const CHECKSUM_PREFIX: &str = "fxhash:";

// ============================================================================
// Configuration
// ============================================================================

/// Viewport and paging settings for one harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Viewport width in cells.
    pub cols: i32,
    /// Viewport height in cells.
    pub rows: i32,
    /// Blank cells between rows.
    pub line_gap: i32,
    /// Inset on every side of the viewport, in cells.
    pub border: i32,
    /// Number of pages to emit; `None` pages until the end of the buffer.
    pub pages: Option<usize>,
    /// Forward scan stop policy.
    pub scan_mode: ScanMode,
    /// Byte offset of the first page. Snapped down to a char boundary.
    pub start: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            line_gap: 0,
            border: 0,
            pages: None,
            scan_mode: ScanMode::default(),
            start: 0,
        }
    }
}

impl HarnessConfig {
    /// Read the configuration from `PAGER_HARNESS_*` environment variables.
    pub fn from_env() -> io::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Unset or blank variables keep their defaults. Malformed values are
    /// reported as [`io::ErrorKind::InvalidInput`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> io::Result<Self> {
        let get = |name: &str| {
            lookup(name).and_then(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        let mut config = Self::default();
        if let Some(value) = get("PAGER_HARNESS_COLS") {
            config.cols = parse_positive("PAGER_HARNESS_COLS", &value)?;
        }
        if let Some(value) = get("PAGER_HARNESS_ROWS") {
            config.rows = parse_positive("PAGER_HARNESS_ROWS", &value)?;
        }
        if let Some(value) = get("PAGER_HARNESS_LINE_GAP") {
            config.line_gap = parse_number("PAGER_HARNESS_LINE_GAP", &value)?;
        }
        if let Some(value) = get("PAGER_HARNESS_BORDER") {
            config.border = parse_number("PAGER_HARNESS_BORDER", &value)?;
        }
        if let Some(value) = get("PAGER_HARNESS_PAGES") {
            config.pages = if value.eq_ignore_ascii_case("all") {
                None
            } else {
                Some(parse_number("PAGER_HARNESS_PAGES", &value)?)
            };
        }
        if let Some(value) = get("PAGER_HARNESS_SCAN_MODE") {
            config.scan_mode = value.parse().map_err(|err| {
                invalid_input(format!("PAGER_HARNESS_SCAN_MODE: {err}"))
            })?;
        }
        if let Some(value) = get("PAGER_HARNESS_START") {
            config.start = parse_number("PAGER_HARNESS_START", &value)?;
        }
        Ok(config)
    }
}

fn invalid_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> io::Result<T> {
    value
        .parse()
        .map_err(|_| invalid_input(format!("{name} must be a non-negative integer, got {value:?}")))
}

fn parse_positive(name: &str, value: &str) -> io::Result<i32> {
    match value.parse::<i32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid_input(format!(
            "{name} must be a positive integer, got {value:?}"
        ))),
    }
}

// ============================================================================
// Run
// ============================================================================

/// One page as it reached the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDump {
    /// Zero-based page number within the run.
    pub index: usize,
    /// Byte offset of the page's first line.
    pub position: usize,
    /// Bytes covered by the page.
    pub page_size: usize,
    /// Drawn rows, top to bottom, with their line terminators.
    pub rows: Vec<String>,
}

/// Everything a harness run observed.
#[derive(Debug, Clone)]
pub struct Report {
    /// Configuration the run used.
    pub config: HarnessConfig,
    /// Buffer length in bytes.
    pub text_len: usize,
    /// See [`text_checksum`].
    pub checksum: String,
    /// Pages in the order they were drawn.
    pub pages: Vec<PageDump>,
    /// Whether the last page ends at the end of the buffer.
    pub at_end: bool,
    /// Lines held in the index after the last draw.
    pub lines_indexed: usize,
    /// Glyph width cache counters at the end of the run.
    pub width_cache: CacheStats,
}

/// Page through `text` as configured.
pub fn run(config: &HarnessConfig, text: &str) -> Report {
    let _span = info_span!(
        "harness.run",
        cols = config.cols,
        rows = config.rows,
        scan_mode = %config.scan_mode
    )
    .entered();

    let cells = ReaderCells::shared(config.start, config.line_gap, config.border);
    let mut host = RedrawRequests::new();
    let mut cache = PageCache::with_config(LayoutConfig::new().scan_mode(config.scan_mode));
    cache.set_text(text, cells.clone(), &mut host);
    cache.set_rect(Rect::from_size(config.cols, config.rows));
    let mut surface = RecordingSurface::new(CellMeasurer::terminal());

    let mut pages = Vec::new();
    let mut at_end = text.is_empty();
    loop {
        if config.pages.is_some_and(|limit| pages.len() >= limit) {
            break;
        }
        surface.clear();
        cache.draw_page(&mut surface);
        let position = cells.position();
        let page_size = cache.current_page_size();
        debug!(index = pages.len(), position, page_size, "page drawn");
        pages.push(PageDump {
            index: pages.len(),
            position,
            page_size,
            rows: surface.rows().into_iter().map(str::to_owned).collect(),
        });

        at_end = position + page_size >= text.len();
        if at_end || page_size == 0 {
            break;
        }
        host.take();
        cache.page_down(&mut host);
        if host.is_empty() {
            break;
        }
    }

    Report {
        config: config.clone(),
        text_len: text.len(),
        checksum: text_checksum(text),
        pages,
        at_end,
        lines_indexed: cache.lines().len(),
        width_cache: cache.width_cache_stats(),
    }
}

/// Deterministic checksum of a buffer, prefixed with its hash family.
pub fn text_checksum(text: &str) -> String {
    let mut hasher = FxHasher::default();
    hasher.write(text.as_bytes());
    format!("{CHECKSUM_PREFIX}{:016x}", hasher.finish())
}

// ============================================================================
// Output
// ============================================================================

/// Write `report` as JSONL, one event per line.
pub fn write_report(report: &Report, out: &mut impl Write) -> io::Result<()> {
    let start = json!({
        "event": "start",
        "text_len": report.text_len,
        "checksum": report.checksum,
        "cols": report.config.cols,
        "rows": report.config.rows,
        "line_gap": report.config.line_gap,
        "border": report.config.border,
        "scan_mode": report.config.scan_mode.as_str(),
        "start": report.config.start,
    });
    writeln!(out, "{start}")?;

    for page in &report.pages {
        let line = json!({
            "event": "page",
            "index": page.index,
            "position": page.position,
            "page_size": page.page_size,
            "rows": page.rows,
        });
        writeln!(out, "{line}")?;
    }

    let stats = &report.width_cache;
    let complete = json!({
        "event": "complete",
        "pages": report.pages.len(),
        "at_end": report.at_end,
        "lines_indexed": report.lines_indexed,
        "width_cache": {
            "hits": stats.hits,
            "misses": stats.misses,
            "size": stats.size,
            "hit_rate": stats.hit_rate(),
        },
    });
    writeln!(out, "{complete}")?;
    out.flush()
}
