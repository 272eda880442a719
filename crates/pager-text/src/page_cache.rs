#![forbid(unsafe_code)]

//! Incremental pagination over an immutable text buffer.
//!
//! [`PageCache`] keeps a window of discovered line boundaries (a
//! [`LineIndex`]) around the page being shown and grows it lazily at draw
//! time. Scrolling only moves a cursor; every scan is bounded by a budget
//! derived from the viewport, so the cost of a scroll step does not depend
//! on the size of the buffer.
//!
//! # Cursor
//!
//! `current_line` indexes the top line of the page. Scrolling up past the
//! first indexed line leaves it negative, which tells the next draw to
//! discover lines backward first. Scrolling down past the last indexed line
//! is resolved the same way in the forward direction.
//!
//! # Example
//! ```
//! use pager_core::{ReaderCells, Rect};
//! use pager_text::{CellMeasurer, PageCache, RecordingSurface, RedrawRequests};
//!
//! let text = "AAAA\nBBBBBBBBBB\nCC";
//! let mut cache = PageCache::new();
//! let mut host = RedrawRequests::new();
//! cache.set_text(text, ReaderCells::shared(0, 0, 0), &mut host);
//! cache.set_rect(Rect::from_size(10, 3));
//!
//! let mut surface = RecordingSurface::new(CellMeasurer::terminal());
//! cache.draw_page(&mut surface);
//! assert_eq!(surface.rows(), vec!["AAAA", "BBBBBBBBBB", "CC"]);
//! assert_eq!(cache.current_page_size(), text.len());
//! ```

use pager_core::geometry::Rect;
use pager_core::shared::{ReaderCells, SharedCells};
use smallvec::SmallVec;
use tracing::{debug, debug_span, trace, warn};

use crate::config::{LayoutConfig, VerifyPolicy};
use crate::discover::{
    LineBreaks, TailPolicy, backward_floor, floor_char_boundary, forward_ceiling,
};
use crate::line_index::{ClearMode, IndexViolation, LineIndex, LineRecord};
use crate::measure::TextMeasurer;
use crate::surface::{Invalidate, RenderContext};
use crate::width_cache::{CacheStats, GlyphWidthCache};

/// Backward scans rarely produce more than a screenful of lines.
type ScanBuffer = SmallVec<[LineRecord; 64]>;

/// Line-break and pagination cache for one viewport.
#[derive(Debug)]
pub struct PageCache<'a> {
    config: LayoutConfig,
    text: &'a str,
    cells: SharedCells,
    rect: Rect,
    lines: LineIndex,
    current_line: isize,
    current_page_size: usize,
    lines_per_page: usize,
    widths: GlyphWidthCache,
}

impl<'a> PageCache<'a> {
    /// Create an empty cache with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    /// Create an empty cache.
    #[must_use]
    pub fn with_config(config: LayoutConfig) -> Self {
        let widths = GlyphWidthCache::new(config.width_cache_capacity);
        Self {
            config,
            text: "",
            cells: ReaderCells::shared(0, 0, 0),
            rect: Rect::default(),
            lines: LineIndex::new(),
            current_line: 0,
            current_page_size: 0,
            lines_per_page: 0,
            widths,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    // --- Configuration -----------------------------------------------------

    /// Attach a new buffer and the cells shared with the host.
    ///
    /// Drops all layout state, including cached glyph widths: a new buffer
    /// is also how hosts announce a font change. The first page is laid out
    /// from `cells.position()` on the next draw.
    pub fn set_text(&mut self, text: &'a str, cells: SharedCells, host: &mut impl Invalidate) {
        debug!(len = text.len(), position = cells.position(), "page cache text set");
        self.text = text;
        self.cells = cells;
        self.clear_index(ClearMode::Release);
        self.widths.clear();
        self.redraw(host);
    }

    /// Resize the viewport.
    ///
    /// Line breaks only depend on the width, so a height-only change keeps
    /// the index.
    pub fn set_rect(&mut self, rect: Rect) {
        if rect == self.rect {
            return;
        }
        if !rect.same_width(&self.rect) {
            debug!(
                old_width = self.rect.width,
                new_width = rect.width,
                "viewport width changed; dropping line index"
            );
            self.clear_index(ClearMode::Release);
        }
        self.rect = rect;
    }

    /// Forget the discovered lines but keep their storage.
    ///
    /// The next draw lays out from the published position again. Hosts call
    /// this after changing the line gap or border.
    pub fn reset(&mut self, host: &mut impl Invalidate, redraw: bool) {
        self.clear_index(ClearMode::Truncate);
        if redraw {
            self.redraw(host);
        }
    }

    /// Ask the host to repaint the viewport.
    pub fn redraw(&self, host: &mut impl Invalidate) {
        host.invalidate(self.rect);
    }

    // --- Scrolling ---------------------------------------------------------

    /// Scroll up by `n` lines.
    pub fn line_up(&mut self, host: &mut impl Invalidate, n: usize) {
        if n == 0 || !self.is_valid() || self.lines.is_empty() {
            return;
        }
        if self.current_line <= 0 && self.lines.reaches_start() {
            return;
        }
        self.current_line = self.current_line.saturating_sub(to_isize(n));
        if self.current_line < 0 && self.lines.reaches_start() {
            self.current_line = 0;
        }
        self.redraw(host);
    }

    /// Scroll down by `n` lines.
    ///
    /// The cursor may move past the indexed lines; the next draw discovers
    /// or clamps as needed.
    pub fn line_down(&mut self, host: &mut impl Invalidate, n: usize) {
        if n == 0 || !self.is_valid() || self.lines.is_empty() {
            return;
        }
        if self.cells.position() + self.current_page_size == self.text.len() {
            return;
        }
        self.current_line = self.current_line.saturating_add(to_isize(n));
        self.redraw(host);
    }

    /// Scroll up by one page.
    pub fn page_up(&mut self, host: &mut impl Invalidate) {
        self.line_up(host, self.lines_per_page);
    }

    /// Scroll down by one page.
    pub fn page_down(&mut self, host: &mut impl Invalidate) {
        self.line_down(host, self.lines_per_page);
    }

    // --- Rendering ---------------------------------------------------------

    /// Lay out and draw the current page.
    ///
    /// Publishes the offset of the top line to the shared position cell.
    pub fn draw_page<C: RenderContext + ?Sized>(&mut self, ctx: &mut C) {
        let _span = debug_span!(
            "page_cache.draw_page",
            cursor = self.current_line,
            indexed = self.lines.len()
        )
        .entered();

        self.current_page_size = 0;
        if !self.is_valid() {
            return;
        }

        let gap = self.cells.line_gap();
        let border = self.cells.border();
        let line_height = ctx
            .measure(&self.config.reference_glyphs)
            .height
            .saturating_add(gap);
        let usable = self
            .rect
            .height
            .saturating_add(gap)
            .saturating_sub(border.saturating_mul(2));
        self.lines_per_page = if line_height > 0 && usable > 0 {
            (usable / line_height) as usize
        } else {
            0
        };
        if self.lines_per_page == 0 {
            trace!("viewport holds no lines");
            return;
        }

        let inner = self.rect.inset(border);
        let max_width = inner.width;
        self.layout(&*ctx, max_width);
        if !self.verify(&*ctx, max_width) {
            return;
        }
        let Ok(top) = usize::try_from(self.current_line) else {
            return;
        };
        let Some(first) = self.lines.get(top) else {
            return;
        };
        let position = first.start;

        let mut y = inner.top();
        let mut page_size = 0;
        for record in self.lines[top..].iter().take(self.lines_per_page) {
            let bottom = y.saturating_add(line_height);
            let dest = Rect::from_edges(inner.left(), y, inner.right(), bottom);
            ctx.draw_text(record.slice(self.text), dest);
            page_size += record.len;
            y = y.saturating_add(line_height);
        }

        self.current_page_size = page_size;
        self.cells.set_position(position);
        trace!(position, page_size, "page drawn");
    }

    // --- Accessors ---------------------------------------------------------

    /// Bytes covered by the lines drawn in the last render.
    #[must_use]
    pub fn current_page_size(&self) -> usize {
        self.current_page_size
    }

    /// Lines that fit the viewport, as of the last render.
    #[must_use]
    pub fn lines_per_page(&self) -> usize {
        self.lines_per_page
    }

    /// The discovered lines.
    #[must_use]
    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    /// Index of the top line into [`lines`](Self::lines); negative while a
    /// backward scroll is pending.
    #[must_use]
    pub fn current_line(&self) -> isize {
        self.current_line
    }

    /// The viewport.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The attached buffer.
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Handle to the shared reader cells.
    #[must_use]
    pub fn cells(&self) -> &SharedCells {
        &self.cells
    }

    /// True when there is something to lay out: a non-empty buffer and a
    /// viewport with area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.text.is_empty() && !self.rect.is_empty()
    }

    /// Glyph width cache statistics.
    #[must_use]
    pub fn width_cache_stats(&self) -> CacheStats {
        self.widths.stats()
    }

    /// Check the index and cursor invariants.
    ///
    /// These hold after every [`draw_page`](Self::draw_page); scrolling in
    /// between may leave the cursor outside the index until the next draw.
    pub fn check_invariants(&self) -> Result<(), IndexViolation> {
        let len = self.text.len();
        self.lines.validate(len)?;
        if self.lines.is_empty() {
            return Ok(());
        }
        let cursor = usize::try_from(self.current_line)
            .ok()
            .filter(|&c| c < self.lines.len())
            .ok_or(IndexViolation::Cursor {
                cursor: self.current_line,
                len: self.lines.len(),
            })?;
        if cursor + self.lines_per_page > self.lines.len() && !self.lines.reaches_end(len) {
            return Err(IndexViolation::ShortPage {
                cursor,
                lines_per_page: self.lines_per_page,
                len: self.lines.len(),
            });
        }
        Ok(())
    }

    // --- Index maintenance -------------------------------------------------

    /// Add a discovered line.
    ///
    /// `None` appends. `Some(at)` inserts before position `at`; when that
    /// lands at or before the cursor the cursor moves down with its line.
    pub fn append_or_insert_line(&mut self, record: LineRecord, at: Option<usize>) {
        match at {
            None => self.lines.push(record),
            Some(at) => {
                let at = at.min(self.lines.len());
                self.lines.insert(at, record);
                if to_isize(at) <= self.current_line {
                    self.current_line += 1;
                }
            }
        }
    }

    /// Prepend a batch of lines, shifting the cursor by the count.
    fn insert_front(&mut self, records: &[LineRecord]) -> usize {
        let added = self.lines.insert_front(records);
        self.current_line = self.current_line.saturating_add(to_isize(added));
        added
    }

    /// Drop every discovered line and move the cursor to the top.
    pub fn clear_index(&mut self, mode: ClearMode) {
        self.lines.clear(mode);
        self.current_line = 0;
    }

    // --- Layout ------------------------------------------------------------

    fn needs_extension(&self) -> bool {
        let len = self.text.len();
        if self.lines.is_empty() || self.current_line < 0 {
            return true;
        }
        if self.lines.reaches_end(len) {
            return self.current_line >= to_isize(self.lines.len());
        }
        self.current_line.saturating_add(to_isize(self.lines_per_page)) > to_isize(self.lines.len())
    }

    fn layout<M: TextMeasurer + ?Sized>(&mut self, measurer: &M, max_width: i32) {
        if !self.needs_extension() {
            return;
        }
        let len = self.text.len();
        let _span = debug_span!(
            "page_cache.extend",
            cursor = self.current_line,
            indexed = self.lines.len(),
            max_width
        )
        .entered();

        let budget = self.scan_budget(measurer, max_width);
        let anchor = floor_char_boundary(self.text, self.cells.position());
        if self.lines.is_empty() {
            // Anchored at the end: lay out backward so the final page shows.
            self.current_line = if anchor >= len {
                -to_isize(self.lines_per_page)
            } else {
                0
            };
        }

        self.extend_backward(measurer, max_width, budget, anchor);
        self.extend_forward(measurer, max_width, budget, anchor);

        let indexed = to_isize(self.lines.len());
        if self.lines.reaches_end(len) && self.current_line >= indexed {
            self.current_line = indexed - to_isize(self.lines_per_page);
            self.extend_backward(measurer, max_width, budget, anchor);
        }

        self.trim();
        debug!(
            cursor = self.current_line,
            indexed = self.lines.len(),
            start = self.lines.start(),
            end = self.lines.end(),
            "index extended"
        );
    }

    /// Scan budget in bytes: roughly one viewport of probe glyphs.
    fn scan_budget<M: TextMeasurer + ?Sized>(&self, measurer: &M, max_width: i32) -> usize {
        let mut buf = [0u8; 4];
        let probe = measurer.measure(self.config.probe_glyph.encode_utf8(&mut buf));
        let cols = if probe.width > 0 { max_width.max(0) / probe.width } else { 0 };
        let rows = if probe.height > 0 {
            self.rect.height.max(0) / probe.height
        } else {
            0
        };
        (cols as usize)
            .saturating_mul(rows as usize)
            .max(self.config.min_scan_budget)
    }

    fn extend_backward<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &M,
        max_width: i32,
        budget: usize,
        anchor: usize,
    ) {
        while self.current_line < 0 {
            let first = self.lines.start().unwrap_or(anchor);
            if first == 0 {
                break;
            }
            let floor = backward_floor(self.text, first, budget);
            let widths = &mut self.widths;
            let found: ScanBuffer = LineBreaks::new(
                self.text,
                floor,
                first,
                max_width,
                TailPolicy::Emit,
                |ch| widths.get_or_measure(ch, measurer),
            )
            .map(|line| line.record)
            .collect();
            let added = self.insert_front(&found);
            trace!(from = floor, to = first, added, "backward scan");
            if added == 0 {
                break;
            }
        }
        if self.current_line < 0 {
            self.current_line = 0;
        }
    }

    fn extend_forward<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &M,
        max_width: i32,
        budget: usize,
        anchor: usize,
    ) {
        let len = self.text.len();
        let Ok(top) = usize::try_from(self.current_line) else {
            return;
        };
        let wanted = top.saturating_add(self.lines_per_page);
        let mut budget = budget;

        while self.lines.len() < wanted && !self.lines.reaches_end(len) {
            let last = self.lines.end().unwrap_or(anchor);
            let ceiling = forward_ceiling(self.text, last, budget);
            let tail = if ceiling == len {
                TailPolicy::Emit
            } else {
                TailPolicy::Discard
            };

            let mode = self.config.scan_mode;
            let lines = &mut self.lines;
            let widths = &mut self.widths;
            let mut added = 0usize;
            let scan = LineBreaks::new(self.text, last, ceiling, max_width, tail, |ch| {
                widths.get_or_measure(ch, measurer)
            });
            for line in scan {
                lines.push(line.record);
                added += 1;
                if lines.len() >= wanted && mode.stops_at(line.kind) {
                    break;
                }
            }
            trace!(from = last, to = ceiling, added, "forward scan");

            if added == 0 {
                if ceiling >= len {
                    break;
                }
                budget = budget.saturating_mul(2);
            }
        }
    }

    /// Drop lines far from the page once the index outgrows the retention
    /// window. Keeps one page above the cursor and the page itself.
    fn trim(&mut self) {
        let Some(limit) = self.config.retain_lines else {
            return;
        };
        if self.lines.len() <= limit {
            return;
        }
        let Ok(top) = usize::try_from(self.current_line) else {
            return;
        };

        let excess = self.lines.len() - limit;
        let front = excess.min(top.saturating_sub(self.lines_per_page));
        if front > 0 {
            self.lines.drain_front(front);
            self.current_line -= to_isize(front);
        }

        let keep = limit.max(top - front + self.lines_per_page);
        if self.lines.len() > keep {
            self.lines.truncate(keep);
        }
        debug!(front, indexed = self.lines.len(), "index trimmed");
    }

    /// Run the invariant checks under the configured policy. Returns false
    /// when the page cannot be drawn.
    fn verify<M: TextMeasurer + ?Sized>(&mut self, measurer: &M, max_width: i32) -> bool {
        if self.config.verify == VerifyPolicy::Off {
            return true;
        }
        let Err(violation) = self.check_invariants() else {
            return true;
        };
        if self.config.verify == VerifyPolicy::Strict {
            panic!("page cache invariant violated: {violation}");
        }
        warn!(%violation, "page cache index inconsistent; rebuilding");
        self.clear_index(ClearMode::Release);
        self.layout(measurer, max_width);
        self.check_invariants().is_ok()
    }
}

impl Default for PageCache<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn to_isize(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}
