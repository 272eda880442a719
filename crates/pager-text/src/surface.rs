#![forbid(unsafe_code)]

//! Drawing and invalidation seams.
//!
//! The cache renders through [`Surface::draw_text`] and asks the host to
//! schedule repaints through [`Invalidate::invalidate`]. Both are
//! fire-and-forget: nothing the host returns feeds back into layout.

use pager_core::geometry::{Extent, Rect};

use crate::measure::{CellMeasurer, TextMeasurer};

/// Drawing primitive supplied by the host.
pub trait Surface {
    /// Draw `text` left-aligned inside `dest`.
    ///
    /// `text` is the raw line slice, including a trailing line terminator
    /// when the line has one.
    fn draw_text(&mut self, text: &str, dest: Rect);
}

/// Everything [`crate::PageCache::draw_page`] needs from the host.
pub trait RenderContext: TextMeasurer + Surface {}

impl<T: TextMeasurer + Surface + ?Sized> RenderContext for T {}

/// Repaint request sink.
pub trait Invalidate {
    /// Ask the host to repaint `rect` at its next opportunity.
    fn invalidate(&mut self, rect: Rect);
}

impl<F: FnMut(Rect)> Invalidate for F {
    fn invalidate(&mut self, rect: Rect) {
        self(rect);
    }
}

/// Counts repaint requests; handy for hosts that repaint everything anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedrawRequests {
    requests: Vec<Rect>,
}

impl RedrawRequests {
    /// Create an empty request log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests since the last [`take`](Self::take).
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// True when no repaint is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Drain pending requests.
    pub fn take(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.requests)
    }
}

impl Invalidate for RedrawRequests {
    fn invalidate(&mut self, rect: Rect) {
        self.requests.push(rect);
    }
}

/// One recorded [`Surface::draw_text`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    /// Text passed to the surface.
    pub text: String,
    /// Destination rectangle.
    pub dest: Rect,
}

/// A surface that records draw calls instead of rasterizing them.
///
/// Pairs a measurer with the recording so it can be handed to
/// [`crate::PageCache::draw_page`] directly.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface<M = CellMeasurer> {
    measurer: M,
    calls: Vec<DrawCall>,
}

impl<M: TextMeasurer> RecordingSurface<M> {
    /// Create a recording surface measuring with `measurer`.
    pub fn new(measurer: M) -> Self {
        Self {
            measurer,
            calls: Vec::new(),
        }
    }

    /// Draw calls since the last clear.
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Forget recorded calls; call before each page render.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Text of each recorded row without its line terminator.
    #[must_use]
    pub fn rows(&self) -> Vec<&str> {
        self.calls
            .iter()
            .map(|call| call.text.trim_end_matches(['\n', '\r']))
            .collect()
    }
}

impl<M: TextMeasurer> TextMeasurer for RecordingSurface<M> {
    fn measure(&self, text: &str) -> Extent {
        self.measurer.measure(text)
    }

    fn char_width(&self, ch: char) -> i32 {
        self.measurer.char_width(ch)
    }
}

impl<M> Surface for RecordingSurface<M> {
    fn draw_text(&mut self, text: &str, dest: Rect) {
        self.calls.push(DrawCall {
            text: text.to_owned(),
            dest,
        });
    }
}
