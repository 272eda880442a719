#![forbid(unsafe_code)]

//! Reader state shared between the host and the page cache.
//!
//! Three values cross the component boundary:
//!
//! | cell       | written by | read by          |
//! |------------|------------|------------------|
//! | `position` | page cache | host, persisters |
//! | `line_gap` | host       | page cache       |
//! | `border`   | host       | page cache       |
//!
//! The cache publishes the byte offset of the top line after every render.
//! Hosts update the gap and border before asking for a redraw. All access is
//! single-threaded, so the cells are plain [`Cell`]s behind an [`Rc`].

use std::cell::Cell;
use std::rc::Rc;

/// Handle to the shared reader cells.
pub type SharedCells = Rc<ReaderCells>;

/// Mutable reader settings and the published scroll position.
#[derive(Debug, Default)]
pub struct ReaderCells {
    position: Cell<usize>,
    line_gap: Cell<i32>,
    border: Cell<i32>,
}

impl ReaderCells {
    /// Create cells with an initial position, line gap, and border inset.
    #[must_use]
    pub fn new(position: usize, line_gap: i32, border: i32) -> Self {
        Self {
            position: Cell::new(position),
            line_gap: Cell::new(line_gap),
            border: Cell::new(border),
        }
    }

    /// Create cells wrapped in a shareable handle.
    #[must_use]
    pub fn shared(position: usize, line_gap: i32, border: i32) -> SharedCells {
        Rc::new(Self::new(position, line_gap, border))
    }

    /// Byte offset of the line at the top of the last rendered page.
    #[inline]
    pub fn position(&self) -> usize {
        self.position.get()
    }

    /// Publish a new top-of-page offset.
    #[inline]
    pub fn set_position(&self, position: usize) {
        self.position.set(position);
    }

    /// Extra vertical space between lines, in device units.
    #[inline]
    pub fn line_gap(&self) -> i32 {
        self.line_gap.get()
    }

    /// Update the line gap. Takes effect on the next draw.
    #[inline]
    pub fn set_line_gap(&self, line_gap: i32) {
        self.line_gap.set(line_gap);
    }

    /// Inset applied on every side of the viewport, in device units.
    #[inline]
    pub fn border(&self) -> i32 {
        self.border.get()
    }

    /// Update the border inset. Takes effect on the next draw.
    #[inline]
    pub fn set_border(&self, border: i32) {
        self.border.set(border);
    }
}
