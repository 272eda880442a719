#![forbid(unsafe_code)]

//! Glyph measurement seam.
//!
//! The page cache never talks to a font system directly. Hosts hand it a
//! [`TextMeasurer`] (usually the same object that draws, see
//! [`crate::surface::RenderContext`]) and the cache asks for:
//!
//! - the advance width of single characters while discovering line breaks,
//! - the extent of a reference string to derive the uniform line height,
//! - the extent of a probe glyph to size its scan budget.
//!
//! Results must be deterministic for a fixed font selection; the cache
//! memoizes per-character widths (see [`crate::width_cache`]).

use pager_core::geometry::Extent;
use unicode_width::UnicodeWidthChar;

/// Font metrics oracle.
pub trait TextMeasurer {
    /// Extent of `text` in device units.
    ///
    /// `height` is the font's line height and must not depend on which
    /// characters `text` contains.
    fn measure(&self, text: &str) -> Extent;

    /// Advance width of a single character.
    fn char_width(&self, ch: char) -> i32 {
        let mut buf = [0u8; 4];
        self.measure(ch.encode_utf8(&mut buf)).width
    }
}

impl<M: TextMeasurer + ?Sized> TextMeasurer for &M {
    fn measure(&self, text: &str) -> Extent {
        (**self).measure(text)
    }

    fn char_width(&self, ch: char) -> i32 {
        (**self).char_width(ch)
    }
}

/// Monospace cell measurer.
///
/// Every character occupies its Unicode display width in cells (CJK and
/// most emoji take two, combining marks and controls take none), scaled by
/// a fixed cell size. Terminal hosts use a 1x1 cell; tests and pixel hosts
/// pick a concrete glyph size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMeasurer {
    cell_width: i32,
    cell_height: i32,
}

impl CellMeasurer {
    /// Create a measurer with the given cell size in device units.
    #[must_use]
    pub const fn new(cell_width: i32, cell_height: i32) -> Self {
        Self {
            cell_width,
            cell_height,
        }
    }

    /// One device unit per cell, as in a terminal grid.
    #[must_use]
    pub const fn terminal() -> Self {
        Self::new(1, 1)
    }

    /// Width of a cell in device units.
    #[must_use]
    pub const fn cell_width(&self) -> i32 {
        self.cell_width
    }

    /// Height of a cell in device units.
    #[must_use]
    pub const fn cell_height(&self) -> i32 {
        self.cell_height
    }
}

impl Default for CellMeasurer {
    fn default() -> Self {
        Self::terminal()
    }
}

impl TextMeasurer for CellMeasurer {
    fn measure(&self, text: &str) -> Extent {
        let cells: i32 = text.chars().map(cell_count).sum();
        Extent::new(cells.saturating_mul(self.cell_width), self.cell_height)
    }

    #[inline]
    fn char_width(&self, ch: char) -> i32 {
        cell_count(ch).saturating_mul(self.cell_width)
    }
}

#[inline]
fn cell_count(ch: char) -> i32 {
    if ch.is_control() {
        return 0;
    }
    ch.width().map_or(0, |w| w as i32)
}
