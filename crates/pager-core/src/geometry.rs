#![forbid(unsafe_code)]

//! Geometric primitives.

/// A viewport or destination rectangle in device units (pixels).
///
/// Origin is top-left; `x`/`y` may be negative when a host scrolls a
/// surface, but a usable viewport always has a positive width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in device units.
    pub width: i32,
    /// Height in device units.
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Create a rectangle from its four edges (`right`/`bottom` exclusive).
    #[inline]
    pub const fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    /// Left edge (inclusive). Alias for `self.x`.
    #[inline]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Top edge (inclusive). Alias for `self.y`.
    #[inline]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// True when the rectangle has no drawable area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Shrink every edge by `amount`.
    ///
    /// Negative amounts grow the rectangle. The result may be empty.
    pub fn inset(&self, amount: i32) -> Rect {
        let twice = amount.saturating_mul(2);
        Rect {
            x: self.x.saturating_add(amount),
            y: self.y.saturating_add(amount),
            width: self.width.saturating_sub(twice),
            height: self.height.saturating_sub(twice),
        }
    }

    /// True when both rectangles have the same horizontal extent.
    ///
    /// Line breaks only depend on this, so hosts can resize vertically
    /// without losing layout work.
    #[inline]
    pub const fn same_width(&self, other: &Rect) -> bool {
        self.width == other.width
    }
}

/// Measured size of a run of text in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Extent {
    /// Advance width.
    pub width: i32,
    /// Line height of the font, independent of the text content.
    pub height: i32,
}

impl Extent {
    /// Create a new extent.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}
