#![forbid(unsafe_code)]

//! Sparse index of discovered line boundaries.
//!
//! The index covers one contiguous window of the buffer: it starts at some
//! line boundary and runs forward without gaps. Records outside the window
//! are simply unknown; they are rediscovered on demand by
//! [`crate::discover`].
//!
//! # Invariants
//!
//! 1. Every record is non-empty and lies inside the buffer.
//! 2. Consecutive records touch: `r[i].end() == r[i + 1].start`.
//! 3. Only the last record may end at the buffer length.
//!
//! Strictly increasing starts follow from 1 and 2.

use std::fmt;
use std::ops::{Deref, Range};

/// Records reserved at a time when the index grows.
pub const LINE_BLOCK: usize = 1024;

/// One laid-out line: the half-open byte range `[start, start + len)`.
///
/// `len` includes the line terminator when the line ends in a hard break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineRecord {
    /// Byte offset of the first character.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
}

impl LineRecord {
    /// Create a record.
    #[inline]
    #[must_use]
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Offset one past the last byte.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    /// Byte range of the line.
    #[inline]
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// The line's text within `text`, or `""` if the record does not fit.
    #[must_use]
    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        text.get(self.range()).unwrap_or("")
    }
}

/// How much of the index storage [`LineIndex::clear`] gives back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Drop the records but keep the allocation for the next layout.
    Truncate,
    /// Drop the records and free the allocation.
    Release,
}

/// A broken index or cursor invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexViolation {
    /// A record of length zero.
    EmptyRecord {
        /// Position of the record in the index.
        index: usize,
    },
    /// A record running past the end of the buffer.
    OutOfBounds {
        /// Position of the record in the index.
        index: usize,
        /// End offset of the record.
        end: usize,
        /// Length of the buffer.
        buffer_len: usize,
    },
    /// Two neighbouring records that do not touch.
    Gap {
        /// Position of the second record.
        index: usize,
        /// Where the second record should have started.
        expected: usize,
        /// Where it actually starts.
        found: usize,
    },
    /// A record other than the last one reaching the end of the buffer.
    InteriorEnd {
        /// Position of the record in the index.
        index: usize,
    },
    /// The top-of-page cursor points outside the index.
    Cursor {
        /// Cursor value.
        cursor: isize,
        /// Number of indexed lines.
        len: usize,
    },
    /// The page runs past the index although the index stops short of the
    /// end of the buffer.
    ShortPage {
        /// Cursor value.
        cursor: usize,
        /// Lines the page holds.
        lines_per_page: usize,
        /// Number of indexed lines.
        len: usize,
    },
}

impl fmt::Display for IndexViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRecord { index } => write!(f, "line {index} is empty"),
            Self::OutOfBounds {
                index,
                end,
                buffer_len,
            } => write!(
                f,
                "line {index} ends at {end}, past the buffer length {buffer_len}"
            ),
            Self::Gap {
                index,
                expected,
                found,
            } => write!(
                f,
                "line {index} starts at {found}, expected {expected} (not contiguous)"
            ),
            Self::InteriorEnd { index } => {
                write!(f, "line {index} reaches the end of the buffer but is not last")
            }
            Self::Cursor { cursor, len } => {
                write!(f, "cursor {cursor} outside index of {len} lines")
            }
            Self::ShortPage {
                cursor,
                lines_per_page,
                len,
            } => write!(
                f,
                "page at {cursor} needs {lines_per_page} lines but the index \
                 stops at {len} before the end of the buffer"
            ),
        }
    }
}

impl std::error::Error for IndexViolation {}

/// Ordered, contiguous run of [`LineRecord`]s.
///
/// Dereferences to a slice for read access. All mutation goes through
/// methods that keep storage growing in [`LINE_BLOCK`] steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    lines: Vec<LineRecord>,
}

impl LineIndex {
    /// Create an empty index without allocating.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Allocated record slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lines.capacity()
    }

    /// Start offset of the first record.
    #[must_use]
    pub fn start(&self) -> Option<usize> {
        self.lines.first().map(|r| r.start)
    }

    /// End offset of the last record.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        self.lines.last().map(LineRecord::end)
    }

    /// True when the last record ends at `buffer_len`.
    #[must_use]
    pub fn reaches_end(&self, buffer_len: usize) -> bool {
        self.end() == Some(buffer_len)
    }

    /// True when the first record starts at offset zero.
    #[must_use]
    pub fn reaches_start(&self) -> bool {
        self.start() == Some(0)
    }

    /// Append a record.
    pub fn push(&mut self, record: LineRecord) {
        self.reserve(1);
        self.lines.push(record);
    }

    /// Insert a record before position `at` (clamped to the length).
    pub fn insert(&mut self, at: usize, record: LineRecord) {
        self.reserve(1);
        let at = at.min(self.lines.len());
        self.lines.insert(at, record);
    }

    /// Prepend `records` in order with a single shift of the existing ones.
    ///
    /// Returns the number of records inserted.
    pub fn insert_front(&mut self, records: &[LineRecord]) -> usize {
        if records.is_empty() {
            return 0;
        }
        self.reserve(records.len());
        self.lines.splice(0..0, records.iter().copied());
        records.len()
    }

    /// Drop the first `count` records (clamped to the length).
    pub fn drain_front(&mut self, count: usize) {
        let count = count.min(self.lines.len());
        self.lines.drain(..count);
    }

    /// Keep only the first `len` records.
    pub fn truncate(&mut self, len: usize) {
        self.lines.truncate(len);
    }

    /// Remove every record.
    pub fn clear(&mut self, mode: ClearMode) {
        match mode {
            ClearMode::Truncate => self.lines.clear(),
            ClearMode::Release => self.lines = Vec::new(),
        }
    }

    /// Check the structural invariants against a buffer of `buffer_len`
    /// bytes, reporting the first violation found.
    pub fn validate(&self, buffer_len: usize) -> Result<(), IndexViolation> {
        let last = self.lines.len().saturating_sub(1);
        let mut expected: Option<usize> = None;

        for (index, record) in self.lines.iter().enumerate() {
            if record.len == 0 {
                return Err(IndexViolation::EmptyRecord { index });
            }
            let end = record.start.saturating_add(record.len);
            if end > buffer_len {
                return Err(IndexViolation::OutOfBounds {
                    index,
                    end,
                    buffer_len,
                });
            }
            if let Some(expected) = expected
                && record.start != expected
            {
                return Err(IndexViolation::Gap {
                    index,
                    expected,
                    found: record.start,
                });
            }
            if end == buffer_len && index != last {
                return Err(IndexViolation::InteriorEnd { index });
            }
            expected = Some(end);
        }
        Ok(())
    }

    fn reserve(&mut self, additional: usize) {
        let needed = self.lines.len() + additional;
        if needed > self.lines.capacity() {
            let blocks = needed.div_ceil(LINE_BLOCK);
            self.lines.reserve_exact(blocks * LINE_BLOCK - self.lines.len());
        }
    }
}

impl Deref for LineIndex {
    type Target = [LineRecord];

    fn deref(&self) -> &Self::Target {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(records: &[(usize, usize)]) -> LineIndex {
        let mut index = LineIndex::new();
        for &(start, len) in records {
            index.push(LineRecord::new(start, len));
        }
        index
    }

    #[test]
    fn record_accessors() {
        let r = LineRecord::new(5, 11);
        assert_eq!(r.end(), 16);
        assert_eq!(r.range(), 5..16);
        assert_eq!(r.slice("AAAA\nBBBBBBBBBB\nCC"), "BBBBBBBBBB\n");
        assert_eq!(LineRecord::new(10, 50).slice("short"), "");
    }

    #[test]
    fn storage_grows_in_blocks() {
        let mut index = LineIndex::new();
        assert_eq!(index.capacity(), 0);
        index.push(LineRecord::new(0, 1));
        assert_eq!(index.capacity(), LINE_BLOCK);
        for i in 1..=LINE_BLOCK {
            index.push(LineRecord::new(i, 1));
        }
        assert_eq!(index.capacity(), 2 * LINE_BLOCK);
    }

    #[test]
    fn insert_front_keeps_order() {
        let mut index = index_of(&[(6, 2), (8, 3)]);
        let added = index.insert_front(&[LineRecord::new(0, 4), LineRecord::new(4, 2)]);
        assert_eq!(added, 2);
        let starts: Vec<usize> = index.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 4, 6, 8]);
        assert_eq!(index.insert_front(&[]), 0);
        assert!(index.validate(11).is_ok());
    }

    #[test]
    fn insert_is_clamped() {
        let mut index = index_of(&[(0, 2)]);
        index.insert(99, LineRecord::new(2, 2));
        index.insert(0, LineRecord::new(9, 9));
        assert_eq!(index[0], LineRecord::new(9, 9));
        assert_eq!(index[2], LineRecord::new(2, 2));
    }

    #[test]
    fn start_end_and_reach() {
        let index = index_of(&[(0, 5), (5, 11), (16, 2)]);
        assert_eq!(index.start(), Some(0));
        assert_eq!(index.end(), Some(18));
        assert!(index.reaches_start());
        assert!(index.reaches_end(18));
        assert!(!index.reaches_end(19));

        let empty = LineIndex::new();
        assert_eq!(empty.start(), None);
        assert!(!empty.reaches_end(0));
    }

    #[test]
    fn drain_and_truncate() {
        let mut index = index_of(&[(0, 1), (1, 1), (2, 1), (3, 1)]);
        index.drain_front(1);
        index.truncate(2);
        assert_eq!(&index[..], &[LineRecord::new(1, 1), LineRecord::new(2, 1)]);
        index.drain_front(10);
        assert!(index.is_empty());
    }

    #[test]
    fn clear_modes() {
        let mut index = index_of(&[(0, 1), (1, 1)]);
        index.clear(ClearMode::Truncate);
        assert!(index.is_empty());
        assert!(index.capacity() >= LINE_BLOCK);

        index.push(LineRecord::new(0, 1));
        index.clear(ClearMode::Release);
        assert!(index.is_empty());
        assert_eq!(index.capacity(), 0);
    }

    #[test]
    fn validate_accepts_partial_windows() {
        assert!(LineIndex::new().validate(0).is_ok());
        assert!(index_of(&[(5, 11)]).validate(18).is_ok());
        assert!(index_of(&[(5, 11), (16, 2)]).validate(18).is_ok());
    }

    #[test]
    fn validate_reports_first_violation() {
        assert_eq!(
            index_of(&[(0, 4), (4, 0)]).validate(10),
            Err(IndexViolation::EmptyRecord { index: 1 })
        );
        assert_eq!(
            index_of(&[(0, 12)]).validate(10),
            Err(IndexViolation::OutOfBounds {
                index: 0,
                end: 12,
                buffer_len: 10
            })
        );
        assert_eq!(
            index_of(&[(0, 4), (5, 2)]).validate(10),
            Err(IndexViolation::Gap {
                index: 1,
                expected: 4,
                found: 5
            })
        );
        assert_eq!(
            index_of(&[(0, 10), (10, 0)]).validate(10),
            Err(IndexViolation::InteriorEnd { index: 0 })
        );
        assert_eq!(
            index_of(&[(0, 4), (4, 6), (10, 1)]).validate(11),
            Ok(())
        );
        assert_eq!(
            index_of(&[(0, 4), (4, 6), (6, 4)]).validate(10),
            Err(IndexViolation::InteriorEnd { index: 1 })
        );
    }

    #[test]
    fn violations_display() {
        let msg = IndexViolation::Gap {
            index: 3,
            expected: 10,
            found: 12,
        }
        .to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("not contiguous"));

        let err: Box<dyn std::error::Error> = Box::new(IndexViolation::Cursor { cursor: -1, len: 0 });
        assert_eq!(err.to_string(), "cursor -1 outside index of 0 lines");
    }
}
