#![forbid(unsafe_code)]

//! Line-boundary discovery.
//!
//! [`LineBreaks`] walks a byte range of the buffer and yields one
//! [`LineBreak`] per line it can prove complete. Wrapping is forced, not
//! word-based: a line ends at a `'\n'` or just before the first character
//! that would push its width past `max_width`.
//!
//! The range end is not always a line boundary. Scans that stop at an
//! arbitrary budget offset must discard the partial line they end in
//! ([`TailPolicy::Discard`]); scans that end at a known boundary keep it
//! ([`TailPolicy::Emit`]).

use crate::line_index::LineRecord;

/// Why a line ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakKind {
    /// Ended by `'\n'`, which the record includes.
    Hard,
    /// Wrapped because the next character did not fit.
    Soft,
    /// Ran into the end of the scanned range.
    Tail,
}

/// What to do with the partial line at the end of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TailPolicy {
    /// The range end is a line boundary; emit the remainder as a line.
    Emit,
    /// The range end is arbitrary; drop the remainder.
    #[default]
    Discard,
}

/// A discovered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineBreak {
    /// Byte range of the line.
    pub record: LineRecord,
    /// How the line ended.
    pub kind: BreakKind,
}

/// Iterator over the lines of `text[from..to]`.
///
/// `width_of` reports the advance width of a character. It is called at
/// most once per character, in order.
#[derive(Debug)]
pub struct LineBreaks<'t, W> {
    text: &'t str,
    cursor: usize,
    end: usize,
    line_start: usize,
    width: i32,
    max_width: i32,
    tail: TailPolicy,
    width_of: W,
    finished: bool,
}

impl<'t, W> LineBreaks<'t, W>
where
    W: FnMut(char) -> i32,
{
    /// Scan `text[from..to]`. Both offsets are clamped to the text and
    /// moved to character boundaries.
    pub fn new(
        text: &'t str,
        from: usize,
        to: usize,
        max_width: i32,
        tail: TailPolicy,
        width_of: W,
    ) -> Self {
        let end = floor_char_boundary(text, to);
        let start = floor_char_boundary(text, from).min(end);
        Self {
            text,
            cursor: start,
            end,
            line_start: start,
            width: 0,
            max_width,
            tail,
            width_of,
            finished: false,
        }
    }

    fn cut(&mut self, kind: BreakKind) -> LineBreak {
        let record = LineRecord::new(self.line_start, self.cursor - self.line_start);
        self.line_start = self.cursor;
        self.width = 0;
        LineBreak { record, kind }
    }
}

impl<W> Iterator for LineBreaks<'_, W>
where
    W: FnMut(char) -> i32,
{
    type Item = LineBreak;

    fn next(&mut self) -> Option<LineBreak> {
        if self.finished {
            return None;
        }
        let text = self.text;
        let rest = text.get(self.cursor..self.end).unwrap_or("");

        for (offset, ch) in rest.char_indices() {
            if ch == '\n' {
                self.cursor += offset + 1;
                return Some(self.cut(BreakKind::Hard));
            }

            // A CR that belongs to a CRLF pair takes no room on the line,
            // even when the LF lies past the end of this scan.
            let at = self.cursor + offset;
            let w = if ch == '\r' && text.as_bytes().get(at + 1) == Some(&b'\n') {
                0
            } else {
                (self.width_of)(ch).max(0)
            };

            if w > 0 && self.width.saturating_add(w) > self.max_width && at > self.line_start {
                self.cursor = at;
                let line = self.cut(BreakKind::Soft);
                self.width = w;
                self.cursor = at + ch.len_utf8();
                return Some(line);
            }
            self.width = self.width.saturating_add(w);
        }

        self.cursor = self.end;
        self.finished = true;
        if self.tail == TailPolicy::Emit && self.cursor > self.line_start {
            Some(self.cut(BreakKind::Tail))
        } else {
            None
        }
    }
}

/// Lay out the whole text in one pass.
///
/// Paging through a buffer with a [`crate::PageCache`] visits exactly these
/// lines, so this is the reference the incremental layout is checked
/// against.
pub fn layout_all<W>(text: &str, max_width: i32, width_of: W) -> Vec<LineRecord>
where
    W: FnMut(char) -> i32,
{
    LineBreaks::new(text, 0, text.len(), max_width, TailPolicy::Emit, width_of)
        .map(|line| line.record)
        .collect()
}

/// Lower bound of a backward scan ending at `first_start`.
///
/// Goes `budget` bytes back, then moves up to the first logical line start
/// inside the window when there is one, so the lines found match the ones a
/// forward scan from that point would produce.
#[must_use]
pub fn backward_floor(text: &str, first_start: usize, budget: usize) -> usize {
    let first_start = floor_char_boundary(text, first_start);
    let floor = floor_char_boundary(text, first_start.saturating_sub(budget));
    if floor == 0 {
        return 0;
    }
    let window = &text.as_bytes()[floor - 1..first_start];
    match memchr::memchr(b'\n', window) {
        Some(i) if floor + i < first_start => floor + i,
        _ => floor,
    }
}

/// Upper bound of a forward scan starting at `last_end`.
#[must_use]
pub fn forward_ceiling(text: &str, last_end: usize, budget: usize) -> usize {
    ceil_char_boundary(text, last_end.saturating_add(budget))
}

/// Largest character boundary `<= index`, clamped to the text.
#[must_use]
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest character boundary `>= index`, clamped to the text.
#[must_use]
pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
