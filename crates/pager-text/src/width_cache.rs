#![forbid(unsafe_code)]

//! LRU glyph width cache.
//!
//! Line discovery asks for the advance width of every character it scans.
//! Font queries are the expensive part of that loop, and a book uses a few
//! hundred distinct characters at most, so widths are memoized per `char`.
//!
//! # Example
//! ```
//! use pager_text::{CellMeasurer, GlyphWidthCache};
//!
//! let measurer = CellMeasurer::new(8, 16);
//! let mut cache = GlyphWidthCache::new(256);
//!
//! assert_eq!(cache.get_or_measure('a', &measurer), 8);
//! assert_eq!(cache.get_or_measure('a', &measurer), 8);
//!
//! let stats = cache.stats();
//! assert_eq!(stats.hits, 1);
//! assert_eq!(stats.misses, 1);
//! ```

use lru::LruCache;
use rustc_hash::FxBuildHasher;
use std::num::NonZeroUsize;

use crate::measure::TextMeasurer;

/// Enough for any alphabet plus a CJK working set.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Hit/miss counters and occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to ask the measurer.
    pub misses: u64,
    /// Cached characters.
    pub size: usize,
    /// Maximum number of cached characters.
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0.0 before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of per-character advance widths.
///
/// Widths are only valid for the font they were measured with. Owners must
/// [`clear`](Self::clear) the cache whenever the font selection changes.
#[derive(Debug)]
pub struct GlyphWidthCache {
    cache: LruCache<char, i32, FxBuildHasher>,
    hits: u64,
    misses: u64,
}

impl GlyphWidthCache {
    /// Cache holding at most `capacity` widths (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::with_hasher(non_zero(capacity), FxBuildHasher),
            hits: 0,
            misses: 0,
        }
    }

    /// Get the cached width of `ch` or measure and cache it.
    #[inline]
    pub fn get_or_measure<M>(&mut self, ch: char, measurer: &M) -> i32
    where
        M: TextMeasurer + ?Sized,
    {
        self.get_or_compute_with(ch, |c| measurer.char_width(c))
    }

    /// Like [`get_or_measure`](Self::get_or_measure) with an arbitrary width function.
    pub fn get_or_compute_with<F>(&mut self, ch: char, compute: F) -> i32
    where
        F: FnOnce(char) -> i32,
    {
        if let Some(&width) = self.cache.get(&ch) {
            self.hits += 1;
            return width;
        }

        self.misses += 1;
        let width = compute(ch);
        self.cache.put(ch, width);
        width
    }

    /// Forget every width. Counters are kept.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Counters and occupancy so far.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.cache.len(),
            capacity: self.cache.cap().get(),
        }
    }

    /// Number of cached characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Maximum number of cached characters.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

impl Default for GlyphWidthCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[inline]
fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}
