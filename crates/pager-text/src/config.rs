#![forbid(unsafe_code)]

//! Layout tuning knobs.

use std::fmt;
use std::str::FromStr;

use crate::discover::BreakKind;
use crate::width_cache::DEFAULT_CACHE_CAPACITY;

/// Glyphs measured to derive the uniform line height.
pub const DEFAULT_REFERENCE_GLYPHS: &str = "AaBbYyZz";

/// Glyph whose extent sizes the scan budget.
pub const DEFAULT_PROBE_GLYPH: char = '.';

/// Smallest scan budget in bytes, whatever the viewport.
pub const DEFAULT_MIN_SCAN_BUDGET: usize = 256;

/// Default retention window in lines.
pub const DEFAULT_RETAIN_LINES: usize = 16 * 1024;

/// When a forward scan may stop once the page is covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanMode {
    /// Stop at the first line break of any kind.
    Eager,
    /// Stop at the first newline. Soft-wrapped lines past the page are
    /// indexed up to the end of their paragraph.
    #[default]
    LogicalLine,
    /// Scan to the budget ceiling every time.
    Budget,
}

impl ScanMode {
    /// Whether a covered page may stop scanning after a break of `kind`.
    #[must_use]
    pub const fn stops_at(self, kind: BreakKind) -> bool {
        match self {
            Self::Eager => matches!(kind, BreakKind::Hard | BreakKind::Soft),
            Self::LogicalLine => matches!(kind, BreakKind::Hard),
            Self::Budget => false,
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eager => "eager",
            Self::LogicalLine => "logical-line",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ScanMode`] name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseScanModeError {
    input: String,
}

impl fmt::Display for ParseScanModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown scan mode {:?} (expected eager, logical-line or budget)",
            self.input
        )
    }
}

impl std::error::Error for ParseScanModeError {}

impl FromStr for ScanMode {
    type Err = ParseScanModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "eager" | "fast" => Ok(Self::Eager),
            "logical-line" | "logical" | "line" => Ok(Self::LogicalLine),
            "budget" | "full" => Ok(Self::Budget),
            _ => Err(ParseScanModeError {
                input: s.to_owned(),
            }),
        }
    }
}

/// What the cache does when its own invariants break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerifyPolicy {
    /// Skip the checks.
    Off,
    /// Log the violation, drop the index and lay out again.
    Recover,
    /// Panic on the violation.
    Strict,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        if cfg!(feature = "verify") {
            Self::Strict
        } else {
            Self::Recover
        }
    }
}

/// Layout configuration for a [`crate::PageCache`].
///
/// # Example
/// ```
/// use pager_text::{LayoutConfig, ScanMode};
///
/// let config = LayoutConfig::new()
///     .scan_mode(ScanMode::Eager)
///     .retain_lines(None);
/// assert_eq!(config.min_scan_budget, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Glyphs measured for the line height.
    pub reference_glyphs: String,
    /// Glyph measured for the scan budget.
    pub probe_glyph: char,
    /// Forward scan stop policy.
    pub scan_mode: ScanMode,
    /// Lower bound on the scan budget in bytes.
    pub min_scan_budget: usize,
    /// Index size above which lines far from the page are dropped.
    pub retain_lines: Option<usize>,
    /// Capacity of the glyph width cache.
    pub width_cache_capacity: usize,
    /// Invariant check policy.
    pub verify: VerifyPolicy,
}

impl LayoutConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reference_glyphs: DEFAULT_REFERENCE_GLYPHS.to_owned(),
            probe_glyph: DEFAULT_PROBE_GLYPH,
            scan_mode: ScanMode::default(),
            min_scan_budget: DEFAULT_MIN_SCAN_BUDGET,
            retain_lines: Some(DEFAULT_RETAIN_LINES),
            width_cache_capacity: DEFAULT_CACHE_CAPACITY,
            verify: VerifyPolicy::default(),
        }
    }

    /// Set the line-height reference glyphs.
    #[must_use]
    pub fn reference_glyphs(mut self, glyphs: impl Into<String>) -> Self {
        self.reference_glyphs = glyphs.into();
        self
    }

    /// Set the budget probe glyph.
    #[must_use]
    pub fn probe_glyph(mut self, glyph: char) -> Self {
        self.probe_glyph = glyph;
        self
    }

    /// Set the forward scan stop policy.
    #[must_use]
    pub fn scan_mode(mut self, mode: ScanMode) -> Self {
        self.scan_mode = mode;
        self
    }

    /// Set the minimum scan budget. Zero is raised to one byte.
    #[must_use]
    pub fn min_scan_budget(mut self, bytes: usize) -> Self {
        self.min_scan_budget = bytes.max(1);
        self
    }

    /// Set the retention window, or `None` to keep every discovered line.
    #[must_use]
    pub fn retain_lines(mut self, lines: Option<usize>) -> Self {
        self.retain_lines = lines;
        self
    }

    /// Set the glyph width cache capacity.
    #[must_use]
    pub fn width_cache_capacity(mut self, capacity: usize) -> Self {
        self.width_cache_capacity = capacity;
        self
    }

    /// Set the invariant check policy.
    #[must_use]
    pub fn verify(mut self, policy: VerifyPolicy) -> Self {
        self.verify = policy;
        self
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new()
    }
}
