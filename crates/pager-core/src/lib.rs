#![forbid(unsafe_code)]

//! Core: viewport geometry and the reader state shared with the host.

pub mod geometry;
pub mod shared;

pub use geometry::{Extent, Rect};
pub use shared::{ReaderCells, SharedCells};
