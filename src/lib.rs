//! Photomosaic tile matching and assignment
//!
//! Target regions and candidate tiles are reduced to small feature vectors,
//! compared with an early-exit weighted distance, and assigned to output
//! locations by one of several strategies: greedy local search, a global
//! one-use ranking, a bounded best subset, free-form collage packing, or
//! color-cube partitioning for one candidate per tile.

#![forbid(unsafe_code)]

/// Assignment strategies and their orchestration
pub mod algorithm;
/// Feature vectors, candidate pools and matching
pub mod analysis;
/// Generic ordered index and candidate bitset
pub mod collections;
/// Input/output operations and error handling
pub mod io;
/// Color-space conversions
pub mod math;
/// Tilings, placement maps and coverage tracking
pub mod spatial;

pub use io::error::{MosaicError, Result};
