//! Spatial data structures for mosaic layout
//!
//! This module contains spatial-related functionality including:
//! - Rectangular tiling of the target image
//! - Placement maps produced by the assignment strategies
//! - Coverage tracking for free-form collage packing

/// Coverage bitmap for collage placement
pub mod occupancy;
/// Placement maps and flattened layouts
pub mod placement;
/// Rectangular division of an image into tiles
pub mod tiling;

pub use occupancy::Occupancy;
pub use placement::{MosaicLayout, Placement, PlacementMap};
pub use tiling::{PixelRect, Tiling};
