//! Numeric helpers for the matching engine

/// Color-space conversions between RGB and the feature spaces
pub mod color;
