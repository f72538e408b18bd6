//! Error types and context helpers for mosaic generation

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for all mosaic operations
#[derive(Debug, Error)]
pub enum MosaicError {
    /// Failed to load an image from the filesystem
    #[error("Failed to load image '{}': {source}", .path.display())]
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a rendered image to disk
    #[error("Failed to export image to '{}': {source}", .path.display())]
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    #[error("File system error during {operation} on '{}': {source}", .path.display())]
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Parameter validation failed before any search started
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// The candidate pool cannot serve the requested assignment
    #[error("{strategy} search needs at least {required} candidates, pool has {available}")]
    PoolTooSmall {
        /// Strategy that rejected the pool
        strategy: &'static str,
        /// Minimum number of candidates required
        required: usize,
        /// Number of candidates in the pool
        available: usize,
    },

    /// Every candidate was excluded for a location
    ///
    /// Coordinates are tile coordinates for grid strategies and pixel
    /// coordinates for collage placement.
    #[error("No match found for location ({x}, {y})")]
    NoMatchFound {
        /// Horizontal coordinate of the location
        x: u32,
        /// Vertical coordinate of the location
        y: u32,
    },

    /// A persisted record could not be parsed
    #[error("Malformed record in '{}': {reason}", .path.display())]
    MalformedRecord {
        /// File containing the record
        path: PathBuf,
        /// Description of what is wrong with the record
        reason: String,
    },

    /// A protocol record references a candidate missing from every pool
    #[error("Candidate '{filename}' from library '{}' is not in any loaded pool", .library.display())]
    UnknownCandidate {
        /// Library the record refers to
        library: PathBuf,
        /// File name of the candidate within the library
        filename: String,
    },
}

/// Convenience type alias for mosaic results
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Attaches a path and operation to raw I/O failures
pub trait WithPath<T> {
    /// Convert an I/O error into [`MosaicError::FileSystem`]
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path and operation applied
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> WithPath<T> for std::io::Result<T> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| MosaicError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a malformed record error
pub fn malformed_record(path: &Path, reason: &impl ToString) -> MosaicError {
    MosaicError::MalformedRecord {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
