//! Matching constants and runtime configuration defaults

// Feature grid shared by every library table and query
/// Horizontal sample count of a feature vector
pub const SAMPLE_GRID_WIDTH: u32 = 5;
/// Vertical sample count of a feature vector
pub const SAMPLE_GRID_HEIGHT: u32 = 5;

/// Default tile edge length in target pixels
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// Default Chebyshev radius within which Local search forbids reuse
pub const DEFAULT_MIN_DISTANCE: u32 = 5;

// Collage square edge bounds in target pixels
/// Default smallest collage placement
pub const DEFAULT_COLLAGE_MIN_SIZE: u32 = 16;
/// Default largest collage placement
pub const DEFAULT_COLLAGE_MAX_SIZE: u32 = 64;

// Random rectangles are re-rolled this often before anchoring on a known gap
/// Maximum rejected collage rolls per placement
pub const COLLAGE_MAX_REROLLS: usize = 64;

// Cube partitioning limits
/// Default recursion depth of the color cube
pub const DEFAULT_CUBE_MAX_DEPTH: u32 = 8;
/// Default small-pixel count below which a cell is assigned round-robin
pub const DEFAULT_CUBE_LEAF_THRESHOLD: usize = 4;

/// File name of the candidate table inside a library directory
pub const TABLE_FILE_NAME: &str = "tiles.tbl";

/// File extensions accepted when preparing a library
pub const TILE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

// Default values for configurable parameters
/// Fixed seed for reproducible collages
pub const DEFAULT_SEED: u64 = 42;

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
