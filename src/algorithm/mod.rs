//! Assignment strategies turning candidate pools into placements

/// Randomized free-form packing
pub mod collage;
/// Recursive color-cube partitioning
pub mod cube;
/// Strategy selection and orchestration
pub mod executor;
/// Globally sorted one-use assignment
pub mod global;
/// Greedy raster-order assignment
pub mod local;
/// Bounded best-subset assignment
pub mod subset;

use crate::analysis::features::FeatureVector;
use crate::io::error::{Result, invalid_parameter};
use crate::spatial::tiling::Tiling;
use ndarray::Array2;

pub use collage::{CollageConfig, CollageSearch};
pub use cube::{CubeConfig, CubePartitioner, process_cube};
pub use executor::{MosaicConfig, MosaicExecutor, SearchMethod};
pub use global::GlobalSearch;
pub use local::LocalSearch;
pub use subset::SubsetSearch;

/// Check that precomputed features cover exactly the tiles of a tiling
///
/// # Errors
///
/// Returns an error if the feature grid shape differs from the tile grid
pub fn check_features(features: &Array2<FeatureVector>, tiling: &Tiling) -> Result<()> {
    let expected = (tiling.metaheight() as usize, tiling.metawidth() as usize);
    if features.dim() != expected {
        return Err(invalid_parameter(
            "feature grid",
            &format!("{}x{}", features.ncols(), features.nrows()),
            &format!("tiling has {}x{} tiles", expected.1, expected.0),
        ));
    }
    Ok(())
}
