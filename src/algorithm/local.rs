//! Greedy raster-order assignment with neighborhood exclusion

use crate::analysis::features::{FeatureExtractor, FeatureVector};
use crate::analysis::matcher::Matcher;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::{RowSource, Scaler};
use crate::io::progress::ProgressReporter;
use crate::spatial::placement::PlacementMap;
use crate::spatial::tiling::Tiling;
use ndarray::Array2;
use tracing::info;

/// Local search: each tile takes its best match not used nearby
///
/// Tiles are filled in raster order. A candidate placed within Chebyshev
/// distance `min_distance` of a tile may not be placed there again, so with
/// a distance of 1 no two touching tiles share a candidate.
#[derive(Clone, Copy, Debug)]
pub struct LocalSearch<'p> {
    matcher: Matcher<'p>,
    min_distance: u32,
}

impl<'p> LocalSearch<'p> {
    /// Create a local search with the given reuse radius
    pub const fn new(matcher: Matcher<'p>, min_distance: u32) -> Self {
        Self {
            matcher,
            min_distance,
        }
    }

    /// Stream the target row by row and fill every tile
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The target size does not match the tiling
    /// - Reading or resampling a tile row fails
    /// - Every candidate is excluded for some tile
    pub fn run<S: Scaler>(
        &self,
        source: &mut dyn RowSource,
        tiling: &Tiling,
        extractor: &FeatureExtractor<S>,
        progress: &ProgressReporter,
    ) -> Result<PlacementMap> {
        if (source.width(), source.height()) != (tiling.width(), tiling.height()) {
            return Err(invalid_parameter(
                "target size",
                &format!("{}x{}", source.width(), source.height()),
                &format!("tiling expects {}x{}", tiling.width(), tiling.height()),
            ));
        }

        info!(
            tiles = tiling.tile_count(),
            min_distance = self.min_distance,
            "local search"
        );
        let mut map = PlacementMap::new(*tiling);
        for tile_y in 0..tiling.metaheight() {
            let rows = source.read_rows(tiling.rect(0, tile_y).height)?;
            let row = extractor.extract_tile_row(&rows, tiling, tile_y)?;
            self.fill_row(&mut map, tile_y, &row, progress)?;
        }
        progress.finish();
        Ok(map)
    }

    /// Fill every tile from precomputed feature vectors
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::NoMatchFound`] if every candidate is excluded
    /// for some tile
    pub fn run_with_features(
        &self,
        features: &Array2<FeatureVector>,
        tiling: &Tiling,
        progress: &ProgressReporter,
    ) -> Result<PlacementMap> {
        let mut map = PlacementMap::new(*tiling);
        for (tile_y, row) in features.outer_iter().enumerate() {
            let row: Vec<FeatureVector> = row.iter().copied().collect();
            self.fill_row(&mut map, tile_y as u32, &row, progress)?;
        }
        progress.finish();
        Ok(map)
    }

    fn fill_row(
        &self,
        map: &mut PlacementMap,
        tile_y: u32,
        row: &[FeatureVector],
        progress: &ProgressReporter,
    ) -> Result<()> {
        for (tile_x, query) in row.iter().enumerate() {
            let tile_x = tile_x as u32;
            let excluded = self.neighborhood(map, tile_x, tile_y);
            let matched = self
                .matcher
                .best(query, &excluded, |_| true)
                .ok_or(MosaicError::NoMatchFound {
                    x: tile_x,
                    y: tile_y,
                })?;
            map.set(tile_x, tile_y, matched);
            progress.advance(1);
        }
        Ok(())
    }

    /// Candidates already placed within the reuse radius of a tile
    fn neighborhood(&self, map: &PlacementMap, tile_x: u32, tile_y: u32) -> Vec<usize> {
        let d = self.min_distance;
        if d == 0 {
            return Vec::new();
        }

        let tiling = map.tiling();
        let x_end = tile_x.saturating_add(d).min(tiling.metawidth() - 1);
        let y_end = tile_y.saturating_add(d).min(tiling.metaheight() - 1);

        let mut excluded = Vec::new();
        for y in tile_y.saturating_sub(d)..=y_end {
            for x in tile_x.saturating_sub(d)..=x_end {
                if let Some(matched) = map.get(x, y) {
                    excluded.push(matched.candidate);
                }
            }
        }
        excluded.sort_unstable();
        excluded.dedup();
        excluded
    }
}
