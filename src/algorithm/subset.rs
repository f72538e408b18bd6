//! Bounded best-subset assignment

use crate::algorithm::check_features;
use crate::analysis::features::FeatureVector;
use crate::analysis::matcher::{Match, Matcher};
use crate::collections::bitset::CandidateBitset;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::progress::ProgressReporter;
use crate::spatial::placement::PlacementMap;
use crate::spatial::tiling::Tiling;
use ndarray::Array2;
use tracing::info;

/// Fill a fixed number of tiles with their globally best distinct matches
///
/// Each round commits the single best (tile, candidate) pair among unfilled
/// tiles and unused candidates. When several tiles tie for the best score the
/// lowest raster index wins.
#[derive(Clone, Copy, Debug)]
pub struct SubsetSearch<'p> {
    matcher: Matcher<'p>,
    count: usize,
}

impl<'p> SubsetSearch<'p> {
    /// Create a search filling `count` tiles
    pub const fn new(matcher: Matcher<'p>, count: usize) -> Self {
        Self { matcher, count }
    }

    /// Run the rounds and return the partially filled map
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `count` exceeds the number of tiles
    /// - `count` exceeds the pool size
    /// - The features do not match the tiling
    pub fn run(
        &self,
        features: &Array2<FeatureVector>,
        tiling: &Tiling,
        progress: &ProgressReporter,
    ) -> Result<PlacementMap> {
        check_features(features, tiling)?;
        if self.count > tiling.tile_count() {
            return Err(invalid_parameter(
                "subset count",
                &self.count,
                &format!("only {} tiles exist", tiling.tile_count()),
            ));
        }
        let pool = self.matcher.pool();
        if self.count > pool.len() {
            return Err(MosaicError::PoolTooSmall {
                strategy: "subset",
                required: self.count,
                available: pool.len(),
            });
        }

        info!(count = self.count, tiles = tiling.tile_count(), "subset search");
        let queries: Vec<FeatureVector> = features.iter().copied().collect();
        let mut used = CandidateBitset::new(pool.len());
        let mut filled = vec![false; queries.len()];
        let mut cached: Vec<Option<Match>> = vec![None; queries.len()];
        let mut map = PlacementMap::new(*tiling);

        for _ in 0..self.count {
            let mut round_best: Option<(usize, Match)> = None;

            for (tile, query) in queries.iter().enumerate() {
                if filled.get(tile).copied().unwrap_or(true) {
                    continue;
                }
                let Some(slot) = cached.get_mut(tile) else {
                    continue;
                };
                // A cached best stays best until its candidate is taken
                if slot.is_none_or(|m| used.contains(m.candidate)) {
                    *slot = self
                        .matcher
                        .best(query, &[], |c| !used.contains(c.index()));
                }
                if let Some(matched) = *slot
                    && round_best.is_none_or(|(_, best)| matched.score < best.score)
                {
                    round_best = Some((tile, matched));
                }
            }

            let Some((tile, matched)) = round_best else {
                break;
            };
            let (tile_x, tile_y) = tiling.tile_at(tile);
            map.set(tile_x, tile_y, matched);
            used.insert(matched.candidate);
            if let Some(flag) = filled.get_mut(tile) {
                *flag = true;
            }
            progress.advance(1);
        }

        progress.finish();
        Ok(map)
    }
}
