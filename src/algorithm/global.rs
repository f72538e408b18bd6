//! Globally sorted assignment using every candidate at most once

use crate::algorithm::check_features;
use crate::analysis::features::FeatureVector;
use crate::analysis::matcher::{Match, Matcher};
use crate::collections::bitset::CandidateBitset;
use crate::io::error::{MosaicError, Result};
use crate::io::progress::ProgressReporter;
use crate::spatial::placement::PlacementMap;
use crate::spatial::tiling::Tiling;
use ndarray::Array2;
use tracing::{debug, info};

/// One ranked (tile, candidate, orientation) triple
#[derive(Clone, Copy, Debug)]
struct Ranked {
    tile: usize,
    matched: Match,
}

/// Global search: rank every pairing and assign greedily by score
///
/// With a positive `anti_radius`, a first pass refuses to place a candidate
/// closer than that many tiles (Chebyshev) to where it was sampled; a second
/// pass fills whatever that left empty without the restriction.
#[derive(Clone, Copy, Debug)]
pub struct GlobalSearch<'p> {
    matcher: Matcher<'p>,
    anti_radius: u32,
}

impl<'p> GlobalSearch<'p> {
    /// Create a global search; an `anti_radius` of 0 disables the first pass
    pub const fn new(matcher: Matcher<'p>, anti_radius: u32) -> Self {
        Self {
            matcher,
            anti_radius,
        }
    }

    /// Assign every tile a distinct candidate
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pool has fewer candidates than there are tiles
    /// - The features do not match the tiling
    pub fn run(
        &self,
        features: &Array2<FeatureVector>,
        tiling: &Tiling,
        progress: &ProgressReporter,
    ) -> Result<PlacementMap> {
        check_features(features, tiling)?;
        let pool = self.matcher.pool();
        if pool.len() < tiling.tile_count() {
            return Err(MosaicError::PoolTooSmall {
                strategy: "global",
                required: tiling.tile_count(),
                available: pool.len(),
            });
        }

        let k = pool.len() * self.matcher.orientation_multiplier();
        info!(tiles = tiling.tile_count(), per_tile = k, "global search");

        let mut ranked = Vec::with_capacity(tiling.tile_count().saturating_mul(k));
        for (tile, query) in features.iter().enumerate() {
            ranked.extend(
                self.matcher
                    .best_k(query, k)
                    .into_iter()
                    .map(|matched| Ranked { tile, matched }),
            );
            progress.advance(1);
        }
        ranked.sort_by(|a, b| a.matched.score.total_cmp(&b.matched.score));

        let mut map = PlacementMap::new(*tiling);
        let mut used = CandidateBitset::new(pool.len());

        if self.anti_radius > 0 {
            let placed = self.assign(&ranked, &mut map, &mut used, true);
            debug!(placed, "anti-reconstruction pass");
        }
        let placed = self.assign(&ranked, &mut map, &mut used, false);
        debug!(placed, "unrestricted pass");

        progress.finish();
        Ok(map)
    }

    /// Walk the ranking once, returning the number of tiles filled
    fn assign(
        &self,
        ranked: &[Ranked],
        map: &mut PlacementMap,
        used: &mut CandidateBitset,
        restricted: bool,
    ) -> usize {
        let tiling = *map.tiling();
        let empty = tiling.tile_count() - map.filled_count();
        let mut placed = 0;

        for entry in ranked {
            let (tile_x, tile_y) = tiling.tile_at(entry.tile);
            let candidate = entry.matched.candidate;
            if map.is_filled(tile_x, tile_y) || used.contains(candidate) {
                continue;
            }
            if restricted && self.too_close(candidate, tile_x, tile_y) {
                continue;
            }

            used.insert(candidate);
            map.set(tile_x, tile_y, entry.matched);
            placed += 1;
            if placed == empty {
                break;
            }
        }

        placed
    }

    fn too_close(&self, candidate: usize, tile_x: u32, tile_y: u32) -> bool {
        self.matcher
            .pool()
            .get(candidate)
            .and_then(|c| c.anti())
            .is_some_and(|(x, y)| x.abs_diff(tile_x).max(y.abs_diff(tile_y)) < self.anti_radius)
    }
}
