//! Candidate scoring with early-exit pruning

use crate::analysis::candidate::{Candidate, Orientation, Pool};
use crate::analysis::features::{CHANNELS, FeatureVector, SAMPLE_COUNT};
use crate::io::error::{Result, invalid_parameter};

/// Score of "no match", worse than any real score
pub const NO_MATCH_SCORE: f32 = f32::INFINITY;

/// Result of a search over a pool
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Pool index of the chosen candidate
    pub candidate: usize,
    /// Flip applied to the candidate
    pub orientation: Orientation,
    /// Weighted squared distance, lower is better
    pub score: f32,
}

/// Per-channel multipliers of squared differences
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelWeights([f32; CHANNELS]);

impl Default for ChannelWeights {
    fn default() -> Self {
        Self([1.0; CHANNELS])
    }
}

impl ChannelWeights {
    /// Create weights, each finite and non-negative
    ///
    /// # Errors
    ///
    /// Returns an error if any weight is negative or not finite
    pub fn new(weights: [f32; CHANNELS]) -> Result<Self> {
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(invalid_parameter(
                "channel weight",
                bad,
                &"must be finite and non-negative",
            ));
        }
        Ok(Self(weights))
    }

    /// Weight of one channel
    pub fn get(&self, channel: usize) -> f32 {
        self.0.get(channel).copied().unwrap_or(0.0)
    }
}

/// Weighted squared distance between a query and a flipped tile
///
/// Returns `None` as soon as the partial sum reaches `bound`, so a caller
/// passing its current best never pays for the rest of a losing comparison.
pub fn score(
    query: &FeatureVector,
    tile: &FeatureVector,
    orientation: Orientation,
    weights: &ChannelWeights,
    bound: f32,
) -> Option<f32> {
    let mut sum = 0.0f32;
    for channel in 0..CHANNELS {
        let weight = weights.get(channel);
        for sample in 0..SAMPLE_COUNT {
            let diff = f32::from(query.get(channel, sample))
                - f32::from(tile.get(channel, orientation.source_sample(sample)));
            sum = weight.mul_add(diff * diff, sum);
            if sum >= bound {
                return None;
            }
        }
    }
    Some(sum)
}

/// Searches a pool for the candidates closest to a query
#[derive(Clone, Copy, Debug)]
pub struct Matcher<'p> {
    pool: &'p Pool,
    weights: ChannelWeights,
    orientations: Orientation,
}

impl<'p> Matcher<'p> {
    /// Create a matcher over a pool
    ///
    /// `orientations` is the caller's flip mask, intersected with each
    /// candidate's own mask.
    pub const fn new(pool: &'p Pool, weights: ChannelWeights, orientations: Orientation) -> Self {
        Self {
            pool,
            weights,
            orientations,
        }
    }

    /// Pool searched by this matcher
    pub const fn pool(&self) -> &'p Pool {
        self.pool
    }

    /// Largest number of orientations any candidate can be scored under
    pub const fn orientation_multiplier(&self) -> usize {
        self.orientations.variant_count()
    }

    /// Best admissible match for a query
    ///
    /// A candidate is admissible if it is not in `excluded` and `valid`
    /// accepts it. Admissibility is only checked once a candidate improves on
    /// the best score so far, and at most once per candidate.
    pub fn best<F>(&self, query: &FeatureVector, excluded: &[usize], mut valid: F) -> Option<Match>
    where
        F: FnMut(&Candidate) -> bool,
    {
        let mut best: Option<Match> = None;

        for candidate in self.pool.candidates() {
            let mask = candidate.orientations().intersect(self.orientations);
            let mut admissible = None;

            for orientation in mask.allowed_variants() {
                let bound = best.map_or(NO_MATCH_SCORE, |m| m.score);
                let Some(score) = score(
                    query,
                    candidate.features(),
                    orientation,
                    &self.weights,
                    bound,
                ) else {
                    continue;
                };

                let ok = *admissible.get_or_insert_with(|| {
                    !excluded.contains(&candidate.index()) && valid(candidate)
                });
                if !ok {
                    break;
                }

                best = Some(Match {
                    candidate: candidate.index(),
                    orientation,
                    score,
                });
            }
        }

        best
    }

    /// The `k` best matches for a query in ascending score order
    ///
    /// Equal scores keep pool and orientation order.
    pub fn best_k(&self, query: &FeatureVector, k: usize) -> Vec<Match> {
        let mut ranked: Vec<Match> = Vec::with_capacity(k.saturating_add(1).min(1 << 16));
        if k == 0 {
            return ranked;
        }

        for candidate in self.pool.candidates() {
            let mask = candidate.orientations().intersect(self.orientations);
            for orientation in mask.allowed_variants() {
                let bound = if ranked.len() < k {
                    NO_MATCH_SCORE
                } else {
                    ranked.last().map_or(NO_MATCH_SCORE, |m| m.score)
                };
                let Some(score) = score(
                    query,
                    candidate.features(),
                    orientation,
                    &self.weights,
                    bound,
                ) else {
                    continue;
                };

                let at = ranked.partition_point(|m| m.score <= score);
                ranked.insert(
                    at,
                    Match {
                        candidate: candidate.index(),
                        orientation,
                        score,
                    },
                );
                ranked.truncate(k);
            }
        }

        ranked
    }
}
