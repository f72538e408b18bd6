//! Strategy dispatch from a target image to a placement map

use crate::algorithm::collage::{CollageConfig, CollageSearch};
use crate::algorithm::cube::{CubeConfig, process_cube};
use crate::algorithm::global::GlobalSearch;
use crate::algorithm::local::LocalSearch;
use crate::algorithm::subset::SubsetSearch;
use crate::analysis::candidate::{Orientation, Pool};
use crate::analysis::features::FeatureExtractor;
use crate::analysis::matcher::{ChannelWeights, Match, Matcher};
use crate::io::configuration::DEFAULT_MIN_DISTANCE;
use crate::io::error::{MosaicError, Result};
use crate::io::image::{RowSource, Scaler};
use crate::io::progress::ProgressReporter;
use crate::spatial::placement::{MosaicLayout, PlacementMap};
use crate::spatial::tiling::Tiling;
use image::RgbImage;
use tracing::info;

/// Assignment strategy for grid mosaics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchMethod {
    /// Greedy raster order with neighborhood exclusion
    #[default]
    Local,
    /// Globally sorted pairings, each candidate used once
    Global,
    /// Best pairs only, for a fixed number of tiles
    Subset,
    /// Color-cube partitioning of mean colors
    Cube,
}

impl SearchMethod {
    /// Name used in log events and errors
    pub const fn name(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::Subset => "subset",
            Self::Cube => "cube",
        }
    }
}

/// Parameters of a grid mosaic run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MosaicConfig {
    /// Strategy to run
    pub method: SearchMethod,
    /// Local reuse radius in tiles
    pub min_distance: u32,
    /// Global anti-reconstruction radius in tiles, 0 to disable
    pub anti_radius: u32,
    /// Tiles to fill in subset mode, all tiles the pool can cover when absent
    pub subset_count: Option<usize>,
    /// Flips the matcher may try
    pub orientations: Orientation,
    /// Channel weights of the score
    pub weights: ChannelWeights,
    /// Cube mode limits
    pub cube: CubeConfig,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            method: SearchMethod::default(),
            min_distance: DEFAULT_MIN_DISTANCE,
            anti_radius: 0,
            subset_count: None,
            orientations: Orientation::BOTH,
            weights: ChannelWeights::default(),
            cube: CubeConfig::default(),
        }
    }
}

/// Runs the configured strategy over one pool
#[derive(Debug)]
pub struct MosaicExecutor<'p, S: Scaler> {
    pool: &'p Pool,
    extractor: FeatureExtractor<S>,
    config: MosaicConfig,
}

impl<'p, S: Scaler> MosaicExecutor<'p, S> {
    /// Create an executor
    pub const fn new(pool: &'p Pool, extractor: FeatureExtractor<S>, config: MosaicConfig) -> Self {
        Self {
            pool,
            extractor,
            config,
        }
    }

    /// Matcher configured for this run
    pub const fn matcher(&self) -> Matcher<'p> {
        Matcher::new(self.pool, self.config.weights, self.config.orientations)
    }

    /// Extractor shared by every strategy
    pub const fn extractor(&self) -> &FeatureExtractor<S> {
        &self.extractor
    }

    /// Fill a grid mosaic for a streamed target
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is empty, the target does not match the
    /// tiling, or the selected strategy fails
    pub fn generate(
        &self,
        source: &mut dyn RowSource,
        tiling: &Tiling,
        progress: &ProgressReporter,
    ) -> Result<PlacementMap> {
        let method = self.config.method;
        if self.pool.is_empty() {
            return Err(MosaicError::PoolTooSmall {
                strategy: method.name(),
                required: 1,
                available: 0,
            });
        }

        info!(
            method = method.name(),
            columns = tiling.metawidth(),
            rows = tiling.metaheight(),
            candidates = self.pool.len(),
            "generating mosaic"
        );
        progress.reset("matching", tiling.tile_count() as u64);

        let matcher = self.matcher();
        let map = match method {
            SearchMethod::Local => LocalSearch::new(matcher, self.config.min_distance).run(
                source,
                tiling,
                &self.extractor,
                progress,
            )?,
            SearchMethod::Global => {
                let features = self.extractor.extract_tiles(source, tiling)?;
                GlobalSearch::new(matcher, self.config.anti_radius).run(
                    &features, tiling, progress,
                )?
            }
            SearchMethod::Subset => {
                let features = self.extractor.extract_tiles(source, tiling)?;
                let count = self
                    .config
                    .subset_count
                    .unwrap_or_else(|| tiling.tile_count().min(self.pool.len()));
                SubsetSearch::new(matcher, count).run(&features, tiling, progress)?
            }
            SearchMethod::Cube => self.cube(source, tiling)?,
        };

        info!(filled = map.filled_count(), "mosaic complete");
        Ok(map)
    }

    /// Pack a collage over a decoded target
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is empty or collage packing fails
    pub fn collage(
        &self,
        target: &RgbImage,
        config: CollageConfig,
        progress: &ProgressReporter,
    ) -> Result<MosaicLayout> {
        if self.pool.is_empty() {
            return Err(MosaicError::PoolTooSmall {
                strategy: "collage",
                required: 1,
                available: 0,
            });
        }
        progress.reset("packing", u64::from(target.width()) * u64::from(target.height()));
        CollageSearch::new(self.matcher(), config).run(target, &self.extractor, progress)
    }

    /// One big pixel per tile, candidates' mean colors as smalls
    fn cube(&self, source: &mut dyn RowSource, tiling: &Tiling) -> Result<PlacementMap> {
        let target = source.read_rows(source.height())?;
        let reduced = self
            .extractor
            .scaler()
            .scale(&target, tiling.metawidth(), tiling.metaheight())?;

        let bigs: Vec<[u8; 3]> = reduced.pixels().map(|pixel| pixel.0).collect();
        let smalls: Vec<[u8; 3]> = self.pool.candidates().iter().map(|c| c.mean_rgb()).collect();
        let assignment = process_cube(&bigs, &smalls, self.config.cube)?;

        let mut map = PlacementMap::new(*tiling);
        for (tile, (&candidate, big)) in assignment.iter().zip(&bigs).enumerate() {
            let small = smalls.get(candidate).copied().unwrap_or_default();
            let score = (0..3)
                .map(|channel| {
                    let diff = f32::from(big.get(channel).copied().unwrap_or(0))
                        - f32::from(small.get(channel).copied().unwrap_or(0));
                    self.config.weights.get(channel) * diff * diff
                })
                .sum();
            let (tile_x, tile_y) = tiling.tile_at(tile);
            map.set(
                tile_x,
                tile_y,
                Match {
                    candidate,
                    orientation: Orientation::IDENTITY,
                    score,
                },
            );
        }
        Ok(map)
    }
}
