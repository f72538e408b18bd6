//! Randomized free-form collage packing

use crate::analysis::features::FeatureExtractor;
use crate::analysis::matcher::Matcher;
use crate::io::configuration::{
    COLLAGE_MAX_REROLLS, DEFAULT_COLLAGE_MAX_SIZE, DEFAULT_COLLAGE_MIN_SIZE, DEFAULT_SEED,
};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::Scaler;
use crate::io::progress::ProgressReporter;
use crate::spatial::occupancy::Occupancy;
use crate::spatial::placement::{MosaicLayout, Placement};
use crate::spatial::tiling::PixelRect;
use image::RgbImage;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

/// Parameters of a collage run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollageConfig {
    /// Smallest square edge in target pixels
    pub min_size: u32,
    /// Largest square edge in target pixels
    pub max_size: u32,
    /// Minimum Manhattan distance between two placements of one candidate
    pub min_distance: u32,
    /// Seed of the placement generator
    pub seed: u64,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_COLLAGE_MIN_SIZE,
            max_size: DEFAULT_COLLAGE_MAX_SIZE,
            min_distance: 0,
            seed: DEFAULT_SEED,
        }
    }
}

impl CollageConfig {
    /// Check the size range
    ///
    /// # Errors
    ///
    /// Returns an error if the minimum size is zero or exceeds the maximum
    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 {
            return Err(invalid_parameter(
                "collage min size",
                &self.min_size,
                &"must be at least 1",
            ));
        }
        if self.min_size > self.max_size {
            return Err(invalid_parameter(
                "collage min size",
                &self.min_size,
                &format!("exceeds max size {}", self.max_size),
            ));
        }
        Ok(())
    }
}

/// Covers a target with randomly placed squares until no pixel is bare
#[derive(Debug)]
pub struct CollageSearch<'p> {
    matcher: Matcher<'p>,
    config: CollageConfig,
    rng: StdRng,
    history: Vec<Vec<(u32, u32)>>,
}

impl<'p> CollageSearch<'p> {
    /// Create a collage search seeded from the configuration
    pub fn new(matcher: Matcher<'p>, config: CollageConfig) -> Self {
        Self {
            history: vec![Vec::new(); matcher.pool().len()],
            rng: StdRng::seed_from_u64(config.seed),
            matcher,
            config,
        }
    }

    /// Pack the target and return placements in drawing order
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration or target size is invalid
    /// - Resampling a region fails
    /// - Every candidate is too close to its earlier uses for some square
    pub fn run<S: Scaler>(
        &mut self,
        target: &RgbImage,
        extractor: &FeatureExtractor<S>,
        progress: &ProgressReporter,
    ) -> Result<MosaicLayout> {
        self.config.validate()?;
        let (width, height) = target.dimensions();
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "target size",
                &format!("{width}x{height}"),
                &"target image is empty",
            ));
        }

        info!(
            width,
            height,
            min_size = self.config.min_size,
            max_size = self.config.max_size,
            "collage search"
        );
        let mut occupancy = Occupancy::new(width, height);
        let mut placements = Vec::new();

        while !occupancy.is_complete() {
            let rect = self.roll(&occupancy);
            let query = extractor.extract_region(target, rect)?;
            let center = center(rect);
            let min_distance = self.config.min_distance;
            let history = &self.history;

            let matched = self
                .matcher
                .best(&query, &[], |candidate| {
                    history.get(candidate.index()).is_none_or(|used| {
                        used.iter().all(|&(x, y)| {
                            x.abs_diff(center.0) + y.abs_diff(center.1) >= min_distance
                        })
                    })
                })
                .ok_or(MosaicError::NoMatchFound {
                    x: rect.x,
                    y: rect.y,
                })?;

            if let Some(used) = self.history.get_mut(matched.candidate) {
                used.push(center);
            }
            placements.push(Placement { rect, matched });
            progress.advance(occupancy.cover(rect) as u64);
        }

        progress.finish();
        info!(placements = placements.len(), "collage complete");
        Ok(MosaicLayout {
            width,
            height,
            placements,
        })
    }

    /// Draw a square that covers at least one bare pixel
    fn roll(&mut self, occupancy: &Occupancy) -> PixelRect {
        let size = self
            .rng
            .random_range(self.config.min_size..=self.config.max_size);
        let w = size.min(occupancy.width());
        let h = size.min(occupancy.height());

        for _ in 0..COLLAGE_MAX_REROLLS {
            let x = self.rng.random_range(0..=occupancy.width() - w);
            let y = self.rng.random_range(0..=occupancy.height() - h);
            let rect = PixelRect::new(x, y, w, h);
            if occupancy.has_uncovered(rect) {
                return rect;
            }
        }

        // Late in a run most rolls miss, so anchor on a bare pixel instead
        let n = self.rng.random_range(0..occupancy.uncovered_count().max(1));
        let (px, py) = occupancy.nth_uncovered(n).unwrap_or((0, 0));
        PixelRect::new(
            px.saturating_sub(w / 2).min(occupancy.width() - w),
            py.saturating_sub(h / 2).min(occupancy.height() - h),
            w,
            h,
        )
    }
}

const fn center(rect: PixelRect) -> (u32, u32) {
    (rect.x + rect.width / 2, rect.y + rect.height / 2)
}
