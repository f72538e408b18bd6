//! Feature vectors and their extraction from image regions
//!
//! A feature vector is the region resampled to a fixed grid of
//! [`SAMPLE_GRID_WIDTH`] x [`SAMPLE_GRID_HEIGHT`] samples, stored channel-major:
//! all samples of channel 0, then channel 1, then channel 2. Samples within a
//! channel are in raster order.

use crate::io::configuration::{SAMPLE_GRID_HEIGHT, SAMPLE_GRID_WIDTH};
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::{RowSource, Scaler, crop};
use crate::math::color::ColorSpace;
use crate::spatial::tiling::{PixelRect, Tiling};
use image::RgbImage;
use ndarray::Array2;

/// Number of sample points per channel
pub const SAMPLE_COUNT: usize = (SAMPLE_GRID_WIDTH * SAMPLE_GRID_HEIGHT) as usize;
/// Channels per sample point
pub const CHANNELS: usize = 3;
/// Total length of a feature vector
pub const FEATURE_LEN: usize = SAMPLE_COUNT * CHANNELS;

/// Downsampled, color-converted summary of an image region
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeatureVector {
    values: [u8; FEATURE_LEN],
}

impl FeatureVector {
    /// Wrap raw channel-major values
    pub const fn from_values(values: [u8; FEATURE_LEN]) -> Self {
        Self { values }
    }

    /// Build from a slice, which must hold exactly [`FEATURE_LEN`] values
    pub fn from_slice(values: &[u8]) -> Option<Self> {
        <[u8; FEATURE_LEN]>::try_from(values)
            .ok()
            .map(Self::from_values)
    }

    /// Vector of a single color at every sample
    pub fn uniform(color: [u8; 3]) -> Self {
        let mut values = [0; FEATURE_LEN];
        for (channel, chunk) in values.chunks_exact_mut(SAMPLE_COUNT).enumerate() {
            chunk.fill(color.get(channel).copied().unwrap_or(0));
        }
        Self { values }
    }

    /// Raw channel-major values
    pub const fn values(&self) -> &[u8; FEATURE_LEN] {
        &self.values
    }

    /// Value of one channel at one sample
    pub fn get(&self, channel: usize, sample: usize) -> u8 {
        self.values
            .get(channel * SAMPLE_COUNT + sample)
            .copied()
            .unwrap_or(0)
    }

    /// All three channels of one sample
    pub fn sample(&self, sample: usize) -> [u8; 3] {
        [
            self.get(0, sample),
            self.get(1, sample),
            self.get(2, sample),
        ]
    }

    /// Per-channel mean, rounded
    pub fn mean(&self) -> [u8; 3] {
        let mut mean = [0u8; 3];
        for (channel, chunk) in self.values.chunks_exact(SAMPLE_COUNT).enumerate() {
            let sum: usize = chunk.iter().map(|&v| usize::from(v)).sum();
            if let Some(slot) = mean.get_mut(channel) {
                *slot = ((sum + SAMPLE_COUNT / 2) / SAMPLE_COUNT) as u8;
            }
        }
        mean
    }

    /// Reinterpret an RGB vector in another color space
    pub fn convert(&self, space: ColorSpace) -> Self {
        if space == ColorSpace::Rgb {
            return *self;
        }

        let mut values = [0; FEATURE_LEN];
        for sample in 0..SAMPLE_COUNT {
            let converted = space.from_rgb(self.sample(sample));
            for (channel, value) in converted.into_iter().enumerate() {
                if let Some(slot) = values.get_mut(channel * SAMPLE_COUNT + sample) {
                    *slot = value;
                }
            }
        }
        Self { values }
    }
}

/// Reduces image regions to feature vectors
#[derive(Clone, Debug)]
pub struct FeatureExtractor<S: Scaler> {
    scaler: S,
    color_space: ColorSpace,
}

impl<S: Scaler> FeatureExtractor<S> {
    /// Create an extractor producing vectors in `color_space`
    pub const fn new(scaler: S, color_space: ColorSpace) -> Self {
        Self {
            scaler,
            color_space,
        }
    }

    /// Active color space
    pub const fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Resampling primitive in use
    pub const fn scaler(&self) -> &S {
        &self.scaler
    }

    /// Feature vector of a whole image in the active color space
    ///
    /// # Errors
    ///
    /// Propagates resampling failures
    pub fn extract(&self, image: &RgbImage) -> Result<FeatureVector> {
        Ok(self.extract_raw(image)?.convert(self.color_space))
    }

    /// Feature vector of a whole image in plain RGB
    ///
    /// Library tables store this form so they stay valid for every space.
    ///
    /// # Errors
    ///
    /// Propagates resampling failures
    pub fn extract_raw(&self, image: &RgbImage) -> Result<FeatureVector> {
        let grid = self
            .scaler
            .scale(image, SAMPLE_GRID_WIDTH, SAMPLE_GRID_HEIGHT)?;

        let mut values = [0; FEATURE_LEN];
        for (sample, pixel) in grid.pixels().enumerate().take(SAMPLE_COUNT) {
            for (channel, &value) in pixel.0.iter().enumerate() {
                if let Some(slot) = values.get_mut(channel * SAMPLE_COUNT + sample) {
                    *slot = value;
                }
            }
        }
        Ok(FeatureVector { values })
    }

    /// Feature vector of a rectangle of an image
    ///
    /// # Errors
    ///
    /// Returns an error if the rectangle leaves the image or resampling fails
    pub fn extract_region(&self, image: &RgbImage, rect: PixelRect) -> Result<FeatureVector> {
        if rect.right() > image.width() || rect.bottom() > image.height() {
            return Err(invalid_parameter(
                "region",
                &format!("{}x{}+{}+{}", rect.width, rect.height, rect.x, rect.y),
                &format!("exceeds image of {}x{}", image.width(), image.height()),
            ));
        }
        self.extract(&crop(image, rect))
    }

    /// Feature vectors of every tile in one tile row
    ///
    /// `rows` holds exactly the pixel rows of tile row `tile_y`.
    ///
    /// # Errors
    ///
    /// Propagates resampling failures
    pub fn extract_tile_row(
        &self,
        rows: &RgbImage,
        tiling: &Tiling,
        tile_y: u32,
    ) -> Result<Vec<FeatureVector>> {
        (0..tiling.metawidth())
            .map(|tile_x| {
                let rect = tiling.rect(tile_x, tile_y);
                self.extract_region(rows, PixelRect::new(rect.x, 0, rect.width, rect.height))
            })
            .collect()
    }

    /// Feature vectors of every tile, streaming the target row by row
    ///
    /// # Errors
    ///
    /// Returns an error if the source size differs from the tiling, or if
    /// reading or resampling fails
    pub fn extract_tiles(
        &self,
        source: &mut dyn RowSource,
        tiling: &Tiling,
    ) -> Result<Array2<FeatureVector>> {
        if (source.width(), source.height()) != (tiling.width(), tiling.height()) {
            return Err(invalid_parameter(
                "target size",
                &format!("{}x{}", source.width(), source.height()),
                &format!("tiling expects {}x{}", tiling.width(), tiling.height()),
            ));
        }

        let mut features = Vec::with_capacity(tiling.tile_count());
        for tile_y in 0..tiling.metaheight() {
            let rows = source.read_rows(tiling.rect(0, tile_y).height)?;
            features.extend(self.extract_tile_row(&rows, tiling, tile_y)?);
        }

        Array2::from_shape_vec(
            (tiling.metaheight() as usize, tiling.metawidth() as usize),
            features,
        )
        .map_err(|e| invalid_parameter("tiling", &tiling.tile_count(), &e))
    }
}
