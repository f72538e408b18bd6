//! Image loading, saving, resampling and row streaming

use crate::analysis::candidate::Orientation;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::spatial::tiling::PixelRect;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Load an image from disk as 8-bit RGB
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    image::open(path)
        .map(DynamicImage::into_rgb8)
        .map_err(|source| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })
}

/// Decode an in-memory encoded image as 8-bit RGB
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image format
pub fn decode_rgb(bytes: &[u8], path: &Path) -> Result<RgbImage> {
    image::load_from_memory(bytes)
        .map(DynamicImage::into_rgb8)
        .map_err(|source| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })
}

/// Save an image, creating the parent directory when needed
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written to the specified path
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    image.save(path).map_err(|e| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Copy a rectangle out of an image
pub fn crop(image: &RgbImage, rect: PixelRect) -> RgbImage {
    imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Apply a flip orientation to an image
pub fn orient(image: &RgbImage, orientation: Orientation) -> RgbImage {
    match (orientation.horizontal, orientation.vertical) {
        (false, false) => image.clone(),
        (true, false) => imageops::flip_horizontal(image),
        (false, true) => imageops::flip_vertical(image),
        (true, true) => imageops::rotate180(image),
    }
}

/// Separable-filter resampling primitive
///
/// Implementations must return an image of exactly the requested size.
pub trait Scaler {
    /// Resample `source` to `width` x `height`
    ///
    /// # Errors
    ///
    /// Returns an error if the source or target size is empty
    fn scale(&self, source: &RgbImage, width: u32, height: u32) -> Result<RgbImage>;
}

/// Resampling through `image::imageops::resize`
#[derive(Clone, Copy, Debug)]
pub struct FilterScaler {
    filter: FilterType,
}

impl Default for FilterScaler {
    fn default() -> Self {
        Self::new(FilterType::Triangle)
    }
}

impl FilterScaler {
    /// Create a scaler using the given reconstruction filter
    pub const fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Scaler for FilterScaler {
    fn scale(&self, source: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
        if source.width() == 0 || source.height() == 0 {
            return Err(invalid_parameter(
                "source size",
                &format!("{}x{}", source.width(), source.height()),
                &"cannot resample an empty image",
            ));
        }
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "target size",
                &format!("{width}x{height}"),
                &"cannot resample to an empty image",
            ));
        }
        if source.dimensions() == (width, height) {
            return Ok(source.clone());
        }

        Ok(imageops::resize(source, width, height, self.filter))
    }
}

/// Row-streaming image reader
///
/// Rows are handed out strictly top to bottom so that the whole target never
/// has to be resident at once.
pub trait RowSource {
    /// Image width in pixels
    fn width(&self) -> u32;

    /// Image height in pixels
    fn height(&self) -> u32;

    /// Read the next `count` rows as a `width` x `count` image
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than `count` rows remain
    fn read_rows(&mut self, count: u32) -> Result<RgbImage>;
}

/// Row source over a decoded in-memory image
#[derive(Clone, Debug)]
pub struct ImageRows {
    image: RgbImage,
    cursor: u32,
}

impl ImageRows {
    /// Stream the rows of an image from the top
    pub const fn new(image: RgbImage) -> Self {
        Self { image, cursor: 0 }
    }

    /// Number of rows not yet read
    pub fn remaining(&self) -> u32 {
        self.image.height() - self.cursor
    }
}

impl RowSource for ImageRows {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn read_rows(&mut self, count: u32) -> Result<RgbImage> {
        if count > self.remaining() {
            return Err(invalid_parameter(
                "row count",
                &count,
                &format!("only {} rows remain", self.remaining()),
            ));
        }

        let rows = crop(
            &self.image,
            PixelRect::new(0, self.cursor, self.image.width(), count),
        );
        self.cursor += count;
        Ok(rows)
    }
}
