//! Rectangular tiling with near-equal cell sizes
//!
//! Cell boundaries are `floor(size * i / count)`, which partitions the image
//! exactly: no gaps, no overlaps, and boundaries never decrease.

use crate::io::error::{Result, invalid_parameter};

/// Axis-aligned rectangle in output pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge (inclusive)
    pub x: u32,
    /// Top edge (inclusive)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PixelRect {
    /// Create a rectangle from its origin and size
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive)
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive)
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Number of pixels covered
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Test if a pixel lies inside the rectangle
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Scale all edges by a factor
    ///
    /// Edges are scaled independently and floored, so rectangles that share
    /// an edge before scaling still share it afterwards.
    pub fn scaled(&self, factor: f64) -> Self {
        let edge = |value: u32| (f64::from(value) * factor).floor() as u32;
        let x = edge(self.x);
        let y = edge(self.y);
        Self {
            x,
            y,
            width: edge(self.right()).saturating_sub(x),
            height: edge(self.bottom()).saturating_sub(y),
        }
    }
}

/// Division of an image into `metawidth` x `metaheight` cells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tiling {
    width: u32,
    height: u32,
    metawidth: u32,
    metaheight: u32,
}

impl Tiling {
    /// Create a tiling with an explicit tile count per axis
    ///
    /// # Errors
    ///
    /// Returns an error if any dimension is zero or a tile would be less
    /// than one pixel wide or high
    pub fn new(width: u32, height: u32, metawidth: u32, metaheight: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "image size",
                &format!("{width}x{height}"),
                &"image must not be empty",
            ));
        }
        if metawidth == 0 || metawidth > width {
            return Err(invalid_parameter(
                "metawidth",
                &metawidth,
                &format!("must be between 1 and the image width {width}"),
            ));
        }
        if metaheight == 0 || metaheight > height {
            return Err(invalid_parameter(
                "metaheight",
                &metaheight,
                &format!("must be between 1 and the image height {height}"),
            ));
        }

        Ok(Self {
            width,
            height,
            metawidth,
            metaheight,
        })
    }

    /// Create a tiling whose cells approximate the requested tile size
    ///
    /// # Errors
    ///
    /// Returns an error if the image or the tile size is empty
    pub fn with_tile_size(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Result<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(invalid_parameter(
                "tile size",
                &format!("{tile_width}x{tile_height}"),
                &"tiles must be at least one pixel",
            ));
        }

        let count = |size: u32, tile: u32| ((size + tile / 2) / tile).clamp(1, size.max(1));
        Self::new(
            width,
            height,
            count(width, tile_width),
            count(height, tile_height),
        )
    }

    /// Image width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of tile columns
    pub const fn metawidth(&self) -> u32 {
        self.metawidth
    }

    /// Number of tile rows
    pub const fn metaheight(&self) -> u32 {
        self.metaheight
    }

    /// Total number of tiles
    pub const fn tile_count(&self) -> usize {
        self.metawidth as usize * self.metaheight as usize
    }

    /// Left edge of tile column `i`; `i == metawidth` yields the image width
    pub const fn column_bound(&self, i: u32) -> u32 {
        boundary(self.width, i, self.metawidth)
    }

    /// Top edge of tile row `j`; `j == metaheight` yields the image height
    pub const fn row_bound(&self, j: u32) -> u32 {
        boundary(self.height, j, self.metaheight)
    }

    /// Pixel rectangle of the tile at `(tile_x, tile_y)`
    pub const fn rect(&self, tile_x: u32, tile_y: u32) -> PixelRect {
        let x = self.column_bound(tile_x);
        let y = self.row_bound(tile_y);
        PixelRect {
            x,
            y,
            width: self.column_bound(tile_x + 1) - x,
            height: self.row_bound(tile_y + 1) - y,
        }
    }

    /// Same cell grid over an image of a different size
    ///
    /// # Errors
    ///
    /// Returns an error if the new size cannot hold one pixel per cell
    pub fn resized(&self, width: u32, height: u32) -> Result<Self> {
        Self::new(width, height, self.metawidth, self.metaheight)
    }

    /// Row-major index of a tile
    pub const fn tile_index(&self, tile_x: u32, tile_y: u32) -> usize {
        tile_y as usize * self.metawidth as usize + tile_x as usize
    }

    /// Tile coordinates of a row-major index
    pub const fn tile_at(&self, index: usize) -> (u32, u32) {
        let metawidth = self.metawidth as usize;
        ((index % metawidth) as u32, (index / metawidth) as u32)
    }

    /// Iterate tile coordinates in raster order
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32)> + use<> {
        let metawidth = self.metawidth;
        (0..self.metaheight).flat_map(move |y| (0..metawidth).map(move |x| (x, y)))
    }
}

const fn boundary(size: u32, i: u32, count: u32) -> u32 {
    (size as u64 * i as u64 / count as u64) as u32
}
