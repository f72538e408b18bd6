//! Coverage bitmap for free-form collage packing

use crate::spatial::tiling::PixelRect;
use bitvec::prelude::*;

/// One bit per target pixel, set once any placement covers it
#[derive(Clone, Debug)]
pub struct Occupancy {
    bits: BitVec,
    width: u32,
    height: u32,
}

impl Occupancy {
    /// Create an uncovered bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            bits: bitvec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Bitmap width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Bitmap height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Test if a pixel has been covered
    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        x < self.width && self.bits.get(self.offset(x, y)).as_deref() == Some(&true)
    }

    /// Test if the rectangle contains at least one uncovered pixel
    pub fn has_uncovered(&self, rect: PixelRect) -> bool {
        self.rows(rect)
            .any(|row| self.bits.get(row).is_some_and(|bits| !bits.all()))
    }

    /// Mark the rectangle as covered, returning how many pixels were new
    pub fn cover(&mut self, rect: PixelRect) -> usize {
        let mut newly_covered = 0;
        for row in self.rows(rect) {
            if let Some(bits) = self.bits.get_mut(row) {
                newly_covered += bits.count_zeros();
                bits.fill(true);
            }
        }
        newly_covered
    }

    /// Number of pixels not yet covered
    pub fn uncovered_count(&self) -> usize {
        self.bits.count_zeros()
    }

    /// Test if every pixel has been covered
    pub fn is_complete(&self) -> bool {
        self.bits.all()
    }

    /// Coordinates of the `n`-th uncovered pixel in raster order
    pub fn nth_uncovered(&self, n: usize) -> Option<(u32, u32)> {
        let offset = self.bits.iter_zeros().nth(n)?;
        let width = self.width as usize;
        Some(((offset % width) as u32, (offset / width) as u32))
    }

    const fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Bit ranges of each image row intersecting the rectangle
    fn rows(&self, rect: PixelRect) -> impl Iterator<Item = std::ops::Range<usize>> + use<> {
        let x_start = rect.x.min(self.width);
        let x_end = rect.right().min(self.width);
        let y_end = rect.bottom().min(self.height);
        let width = self.width as usize;

        (rect.y.min(y_end)..y_end).map(move |y| {
            let base = y as usize * width;
            base + x_start as usize..base + x_end as usize
        })
    }
}
