//! Placement maps produced by the assignment strategies

use crate::analysis::matcher::Match;
use crate::spatial::tiling::{PixelRect, Tiling};
use ndarray::Array2;

/// A matched candidate with explicit output geometry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Area of the target the candidate covers
    pub rect: PixelRect,
    /// Candidate, orientation and score chosen for the area
    pub matched: Match,
}

/// Grid of matches, one slot per tile (indexed `[tile_y, tile_x]`)
///
/// Slots start empty and are filled by a strategy. Matches refer to
/// candidates by pool index, so a map is only meaningful next to the pool it
/// was produced from.
#[derive(Clone, Debug)]
pub struct PlacementMap {
    tiling: Tiling,
    cells: Array2<Option<Match>>,
}

impl PlacementMap {
    /// Create a map with every slot unassigned
    pub fn new(tiling: Tiling) -> Self {
        Self {
            cells: Array2::from_elem(
                (tiling.metaheight() as usize, tiling.metawidth() as usize),
                None,
            ),
            tiling,
        }
    }

    /// Tiling the map was built for
    pub const fn tiling(&self) -> &Tiling {
        &self.tiling
    }

    /// Match assigned to a tile, if any
    pub fn get(&self, tile_x: u32, tile_y: u32) -> Option<&Match> {
        self.cells
            .get((tile_y as usize, tile_x as usize))
            .and_then(Option::as_ref)
    }

    /// Assign a match to a tile; coordinates outside the grid are ignored
    pub fn set(&mut self, tile_x: u32, tile_y: u32, matched: Match) {
        if let Some(cell) = self.cells.get_mut((tile_y as usize, tile_x as usize)) {
            *cell = Some(matched);
        }
    }

    /// Test if a tile has been assigned
    pub fn is_filled(&self, tile_x: u32, tile_y: u32) -> bool {
        self.get(tile_x, tile_y).is_some()
    }

    /// Number of assigned tiles
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Test if every tile has been assigned
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Pool indices of all assigned candidates in raster order
    pub fn used_candidates(&self) -> Vec<usize> {
        self.cells
            .iter()
            .filter_map(|cell| cell.map(|matched| matched.candidate))
            .collect()
    }

    /// Assigned tiles with their pixel rectangles in raster order
    pub fn placements(&self) -> Vec<Placement> {
        self.tiling
            .tiles()
            .filter_map(|(x, y)| {
                self.get(x, y).map(|matched| Placement {
                    rect: self.tiling.rect(x, y),
                    matched: *matched,
                })
            })
            .collect()
    }

    /// Flatten into a layout for rendering or protocol output
    pub fn layout(&self) -> MosaicLayout {
        MosaicLayout {
            width: self.tiling.width(),
            height: self.tiling.height(),
            placements: self.placements(),
        }
    }
}

/// Flat list of placements over an image of known size
///
/// Later placements are drawn over earlier ones.
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicLayout {
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Placements in drawing order
    pub placements: Vec<Placement>,
}
