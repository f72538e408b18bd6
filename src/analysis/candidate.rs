//! Candidate tile images and the pools that own them

use crate::analysis::features::{FeatureExtractor, FeatureVector};
use crate::collections::ordered_index::OrderedIndex;
use crate::io::configuration::{SAMPLE_GRID_HEIGHT, SAMPLE_GRID_WIDTH};
use crate::io::error::Result;
use crate::io::image::{Scaler, crop};
use crate::math::color::ColorSpace;
use crate::spatial::tiling::Tiling;
use image::RgbImage;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flip applied to a candidate before it is compared or pasted
///
/// Also used as a mask of permitted flips, where `true` means the flip is
/// allowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Orientation {
    /// Mirror left to right
    pub horizontal: bool,
    /// Mirror top to bottom
    pub vertical: bool,
}

impl Orientation {
    /// No flip
    pub const IDENTITY: Self = Self::new(false, false);
    /// Both flips, or as a mask every flip permitted
    pub const BOTH: Self = Self::new(true, true);
    /// Every orientation in scoring order
    pub const VARIANTS: [Self; 4] = [
        Self::IDENTITY,
        Self::new(true, false),
        Self::new(false, true),
        Self::BOTH,
    ];

    /// Create an orientation from its flip flags
    pub const fn new(horizontal: bool, vertical: bool) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Test if `mask` allows every flip this orientation applies
    pub const fn permits(self, mask: Self) -> bool {
        (!self.horizontal || mask.horizontal) && (!self.vertical || mask.vertical)
    }

    /// Intersection of two masks
    pub const fn intersect(self, other: Self) -> Self {
        Self::new(
            self.horizontal && other.horizontal,
            self.vertical && other.vertical,
        )
    }

    /// Number of orientations this mask allows, identity included
    pub const fn variant_count(self) -> usize {
        (1 + self.horizontal as usize) * (1 + self.vertical as usize)
    }

    /// Orientations this mask allows in scoring order
    pub fn allowed_variants(self) -> impl Iterator<Item = Self> {
        Self::VARIANTS
            .into_iter()
            .filter(move |variant| variant.permits(self))
    }

    /// Sample index of the unflipped grid that lands on `sample` after flipping
    pub const fn source_sample(self, sample: usize) -> usize {
        let width = SAMPLE_GRID_WIDTH as usize;
        let height = SAMPLE_GRID_HEIGHT as usize;
        let mut x = sample % width;
        let mut y = sample / width;
        if self.horizontal {
            x = width - 1 - x;
        }
        if self.vertical {
            y = height - 1 - y;
        }
        y * width + x
    }
}

/// Content identity of a tile file used for deduplication
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentKey {
    /// File size in bytes
    pub length: u64,
    /// Leading eight bytes of the content digest
    pub checksum: u64,
}

/// A tile image eligible for placement
///
/// Immutable once pushed into a [`Pool`].
#[derive(Clone, Debug)]
pub struct Candidate {
    index: usize,
    filename: String,
    source: usize,
    features: FeatureVector,
    mean_rgb: [u8; 3],
    orientations: Orientation,
    anti: Option<(u32, u32)>,
    content: Option<ContentKey>,
}

impl Candidate {
    /// Create a candidate from its RGB feature grid
    ///
    /// `source` is the index of the pool source the file belongs to.
    pub fn new(
        filename: impl Into<String>,
        source: usize,
        rgb: &FeatureVector,
        space: ColorSpace,
    ) -> Self {
        Self {
            index: 0,
            filename: filename.into(),
            source,
            features: rgb.convert(space),
            mean_rgb: rgb.mean(),
            orientations: Orientation::BOTH,
            anti: None,
            content: None,
        }
    }

    /// Restrict the flips this candidate may be placed with
    #[must_use]
    pub const fn with_orientations(mut self, orientations: Orientation) -> Self {
        self.orientations = orientations;
        self
    }

    /// Record where in an anti-image this candidate was sampled
    #[must_use]
    pub const fn with_anti(mut self, tile_x: u32, tile_y: u32) -> Self {
        self.anti = Some((tile_x, tile_y));
        self
    }

    /// Attach the file content identity
    #[must_use]
    pub const fn with_content(mut self, content: ContentKey) -> Self {
        self.content = Some(content);
        self
    }

    /// Stable index within the owning pool
    pub const fn index(&self) -> usize {
        self.index
    }

    /// File name relative to its library
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Index of the pool source
    pub const fn source(&self) -> usize {
        self.source
    }

    /// Feature vector in the pool's color space
    pub const fn features(&self) -> &FeatureVector {
        &self.features
    }

    /// Mean color in RGB
    pub const fn mean_rgb(&self) -> [u8; 3] {
        self.mean_rgb
    }

    /// Flips this candidate may be placed with
    pub const fn orientations(&self) -> Orientation {
        self.orientations
    }

    /// Tile coordinate of origin for anti-image candidates
    pub const fn anti(&self) -> Option<(u32, u32)> {
        self.anti
    }

    /// Content identity, if known
    pub const fn content(&self) -> Option<ContentKey> {
        self.content
    }
}

/// Where the candidates of a pool come from
#[derive(Clone, Debug)]
pub enum PoolSource {
    /// Library directory with a prepared table
    Library(PathBuf),
    /// Tiles cut from an image
    AntiImage {
        /// Image file the tiles were cut from
        path: PathBuf,
        /// Decoded image
        image: RgbImage,
        /// Tiling that produced the candidates
        tiling: Tiling,
    },
}

impl PoolSource {
    /// Path identifying this source in protocol records
    pub fn path(&self) -> &Path {
        match self {
            Self::Library(path) | Self::AntiImage { path, .. } => path,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ContentEntry {
    key: ContentKey,
    candidate: usize,
}

/// Ordered collection of candidates with content deduplication
#[derive(Debug)]
pub struct Pool {
    sources: Vec<PoolSource>,
    candidates: Vec<Candidate>,
    content_index: OrderedIndex<ContentEntry>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            candidates: Vec::new(),
            content_index: OrderedIndex::sorted(ContentEntry::cmp),
        }
    }

    /// Register a source, returning its index
    pub fn add_source(&mut self, source: PoolSource) -> usize {
        self.sources.push(source);
        self.sources.len() - 1
    }

    /// Registered sources
    pub fn sources(&self) -> &[PoolSource] {
        &self.sources
    }

    /// Append a candidate, returning its pool index
    pub fn push(&mut self, mut candidate: Candidate) -> usize {
        let index = self.candidates.len();
        candidate.index = index;
        if let Some(key) = candidate.content {
            self.content_index.insert(ContentEntry {
                key,
                candidate: index,
            });
        }
        self.candidates.push(candidate);
        index
    }

    /// Append a candidate unless one with the same content is present
    ///
    /// Returns the new index, or `None` for a duplicate.
    pub fn push_unique(&mut self, candidate: Candidate) -> Option<usize> {
        if let Some(existing) = candidate.content.and_then(|key| self.find_content(key)) {
            debug!(
                filename = candidate.filename(),
                duplicate_of = self.candidates.get(existing).map(Candidate::filename),
                "skipping duplicate tile"
            );
            return None;
        }
        Some(self.push(candidate))
    }

    /// Index of the first candidate with the given content
    pub fn find_content(&self, key: ContentKey) -> Option<usize> {
        let probe = ContentEntry { key, candidate: 0 };
        self.content_index
            .lookup(&probe)
            .and_then(|id| self.content_index.get(id))
            .map(|entry| entry.candidate)
    }

    /// All candidates in index order
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Candidate at a pool index
    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Test if the pool holds no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Source path of a candidate
    pub fn library_path(&self, index: usize) -> Option<&Path> {
        self.get(index)
            .and_then(|candidate| self.sources.get(candidate.source))
            .map(PoolSource::path)
    }

    /// Find a candidate by source path and file name
    pub fn find_by_name(&self, library: &Path, filename: &str) -> Option<usize> {
        let source = self
            .sources
            .iter()
            .position(|source| source.path() == library)?;
        self.candidates
            .iter()
            .position(|candidate| candidate.source == source && candidate.filename == filename)
    }

    /// Add every tile of an image as a candidate with its origin recorded
    ///
    /// # Errors
    ///
    /// Propagates resampling failures
    pub fn add_anti_image<S: Scaler>(
        &mut self,
        path: &Path,
        image: RgbImage,
        tiling: Tiling,
        extractor: &FeatureExtractor<S>,
    ) -> Result<usize> {
        let mut sampled = Vec::with_capacity(tiling.tile_count());
        for (tile_x, tile_y) in tiling.tiles() {
            let rgb = extractor.extract_raw(&crop(&image, tiling.rect(tile_x, tile_y)))?;
            sampled.push((tile_x, tile_y, rgb));
        }

        let source = self.add_source(PoolSource::AntiImage {
            path: path.to_path_buf(),
            image,
            tiling,
        });
        for (tile_x, tile_y, rgb) in &sampled {
            let candidate = Candidate::new(
                anti_tile_name(*tile_x, *tile_y),
                source,
                rgb,
                extractor.color_space(),
            )
            .with_anti(*tile_x, *tile_y);
            self.push(candidate);
        }

        debug!(path = %path.display(), tiles = sampled.len(), "sampled anti-image");
        Ok(source)
    }

    /// Pixels of an anti-image candidate, cut from its source image
    ///
    /// Returns `None` for library candidates, which live in their own files.
    pub fn anti_tile_image(&self, index: usize) -> Option<RgbImage> {
        let candidate = self.get(index)?;
        let (tile_x, tile_y) = candidate.anti?;
        match self.sources.get(candidate.source)? {
            PoolSource::AntiImage { image, tiling, .. } => {
                Some(crop(image, tiling.rect(tile_x, tile_y)))
            }
            PoolSource::Library(_) => None,
        }
    }
}

/// File name given to the anti-image tile at a coordinate
pub fn anti_tile_name(tile_x: u32, tile_y: u32) -> String {
    format!("{tile_x}_{tile_y}")
}

impl PartialEq for ContentEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ContentEntry {}

impl PartialOrd for ContentEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContentEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}
