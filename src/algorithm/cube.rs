//! Recursive color-cube partitioning for one candidate per output pixel
//!
//! Output pixels ("bigs") and candidate colors ("smalls") are points in the
//! 256³ RGB cube. Each level splits its cell into eight octants and evens out
//! supply and demand between them before recursing:
//!
//! 1. octants holding more smalls than bigs hand their surplus to octants
//!    that still have room, nearest target centre first;
//! 2. octants left with bigs but no smalls send those bigs to the nearest
//!    octant that can serve them.
//!
//! Afterwards every octant has at most as many smalls as bigs, and an octant
//! without bigs has no smalls either. Cells that reach the depth limit or
//! hold few smalls assign their bigs round-robin over color-sorted smalls.

use crate::analysis::matcher::ChannelWeights;
use crate::io::configuration::{DEFAULT_CUBE_LEAF_THRESHOLD, DEFAULT_CUBE_MAX_DEPTH};
use crate::io::error::{MosaicError, Result};
use std::collections::HashSet;
use tracing::debug;

/// Limits and metric of the partitioner
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeConfig {
    /// Deepest level that is still split
    pub max_depth: u32,
    /// Cells with fewer smalls than this are assigned directly
    pub leaf_threshold: usize,
    /// Channel weights of the redistribution distance
    pub weights: ChannelWeights,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_CUBE_MAX_DEPTH,
            leaf_threshold: DEFAULT_CUBE_LEAF_THRESHOLD,
            weights: ChannelWeights::default(),
        }
    }
}

/// Axis-aligned cube of colors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    origin: [u32; 3],
    size: u32,
}

impl Cell {
    const ROOT: Self = Self {
        origin: [0; 3],
        size: 256,
    };

    /// Octant of a point; bit `c` is set when channel `c` lies in the upper half
    fn octant(self, point: [u8; 3]) -> usize {
        let half = self.size / 2;
        (0..3).fold(0, |octant, channel| {
            let value = u32::from(point.get(channel).copied().unwrap_or(0));
            let mid = self.origin.get(channel).copied().unwrap_or(0) + half;
            if value >= mid {
                octant | (1 << channel)
            } else {
                octant
            }
        })
    }

    fn child(self, octant: usize) -> Self {
        let half = self.size / 2;
        let mut origin = self.origin;
        for (channel, value) in origin.iter_mut().enumerate() {
            if octant & (1 << channel) != 0 {
                *value += half;
            }
        }
        Self { origin, size: half }
    }

    fn center(self) -> [f32; 3] {
        let half = self.size as f32 / 2.0;
        self.origin.map(|value| value as f32 + half)
    }
}

#[derive(Clone, Debug, Default)]
struct Bucket {
    bigs: Vec<usize>,
    smalls: Vec<usize>,
}

impl Bucket {
    fn excess(&self) -> usize {
        self.smalls.len().saturating_sub(self.bigs.len())
    }

    fn room(&self) -> usize {
        self.bigs.len().saturating_sub(self.smalls.len())
    }
}

/// Counters reported once a partition finishes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CubeStats {
    /// Cells assigned round-robin
    pub leaves: usize,
    /// Smalls handed to a neighbouring octant
    pub moved_smalls: usize,
    /// Bigs sent away from an octant without smalls
    pub moved_bigs: usize,
    /// Surplus smalls no octant had room for
    pub dropped_smalls: usize,
}

/// Assigns every big pixel one small pixel by recursive octree bucketing
#[derive(Debug)]
pub struct CubePartitioner<'a> {
    config: CubeConfig,
    bigs: &'a [[u8; 3]],
    smalls: &'a [[u8; 3]],
    assignment: Vec<Option<usize>>,
    stats: CubeStats,
}

impl<'a> CubePartitioner<'a> {
    /// Prepare a partition of `bigs` over `smalls`
    pub fn new(config: CubeConfig, bigs: &'a [[u8; 3]], smalls: &'a [[u8; 3]]) -> Self {
        Self {
            config,
            bigs,
            smalls,
            assignment: vec![None; bigs.len()],
            stats: CubeStats::default(),
        }
    }

    /// Counters of the last run
    pub const fn stats(&self) -> CubeStats {
        self.stats
    }

    /// Assign every big pixel, returning one small index per big
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::PoolTooSmall`] if there are bigs but no smalls
    pub fn run(&mut self) -> Result<Vec<usize>> {
        if self.bigs.is_empty() {
            return Ok(Vec::new());
        }
        if self.smalls.is_empty() {
            return Err(MosaicError::PoolTooSmall {
                strategy: "cube",
                required: 1,
                available: 0,
            });
        }

        self.assignment = vec![None; self.bigs.len()];
        self.stats = CubeStats::default();
        self.split(
            Cell::ROOT,
            (0..self.bigs.len()).collect(),
            (0..self.smalls.len()).collect(),
            0,
        );
        debug!(
            leaves = self.stats.leaves,
            moved_smalls = self.stats.moved_smalls,
            moved_bigs = self.stats.moved_bigs,
            dropped_smalls = self.stats.dropped_smalls,
            "cube partition complete"
        );

        self.assignment
            .iter()
            .enumerate()
            .map(|(big, small)| {
                small.ok_or(MosaicError::NoMatchFound {
                    x: big as u32,
                    y: 0,
                })
            })
            .collect()
    }

    fn split(&mut self, cell: Cell, bigs: Vec<usize>, smalls: Vec<usize>, depth: u32) {
        if depth >= self.config.max_depth
            || cell.size <= 1
            || smalls.len() < self.config.leaf_threshold.max(2)
        {
            self.assign_leaf(bigs, smalls);
            return;
        }

        let mut buckets: [Bucket; 8] = std::array::from_fn(|_| Bucket::default());
        for big in bigs {
            let octant = cell.octant(self.big(big));
            if let Some(bucket) = buckets.get_mut(octant) {
                bucket.bigs.push(big);
            }
        }
        for small in smalls {
            let octant = cell.octant(self.small(small));
            if let Some(bucket) = buckets.get_mut(octant) {
                bucket.smalls.push(small);
            }
        }

        self.spread_smalls(cell, &mut buckets);
        self.gather_bigs(cell, &mut buckets);

        for (octant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.smalls.is_empty() {
                self.split(cell.child(octant), bucket.bigs, bucket.smalls, depth + 1);
            }
        }
    }

    /// Pass 1: move surplus smalls into octants with room
    fn spread_smalls(&mut self, cell: Cell, buckets: &mut [Bucket; 8]) {
        let mut moves = Vec::new();
        for (from, bucket) in buckets.iter().enumerate() {
            if bucket.excess() == 0 {
                continue;
            }
            for &small in &bucket.smalls {
                for (to, target) in buckets.iter().enumerate() {
                    if target.room() > 0 {
                        let distance = self.distance(self.small(small), cell.child(to).center());
                        moves.push((distance, small, from, to));
                    }
                }
            }
        }
        moves.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut excess = buckets.each_ref().map(Bucket::excess);
        let mut room = buckets.each_ref().map(Bucket::room);
        let mut moved = HashSet::new();
        let mut arrivals: [Vec<usize>; 8] = std::array::from_fn(|_| Vec::new());

        for (_, small, from, to) in moves {
            let (Some(left), Some(open)) = (excess.get_mut(from), room.get_mut(to)) else {
                continue;
            };
            if *left == 0 || *open == 0 || moved.contains(&small) {
                continue;
            }
            *left -= 1;
            *open -= 1;
            moved.insert(small);
            if let Some(list) = arrivals.get_mut(to) {
                list.push(small);
            }
        }

        self.stats.moved_smalls += moved.len();
        for (bucket, arrived) in buckets.iter_mut().zip(arrivals) {
            bucket.smalls.retain(|small| !moved.contains(small));
            bucket.smalls.extend(arrived);

            // Only reachable when the cell holds more smalls than bigs overall
            let limit = bucket.bigs.len();
            if bucket.smalls.len() > limit {
                self.stats.dropped_smalls += bucket.smalls.len() - limit;
                bucket.smalls.truncate(limit);
            }
        }
    }

    /// Pass 2: send bigs away from octants that have no smalls
    fn gather_bigs(&mut self, cell: Cell, buckets: &mut [Bucket; 8]) {
        let served: Vec<usize> = (0..8)
            .filter(|&octant| buckets.get(octant).is_some_and(|b| !b.smalls.is_empty()))
            .collect();
        if served.is_empty() {
            return;
        }

        let mut arrivals: [Vec<usize>; 8] = std::array::from_fn(|_| Vec::new());
        for bucket in buckets.iter_mut() {
            if !bucket.smalls.is_empty() || bucket.bigs.is_empty() {
                continue;
            }
            for big in std::mem::take(&mut bucket.bigs) {
                let point = self.big(big);
                let nearest = served.iter().copied().min_by(|&a, &b| {
                    self.distance(point, cell.child(a).center())
                        .total_cmp(&self.distance(point, cell.child(b).center()))
                });
                if let Some(list) = nearest.and_then(|to| arrivals.get_mut(to)) {
                    list.push(big);
                    self.stats.moved_bigs += 1;
                }
            }
        }

        for (bucket, arrived) in buckets.iter_mut().zip(arrivals) {
            bucket.bigs.extend(arrived);
        }
    }

    /// Round-robin over color-sorted smalls
    fn assign_leaf(&mut self, mut bigs: Vec<usize>, mut smalls: Vec<usize>) {
        if smalls.is_empty() {
            return;
        }
        self.stats.leaves += 1;

        let big_colors = self.bigs;
        let small_colors = self.smalls;
        bigs.sort_by_key(|&big| (big_colors.get(big).copied(), big));
        smalls.sort_by_key(|&small| (small_colors.get(small).copied(), small));

        for (n, big) in bigs.into_iter().enumerate() {
            let small = smalls.get(n % smalls.len()).copied();
            if let Some(slot) = self.assignment.get_mut(big) {
                *slot = small;
            }
        }
    }

    fn big(&self, index: usize) -> [u8; 3] {
        self.bigs.get(index).copied().unwrap_or_default()
    }

    fn small(&self, index: usize) -> [u8; 3] {
        self.smalls.get(index).copied().unwrap_or_default()
    }

    fn distance(&self, point: [u8; 3], center: [f32; 3]) -> f32 {
        point
            .iter()
            .zip(center)
            .enumerate()
            .map(|(channel, (&value, mid))| {
                let diff = f32::from(value) - mid;
                self.config.weights.get(channel) * diff * diff
            })
            .sum()
    }
}

/// Assign each big pixel a small pixel
///
/// # Errors
///
/// Returns [`MosaicError::PoolTooSmall`] if there are bigs but no smalls
pub fn process_cube(
    bigs: &[[u8; 3]],
    smalls: &[[u8; 3]],
    config: CubeConfig,
) -> Result<Vec<usize>> {
    CubePartitioner::new(config, bigs, smalls).run()
}
