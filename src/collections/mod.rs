/// Bitset over candidate pool indices
pub mod bitset;
/// Rank-balanced ordered index with positional access
pub mod ordered_index;

pub use bitset::CandidateBitset;
pub use ordered_index::{NodeId, OrderedIndex};
