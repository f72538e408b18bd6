//! Feature extraction, candidate pools and matching

/// Candidate tile images, orientations and pools
pub mod candidate;
/// Feature vectors and region extraction
pub mod features;
/// Pool search with early-exit scoring
pub mod matcher;

pub use candidate::{Candidate, ContentKey, Orientation, Pool, PoolSource};
pub use features::{FeatureExtractor, FeatureVector};
pub use matcher::{ChannelWeights, Match, Matcher};
