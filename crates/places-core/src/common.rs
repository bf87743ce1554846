// crates/places-core/src/common.rs
use serde::{Deserialize, Serialize};

/// Simple aggregate statistics for an engine's index.
///
/// Returned by [`PlaceSearch::stats`](crate::PlaceSearch::stats); the counts
/// describe the snapshot searches currently run against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub records: usize,
    pub terms: usize,
    /// Country shards indexed, lowercase ISO2, sorted.
    pub shards: Vec<String>,
    /// Whether the whole-world dataset replaced the shards.
    pub full: bool,
    /// Bumped on every change to the index.
    pub generation: u64,
}
