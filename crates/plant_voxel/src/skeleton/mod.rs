//! Skeleton graph engine.
//!
//! Works on a 1-voxel-wide skeleton grid produced by an external thinning
//! step:
//!
//! 1. [`pathfinder`] finds endpoints, picks the root and builds a shortest-path
//!    tree from the root to every endpoint.
//! 2. [`branch`] prunes redundant paths, splits the survivors into a shared
//!    trunk and individual leaves, and validates the trunk topology.
//! 3. [`classifier`] holds the pruning predicates and the tooling used to
//!    evaluate them on annotated path sets.

use crate::voxel::Voxel;

pub mod branch;
pub mod classifier;
pub mod pathfinder;

pub use branch::{
  assign_voxels_to_nearest_path, filter_paths, filter_paths_threshold, keep_selected,
  number_common_voxels, path_has_no_junction, segment_paths, segment_voxels, FilteredPaths,
};
pub use classifier::{BranchClassifier, BranchSelection, ThresholdClassifier};
pub use pathfinder::{
  extract_endpoints, find_and_remove_lowest_endpoint, shortest_paths, PathfinderConfig,
  ShortestPaths,
};

/// Voxels from the root to a tip, root first.
pub type SkeletonPath = Vec<Voxel>;
