//! Skeleton Pipeline
//!
//! Runs the skeleton graph engine end to end on a thinned grid:
//!
//! ```text
//! ┌──────┐   ┌───────────┐   ┌────────────────┐   ┌────────┐   ┌─────────┐   ┌──────────┐
//! │ Sort ├──►│ Endpoints ├──►│ Shortest paths ├──►│ Filter ├──►│ Segment ├──►│ Topology │
//! └──────┘   └───────────┘   └────────────────┘   └────────┘   └─────────┘   └──────────┘
//!            root = lowest   Dijkstra tree        classifier   trunk last    no junction
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let config = SkeletonConfig::default();
//! let report = process_skeleton(&thinned, &config)?;
//! if !report.topology_ok {
//!   tracing::warn!("trunk has a junction");
//! }
//! let error = reconstruction_error(&carved, &report);
//! ```

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::error::Result;
use crate::grid::VoxelGrid;
use crate::metrics::maximum_nearest_distance;
use crate::morphology::grid_from_paths;
use crate::skeleton::{
  extract_endpoints, filter_paths, find_and_remove_lowest_endpoint, path_has_no_junction,
  segment_paths, shortest_paths, BranchSelection, PathfinderConfig, SkeletonPath,
};
use crate::voxel::Voxel;

/// Settings of the skeleton stages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonConfig {
  pub pathfinder: PathfinderConfig,
  pub selection: BranchSelection,
}

impl SkeletonConfig {
  pub fn with_connection_radius(mut self, radius: i32) -> Self {
    self.pathfinder.connection_radius = radius;
    self
  }

  pub fn with_selection(mut self, selection: BranchSelection) -> Self {
    self.selection = selection;
    self
  }
}

/// Everything the pipeline learned about one skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct SkeletonReport {
  /// Lowest endpoint, `None` when the skeleton has no endpoint.
  pub root: Option<Voxel>,
  /// All root-first paths of the shortest-path tree, longest first.
  pub paths: Vec<SkeletonPath>,
  /// Pruning flag for each entry of `paths`.
  pub selected: Vec<bool>,
  /// Leaves in kept-path order, trunk last.
  pub segments: Vec<SkeletonPath>,
  pub topology_ok: bool,
  /// Voxels of the kept paths, in the input grid's frame.
  pub grid: VoxelGrid,
}

impl SkeletonReport {
  fn empty(frame: &VoxelGrid) -> Self {
    Self {
      root: None,
      paths: Vec::new(),
      selected: Vec::new(),
      segments: segment_paths(&[]),
      topology_ok: true,
      grid: VoxelGrid::with_same_frame(frame),
    }
  }

  /// Paths that survived pruning.
  pub fn kept_paths(&self) -> impl Iterator<Item = &SkeletonPath> {
    self.paths.iter().zip(&self.selected).filter(|(_, &s)| s).map(|(p, _)| p)
  }

  /// The trunk segment.
  pub fn trunk(&self) -> &[Voxel] {
    self.segments.last().map_or(&[][..], Vec::as_slice)
  }

  /// Leaf segments, without the trunk.
  pub fn leaves(&self) -> &[SkeletonPath] {
    let n = self.segments.len().saturating_sub(1);
    &self.segments[..n]
  }
}

/// Statistics from a pipeline run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkeletonStats {
  pub skeleton_voxels: usize,
  pub endpoint_count: usize,
  pub path_count: usize,
  pub kept_count: usize,
  /// Total processing time in microseconds.
  pub total_us: u64,
}

/// Run the skeleton stages on a thinned grid.
pub fn process_skeleton(skeleton: &VoxelGrid, config: &SkeletonConfig) -> Result<SkeletonReport> {
  process_skeleton_timed(skeleton, config).map(|(report, _)| report)
}

/// Same as [`process_skeleton`] but also returns timing stats.
#[tracing::instrument(skip_all, name = "pipeline::process_skeleton")]
pub fn process_skeleton_timed(
  skeleton: &VoxelGrid,
  config: &SkeletonConfig,
) -> Result<(SkeletonReport, SkeletonStats)> {
  let start = Instant::now();
  let mut grid = skeleton.clone();
  grid.sort_voxels();
  let mut stats = SkeletonStats {
    skeleton_voxels: grid.len(),
    ..Default::default()
  };

  let mut endpoints = extract_endpoints(&grid);
  stats.endpoint_count = endpoints.len();
  let Some(root) = find_and_remove_lowest_endpoint(&mut endpoints) else {
    tracing::warn!(voxels = grid.len(), "skeleton has no endpoint, nothing to segment");
    stats.total_us = start.elapsed().as_micros() as u64;
    return Ok((SkeletonReport::empty(&grid), stats));
  };

  let tree = shortest_paths(&grid, root, &mut endpoints, &config.pathfinder)?;
  let classifier = config.selection.classifier();
  let filtered = filter_paths(&tree.paths, classifier.as_ref());
  let segments = segment_paths(&filtered.paths);
  let trunk = segments.last().map_or(&[][..], Vec::as_slice);
  let topology_ok = path_has_no_junction(trunk, &grid, &tree.precedence)?;
  let kept_grid = grid_from_paths(&grid, &filtered.paths)?;

  stats.path_count = tree.paths.len();
  stats.kept_count = filtered.paths.len();
  stats.total_us = start.elapsed().as_micros() as u64;
  tracing::info!(
    paths = stats.path_count,
    kept = stats.kept_count,
    leaves = segments.len() - 1,
    trunk = trunk.len(),
    topology_ok,
    elapsed_ms = stats.total_us / 1000,
    "skeleton segmented"
  );

  Ok((
    SkeletonReport {
      root: Some(root),
      paths: tree.paths,
      selected: filtered.selected,
      segments,
      topology_ok,
      grid: kept_grid,
    },
    stats,
  ))
}

/// Largest distance from a carved voxel to the pruned skeleton. `None` when
/// the skeleton is empty and the carved grid is not.
pub fn reconstruction_error(carved: &VoxelGrid, report: &SkeletonReport) -> Option<f32> {
  maximum_nearest_distance(carved, &report.grid)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
