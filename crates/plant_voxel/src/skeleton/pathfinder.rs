//! Endpoints, root selection and the shortest-path tree of a skeleton.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use super::SkeletonPath;
use crate::error::{GridError, Result, SkeletonError};
use crate::grid::VoxelGrid;
use crate::voxel::Voxel;

/// Default Chebyshev radius within which skeleton voxels are linked.
pub const DEFAULT_CONNECTION_RADIUS: i32 = 24;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfinderConfig {
  /// Voxels up to this Chebyshev distance apart are linked. Links longer than
  /// one cell bridge gaps left by thinning and are penalised quadratically.
  pub connection_radius: i32,
}

impl Default for PathfinderConfig {
  fn default() -> Self {
    Self {
      connection_radius: DEFAULT_CONNECTION_RADIUS,
    }
  }
}

/// Output of [`shortest_paths`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShortestPaths {
  /// Root-first paths, longest first.
  pub paths: Vec<SkeletonPath>,
  /// Predecessor of each voxel (indexed like the sorted voxel list).
  /// `None` for the root and for voxels the root cannot reach.
  pub precedence: Vec<Option<usize>>,
  /// Tree distance from the root, `None` when unreached.
  pub distances: Vec<Option<u64>>,
}

// =============================================================================
// Endpoints
// =============================================================================

/// Voxels with at most one occupied 26-neighbor, in voxel list order.
pub fn extract_endpoints(grid: &VoxelGrid) -> Vec<Voxel> {
  grid
    .voxels()
    .par_iter()
    .filter(|&&v| grid.number_neighbors(v) <= 1)
    .copied()
    .collect()
}

/// Remove and return the lowest endpoint (smallest z, then x, then y).
pub fn find_and_remove_lowest_endpoint(endpoints: &mut Vec<Voxel>) -> Option<Voxel> {
  let (index, _) = endpoints.iter().enumerate().min_by(|a, b| a.1.cmp_zxy(b.1))?;
  Some(endpoints.remove(index))
}

// =============================================================================
// Shortest-path tree
// =============================================================================

/// Cost of linking `a` to `b`.
#[inline]
fn link_cost(a: Voxel, b: Voxel) -> u64 {
  if a.chebyshev(&b) <= 1 {
    1
  } else {
    let m = a.manhattan(&b) as u64;
    m * (m + 1) / 2
  }
}

/// Occupied voxels within `radius` (Chebyshev) of `center`, excluding it,
/// in ascending (x, y, z) order.
fn linked_neighbors(
  grid: &VoxelGrid,
  center: Voxel,
  radius: i32,
  out: &mut Vec<(usize, Voxel)>,
) -> Result<()> {
  out.clear();
  let [rx, ry, rz] = grid.resolution().map(|r| r as i32);
  let lo = Voxel::new(
    (center.x - radius).max(0),
    (center.y - radius).max(0),
    (center.z - radius).max(0),
  );
  let hi = Voxel::new(
    (center.x + radius).min(rx - 1),
    (center.y + radius).min(ry - 1),
    (center.z + radius).min(rz - 1),
  );
  let window = (hi.x - lo.x + 1) as usize * (hi.y - lo.y + 1) as usize * (hi.z - lo.z + 1) as usize;

  if window > grid.len() {
    // Sparse skeleton: walking the sorted list visits candidates in the same
    // order as the window scan.
    let start = grid.voxels().partition_point(|v| v.x < lo.x);
    for (i, &v) in grid.voxels().iter().enumerate().skip(start) {
      if v.x > hi.x {
        break;
      }
      if v != center && v.chebyshev(&center) <= radius {
        out.push((i, v));
      }
    }
    return Ok(());
  }

  for x in lo.x..=hi.x {
    for y in lo.y..=hi.y {
      for z in lo.z..=hi.z {
        let v = Voxel::new(x, y, z);
        if v == center || !grid.has_voxel(v) {
          continue;
        }
        if let Some(i) = grid.voxel_number(v)? {
          out.push((i, v));
        }
      }
    }
  }
  Ok(())
}

/// Dijkstra from `root` over the sorted skeleton `grid`.
///
/// Endpoints the tree reveals but `endpoints` misses (leaves of the tree with
/// at most two neighbors) are appended to `endpoints`. Each endpoint yields a
/// root-first path; paths are returned longest first and single-voxel paths
/// (unreachable endpoints) are dropped.
#[tracing::instrument(skip_all, name = "skeleton::shortest_paths")]
pub fn shortest_paths(
  grid: &VoxelGrid,
  root: Voxel,
  endpoints: &mut Vec<Voxel>,
  config: &PathfinderConfig,
) -> Result<ShortestPaths> {
  if !grid.is_sorted() {
    return Err(GridError::Unsorted.into());
  }
  let root_index = grid.voxel_number(root)?.ok_or(SkeletonError::RootNotInGrid(root))?;

  let start = Instant::now();
  let voxels = grid.voxels();
  let count = voxels.len();
  let radius = config.connection_radius.max(1);

  let mut distances: Vec<Option<u64>> = vec![None; count];
  let mut precedence: Vec<Option<usize>> = vec![None; count];
  let mut queue = BinaryHeap::new();
  let mut neighbors = Vec::new();

  distances[root_index] = Some(0);
  queue.push(Reverse((0u64, root_index)));

  while let Some(Reverse((distance, current))) = queue.pop() {
    // stale entry
    if distances[current].is_some_and(|d| distance > d) {
      continue;
    }
    linked_neighbors(grid, voxels[current], radius, &mut neighbors)?;
    for &(n, voxel) in &neighbors {
      let candidate = distance + link_cost(voxels[current], voxel);
      if distances[n].map_or(true, |d| d > candidate) {
        distances[n] = Some(candidate);
        precedence[n] = Some(current);
        queue.push(Reverse((candidate, n)));
      }
    }
  }

  // Leaves of the tree with a sparse neighborhood are endpoints too.
  let mut successors = vec![0usize; count];
  for p in precedence.iter().flatten() {
    successors[*p] += 1;
  }
  let listed = endpoints.len();
  for (i, &voxel) in voxels.iter().enumerate() {
    let is_leaf = successors[i] == 0 && voxel != root;
    if is_leaf && grid.number_neighbors(voxel) <= 2 && !endpoints.contains(&voxel) {
      endpoints.push(voxel);
    }
  }
  if endpoints.len() > listed {
    tracing::debug!(recovered = endpoints.len() - listed, "recovered missed endpoints");
  }

  let mut paths = Vec::with_capacity(endpoints.len());
  for &endpoint in endpoints.iter() {
    let mut index = grid
      .voxel_number(endpoint)?
      .ok_or(SkeletonError::VoxelNotInGrid(endpoint))?;
    let mut path = vec![endpoint];
    while let Some(previous) = precedence[index] {
      index = previous;
      path.push(voxels[index]);
    }
    paths.push(path);
  }
  paths.sort_by(|a, b| b.len().cmp(&a.len()));
  for path in &mut paths {
    path.reverse();
  }
  let total = paths.len();
  paths.retain(|p| p.len() > 1);

  tracing::info!(
    voxels = count,
    endpoints = endpoints.len(),
    paths = paths.len(),
    unreachable = total - paths.len(),
    elapsed_ms = start.elapsed().as_millis() as u64,
    "shortest paths computed"
  );

  Ok(ShortestPaths {
    paths,
    precedence,
    distances,
  })
}

#[cfg(test)]
#[path = "pathfinder_test.rs"]
mod pathfinder_test;
