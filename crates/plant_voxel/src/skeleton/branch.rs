//! Branch pruning, trunk/leaf segmentation and topology validation.

use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;

use super::classifier::{BranchClassifier, ThresholdClassifier};
use super::SkeletonPath;
use crate::error::{Result, SkeletonError};
use crate::grid::VoxelGrid;
use crate::voxel::Voxel;

/// Paths surviving a pruning pass together with the per-input selection flags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilteredPaths {
  pub paths: Vec<SkeletonPath>,
  pub selected: Vec<bool>,
}

/// Length of the prefix shared by two root-first paths.
pub fn number_common_voxels(longer: &[Voxel], shorter: &[Voxel]) -> usize {
  longer.iter().zip(shorter).take_while(|(a, b)| a == b).count()
}

/// Greedy pairwise pruning of longest-first `paths`.
///
/// Every surviving path is compared with each later surviving path; the later
/// one is discarded when `classifier` says it adds nothing.
pub fn filter_paths(paths: &[SkeletonPath], classifier: &dyn BranchClassifier) -> FilteredPaths {
  let mut selected = vec![true; paths.len()];
  for i in 0..paths.len() {
    if !selected[i] {
      continue;
    }
    for j in (i + 1)..paths.len() {
      if selected[j] && !classifier.predict(&paths[i], &paths[j]) {
        selected[j] = false;
      }
    }
  }

  let kept = paths
    .iter()
    .zip(&selected)
    .filter(|(_, &s)| s)
    .map(|(p, _)| p.clone())
    .collect::<Vec<_>>();
  tracing::debug!(input = paths.len(), kept = kept.len(), "filtered skeleton paths");
  FilteredPaths { paths: kept, selected }
}

/// [`filter_paths`] with the shared-proportion rule: a path is discarded when
/// more than `threshold` of it is shared with a longer path.
pub fn filter_paths_threshold(paths: &[SkeletonPath], threshold: f32) -> FilteredPaths {
  filter_paths(paths, &ThresholdClassifier::new(threshold))
}

pub fn keep_selected(paths: &[SkeletonPath], selected: &[bool]) -> Result<Vec<SkeletonPath>> {
  if paths.len() != selected.len() {
    return Err(
      SkeletonError::SelectionMismatch {
        paths: paths.len(),
        labels: selected.len(),
      }
      .into(),
    );
  }
  Ok(
    paths
      .iter()
      .zip(selected)
      .filter(|(_, &s)| s)
      .map(|(p, _)| p.clone())
      .collect(),
  )
}

/// Split paths into leaves and trunk.
///
/// Voxels shared by two or more paths form the trunk. Each leaf keeps its own
/// voxels in path order; the trunk, sorted by height, is appended last.
pub fn segment_paths(paths: &[SkeletonPath]) -> Vec<SkeletonPath> {
  let mut histogram: BTreeMap<Voxel, usize> = BTreeMap::new();
  for voxel in paths.iter().flatten() {
    *histogram.entry(*voxel).or_default() += 1;
  }
  let trunk_set: HashSet<Voxel> = histogram
    .iter()
    .filter(|(_, &count)| count > 1)
    .map(|(&v, _)| v)
    .collect();

  let mut segments: Vec<SkeletonPath> = paths
    .iter()
    .map(|path| path.iter().filter(|v| !trunk_set.contains(v)).copied().collect())
    .collect();

  let mut trunk: SkeletonPath = trunk_set.into_iter().collect();
  trunk.sort_by(Voxel::cmp_zxy);
  segments.push(trunk);
  segments
}

/// Whether `path` has no T junction in the shortest-path tree.
///
/// A junction is a path voxel that is the predecessor of more than one other
/// voxel of the same path. `grid` must be the sorted grid `precedence` was
/// computed on.
pub fn path_has_no_junction(
  path: &[Voxel],
  grid: &VoxelGrid,
  precedence: &[Option<usize>],
) -> Result<bool> {
  if precedence.len() != grid.len() {
    return Err(
      SkeletonError::PrecedenceMismatch {
        expected: grid.len(),
        actual: precedence.len(),
      }
      .into(),
    );
  }

  let mut position: HashMap<Voxel, usize> = HashMap::with_capacity(path.len());
  for (i, v) in path.iter().enumerate() {
    position.entry(*v).or_insert(i);
  }

  let mut successors = vec![0usize; path.len()];
  for (i, voxel) in path.iter().enumerate() {
    let index = grid.voxel_number(*voxel)?.ok_or(SkeletonError::VoxelNotInGrid(*voxel))?;
    let Some(predecessor) = precedence[index] else {
      continue;
    };
    let predecessor = grid.voxels()[predecessor];
    if let Some(&at) = position.get(&predecessor) {
      if at != i {
        successors[at] += 1;
      }
    }
  }
  Ok(successors.iter().all(|&n| n <= 1))
}

/// For every voxel of `grid`, the index of the path holding the nearest voxel
/// center. `None` when `paths` has no voxels.
#[tracing::instrument(skip_all, name = "skeleton::assign_voxels")]
pub fn assign_voxels_to_nearest_path(
  grid: &VoxelGrid,
  paths: &[SkeletonPath],
) -> Vec<Option<usize>> {
  let centers: Vec<Vec<glam::Vec3>> = paths
    .iter()
    .map(|p| p.iter().map(|&v| grid.voxel_center(v)).collect())
    .collect();

  grid
    .voxels()
    .par_iter()
    .map(|&voxel| {
      let point = grid.voxel_center(voxel);
      centers
        .iter()
        .enumerate()
        .flat_map(|(i, path)| path.iter().map(move |c| (i, c.distance_squared(point))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
    })
    .collect()
}

/// Split `grid` into one grid per path, each holding the voxels nearest to
/// that path. Grids keep `grid`'s frame and follow the order of `paths`.
#[tracing::instrument(skip_all, name = "branch::segment_voxels")]
pub fn segment_voxels(grid: &VoxelGrid, paths: &[SkeletonPath]) -> Result<Vec<VoxelGrid>> {
  let assigned = assign_voxels_to_nearest_path(grid, paths);
  let mut segments: Vec<VoxelGrid> =
    paths.iter().map(|_| VoxelGrid::with_same_frame(grid)).collect();
  for (&voxel, path) in grid.voxels().iter().zip(assigned) {
    if let Some(i) = path {
      segments[i].add(voxel)?;
    }
  }
  tracing::debug!(voxels = grid.len(), segments = segments.len(), "assigned voxels to segments");
  Ok(segments)
}

#[cfg(test)]
#[path = "branch_test.rs"]
mod branch_test;
