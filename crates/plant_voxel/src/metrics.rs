//! Plant trait measurements and reconstruction quality statistics.
//!
//! # Usage
//!
//! ```ignore
//! use plant_voxel::metrics::{precision_recall, PlantTraits};
//!
//! let traits = PlantTraits::measure(&grid);
//! println!("height {:?}, volume {}", traits.height, traits.cylinder_volume);
//!
//! // Compare against a reference reconstruction:
//! let stats = precision_recall(&grid, &reference);
//! ```

use rayon::prelude::*;
use serde::Serialize;

use crate::grid::VoxelGrid;

// =============================================================================
// Plant traits
// =============================================================================

/// Number of voxels with at least one empty 26-neighbor.
pub fn count_surface_voxels(grid: &VoxelGrid) -> usize {
  grid
    .voxels()
    .par_iter()
    .filter(|&&v| grid.number_neighbors(v) < 26)
    .count()
}

/// Volume of the smallest cylinder around the vertical axis through the box
/// center that holds every voxel center.
pub fn bounding_cylinder_volume(grid: &VoxelGrid) -> f32 {
  if grid.is_empty() {
    return 0.0;
  }
  let axis = grid.bbox().center().truncate();
  let (mut min_z, mut max_z, mut radius) = (f32::MAX, f32::MIN, 0.0f32);
  for &voxel in grid.voxels() {
    let p = grid.voxel_center(voxel);
    min_z = min_z.min(p.z);
    max_z = max_z.max(p.z);
    radius = radius.max(p.truncate().distance(axis));
  }
  std::f32::consts::PI * radius * radius * (max_z - min_z)
}

/// Share of the grid floor covered by the vertical shadow of the voxels.
pub fn directionality(grid: &VoxelGrid) -> f32 {
  let [rx, ry, _] = grid.resolution().map(|r| r as usize);
  let mut shadow = vec![false; rx * ry];
  for v in grid.voxels() {
    shadow[v.y as usize * rx + v.x as usize] = true;
  }
  shadow.iter().filter(|&&s| s).count() as f32 / shadow.len() as f32
}

/// Height of the highest voxel center above the bottom of the box.
pub fn height(grid: &VoxelGrid) -> Option<f32> {
  let (_, hi) = grid.voxel_bounding_box()?;
  Some(grid.voxel_center(hi).z - grid.bbox().min.z)
}

/// Largest distance from a voxel center of `grid` to the nearest voxel center
/// of `reference`. `None` when `reference` is empty and `grid` is not.
#[tracing::instrument(skip_all, name = "metrics::maximum_nearest_distance")]
pub fn maximum_nearest_distance(grid: &VoxelGrid, reference: &VoxelGrid) -> Option<f32> {
  if grid.is_empty() {
    return Some(0.0);
  }
  grid
    .voxels()
    .par_iter()
    .map(|&v| {
      let query = grid.voxel_center(v);
      reference
        .nearest_voxel_center(query)
        .map(|n| reference.voxel_center(n).distance(query))
    })
    .collect::<Option<Vec<f32>>>()
    .map(|d| d.into_iter().fold(0.0, f32::max))
}

/// Summary of the measurable traits of a reconstructed plant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PlantTraits {
  pub voxel_count: usize,
  pub surface_voxels: usize,
  pub cylinder_volume: f32,
  pub directionality: f32,
  pub height: Option<f32>,
}

impl PlantTraits {
  pub fn measure(grid: &VoxelGrid) -> Self {
    Self {
      voxel_count: grid.len(),
      surface_voxels: count_surface_voxels(grid),
      cylinder_volume: bounding_cylinder_volume(grid),
      directionality: directionality(grid),
      height: height(grid),
    }
  }
}

// =============================================================================
// Precision / recall
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PrecisionRecall {
  pub precision: f32,
  pub recall: f32,
}

impl PrecisionRecall {
  /// Harmonic mean of precision and recall. `None` when both are zero.
  pub fn fmeasure(&self) -> Option<f32> {
    let sum = self.precision + self.recall;
    (sum > 0.0).then(|| 2.0 * self.precision * self.recall / sum)
  }
}

/// Voxel-wise precision and recall of `grid` against `reference`.
/// `None` when either grid is empty.
pub fn precision_recall(grid: &VoxelGrid, reference: &VoxelGrid) -> Option<PrecisionRecall> {
  if grid.is_empty() || reference.is_empty() {
    return None;
  }
  let true_positive = grid.voxels().iter().filter(|&&v| reference.has_voxel(v)).count();
  let false_positive = grid.len() - true_positive;
  let false_negative = reference.voxels().iter().filter(|&&v| !grid.has_voxel(v)).count();
  Some(PrecisionRecall {
    precision: true_positive as f32 / (true_positive + false_positive) as f32,
    recall: true_positive as f32 / (true_positive + false_negative) as f32,
  })
}

/// Mean and sample standard deviation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeanStd {
  pub mean: f32,
  /// `None` with fewer than two samples.
  pub std: Option<f32>,
}

pub fn mean_std(values: &[f32]) -> Option<MeanStd> {
  if values.is_empty() {
    return None;
  }
  let n = values.len() as f32;
  let mean = values.iter().sum::<f32>() / n;
  let std = (values.len() > 1).then(|| {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / (n - 1.0);
    variance.sqrt()
  });
  Some(MeanStd { mean, std })
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Statistics {
  pub precision: MeanStd,
  pub recall: MeanStd,
  pub fmeasure: MeanStd,
}

/// Aggregate per-plant precision/recall. Samples without an f-measure are
/// left out of the f-measure statistics.
pub fn aggregate_precision_recall(samples: &[PrecisionRecall]) -> Option<Statistics> {
  let precision: Vec<f32> = samples.iter().map(|s| s.precision).collect();
  let recall: Vec<f32> = samples.iter().map(|s| s.recall).collect();
  let fmeasure: Vec<f32> = samples.iter().filter_map(PrecisionRecall::fmeasure).collect();
  Some(Statistics {
    precision: mean_std(&precision)?,
    recall: mean_std(&recall)?,
    fmeasure: mean_std(&fmeasure)?,
  })
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_test;
