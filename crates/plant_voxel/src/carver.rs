//! Multi-view space carving.
//!
//! A voxel survives when its center projects onto the silhouette in every
//! view. Each projection is tested against a small pixel neighborhood whose
//! size follows the projected radius of the voxel, so thin structures such as
//! leaf tips are not lost to sub-pixel misalignment.
//!
//! Positions that fall outside an image are treated as foreground: a camera
//! cannot carve what it does not see. The same holds when the center or the
//! neighborhood corner of a voxel does not project at all.

use glam::{IVec2, Vec2, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::bounds::Aabb;
use crate::camera::CameraModel;
use crate::error::GridError;
use crate::grid::VoxelGrid;
use crate::silhouette::{BinaryMask, Silhouette};
use crate::voxel::Voxel;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarverConfig {
  /// Cells per axis.
  pub resolution: [u32; 3],
  /// World-space radius tested around each voxel center.
  /// `None` uses a quarter of the largest voxel dimension.
  pub maximum_radius_around_voxel: Option<f32>,
}

impl Default for CarverConfig {
  fn default() -> Self {
    Self {
      resolution: [512, 512, 512],
      maximum_radius_around_voxel: None,
    }
  }
}

impl CarverConfig {
  pub fn with_resolution(mut self, resolution: [u32; 3]) -> Self {
    self.resolution = resolution;
    self
  }

  pub fn with_radius(mut self, radius: f32) -> Self {
    self.maximum_radius_around_voxel = Some(radius);
    self
  }
}

// =============================================================================
// Views
// =============================================================================

/// One calibrated image: a camera, its silhouette and a pixel offset applied
/// to every projection.
pub struct CameraView {
  pub camera: Box<dyn CameraModel>,
  pub silhouette: Box<dyn Silhouette>,
  pub offset: IVec2,
}

impl CameraView {
  pub fn new(camera: impl CameraModel + 'static, silhouette: impl Silhouette + 'static) -> Self {
    Self {
      camera: Box::new(camera),
      silhouette: Box::new(silhouette),
      offset: IVec2::ZERO,
    }
  }

  pub fn with_offset(mut self, offset: IVec2) -> Self {
    self.offset = offset;
    self
  }

  /// Projected pixel of `point` and the half-size of its pixel neighborhood.
  ///
  /// `None` when either `point` or the neighborhood corner does not project.
  fn footprint(&self, point: Vec3, radius: f32) -> Option<(Vec2, i32)> {
    let width = self.silhouette.width() as f32;
    let height = self.silhouette.height() as f32;
    let pixel = self.camera.project(point, width, height)?;

    let direction = (self.camera.up() + self.camera.right()) * std::f32::consts::FRAC_1_SQRT_2;
    let corner = self.camera.project(point + radius * direction, width, height)?;
    Some((pixel, pixel.distance(corner).ceil() as i32))
  }

  /// Whether this view lets `point` survive.
  fn passes(&self, point: Vec3, radius: f32) -> bool {
    let Some((pixel, reach)) = self.footprint(point, radius) else {
      return true;
    };
    let width = self.silhouette.width() as i32;
    let height = self.silhouette.height() as i32;

    for dx in -reach..=reach {
      for dy in -reach..=reach {
        let col = (pixel.x + (dx + self.offset.x) as f32).round() as i32;
        let row = (pixel.y + (dy + self.offset.y) as f32).round() as i32;
        if col < 0 || row < 0 || col >= width || row >= height {
          return true;
        }
        if self.silhouette.is_foreground(row as u32, col as u32) {
          return true;
        }
      }
    }
    false
  }
}

// =============================================================================
// Carver
// =============================================================================

/// Statistics from a carving pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarveStats {
  /// Number of cells tested.
  pub cell_count: usize,
  /// Number of cells kept.
  pub voxel_count: usize,
  /// Total processing time in microseconds.
  pub total_us: u64,
}

pub struct SpaceCarver {
  bbox: Aabb,
  config: CarverConfig,
  views: Vec<CameraView>,
}

impl SpaceCarver {
  pub fn new(bbox: Aabb, config: CarverConfig) -> Self {
    Self {
      bbox,
      config,
      views: Vec::new(),
    }
  }

  pub fn add_view(&mut self, view: CameraView) {
    self.views.push(view);
  }

  pub fn clear_views(&mut self) {
    self.views.clear();
  }

  pub fn views(&self) -> &[CameraView] {
    &self.views
  }

  pub fn config(&self) -> &CarverConfig {
    &self.config
  }

  /// Radius tested around each voxel center for a grid of `grid`'s frame.
  pub fn radius(&self, grid: &VoxelGrid) -> f32 {
    self
      .config
      .maximum_radius_around_voxel
      .unwrap_or_else(|| grid.voxel_size().max_element() / 4.0)
  }

  /// Whether `point` survives every view.
  pub fn is_inside(&self, point: Vec3, radius: f32) -> bool {
    self.views.iter().all(|view| view.passes(point, radius))
  }

  /// Carve the bounding box.
  pub fn process(&self) -> Result<VoxelGrid, GridError> {
    self.process_timed().map(|(grid, _)| grid)
  }

  /// Carve the bounding box and report timing.
  #[tracing::instrument(skip_all, name = "carver::process")]
  pub fn process_timed(&self) -> Result<(VoxelGrid, CarveStats), GridError> {
    let mut grid = VoxelGrid::new(self.bbox, self.config.resolution)?;
    let mut stats = CarveStats {
      cell_count: grid.cell_count(),
      ..Default::default()
    };
    if self.views.is_empty() {
      tracing::warn!("no camera views registered, carving produces an empty grid");
      return Ok((grid, stats));
    }

    let start = Instant::now();
    let radius = self.radius(&grid);
    let [rx, ry, rz] = self.config.resolution.map(|r| r as i32);

    // One private buffer per x-slab, merged afterwards.
    let slabs: Vec<Vec<Voxel>> = (0..rx)
      .into_par_iter()
      .map(|x| {
        let mut slab = Vec::new();
        for y in 0..ry {
          for z in 0..rz {
            let voxel = Voxel::new(x, y, z);
            if self.is_inside(grid.voxel_center(voxel), radius) {
              slab.push(voxel);
            }
          }
        }
        slab
      })
      .collect();

    for slab in slabs {
      grid.extend(slab)?;
    }
    grid.sort_voxels();

    stats.voxel_count = grid.len();
    stats.total_us = start.elapsed().as_micros() as u64;
    tracing::info!(
      views = self.views.len(),
      voxels = stats.voxel_count,
      cells = stats.cell_count,
      elapsed_ms = stats.total_us / 1000,
      "voxel carving finished"
    );
    Ok((grid, stats))
  }

  /// Dice coefficient between each view's silhouette and the re-projection
  /// of `grid`, summed over views. Returns 0 when both are empty.
  ///
  /// Voxels are re-projected at half their size, so a carved block covers
  /// the silhouette it was carved from.
  #[tracing::instrument(skip_all, name = "carver::reprojection_dice")]
  pub fn reprojection_dice(&self, grid: &VoxelGrid) -> f32 {
    let half_extent = grid.voxel_size().max_element() / 2.0;
    let (tp, fp, fn_) = self
      .views
      .par_iter()
      .map(|view| {
        let predicted = reproject(view, grid, half_extent);
        let mut counts = (0u64, 0u64, 0u64);
        for row in 0..view.silhouette.height() {
          for col in 0..view.silhouette.width() {
            let truth = view.silhouette.is_foreground(row, col);
            match (predicted.is_foreground(row, col), truth) {
              (true, true) => counts.0 += 1,
              (true, false) => counts.1 += 1,
              (false, true) => counts.2 += 1,
              (false, false) => {}
            }
          }
        }
        counts
      })
      .reduce(|| (0, 0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));

    let denominator = 2 * tp + fp + fn_;
    if denominator == 0 {
      return 0.0;
    }
    (2 * tp) as f32 / denominator as f32
  }
}

/// Silhouette of `grid` seen through `view`: each voxel center is splatted as
/// a square of the projected `half_extent`.
fn reproject(view: &CameraView, grid: &VoxelGrid, half_extent: f32) -> BinaryMask {
  let width = view.silhouette.width();
  let height = view.silhouette.height();
  let mut mask = BinaryMask::new(width, height);
  for &voxel in grid.voxels() {
    let Some((pixel, reach)) = view.footprint(grid.voxel_center(voxel), half_extent) else {
      continue;
    };
    for dx in -reach..=reach {
      for dy in -reach..=reach {
        let col = (pixel.x + (dx + view.offset.x) as f32).round() as i32;
        let row = (pixel.y + (dy + view.offset.y) as f32).round() as i32;
        if col >= 0 && row >= 0 {
          mask.set(row as u32, col as u32, true);
        }
      }
    }
  }
  mask
}

#[cfg(test)]
#[path = "carver_test.rs"]
mod carver_test;
