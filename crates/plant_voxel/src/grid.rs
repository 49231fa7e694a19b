//! Dense voxel occupancy grid.
//!
//! A [`VoxelGrid`] pairs a dense occupancy bitmap with the list of occupied
//! voxels in insertion order. The bitmap answers membership in O(1); the list
//! keeps iteration proportional to the number of occupied cells, which is the
//! common case for thin skeletons inside large volumes.
//!
//! Cells are laid out row-major over (x, y, z):
//!
//! ```text
//! index = (Ry * Rz) * x + Rz * y + z
//! ```

use glam::Vec3;

use crate::bounds::Aabb;
use crate::error::GridError;
use crate::voxel::{Voxel, NEIGHBOR_OFFSETS_26};

#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
  bbox: Aabb,
  resolution: [u32; 3],
  occupancy: Vec<bool>,
  voxels: Vec<Voxel>,
  sorted: bool,
}

impl VoxelGrid {
  /// Create an empty grid covering `bbox` with `resolution` cells per axis.
  pub fn new(bbox: Aabb, resolution: [u32; 3]) -> Result<Self, GridError> {
    if resolution.iter().any(|&r| r == 0) {
      return Err(GridError::InvalidResolution(resolution));
    }
    let cells = resolution.iter().map(|&r| r as usize).product();
    Ok(Self {
      bbox,
      resolution,
      occupancy: vec![false; cells],
      voxels: Vec::new(),
      sorted: true,
    })
  }

  /// Empty grid with the same box and resolution as `other`.
  pub fn with_same_frame(other: &VoxelGrid) -> Self {
    Self {
      bbox: other.bbox,
      resolution: other.resolution,
      occupancy: vec![false; other.occupancy.len()],
      voxels: Vec::new(),
      sorted: true,
    }
  }

  // ==========================================================================
  // Accessors
  // ==========================================================================

  #[inline]
  pub fn bbox(&self) -> &Aabb {
    &self.bbox
  }

  #[inline]
  pub fn resolution(&self) -> [u32; 3] {
    self.resolution
  }

  /// Occupied voxels, in insertion order (or sorted after [`Self::sort_voxels`]).
  #[inline]
  pub fn voxels(&self) -> &[Voxel] {
    &self.voxels
  }

  /// Dense occupancy, indexed by [`Self::cell_index`].
  #[inline]
  pub fn occupancy(&self) -> &[bool] {
    &self.occupancy
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.voxels.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.voxels.is_empty()
  }

  #[inline]
  pub fn cell_count(&self) -> usize {
    self.occupancy.len()
  }

  /// Whether the voxel list is currently ordered by (x, y, z).
  #[inline]
  pub fn is_sorted(&self) -> bool {
    self.sorted
  }

  // ==========================================================================
  // Index mapping
  // ==========================================================================

  #[inline]
  pub fn is_voxel_inside_grid(&self, voxel: Voxel) -> bool {
    let [rx, ry, rz] = self.resolution;
    voxel.x >= 0
      && voxel.y >= 0
      && voxel.z >= 0
      && (voxel.x as u32) < rx
      && (voxel.y as u32) < ry
      && (voxel.z as u32) < rz
  }

  /// Dense cell index of `voxel`, or `None` outside the grid.
  #[inline]
  pub fn cell_index(&self, voxel: Voxel) -> Option<usize> {
    if !self.is_voxel_inside_grid(voxel) {
      return None;
    }
    let ry = self.resolution[1] as usize;
    let rz = self.resolution[2] as usize;
    Some((ry * rz) * voxel.x as usize + rz * voxel.y as usize + voxel.z as usize)
  }

  /// Inverse of [`Self::cell_index`]. `index` must be below [`Self::cell_count`].
  #[inline]
  pub fn voxel_from_cell_index(&self, index: usize) -> Voxel {
    let ry = self.resolution[1] as usize;
    let rz = self.resolution[2] as usize;
    let x = index / (ry * rz);
    let rem = index % (ry * rz);
    Voxel::new(x as i32, (rem / rz) as i32, (rem % rz) as i32)
  }

  // ==========================================================================
  // Occupancy
  // ==========================================================================

  /// Mark `voxel` occupied. Adding an occupied voxel is a no-op.
  pub fn add(&mut self, voxel: Voxel) -> Result<(), GridError> {
    let Some(index) = self.cell_index(voxel) else {
      return Err(GridError::OutOfBounds {
        x: voxel.x,
        y: voxel.y,
        z: voxel.z,
        resolution: self.resolution,
      });
    };
    if self.occupancy[index] {
      return Ok(());
    }
    self.occupancy[index] = true;
    if self.sorted {
      if let Some(last) = self.voxels.last() {
        self.sorted = *last < voxel;
      }
    }
    self.voxels.push(voxel);
    Ok(())
  }

  /// Add every voxel from an iterator, stopping at the first error.
  pub fn extend<I: IntoIterator<Item = Voxel>>(&mut self, voxels: I) -> Result<(), GridError> {
    for voxel in voxels {
      self.add(voxel)?;
    }
    Ok(())
  }

  /// Occupancy test. Coordinates outside the grid are never occupied.
  #[inline]
  pub fn has_voxel(&self, voxel: Voxel) -> bool {
    self.cell_index(voxel).is_some_and(|i| self.occupancy[i])
  }

  /// Number of occupied cells in the 26-neighborhood of `voxel`.
  pub fn number_neighbors(&self, voxel: Voxel) -> usize {
    NEIGHBOR_OFFSETS_26
      .iter()
      .filter(|[dx, dy, dz]| self.has_voxel(voxel.offset(*dx, *dy, *dz)))
      .count()
  }

  pub fn clear(&mut self) {
    self.occupancy.fill(false);
    self.voxels.clear();
    self.sorted = true;
  }

  // ==========================================================================
  // Sorted lookups
  // ==========================================================================

  pub fn sort_voxels(&mut self) {
    if !self.sorted {
      self.voxels.sort_unstable();
      self.sorted = true;
    }
  }

  /// Position of `voxel` in the sorted voxel list.
  ///
  /// Returns `Ok(None)` when the voxel is not occupied and
  /// [`GridError::Unsorted`] when the list has not been sorted.
  pub fn voxel_number(&self, voxel: Voxel) -> Result<Option<usize>, GridError> {
    if !self.sorted {
      return Err(GridError::Unsorted);
    }
    Ok(self.voxels.binary_search(&voxel).ok())
  }

  // ==========================================================================
  // World mapping
  // ==========================================================================

  /// World-space size of one cell.
  #[inline]
  pub fn voxel_size(&self) -> Vec3 {
    self.bbox.size() / self.resolution_vec()
  }

  /// World-space center of `voxel`.
  ///
  /// R samples span the box over R - 1 intervals, so voxel 0 sits on the
  /// minimum corner and voxel R - 1 on the maximum corner.
  pub fn voxel_center(&self, voxel: Voxel) -> Vec3 {
    let steps = self.resolution_vec() - Vec3::ONE;
    let v = Vec3::new(voxel.x as f32, voxel.y as f32, voxel.z as f32);
    let t = Vec3::new(
      if steps.x > 0.0 { v.x / steps.x } else { 0.0 },
      if steps.y > 0.0 { v.y / steps.y } else { 0.0 },
      if steps.z > 0.0 { v.z / steps.z } else { 0.0 },
    );
    self.bbox.lerp(t)
  }

  /// Nearest voxel coordinate for a world point. Not clamped to the grid.
  pub fn world_to_voxel(&self, point: Vec3) -> Voxel {
    let steps = self.resolution_vec() - Vec3::ONE;
    let v = (self.bbox.inverse_lerp(point) * steps).round();
    Voxel::new(v.x as i32, v.y as i32, v.z as i32)
  }

  /// Occupied voxel whose center is closest to `point`.
  pub fn nearest_voxel_center(&self, point: Vec3) -> Option<Voxel> {
    self
      .voxels
      .iter()
      .map(|&v| (v, self.voxel_center(v).distance_squared(point)))
      .min_by(|a, b| a.1.total_cmp(&b.1))
      .map(|(v, _)| v)
  }

  /// Per-axis (min, max) of the occupied voxels.
  pub fn voxel_bounding_box(&self) -> Option<(Voxel, Voxel)> {
    let first = *self.voxels.first()?;
    Some(self.voxels.iter().fold((first, first), |(lo, hi), v| {
      (
        Voxel::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
        Voxel::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
      )
    }))
  }

  #[inline]
  fn resolution_vec(&self) -> Vec3 {
    Vec3::new(
      self.resolution[0] as f32,
      self.resolution[1] as f32,
      self.resolution[2] as f32,
    )
  }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
