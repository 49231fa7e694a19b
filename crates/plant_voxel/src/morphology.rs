//! Grid morphology and grid reshaping helpers.

use rayon::prelude::*;

use crate::bounds::Aabb;
use crate::error::GridError;
use crate::grid::VoxelGrid;
use crate::skeleton::SkeletonPath;
use crate::voxel::Voxel;

/// Sweep every cell of `frame` in parallel x-slabs and keep the cells for
/// which `keep` holds. The result is sorted.
fn sweep(frame: &VoxelGrid, keep: impl Fn(Voxel) -> bool + Sync) -> Result<VoxelGrid, GridError> {
  let [rx, ry, rz] = frame.resolution().map(|r| r as i32);
  let slabs: Vec<Vec<Voxel>> = (0..rx)
    .into_par_iter()
    .map(|x| {
      let mut slab = Vec::new();
      for y in 0..ry {
        for z in 0..rz {
          let voxel = Voxel::new(x, y, z);
          if keep(voxel) {
            slab.push(voxel);
          }
        }
      }
      slab
    })
    .collect();

  let mut out = VoxelGrid::with_same_frame(frame);
  out.extend(slabs.into_iter().flatten())?;
  Ok(out)
}

fn any_in_window(grid: &VoxelGrid, center: Voxel, width: i32, occupied: bool) -> bool {
  for dx in -width..=width {
    for dy in -width..=width {
      for dz in -width..=width {
        if grid.has_voxel(center.offset(dx, dy, dz)) == occupied {
          return true;
        }
      }
    }
  }
  false
}

/// Binary dilation with a cubic kernel of `kernel_size` cells per side.
#[tracing::instrument(skip_all, name = "morphology::dilate")]
pub fn dilate(grid: &VoxelGrid, kernel_size: u32) -> Result<VoxelGrid, GridError> {
  let width = (kernel_size / 2) as i32;
  sweep(grid, |v| any_in_window(grid, v, width, true))
}

/// Binary erosion with a cubic kernel of `kernel_size` cells per side.
/// Cells outside the grid count as empty.
#[tracing::instrument(skip_all, name = "morphology::erode")]
pub fn erode(grid: &VoxelGrid, kernel_size: u32) -> Result<VoxelGrid, GridError> {
  let width = (kernel_size / 2) as i32;
  sweep(grid, |v| grid.has_voxel(v) && !any_in_window(grid, v, width, false))
}

/// Copy of `grid` cropped to the bounding box of its voxels. Voxel centers
/// keep their world positions.
pub fn optimized(grid: &VoxelGrid) -> Result<VoxelGrid, GridError> {
  let Some((lo, hi)) = grid.voxel_bounding_box() else {
    return Ok(grid.clone());
  };
  let bbox = Aabb::new(grid.voxel_center(lo), grid.voxel_center(hi));
  let resolution = [
    (hi.x - lo.x + 1) as u32,
    (hi.y - lo.y + 1) as u32,
    (hi.z - lo.z + 1) as u32,
  ];
  let mut out = VoxelGrid::new(bbox, resolution)?;
  out.extend(grid.voxels().iter().map(|v| v.offset(-lo.x, -lo.y, -lo.z)))?;
  Ok(out)
}

/// Grid in `frame`'s box and resolution holding every voxel of `paths`.
pub fn grid_from_paths(
  frame: &VoxelGrid,
  paths: &[SkeletonPath],
) -> Result<VoxelGrid, GridError> {
  let mut out = VoxelGrid::with_same_frame(frame);
  out.extend(paths.iter().flatten().copied())?;
  Ok(out)
}

#[cfg(test)]
#[path = "morphology_test.rs"]
mod morphology_test;
