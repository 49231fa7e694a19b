//! Connected-component cleanup of carved grids.

use crate::error::GridError;
use crate::grid::VoxelGrid;
use crate::union_find::UnionFind;
use crate::voxel::NEIGHBOR_OFFSETS_26;

/// Keep only the largest 26-connected component of `grid`.
///
/// The grid must be sorted. On equal sizes the component holding the
/// smallest voxel wins.
#[tracing::instrument(skip_all, name = "components::extract_major")]
pub fn extract_major_component(grid: &VoxelGrid) -> Result<VoxelGrid, GridError> {
  if !grid.is_sorted() {
    return Err(GridError::Unsorted);
  }

  let voxels = grid.voxels();
  let mut uf = UnionFind::new(voxels.len());
  for (i, voxel) in voxels.iter().enumerate() {
    for [dx, dy, dz] in NEIGHBOR_OFFSETS_26 {
      let neighbor = voxel.offset(dx, dy, dz);
      // Each pair is visited from both sides; the forward half is enough.
      if neighbor <= *voxel || !grid.has_voxel(neighbor) {
        continue;
      }
      if let Some(j) = grid.voxel_number(neighbor)? {
        uf.union(i, j);
      }
    }
  }

  let mut groups = uf.components();
  groups.sort_by_key(|(_, members)| members.first().copied());

  let mut major: Option<&Vec<usize>> = None;
  for (_, members) in &groups {
    if major.map_or(true, |m| members.len() > m.len()) {
      major = Some(members);
    }
  }

  let mut out = VoxelGrid::with_same_frame(grid);
  if let Some(members) = major {
    out.extend(members.iter().map(|&i| voxels[i]))?;
  }
  tracing::debug!(
    components = groups.len(),
    kept = out.len(),
    dropped = grid.len() - out.len(),
    "extracted major component"
  );
  Ok(out)
}

/// Fill every enclosed empty region of `grid`.
///
/// Empty cells are grouped by 6-connectivity; the largest empty region is
/// taken to be the outside and every other region is filled. Returns the
/// number of cells filled. The voxel list is left sorted.
#[tracing::instrument(skip_all, name = "components::fill_cavities")]
pub fn fill_cavities(grid: &mut VoxelGrid) -> usize {
  let [rx, ry, rz] = grid.resolution().map(|r| r as i32);
  let occupancy = grid.occupancy();
  let mut uf = UnionFind::new(grid.cell_count());

  for index in 0..grid.cell_count() {
    let voxel = grid.voxel_from_cell_index(index);
    let forward = [
      (voxel.x + 1 < rx).then(|| voxel.offset(1, 0, 0)),
      (voxel.y + 1 < ry).then(|| voxel.offset(0, 1, 0)),
      (voxel.z + 1 < rz).then(|| voxel.offset(0, 0, 1)),
    ];
    for neighbor in forward.into_iter().flatten() {
      if let Some(n) = grid.cell_index(neighbor) {
        if occupancy[n] == occupancy[index] {
          uf.union(index, n);
        }
      }
    }
  }

  // Groups come back with ascending members; order them by smallest cell.
  let mut empty_groups: Vec<Vec<usize>> = uf
    .components()
    .into_iter()
    .map(|(_, members)| members)
    .filter(|members| members.first().is_some_and(|&i| !occupancy[i]))
    .collect();
  empty_groups.sort_by_key(|members| members[0]);

  let mut outside = None;
  for (g, members) in empty_groups.iter().enumerate() {
    if outside.map_or(true, |o: usize| members.len() > empty_groups[o].len()) {
      outside = Some(g);
    }
  }

  let mut filled = 0;
  for (g, members) in empty_groups.iter().enumerate() {
    if Some(g) == outside {
      continue;
    }
    for &index in members {
      let voxel = grid.voxel_from_cell_index(index);
      if grid.add(voxel).is_ok() {
        filled += 1;
      }
    }
  }
  grid.sort_voxels();

  tracing::debug!(
    empty_regions = empty_groups.len(),
    filled,
    "filled cavities"
  );
  filled
}

#[cfg(test)]
#[path = "components_test.rs"]
mod components_test;
