use glam::Vec3;

use super::*;
use crate::bounds::Aabb;
use crate::voxel::Voxel;

fn grid(r: u32) -> VoxelGrid {
  VoxelGrid::new(Aabb::new(Vec3::ZERO, Vec3::splat(1.0)), [r, r, r]).unwrap()
}

fn add_block(grid: &mut VoxelGrid, min: [i32; 3], size: [i32; 3]) {
  for x in 0..size[0] {
    for y in 0..size[1] {
      for z in 0..size[2] {
        grid.add(Voxel::new(min[0] + x, min[1] + y, min[2] + z)).unwrap();
      }
    }
  }
}

#[test]
fn test_major_component_requires_sorted() {
  let mut g = grid(4);
  g.add(Voxel::new(2, 0, 0)).unwrap();
  g.add(Voxel::new(1, 0, 0)).unwrap();
  assert_eq!(extract_major_component(&g), Err(GridError::Unsorted));
}

#[test]
fn test_major_component_empty() {
  let g = grid(4);
  assert!(extract_major_component(&g).unwrap().is_empty());
}

#[test]
fn test_major_component_with_islands() {
  let mut g = grid(16);
  add_block(&mut g, [0, 0, 0], [2, 2, 2]);
  add_block(&mut g, [5, 5, 5], [3, 3, 3]);
  add_block(&mut g, [12, 0, 12], [1, 1, 4]);
  g.sort_voxels();

  let major = extract_major_component(&g).unwrap();
  assert_eq!(major.len(), 27);
  assert!(major.has_voxel(Voxel::new(6, 6, 6)));
  assert!(!major.has_voxel(Voxel::new(0, 0, 0)));
  assert!(major.is_sorted());
}

#[test]
fn test_major_component_diagonal_connectivity() {
  let mut g = grid(8);
  for i in 0..5 {
    g.add(Voxel::new(i, i, i)).unwrap();
  }
  g.add(Voxel::new(7, 0, 7)).unwrap();
  g.sort_voxels();
  assert_eq!(extract_major_component(&g).unwrap().len(), 5);
}

#[test]
fn test_major_component_tie_prefers_smallest_voxel() {
  let mut g = grid(8);
  add_block(&mut g, [5, 0, 0], [1, 1, 2]);
  add_block(&mut g, [0, 5, 0], [1, 1, 2]);
  g.sort_voxels();
  let major = extract_major_component(&g).unwrap();
  assert_eq!(major.voxels(), &[Voxel::new(0, 5, 0), Voxel::new(0, 5, 1)]);
}

#[test]
fn test_fill_cavities_hollow_cube() {
  let mut g = grid(7);
  // 5x5x5 shell with a 3x3x3 hole
  for x in 1..6 {
    for y in 1..6 {
      for z in 1..6 {
        let on_shell = [x, y, z].iter().any(|&c| c == 1 || c == 5);
        if on_shell {
          g.add(Voxel::new(x, y, z)).unwrap();
        }
      }
    }
  }
  let before = g.len();
  let filled = fill_cavities(&mut g);
  assert_eq!(filled, 27);
  assert_eq!(g.len(), before + 27);
  assert!(g.has_voxel(Voxel::new(3, 3, 3)));
  assert!(!g.has_voxel(Voxel::new(0, 0, 0)));
  assert!(g.is_sorted());
}

#[test]
fn test_fill_cavities_open_volume_untouched() {
  let mut g = grid(6);
  add_block(&mut g, [1, 1, 1], [2, 2, 2]);
  assert_eq!(fill_cavities(&mut g), 0);
  assert_eq!(g.len(), 8);
}

#[test]
fn test_fill_cavities_full_grid() {
  let mut g = grid(3);
  add_block(&mut g, [0, 0, 0], [3, 3, 3]);
  assert_eq!(fill_cavities(&mut g), 0);
}
