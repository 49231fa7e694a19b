use glam::Vec3;

use super::*;
use crate::bounds::Aabb;
use crate::error::PlantError;
use crate::skeleton::number_common_voxels;

fn grid_with(voxels: &[(i32, i32, i32)]) -> VoxelGrid {
  let mut grid = VoxelGrid::new(Aabb::new(Vec3::ZERO, Vec3::splat(10.0)), [11, 11, 11]).unwrap();
  for &(x, y, z) in voxels {
    grid.add(Voxel::new(x, y, z)).unwrap();
  }
  grid.sort_voxels();
  grid
}

/// Vertical stem x=5,y=5,z=0..4 with a side branch x=5,y=6,z=2..3.
fn stem_with_branch() -> VoxelGrid {
  grid_with(&[(5, 5, 0), (5, 5, 1), (5, 5, 2), (5, 5, 3), (5, 5, 4), (5, 6, 2), (5, 6, 3)])
}

/// Column x=0,y=0 with z=4 missing.
fn gapped_stem() -> VoxelGrid {
  grid_with(&[
    (0, 0, 0), (0, 0, 1), (0, 0, 2), (0, 0, 3), (0, 0, 5), (0, 0, 6), (0, 0, 7), (0, 0, 8),
  ])
}

#[test]
fn test_endpoints_of_line() {
  let grid = grid_with(&[(1, 1, 1), (1, 1, 2), (1, 2, 3), (2, 3, 3)]);
  assert_eq!(extract_endpoints(&grid), vec![Voxel::new(1, 1, 1), Voxel::new(2, 3, 3)]);

  let two = grid_with(&[(4, 4, 4), (5, 5, 5)]);
  assert_eq!(extract_endpoints(&two).len(), 2);
}

#[test]
fn test_single_voxel_is_endpoint() {
  let grid = grid_with(&[(3, 3, 3)]);
  assert_eq!(extract_endpoints(&grid), vec![Voxel::new(3, 3, 3)]);
}

#[test]
fn test_lowest_endpoint_ties() {
  let mut endpoints = vec![
    Voxel::new(4, 0, 2),
    Voxel::new(3, 9, 1),
    Voxel::new(3, 2, 1),
    Voxel::new(0, 0, 5),
  ];
  assert_eq!(find_and_remove_lowest_endpoint(&mut endpoints), Some(Voxel::new(3, 2, 1)));
  assert_eq!(endpoints, vec![Voxel::new(4, 0, 2), Voxel::new(3, 9, 1), Voxel::new(0, 0, 5)]);

  let mut empty = Vec::new();
  assert_eq!(find_and_remove_lowest_endpoint(&mut empty), None);
}

#[test]
fn test_stem_with_branch_paths() {
  let grid = stem_with_branch();
  let mut endpoints = extract_endpoints(&grid);
  let root = find_and_remove_lowest_endpoint(&mut endpoints).unwrap();
  assert_eq!(root, Voxel::new(5, 5, 0));

  // Both tips touch the stem, so they are handed over explicitly.
  let mut tips = vec![Voxel::new(5, 5, 4), Voxel::new(5, 6, 3)];
  let result = shortest_paths(&grid, root, &mut tips, &PathfinderConfig::default()).unwrap();
  assert_eq!(tips.len(), 2);
  assert_eq!(result.paths.len(), 2);
  assert_eq!(result.paths[0].len(), 5);
  assert_eq!(result.paths[1].len(), 4);
  assert_eq!(result.paths[0][0], root);
  assert_eq!(result.paths[0].last(), Some(&Voxel::new(5, 5, 4)));
  assert_eq!(result.paths[1].last(), Some(&Voxel::new(5, 6, 3)));
  assert_eq!(number_common_voxels(&result.paths[0], &result.paths[1]), 3);
}

#[test]
fn test_missed_endpoint_recovered() {
  let grid = stem_with_branch();
  let mut endpoints = extract_endpoints(&grid);
  let root = find_and_remove_lowest_endpoint(&mut endpoints).unwrap();
  assert!(endpoints.is_empty());

  let result = shortest_paths(&grid, root, &mut endpoints, &PathfinderConfig::default()).unwrap();
  assert_eq!(endpoints, vec![Voxel::new(5, 5, 4)]);
  assert_eq!(result.paths.len(), 1);
  assert_eq!(result.paths[0].len(), 5);
}

#[test]
fn test_gap_bridged_within_radius() {
  let grid = gapped_stem();
  let mut endpoints = extract_endpoints(&grid);
  let root = find_and_remove_lowest_endpoint(&mut endpoints).unwrap();
  let result = shortest_paths(&grid, root, &mut endpoints, &PathfinderConfig::default()).unwrap();

  let lengths: Vec<usize> = result.paths.iter().map(Vec::len).collect();
  assert_eq!(lengths, vec![8, 5, 4]);
  // jump over the hole costs 2 * 3 / 2
  let five = grid.voxel_number(Voxel::new(0, 0, 5)).unwrap().unwrap();
  assert_eq!(result.distances[five], Some(6));
}

#[test]
fn test_unreachable_paths_dropped() {
  let grid = gapped_stem();
  let mut endpoints = extract_endpoints(&grid);
  let root = find_and_remove_lowest_endpoint(&mut endpoints).unwrap();
  let config = PathfinderConfig { connection_radius: 1 };
  let result = shortest_paths(&grid, root, &mut endpoints, &config).unwrap();

  assert_eq!(result.paths.len(), 1);
  assert_eq!(result.paths[0].last(), Some(&Voxel::new(0, 0, 3)));
  let eight = grid.voxel_number(Voxel::new(0, 0, 8)).unwrap().unwrap();
  assert_eq!(result.distances[eight], None);
  assert_eq!(result.precedence[eight], None);
}

#[test]
fn test_paths_are_connected_and_distances_consistent() {
  // a small Y shape with a diagonal arm
  let grid = grid_with(&[
    (5, 5, 0),
    (5, 5, 1),
    (5, 5, 2),
    (5, 5, 3),
    (6, 6, 4),
    (7, 7, 5),
    (4, 4, 4),
    (3, 4, 5),
    (2, 4, 6),
  ]);
  let mut endpoints = extract_endpoints(&grid);
  let root = find_and_remove_lowest_endpoint(&mut endpoints).unwrap();
  let config = PathfinderConfig { connection_radius: 1 };
  let result = shortest_paths(&grid, root, &mut endpoints, &config).unwrap();

  assert_eq!(result.paths.len(), 2);
  for path in &result.paths {
    assert_eq!(path[0], root);
    for pair in path.windows(2) {
      assert!(pair[0].chebyshev(&pair[1]) <= 1);
    }
  }

  for (i, pred) in result.precedence.iter().enumerate() {
    let Some(p) = pred else { continue };
    let (di, dp) = (result.distances[i].unwrap(), result.distances[*p].unwrap());
    assert_eq!(di, dp + 1);
  }
  let voxels = grid.voxels();
  for i in 0..voxels.len() {
    for j in 0..voxels.len() {
      if i != j && voxels[i].chebyshev(&voxels[j]) <= 1 {
        assert!(result.distances[j].unwrap() <= result.distances[i].unwrap() + 1);
      }
    }
  }
}

#[test]
fn test_shortest_paths_errors() {
  let grid = stem_with_branch();
  let config = PathfinderConfig::default();
  let err = shortest_paths(&grid, Voxel::new(0, 0, 0), &mut Vec::new(), &config).unwrap_err();
  assert!(matches!(err, PlantError::Skeleton(SkeletonError::RootNotInGrid(_))));

  let mut unsorted = VoxelGrid::new(Aabb::default(), [4, 4, 4]).unwrap();
  unsorted.add(Voxel::new(1, 0, 0)).unwrap();
  unsorted.add(Voxel::new(0, 0, 0)).unwrap();
  let err = shortest_paths(&unsorted, Voxel::new(0, 0, 0), &mut Vec::new(), &config).unwrap_err();
  assert!(matches!(err, PlantError::Grid(GridError::Unsorted)));
}

#[test]
fn test_no_endpoints_no_paths() {
  let grid = grid_with(&[(2, 2, 2)]);
  let config = PathfinderConfig::default();
  let result = shortest_paths(&grid, Voxel::new(2, 2, 2), &mut Vec::new(), &config).unwrap();
  assert!(result.paths.is_empty());
  assert_eq!(result.distances, vec![Some(0)]);
}
