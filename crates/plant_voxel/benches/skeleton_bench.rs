//! Skeleton graph benchmarks on a synthetic branching skeleton.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use plant_voxel::pipeline::{process_skeleton, SkeletonConfig};
use plant_voxel::skeleton::{
  extract_endpoints, find_and_remove_lowest_endpoint, shortest_paths, PathfinderConfig,
};
use plant_voxel::{Aabb, Voxel, VoxelGrid};

/// Vertical stem through the middle of the grid with a diagonal leaf every
/// `spacing` levels, alternating sides.
fn branching_skeleton(resolution: u32, spacing: i32) -> VoxelGrid {
  let size = resolution as f32 - 1.0;
  let mut grid = VoxelGrid::new(Aabb::new(Vec3::ZERO, Vec3::splat(size)), [resolution; 3])
    .unwrap_or_else(|e| panic!("grid: {e}"));
  let r = resolution as i32;
  let center = r / 2;

  for z in 0..r {
    let _ = grid.add(Voxel::new(center, center, z));
  }
  for (i, start) in (spacing..r - spacing).step_by(spacing as usize).enumerate() {
    let side = if i % 2 == 0 { 1 } else { -1 };
    for step in 1..center {
      let leaf = Voxel::new(center + side * step, center, start + step / 2);
      if grid.add(leaf).is_err() {
        break;
      }
    }
  }
  grid.sort_voxels();
  grid
}

fn bench_shortest_paths(c: &mut Criterion) {
  let mut group = c.benchmark_group("shortest_paths");

  for radius in [1, 4, 24] {
    let grid = branching_skeleton(64, 8);
    let config = PathfinderConfig {
      connection_radius: radius,
    };
    group.bench_with_input(BenchmarkId::from_parameter(radius), &grid, |b, grid| {
      b.iter(|| {
        let mut endpoints = extract_endpoints(grid);
        let root = find_and_remove_lowest_endpoint(&mut endpoints).unwrap_or_default();
        let tree = shortest_paths(grid, root, &mut endpoints, &config)
          .unwrap_or_else(|e| panic!("{e}"));
        black_box(tree.paths.len())
      })
    });
  }

  group.finish();
}

fn bench_process_skeleton(c: &mut Criterion) {
  let mut group = c.benchmark_group("process_skeleton");
  let config = SkeletonConfig::default();

  for resolution in [64u32, 128] {
    let grid = branching_skeleton(resolution, 8);
    group.bench_with_input(BenchmarkId::from_parameter(resolution), &grid, |b, grid| {
      b.iter(|| {
        let report = process_skeleton(grid, &config).unwrap_or_else(|e| panic!("{e}"));
        black_box(report.segments.len())
      })
    });
  }

  group.finish();
}

criterion_group!(benches, bench_shortest_paths, bench_process_skeleton);
criterion_main!(benches);
