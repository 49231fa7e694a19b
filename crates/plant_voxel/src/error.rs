//! Error types shared by every stage of the reconstruction.

use thiserror::Error;

use crate::voxel::Voxel;

/// Top-level error type for the plant voxel library.
#[derive(Debug, Error)]
pub enum PlantError {
  #[error(transparent)]
  Grid(#[from] GridError),

  #[error(transparent)]
  Skeleton(#[from] SkeletonError),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}

/// Violations of the voxel grid contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
  #[error("voxel ({x}, {y}, {z}) is outside a grid of resolution {resolution:?}")]
  OutOfBounds {
    x: i32,
    y: i32,
    z: i32,
    resolution: [u32; 3],
  },

  #[error("voxel list must be sorted before index lookups")]
  Unsorted,

  #[error("invalid grid resolution {0:?}: every axis needs at least one cell")]
  InvalidResolution([u32; 3]),
}

/// Errors raised while building or validating a skeleton tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkeletonError {
  #[error("root voxel {0:?} is not part of the skeleton grid")]
  RootNotInGrid(Voxel),

  #[error("voxel {0:?} is not part of the skeleton grid")]
  VoxelNotInGrid(Voxel),

  #[error("precedence array has {actual} entries but the grid has {expected} voxels")]
  PrecedenceMismatch { expected: usize, actual: usize },

  #[error("{paths} paths but {labels} selection flags")]
  SelectionMismatch { paths: usize, labels: usize },
}

/// Convenience type alias for results using [`PlantError`].
pub type Result<T> = std::result::Result<T, PlantError>;
