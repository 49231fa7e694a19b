//! Integer voxel coordinates.

use std::cmp::Ordering;

/// Integer cell coordinate inside a [`VoxelGrid`](crate::grid::VoxelGrid).
///
/// Ordered lexicographically by (x, y, z), which is the order of the grid's
/// sorted voxel list. Signed so neighborhood offsets can step below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Voxel {
  pub x: i32,
  pub y: i32,
  pub z: i32,
}

impl Voxel {
  #[inline]
  pub const fn new(x: i32, y: i32, z: i32) -> Self {
    Self { x, y, z }
  }

  /// Order by height first, then (x, y). Used to lay out trunk voxels.
  #[inline]
  pub fn cmp_zxy(&self, other: &Self) -> Ordering {
    (self.z, self.x, self.y).cmp(&(other.z, other.x, other.y))
  }

  /// Largest per-axis distance.
  #[inline]
  pub fn chebyshev(&self, other: &Self) -> i32 {
    (self.x - other.x)
      .abs()
      .max((self.y - other.y).abs())
      .max((self.z - other.z).abs())
  }

  /// Sum of per-axis distances.
  #[inline]
  pub fn manhattan(&self, other: &Self) -> i32 {
    (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
  }

  #[inline]
  pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
    Self::new(self.x + dx, self.y + dy, self.z + dz)
  }

  #[inline]
  pub fn to_array(self) -> [i32; 3] {
    [self.x, self.y, self.z]
  }
}

impl From<[i32; 3]> for Voxel {
  fn from([x, y, z]: [i32; 3]) -> Self {
    Self::new(x, y, z)
  }
}

/// Offsets of the 26-neighborhood (every cell at Chebyshev distance 1).
pub const NEIGHBOR_OFFSETS_26: [[i32; 3]; 26] = {
  let mut out = [[0; 3]; 26];
  let mut i = 0;
  let mut dx = -1;
  while dx <= 1 {
    let mut dy = -1;
    while dy <= 1 {
      let mut dz = -1;
      while dz <= 1 {
        if !(dx == 0 && dy == 0 && dz == 0) {
          out[i] = [dx, dy, dz];
          i += 1;
        }
        dz += 1;
      }
      dy += 1;
    }
    dx += 1;
  }
  out
};
