//! Axis-aligned bounding box in world space.

use glam::Vec3;

/// Axis-aligned bounding box.
///
/// The carving volume and every voxel grid live inside one of these.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
  /// Minimum corner (inclusive).
  pub min: Vec3,
  /// Maximum corner (inclusive).
  pub max: Vec3,
}

impl Default for Aabb {
  fn default() -> Self {
    Self::new(Vec3::ZERO, Vec3::ONE)
  }
}

impl Aabb {
  /// Create a box from any two opposite corners.
  pub fn new(a: Vec3, b: Vec3) -> Self {
    Self {
      min: a.min(b),
      max: a.max(b),
    }
  }

  /// Create a box from its center and half extents.
  pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
    Self::new(center - half_extents, center + half_extents)
  }

  /// Map a normalized [0, 1]³ coordinate to world space.
  #[inline]
  pub fn lerp(&self, t: Vec3) -> Vec3 {
    self.min + (self.max - self.min) * t
  }

  /// Map a world point to normalized box coordinates.
  ///
  /// Degenerate axes map to 0.
  #[inline]
  pub fn inverse_lerp(&self, point: Vec3) -> Vec3 {
    let size = self.size();
    let rel = point - self.min;
    Vec3::new(
      if size.x != 0.0 { rel.x / size.x } else { 0.0 },
      if size.y != 0.0 { rel.y / size.y } else { 0.0 },
      if size.z != 0.0 { rel.z / size.z } else { 0.0 },
    )
  }

  #[inline]
  pub fn contains_point(&self, point: Vec3) -> bool {
    point.cmpge(self.min).all() && point.cmple(self.max).all()
  }

  /// Get the size of the box (max - min).
  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }
}
