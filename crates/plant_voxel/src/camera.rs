//! Camera models used to project voxel centers onto silhouette images.
//!
//! The carver only needs [`CameraModel`]. [`PerspectiveCamera`] is an
//! OpenGL-style pinhole camera; [`generate_cameras`] lays out the turntable
//! ring of the imaging booth the silhouettes come from.

use glam::{Mat4, Vec2, Vec3};

/// Projection from world space to pixel coordinates.
pub trait CameraModel: Send + Sync {
  /// Pixel coordinates of `point` in a `width` x `height` image, origin at the
  /// top-left corner. `None` when the point is outside the view frustum.
  fn project(&self, point: Vec3, width: f32, height: f32) -> Option<Vec2>;

  /// Unit world-space direction of the image's upward axis.
  fn up(&self) -> Vec3;

  /// Unit world-space direction of the image's rightward axis.
  fn right(&self) -> Vec3;
}

// =============================================================================
// Perspective camera
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
  pub eye: Vec3,
  pub at: Vec3,
  pub up: Vec3,
  /// Vertical field of view in degrees.
  pub fovy: f32,
  pub aspect_ratio: f32,
  pub near: f32,
  pub far: f32,
  view_projection: Mat4,
}

impl PerspectiveCamera {
  pub fn new(
    eye: Vec3,
    at: Vec3,
    up: Vec3,
    fovy: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
  ) -> Self {
    let view = Mat4::look_at_rh(eye, at, up);
    let projection = Mat4::perspective_rh_gl(fovy.to_radians(), aspect_ratio, near, far);
    Self {
      eye,
      at,
      up,
      fovy,
      aspect_ratio,
      near,
      far,
      view_projection: projection * view,
    }
  }

  #[inline]
  pub fn view_projection(&self) -> Mat4 {
    self.view_projection
  }
}

impl CameraModel for PerspectiveCamera {
  fn project(&self, point: Vec3, width: f32, height: f32) -> Option<Vec2> {
    let clip = self.view_projection * point.extend(1.0);
    if clip.w <= 0.0 {
      return None;
    }
    let ndc = clip.truncate() / clip.w;
    if ndc.abs().cmpgt(Vec3::ONE).any() {
      return None;
    }
    Some(Vec2::new(
      (ndc.x + 1.0) * 0.5 * width,
      (1.0 - ndc.y) * 0.5 * height,
    ))
  }

  fn up(&self) -> Vec3 {
    self.up.normalize_or_zero()
  }

  fn right(&self) -> Vec3 {
    (self.at - self.eye).cross(self.up).normalize_or_zero()
  }
}

// =============================================================================
// Turntable ring
// =============================================================================

/// Width of the booth camera sensor in millimetres.
pub const SENSOR_WIDTH_MM: f32 = 8.466;
/// Sensor width / height (2454 x 2056 pixels).
pub const SENSOR_ASPECT_RATIO: f32 = 2454.0 / 2056.0;
pub const FOCAL_LENGTH_MM: f32 = 26.5;
/// Distance from the ring cameras to the rotation axis.
pub const RING_RADIUS: f32 = 5.5;
/// Point every camera looks at.
pub const RING_TARGET: Vec3 = Vec3::new(0.0, 5.5, 0.0);
pub const TOP_CAMERA_EYE: Vec3 = Vec3::new(0.0, 5.5, 3.6);
pub const NEAR_PLANE: f32 = 0.01;
pub const FAR_PLANE: f32 = 10.0;

/// Vertical field of view (degrees) of the booth lens.
pub fn ring_fovy() -> f32 {
  let sensor_height = SENSOR_WIDTH_MM / SENSOR_ASPECT_RATIO;
  (2.0 * (sensor_height / (2.0 * FOCAL_LENGTH_MM)).atan()).to_degrees()
}

/// Cameras for side views at `azimuths` (degrees) seen from `polar_angle`
/// (degrees from the vertical axis), plus an optional top camera last.
pub fn generate_cameras(
  azimuths: &[f32],
  polar_angle: f32,
  include_top: bool,
) -> Vec<PerspectiveCamera> {
  let fovy = ring_fovy();
  let phi = polar_angle.to_radians();

  let mut cameras: Vec<PerspectiveCamera> = azimuths
    .iter()
    .map(|&azimuth| {
      let a = azimuth.to_radians();
      let eye = Vec3::new(
        RING_RADIUS * a.sin() * phi.sin(),
        RING_RADIUS * (1.0 - a.cos() * phi.sin()),
        RING_RADIUS * phi.cos(),
      );
      // eye direction rotated a quarter turn counter-clockwise about z
      let right = Vec3::new(a.cos() * phi.sin(), a.sin() * phi.sin(), 0.0);
      let up = right.cross((RING_TARGET - eye).normalize()).normalize();
      PerspectiveCamera::new(eye, RING_TARGET, up, fovy, SENSOR_ASPECT_RATIO, NEAR_PLANE, FAR_PLANE)
    })
    .collect();

  if include_top {
    cameras.push(PerspectiveCamera::new(
      TOP_CAMERA_EYE,
      RING_TARGET,
      Vec3::Y,
      fovy,
      SENSOR_ASPECT_RATIO,
      NEAR_PLANE,
      FAR_PLANE,
    ));
  }
  cameras
}

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;
