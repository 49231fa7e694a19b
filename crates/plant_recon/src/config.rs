//! Configuration parsing for plant reconstruction.

use anyhow::{Context, Result};
use glam::Vec3;
use plant_voxel::camera::{generate_cameras, PerspectiveCamera};
use plant_voxel::{Aabb, CarverConfig, SkeletonConfig, VoxelGrid};
use serde::Deserialize;
use std::path::Path;

/// Root configuration. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub grid: GridConfig,
	#[serde(default)]
	pub carving: CarvingConfig,
	#[serde(default)]
	pub skeleton: SkeletonConfig,
}

/// Bounding box and resolution shared by every voxel file of a plant.
#[derive(Debug, Deserialize)]
pub struct GridConfig {
	/// Center of the cubic bounding box.
	#[serde(default = "default_center")]
	pub center: [f32; 3],
	/// Half of the box side.
	#[serde(default = "default_half_size")]
	pub half_size: f32,
	/// Cells per axis.
	#[serde(default = "default_resolution")]
	pub resolution: u32,
}

/// Silhouette images and carving parameters.
#[derive(Debug, Deserialize)]
pub struct CarvingConfig {
	/// Camera elevation, degrees from the vertical axis.
	#[serde(default = "default_polar_angle")]
	pub polar_angle: f32,
	/// Pixels whose brightest channel is below this are plant.
	#[serde(default = "default_mask_threshold")]
	pub mask_threshold: u8,
	/// Pixel search radius around a voxel, in world units. Defaults to a
	/// quarter of the voxel size.
	pub radius: Option<f32>,
	/// Keep only the largest connected component of the carved grid.
	#[serde(default)]
	pub major_component: bool,
	#[serde(default = "default_images")]
	pub images: Vec<ImageConfig>,
}

/// One silhouette image of the turntable ring.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
	/// File name relative to the input directory.
	pub file: String,
	/// Turntable angle in degrees.
	#[serde(default)]
	pub azimuth: f32,
	/// Taken by the camera above the plant.
	#[serde(default)]
	pub top: bool,
	/// Pixel offset [column, row] applied when sampling the image.
	#[serde(default)]
	pub offset: [i32; 2],
}

fn default_center() -> [f32; 3] {
	[0.0, 5.5, 0.0]
}

fn default_half_size() -> f32 {
	0.5
}

fn default_resolution() -> u32 {
	512
}

fn default_polar_angle() -> f32 {
	90.0
}

fn default_mask_threshold() -> u8 {
	plant_voxel::silhouette::DEFAULT_VALUE_THRESHOLD
}

/// Ten side views every 36 degrees plus the top view.
fn default_images() -> Vec<ImageConfig> {
	let mut images: Vec<ImageConfig> = (0..10)
		.map(|i| {
			let azimuth = i * 36;
			ImageConfig {
				file: format!("0_{azimuth}_0.png"),
				azimuth: azimuth as f32,
				top: false,
				offset: [0, 0],
			}
		})
		.collect();
	images.push(ImageConfig {
		file: "top_0_90_0.png".to_string(),
		azimuth: 0.0,
		top: true,
		offset: [0, 0],
	});
	images
}

impl Default for GridConfig {
	fn default() -> Self {
		Self {
			center: default_center(),
			half_size: default_half_size(),
			resolution: default_resolution(),
		}
	}
}

impl Default for CarvingConfig {
	fn default() -> Self {
		Self {
			polar_angle: default_polar_angle(),
			mask_threshold: default_mask_threshold(),
			radius: None,
			major_component: false,
			images: default_images(),
		}
	}
}

impl Config {
	/// Load configuration from a TOML file, or the defaults when no file is given.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let Some(path) = path else {
			return Ok(Self::default());
		};
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content)
	}

	pub fn parse(content: &str) -> Result<Self> {
		let config: Config =
			toml::from_str(content).with_context(|| "Failed to parse config TOML")?;

		if config.grid.resolution == 0 {
			anyhow::bail!("grid.resolution must be positive");
		}
		if config.grid.half_size <= 0.0 {
			anyhow::bail!("grid.half_size must be positive, got {}", config.grid.half_size);
		}
		if config.carving.images.is_empty() {
			anyhow::bail!("Config must list at least one image");
		}
		if config.carving.images.iter().filter(|i| i.top).count() > 1 {
			anyhow::bail!("At most one top image is supported");
		}
		if let Some(radius) = config.carving.radius {
			if radius < 0.0 {
				anyhow::bail!("carving.radius must not be negative, got {radius}");
			}
		}
		if config.skeleton.pathfinder.connection_radius < 1 {
			anyhow::bail!(
				"skeleton.pathfinder.connection_radius must be at least 1, got {}",
				config.skeleton.pathfinder.connection_radius
			);
		}

		Ok(config)
	}
}

impl GridConfig {
	pub fn bbox(&self) -> Aabb {
		Aabb::from_center_half_extents(Vec3::from_array(self.center), Vec3::splat(self.half_size))
	}

	/// Empty grid in the configured frame.
	pub fn empty_grid(&self) -> Result<VoxelGrid> {
		VoxelGrid::new(self.bbox(), [self.resolution; 3]).context("Invalid grid frame")
	}
}

impl CarvingConfig {
	pub fn carver_config(&self, grid: &GridConfig) -> CarverConfig {
		let config = CarverConfig::default().with_resolution([grid.resolution; 3]);
		match self.radius {
			Some(radius) => config.with_radius(radius),
			None => config,
		}
	}
}

impl ImageConfig {
	/// Ring camera that took this image.
	pub fn camera(&self, polar_angle: f32) -> Option<PerspectiveCamera> {
		if self.top {
			generate_cameras(&[], polar_angle, true).into_iter().next()
		} else {
			generate_cameras(&[self.azimuth], polar_angle, false).into_iter().next()
		}
	}

	/// Name used for per-view output files.
	pub fn label(&self) -> String {
		if self.top {
			"top".to_string()
		} else {
			format!("{}", self.azimuth)
		}
	}
}
