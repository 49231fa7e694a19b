//! plant_voxel - Plant reconstruction by voxel space carving
//!
//! This crate reconstructs the volume of a plant from calibrated silhouette
//! images and segments the curve skeleton of that volume into a trunk and
//! individual leaves.
//!
//! # Features
//!
//! - **Space Carving**: Parallel visual hull sweep over a dense voxel grid
//!   with pluggable camera models and silhouette predicates
//! - **Grid Cleanup**: Majority connected component and cavity filling backed
//!   by a union-find
//! - **Skeleton Graph**: Endpoint detection, root selection and a Dijkstra
//!   shortest-path tree that bridges small thinning gaps
//! - **Segmentation**: Classifier-driven branch pruning, trunk/leaf split and
//!   trunk topology validation
//! - **Metrics**: Plant traits and precision/recall against references
//!
//! # Example
//!
//! ```ignore
//! use plant_voxel::{Aabb, CameraView, CarverConfig, SpaceCarver};
//! use plant_voxel::pipeline::{process_skeleton, SkeletonConfig};
//!
//! let mut carver = SpaceCarver::new(bbox, CarverConfig::default());
//! for (camera, mask) in cameras.into_iter().zip(masks) {
//!     carver.add_view(CameraView::new(camera, mask));
//! }
//! let carved = carver.process()?;
//! let plant = plant_voxel::components::extract_major_component(&carved)?;
//!
//! // Thinning happens outside this crate.
//! let report = process_skeleton(&thinned, &SkeletonConfig::default())?;
//! println!("{} leaves, trunk ok: {}", report.leaves().len(), report.topology_ok);
//! ```

pub mod bounds;
pub mod error;
pub mod grid;
pub mod io;
pub mod voxel;

// Re-export commonly used items
pub use bounds::Aabb;
pub use error::{GridError, PlantError, Result, SkeletonError};
pub use grid::VoxelGrid;
pub use voxel::Voxel;

// Disjoint sets and connected components
pub mod components;
pub mod union_find;
pub use union_find::UnionFind;

// Multi-view space carving
pub mod camera;
pub mod carver;
pub mod silhouette;
pub use camera::{generate_cameras, CameraModel, PerspectiveCamera};
pub use carver::{CameraView, CarveStats, CarverConfig, SpaceCarver};
pub use silhouette::{BinaryMask, Silhouette, ValueThresholdMask};

// Skeleton graph engine
pub mod skeleton;
pub use skeleton::{BranchClassifier, BranchSelection, SkeletonPath};

pub mod metrics;
pub mod morphology;

// End-to-end skeleton processing
pub mod pipeline;
pub use pipeline::{process_skeleton, SkeletonConfig, SkeletonReport};
