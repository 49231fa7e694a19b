//! Plant reconstruction front-end.
//!
//! Subcommands, in processing order:
//! - carve: silhouette images → voxels.txt (+ error.txt, the re-projection Dice score)
//! - clean: keep the largest connected component, optionally close, fill cavities and crop
//! - skeleton: voxels.txt + skeleton.txt → optim_skeleton.txt, topology.txt, error.txt and
//!   one leaf_<n>_voxels.txt per segment (the trunk is last)
//! - measure: plant traits of a voxel file
//! - compare: precision/recall of voxel files against references
//! - evaluate: branch selection quality on an annotated path data set
//!
//! The skeleton step expects skeleton.txt from an external thinning tool.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::IVec2;
use plant_voxel::components::{extract_major_component, fill_cavities};
use plant_voxel::io::{export_paths, export_voxels, import_voxels};
use plant_voxel::metrics::{
	aggregate_precision_recall, precision_recall, PlantTraits, PrecisionRecall,
};
use plant_voxel::morphology::{dilate, erode, optimized};
use plant_voxel::pipeline::{process_skeleton_timed, reconstruction_error};
use plant_voxel::skeleton::segment_voxels;
use plant_voxel::skeleton::classifier::{
	evaluate_filter, generate_path_pairs_from_set, read_annotated_folder, shuffle_annotated,
	split_annotated, ConfusionCounts, ThresholdClassifier,
};
use plant_voxel::{BranchSelection, CameraView, SpaceCarver, ValueThresholdMask, VoxelGrid};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use config::Config;

const VOXELS_FILE: &str = "voxels.txt";
const SKELETON_FILE: &str = "skeleton.txt";

/// Plant reconstruction by voxel carving and skeleton segmentation.
#[derive(Parser, Debug)]
#[command(name = "plant_recon")]
#[command(about = "Reconstructs plants from silhouettes and segments their skeletons")]
struct Args {
	/// Path to configuration TOML file (defaults apply when omitted).
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Carve the plant volume from silhouette images.
	Carve {
		/// Directory holding the images listed in the config.
		input: PathBuf,
		/// Output directory.
		output: PathBuf,
	},
	/// Keep the largest connected component of a voxel file.
	Clean {
		input: PathBuf,
		output: PathBuf,
		/// Morphological closing with this cubic kernel size before cleaning.
		#[arg(long)]
		closing: Option<u32>,
		/// Fill enclosed empty regions.
		#[arg(long)]
		fill_cavities: bool,
		/// Crop the output grid to the bounding box of its voxels.
		#[arg(long)]
		crop: bool,
	},
	/// Extract, prune and segment the skeleton of a plant.
	Skeleton {
		/// Directory holding voxels.txt and skeleton.txt.
		input: PathBuf,
		/// Output directory.
		output: PathBuf,
	},
	/// Print the traits of a voxel file.
	Measure { input: PathBuf },
	/// Compare every voxel file of a directory with the same-named reference.
	Compare { input: PathBuf, reference: PathBuf },
	/// Evaluate branch selection on `<name>.path.txt` / `<name>.label.txt` pairs.
	Evaluate {
		input: PathBuf,
		/// Share of the shuffled samples used as the training set.
		#[arg(long, default_value_t = 0.8)]
		ratio: f32,
		#[arg(long, default_value_t = 11_16_1994)]
		seed: u64,
	},
}

fn main() -> Result<()> {
	init_tracing();
	let args = Args::parse();
	let config = Config::load(args.config.as_deref())?;

	match args.command {
		Command::Carve { input, output } => run_carve(&config, &input, &output),
		Command::Clean {
			input,
			output,
			closing,
			fill_cavities,
			crop,
		} => run_clean(&config, &input, &output, closing, fill_cavities, crop),
		Command::Skeleton { input, output } => run_skeleton(&config, &input, &output),
		Command::Measure { input } => run_measure(&config, &input),
		Command::Compare { input, reference } => run_compare(&config, &input, &reference),
		Command::Evaluate { input, ratio, seed } => run_evaluate(&config, &input, ratio, seed),
	}
}

/// Default INFO, override with RUST_LOG (e.g. RUST_LOG=plant_voxel=debug).
fn init_tracing() {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn run_carve(config: &Config, input: &Path, output: &Path) -> Result<()> {
	create_output_dir(output)?;

	let carving = &config.carving;
	let mut carver = SpaceCarver::new(config.grid.bbox(), carving.carver_config(&config.grid));
	for image_config in &carving.images {
		let path = input.join(&image_config.file);
		if !path.is_file() {
			tracing::warn!(file = %path.display(), "image missing, view skipped");
			continue;
		}
		let image = image::open(&path)
			.with_context(|| format!("Failed to read image: {}", path.display()))?
			.to_rgb8();
		let camera = image_config
			.camera(carving.polar_angle)
			.with_context(|| format!("No camera for view {}", image_config.label()))?;
		let mask = ValueThresholdMask::new(image).with_threshold(carving.mask_threshold);
		let offset = IVec2::from_array(image_config.offset);
		carver.add_view(CameraView::new(camera, mask).with_offset(offset));
		tracing::info!(view = %image_config.label(), file = %path.display(), "loaded silhouette");
	}
	if carver.views().is_empty() {
		anyhow::bail!("No image available for reconstruction in {}", input.display());
	}

	let (carved, stats) = carver.process_timed()?;
	let grid = if carving.major_component {
		extract_major_component(&carved)?
	} else {
		carved
	};
	tracing::info!(voxels = grid.len(), carve_ms = stats.total_us / 1000, "carved plant");

	save_voxels(&grid, &output.join(VOXELS_FILE))?;
	write_value(&output.join("error.txt"), carver.reprojection_dice(&grid))?;
	Ok(())
}

fn run_clean(
	config: &Config,
	input: &Path,
	output: &Path,
	closing: Option<u32>,
	fill: bool,
	crop: bool,
) -> Result<()> {
	let mut grid = load_voxels(config, input)?;
	if let Some(kernel) = closing {
		grid = erode(&dilate(&grid, kernel)?, kernel)?;
	}
	grid.sort_voxels();

	let mut cleaned = extract_major_component(&grid)?;
	if fill {
		let filled = fill_cavities(&mut cleaned);
		tracing::info!(filled, "filled cavities");
	}
	tracing::info!(before = grid.len(), after = cleaned.len(), "kept major component");

	if crop {
		let cropped = optimized(&cleaned)?;
		let bbox = cropped.bbox();
		tracing::info!(
			min = ?bbox.min,
			max = ?bbox.max,
			resolution = ?cropped.resolution(),
			"cropped grid frame"
		);
		return save_voxels(&cropped, output);
	}
	save_voxels(&cleaned, output)
}

fn run_skeleton(config: &Config, input: &Path, output: &Path) -> Result<()> {
	let voxel_path = input.join(VOXELS_FILE);
	let skeleton_path = input.join(SKELETON_FILE);
	if !voxel_path.is_file() || !skeleton_path.is_file() {
		anyhow::bail!("{} must contain {VOXELS_FILE} and {SKELETON_FILE}", input.display());
	}
	create_output_dir(output)?;

	let carved = load_voxels(config, &voxel_path)?;
	let skeleton = load_voxels(config, &skeleton_path)?;
	if skeleton.is_empty() {
		anyhow::bail!("The raw skeleton is empty: {}", skeleton_path.display());
	}

	let (report, stats) = process_skeleton_timed(&skeleton, &config.skeleton)?;
	tracing::info!(
		endpoints = stats.endpoint_count,
		paths = stats.path_count,
		kept = stats.kept_count,
		elapsed_ms = stats.total_us / 1000,
		"processed skeleton"
	);

	write_value(&output.join("topology.txt"), report.topology_ok)?;
	save_voxels(&report.grid, &output.join("optim_skeleton.txt"))?;
	let paths_file = output.join("skeleton.path.txt");
	export_paths(&report.paths, &paths_file)
		.with_context(|| format!("Failed to write: {}", paths_file.display()))?;
	let segments_file = output.join("segments.path.txt");
	export_paths(&report.segments, &segments_file)
		.with_context(|| format!("Failed to write: {}", segments_file.display()))?;

	let leaves = segment_voxels(&carved, &report.segments)?;
	for (i, leaf) in leaves.iter().enumerate() {
		save_voxels(leaf, &output.join(format!("leaf_{}_voxels.txt", i + 1)))?;
	}
	tracing::info!(segments = leaves.len(), "exported segmented voxels");

	match reconstruction_error(&carved, &report) {
		Some(error) => write_value(&output.join("error.txt"), error)?,
		None => tracing::warn!("pruned skeleton is empty, no error written"),
	}
	Ok(())
}

fn run_measure(config: &Config, input: &Path) -> Result<()> {
	let grid = load_voxels(config, input)?;
	let traits = PlantTraits::measure(&grid);
	print!("{}", toml::to_string(&traits).context("Failed to format traits")?);
	Ok(())
}

fn run_compare(config: &Config, input: &Path, reference: &Path) -> Result<()> {
	let mut files: Vec<PathBuf> = std::fs::read_dir(input)
		.with_context(|| format!("Failed to list: {}", input.display()))?
		.filter_map(|entry| entry.ok().map(|e| e.path()))
		.filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
		.collect();
	files.sort();

	let mut samples = Vec::new();
	for file in files {
		let Some(name) = file.file_name() else { continue };
		let reference_file = reference.join(name);
		if !reference_file.is_file() {
			tracing::debug!(file = %file.display(), "no reference, skipped");
			continue;
		}
		let grid = load_voxels(config, &file)?;
		let reference_grid = load_voxels(config, &reference_file)?;
		match precision_recall(&grid, &reference_grid) {
			Some(stats) => {
				println!(
					"{}: precision = {} recall = {}",
					file.display(),
					stats.precision,
					stats.recall
				);
				samples.push(stats);
			}
			None => tracing::warn!(file = %file.display(), "empty grid, skipped"),
		}
	}

	let summary = aggregate_precision_recall(&samples).context("No comparable voxel files")?;
	println!("samples = {}", samples.len());
	println!("precision = {:?}", summary.precision);
	println!("recall = {:?}", summary.recall);
	println!("fmeasure = {:?}", summary.fmeasure);
	Ok(())
}

fn run_evaluate(config: &Config, input: &Path, ratio: f32, seed: u64) -> Result<()> {
	let mut set = read_annotated_folder(input)?;
	if set.is_empty() {
		anyhow::bail!("Could not load the annotated set from {}", input.display());
	}
	shuffle_annotated(&mut set, &mut StdRng::seed_from_u64(seed));
	println!("Files in the data set (training first):");
	for sample in &set {
		println!("\t{}", sample.name);
	}
	let (train, test) = split_annotated(set, ratio);
	println!("Training samples: {}", train.len());
	println!("Test samples: {}", test.len());

	if let BranchSelection::Threshold { threshold } = config.skeleton.selection {
		let pairs = generate_path_pairs_from_set(&test)?;
		if let Some(accuracy) = ThresholdClassifier::new(threshold).accuracy(&pairs) {
			println!("Correctly classified test pairs: {accuracy}%");
		}
	}

	let classifier = config.skeleton.selection.classifier();
	report_counts("Training set", evaluate_filter(classifier.as_ref(), &train)?);
	report_counts("Test set", evaluate_filter(classifier.as_ref(), &test)?);
	Ok(())
}

fn report_counts(title: &str, counts: ConfusionCounts) {
	println!("{title}");
	match (counts.precision(), counts.recall()) {
		(Some(precision), Some(recall)) => {
			let fmeasure = PrecisionRecall { precision, recall }.fmeasure();
			println!("\tprecision = {precision}");
			println!("\trecall = {recall}");
			println!("\tfmeasure = {fmeasure:?}");
		}
		_ => println!("\tundefined ({counts:?})"),
	}
}

// =============================================================================
// File helpers
// =============================================================================

fn create_output_dir(output: &Path) -> Result<()> {
	std::fs::create_dir_all(output)
		.with_context(|| format!("Failed to create output dir: {}", output.display()))
}

fn load_voxels(config: &Config, path: &Path) -> Result<VoxelGrid> {
	let mut grid = config.grid.empty_grid()?;
	let count = import_voxels(&mut grid, path);
	if count == 0 {
		tracing::warn!(file = %path.display(), "no voxels imported");
	}
	tracing::debug!(file = %path.display(), count, "imported voxels");
	Ok(grid)
}

fn save_voxels(grid: &VoxelGrid, path: &Path) -> Result<()> {
	export_voxels(grid, path).with_context(|| format!("Failed to write: {}", path.display()))
}

fn write_value(path: &Path, value: impl Display) -> Result<()> {
	std::fs::write(path, format!("{value}\n"))
		.with_context(|| format!("Failed to write: {}", path.display()))
}
