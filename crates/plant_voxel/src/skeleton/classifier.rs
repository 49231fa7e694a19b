//! Branch pruning predicates and annotated path data sets.
//!
//! A [`BranchClassifier`] looks at a (longer, shorter) pair of root-first
//! paths and decides whether the shorter one is a real branch worth keeping.
//! The data-set helpers read hand-labelled path files and measure how well a
//! classifier reproduces the labels.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::branch::{filter_paths, number_common_voxels};
use super::SkeletonPath;
use crate::error::{Result, SkeletonError};
use crate::io;
use crate::voxel::Voxel;

/// Keep a shorter path only when at most this share of it overlaps a longer one.
pub const DEFAULT_PATH_PROPORTION_THRESHOLD: f32 = 0.65;

// =============================================================================
// Classifiers
// =============================================================================

pub trait BranchClassifier: Send + Sync {
  /// `true` keeps `shorter`, `false` discards it.
  fn predict(&self, longer: &[Voxel], shorter: &[Voxel]) -> bool;
}

impl<F> BranchClassifier for F
where
  F: Fn(&[Voxel], &[Voxel]) -> bool + Send + Sync,
{
  fn predict(&self, longer: &[Voxel], shorter: &[Voxel]) -> bool {
    self(longer, shorter)
  }
}

/// Features of a path pair:
/// `[shared / shorter.len(), shorter.len() - shared, shared]`.
pub fn path_pair_features(longer: &[Voxel], shorter: &[Voxel]) -> [f32; 3] {
  let shared = number_common_voxels(longer, shorter) as f32;
  let len = shorter.len() as f32;
  let proportion = if shorter.is_empty() { 0.0 } else { shared / len };
  [proportion, len - shared, shared]
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdClassifier {
  pub threshold: f32,
}

impl Default for ThresholdClassifier {
  fn default() -> Self {
    Self::new(DEFAULT_PATH_PROPORTION_THRESHOLD)
  }
}

impl ThresholdClassifier {
  pub fn new(threshold: f32) -> Self {
    Self { threshold }
  }

  /// Percentage of `pairs` whose label this classifier reproduces.
  pub fn accuracy(&self, pairs: &[PathPair]) -> Option<f32> {
    if pairs.is_empty() {
      return None;
    }
    let correct = pairs
      .iter()
      .filter(|p| (p.features[0] <= self.threshold) == p.keep)
      .count();
    Some(100.0 * correct as f32 / pairs.len() as f32)
  }
}

impl BranchClassifier for ThresholdClassifier {
  fn predict(&self, longer: &[Voxel], shorter: &[Voxel]) -> bool {
    path_pair_features(longer, shorter)[0] <= self.threshold
  }
}

/// Keeps a shorter path when its own tail is at least `min_length` voxels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TailLengthClassifier {
  min_length: usize,
}

impl BranchClassifier for TailLengthClassifier {
  fn predict(&self, longer: &[Voxel], shorter: &[Voxel]) -> bool {
    shorter.len() - number_common_voxels(longer, shorter) >= self.min_length
  }
}

fn default_threshold() -> f32 {
  DEFAULT_PATH_PROPORTION_THRESHOLD
}

/// Pruning strategy chosen in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchSelection {
  /// Shared-proportion rule, see [`ThresholdClassifier`].
  Threshold {
    #[serde(default = "default_threshold")]
    threshold: f32,
  },
  /// Keep a path when its unshared tail is long enough.
  TailLength { min_length: usize },
  /// No pruning.
  KeepAll,
}

impl Default for BranchSelection {
  fn default() -> Self {
    Self::Threshold {
      threshold: DEFAULT_PATH_PROPORTION_THRESHOLD,
    }
  }
}

impl BranchSelection {
  pub fn classifier(&self) -> Box<dyn BranchClassifier> {
    match *self {
      Self::Threshold { threshold } => Box::new(ThresholdClassifier::new(threshold)),
      Self::TailLength { min_length } => Box::new(TailLengthClassifier { min_length }),
      Self::KeepAll => Box::new(|_: &[Voxel], _: &[Voxel]| true),
    }
  }
}

// =============================================================================
// Labelled pairs
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct PathPair {
  pub longer: SkeletonPath,
  pub shorter: SkeletonPath,
  /// Whether the shorter path should survive.
  pub keep: bool,
  pub features: [f32; 3],
}

impl PathPair {
  pub fn new(longer: SkeletonPath, shorter: SkeletonPath, keep: bool) -> Self {
    let features = path_pair_features(&longer, &shorter);
    Self {
      longer,
      shorter,
      keep,
      features,
    }
  }
}

/// Training pairs from shortest-first `paths` and their keep labels.
///
/// A kept path is paired (keep) with every longer kept path. A discarded path
/// is paired (discard) with the longer kept path sharing the most voxels
/// with it, if any shares one.
pub fn generate_path_pairs(paths: &[SkeletonPath], labels: &[bool]) -> Result<Vec<PathPair>> {
  if paths.len() != labels.len() {
    return Err(
      SkeletonError::SelectionMismatch {
        paths: paths.len(),
        labels: labels.len(),
      }
      .into(),
    );
  }

  let mut pairs = Vec::new();
  for (i, shorter) in paths.iter().enumerate() {
    let longer_kept = ((i + 1)..paths.len()).filter(|&j| labels[j]);
    if labels[i] {
      pairs.extend(longer_kept.map(|j| PathPair::new(paths[j].clone(), shorter.clone(), true)));
    } else {
      let mut best: Option<(usize, usize)> = None;
      for j in longer_kept {
        let common = number_common_voxels(&paths[j], shorter);
        if common > best.map_or(0, |(_, c)| c) {
          best = Some((j, common));
        }
      }
      if let Some((j, _)) = best {
        pairs.push(PathPair::new(paths[j].clone(), shorter.clone(), false));
      }
    }
  }
  Ok(pairs)
}

// =============================================================================
// Annotated data sets
// =============================================================================

const PATH_SUFFIX: &str = ".path.txt";
const LABEL_SUFFIX: &str = ".label.txt";

/// Paths of one plant with per-path keep labels, shortest path first.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedPaths {
  pub name: String,
  pub paths: Vec<SkeletonPath>,
  pub labels: Vec<bool>,
}

impl AnnotatedPaths {
  /// Read a path file and its label file. Both are stored longest first on
  /// disk and reversed here. An unreadable file yields no paths or labels.
  pub fn read(name: impl Into<String>, path_file: &Path, label_file: &Path) -> Self {
    let mut paths = io::import_paths(path_file);
    let mut labels = io::import_labels(label_file);
    paths.reverse();
    labels.reverse();
    Self {
      name: name.into(),
      paths,
      labels,
    }
  }

  pub fn path_pairs(&self) -> Result<Vec<PathPair>> {
    generate_path_pairs(&self.paths, &self.labels)
  }
}

/// Every `<name>.path.txt` in `folder` that has a matching
/// `<name>.label.txt`, sorted by file name.
pub fn list_annotated_files(folder: &Path) -> Result<Vec<(String, PathBuf, PathBuf)>> {
  let mut entries = Vec::new();
  for entry in std::fs::read_dir(folder)? {
    let path = entry?.path();
    let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
      continue;
    };
    let Some(name) = file_name.strip_suffix(PATH_SUFFIX) else {
      continue;
    };
    let labels = folder.join(format!("{name}{LABEL_SUFFIX}"));
    if path.is_file() && labels.is_file() {
      entries.push((name.to_string(), path.clone(), labels));
    }
  }
  entries.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));
  Ok(entries)
}

pub fn read_annotated_folder(folder: &Path) -> Result<Vec<AnnotatedPaths>> {
  let set = list_annotated_files(folder)?
    .into_iter()
    .map(|(name, paths, labels)| AnnotatedPaths::read(name, &paths, &labels))
    .collect::<Vec<_>>();
  tracing::info!(folder = %folder.display(), samples = set.len(), "read annotated paths");
  Ok(set)
}

pub fn generate_path_pairs_from_set(set: &[AnnotatedPaths]) -> Result<Vec<PathPair>> {
  let mut pairs = Vec::new();
  for sample in set {
    pairs.extend(sample.path_pairs()?);
  }
  Ok(pairs)
}

/// First `round(len * ratio)` samples, then the rest.
pub fn split_annotated(
  set: Vec<AnnotatedPaths>,
  ratio: f32,
) -> (Vec<AnnotatedPaths>, Vec<AnnotatedPaths>) {
  let split = ((set.len() as f32 * ratio).round().max(0.0) as usize).min(set.len());
  let mut first = set;
  let second = first.split_off(split);
  (first, second)
}

pub fn shuffle_annotated<R: Rng + ?Sized>(set: &mut [AnnotatedPaths], rng: &mut R) {
  set.shuffle(rng);
}

// =============================================================================
// Evaluation
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
  pub true_positive: u64,
  pub false_positive: u64,
  pub false_negative: u64,
  pub true_negative: u64,
}

impl ConfusionCounts {
  pub fn precision(&self) -> Option<f32> {
    let denominator = self.true_positive + self.false_positive;
    (denominator > 0).then(|| self.true_positive as f32 / denominator as f32)
  }

  pub fn recall(&self) -> Option<f32> {
    let denominator = self.true_positive + self.false_negative;
    (denominator > 0).then(|| self.true_positive as f32 / denominator as f32)
  }
}

/// Run [`filter_paths`] on every sample and compare the selection with the
/// labels. A kept path counts as positive.
pub fn evaluate_filter(
  classifier: &dyn BranchClassifier,
  set: &[AnnotatedPaths],
) -> Result<ConfusionCounts> {
  let mut counts = ConfusionCounts::default();
  for sample in set {
    if sample.paths.len() != sample.labels.len() {
      return Err(
        SkeletonError::SelectionMismatch {
          paths: sample.paths.len(),
          labels: sample.labels.len(),
        }
        .into(),
      );
    }
    // filtering expects the longest path first
    let paths: Vec<SkeletonPath> = sample.paths.iter().rev().cloned().collect();
    let labels = sample.labels.iter().rev();
    let filtered = filter_paths(&paths, classifier);

    for (&selected, &label) in filtered.selected.iter().zip(labels) {
      match (selected, label) {
        (true, true) => counts.true_positive += 1,
        (true, false) => counts.false_positive += 1,
        (false, true) => counts.false_negative += 1,
        (false, false) => counts.true_negative += 1,
      }
    }
  }
  tracing::info!(?counts, "evaluated branch filter");
  Ok(counts)
}

#[cfg(test)]
#[path = "classifier_test.rs"]
mod classifier_test;
