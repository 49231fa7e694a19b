use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;
use crate::skeleton::filter_paths_threshold;

fn v(x: i32, y: i32, z: i32) -> Voxel {
  Voxel::new(x, y, z)
}

/// Shortest first: a stub fully inside the stem, a real leaf, the stem.
fn labelled_sample() -> (Vec<SkeletonPath>, Vec<bool>) {
  let stem = vec![v(0, 0, 0), v(0, 0, 1), v(0, 0, 2), v(0, 0, 3), v(0, 0, 4), v(0, 0, 5)];
  let leaf = vec![v(0, 0, 0), v(0, 0, 1), v(1, 0, 2), v(2, 0, 3)];
  let stub = vec![v(0, 0, 0), v(0, 0, 1), v(0, 0, 2)];
  (vec![stub, leaf, stem], vec![false, true, true])
}

#[test]
fn test_features() {
  let longer = [v(0, 0, 0), v(0, 0, 1), v(0, 0, 2), v(0, 0, 3)];
  let shorter = [v(0, 0, 0), v(0, 0, 1), v(1, 0, 2)];
  let f = path_pair_features(&longer, &shorter);
  assert_relative_eq!(f[0], 2.0 / 3.0);
  assert_eq!(f[1], 1.0);
  assert_eq!(f[2], 2.0);
  assert_eq!(path_pair_features(&longer, &[]), [0.0, 0.0, 0.0]);
}

#[test]
fn test_threshold_classifier() {
  let classifier = ThresholdClassifier::default();
  assert_eq!(classifier.threshold, 0.65);
  let longer = [v(0, 0, 0), v(0, 0, 1), v(0, 0, 2), v(0, 0, 3)];
  assert!(!classifier.predict(&longer, &[v(0, 0, 0), v(0, 0, 1), v(1, 1, 2)]));
  assert!(classifier.predict(&longer, &[v(0, 0, 0), v(1, 0, 1), v(2, 0, 2)]));
}

#[test]
fn test_closure_classifier() {
  let (mut paths, _) = labelled_sample();
  paths.reverse();
  let only_long = |_: &[Voxel], shorter: &[Voxel]| shorter.len() > 3;
  let filtered = filter_paths(&paths, &only_long);
  assert_eq!(filtered.selected, vec![true, true, false]);
  assert_eq!(filtered.paths.len(), 2);
}

#[test]
fn test_branch_selection_strategies() {
  let (mut paths, _) = labelled_sample();
  paths.reverse();

  let threshold = BranchSelection::default().classifier();
  assert_eq!(filter_paths(&paths, threshold.as_ref()).selected, vec![true, true, false]);
  assert_eq!(
    filter_paths(&paths, threshold.as_ref()),
    filter_paths_threshold(&paths, DEFAULT_PATH_PROPORTION_THRESHOLD)
  );

  let keep_all = BranchSelection::KeepAll.classifier();
  assert_eq!(filter_paths(&paths, keep_all.as_ref()).selected, vec![true, true, true]);

  // leaf tail is 2 voxels, stub tail is 0
  let tail = BranchSelection::TailLength { min_length: 2 }.classifier();
  assert_eq!(filter_paths(&paths, tail.as_ref()).selected, vec![true, true, false]);
  let tail = BranchSelection::TailLength { min_length: 3 }.classifier();
  assert_eq!(filter_paths(&paths, tail.as_ref()).selected, vec![true, false, false]);
}

#[test]
fn test_generate_path_pairs() {
  let (paths, labels) = labelled_sample();
  let pairs = generate_path_pairs(&paths, &labels).unwrap();
  assert_eq!(pairs.len(), 2);

  assert_eq!(pairs[0].longer, paths[2]);
  assert_eq!(pairs[0].shorter, paths[0]);
  assert!(!pairs[0].keep);
  assert_eq!(pairs[0].features, [1.0, 0.0, 3.0]);

  assert_eq!(pairs[1].longer, paths[2]);
  assert_eq!(pairs[1].shorter, paths[1]);
  assert!(pairs[1].keep);
}

#[test]
fn test_discarded_path_without_overlap_has_no_pair() {
  let paths = vec![vec![v(9, 9, 9), v(9, 9, 8)], vec![v(0, 0, 0), v(0, 0, 1), v(0, 0, 2)]];
  let pairs = generate_path_pairs(&paths, &[false, true]).unwrap();
  assert!(pairs.is_empty());
  assert!(generate_path_pairs(&paths, &[true]).is_err());
}

#[test]
fn test_threshold_accuracy() {
  let (paths, labels) = labelled_sample();
  let pairs = generate_path_pairs(&paths, &labels).unwrap();
  assert_eq!(ThresholdClassifier::default().accuracy(&pairs), Some(100.0));
  assert_eq!(ThresholdClassifier::new(0.4).accuracy(&pairs), Some(50.0));
  assert_eq!(ThresholdClassifier::default().accuracy(&[]), None);
}

fn sample(name: &str) -> AnnotatedPaths {
  let (paths, labels) = labelled_sample();
  AnnotatedPaths {
    name: name.to_string(),
    paths,
    labels,
  }
}

#[test]
fn test_evaluate_filter() {
  let set = vec![sample("a"), sample("b")];
  let counts = evaluate_filter(&ThresholdClassifier::default(), &set).unwrap();
  assert_eq!(
    counts,
    ConfusionCounts {
      true_positive: 4,
      false_positive: 0,
      false_negative: 0,
      true_negative: 2,
    }
  );
  assert_eq!(counts.precision(), Some(1.0));
  assert_eq!(counts.recall(), Some(1.0));

  let keep_all = BranchSelection::KeepAll.classifier();
  let counts = evaluate_filter(keep_all.as_ref(), &set).unwrap();
  assert_eq!(counts.false_positive, 2);
  assert_relative_eq!(counts.precision().unwrap(), 2.0 / 3.0);
}

#[test]
fn test_confusion_zero_denominators() {
  let counts = ConfusionCounts::default();
  assert_eq!(counts.precision(), None);
  assert_eq!(counts.recall(), None);
}

#[test]
fn test_split_annotated() {
  let set: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|n| sample(n)).collect();
  let (train, test) = split_annotated(set.clone(), 0.8);
  assert_eq!((train.len(), test.len()), (4, 1));
  assert_eq!(test[0].name, "e");

  let (train, test) = split_annotated(set, 0.5);
  assert_eq!((train.len(), test.len()), (3, 2));
}

#[test]
fn test_seeded_shuffle_reproducible() {
  let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
  let mut first: Vec<_> = names.iter().map(|n| sample(n)).collect();
  let mut second = first.clone();
  shuffle_annotated(&mut first, &mut StdRng::seed_from_u64(11_16_1994));
  shuffle_annotated(&mut second, &mut StdRng::seed_from_u64(11_16_1994));
  let order = |s: &[AnnotatedPaths]| s.iter().map(|a| a.name.clone()).collect::<Vec<_>>();
  assert_eq!(order(&first), order(&second));
}

#[test]
fn test_read_annotated_folder() {
  let dir = std::env::temp_dir().join(format!("plant_voxel_annotated_{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();

  let (mut paths, mut labels) = labelled_sample();
  // on disk: longest first
  paths.reverse();
  labels.reverse();
  let label_text: String = labels.iter().map(|&l| if l { "1\n" } else { "0\n" }).collect();
  for name in ["b_plant", "a_plant", "c_plant"] {
    io::export_paths(&paths, dir.join(format!("{name}.path.txt"))).unwrap();
  }
  for name in ["b_plant", "a_plant"] {
    std::fs::write(dir.join(format!("{name}.label.txt")), &label_text).unwrap();
  }

  let set = read_annotated_folder(&dir).unwrap();
  std::fs::remove_dir_all(&dir).unwrap();

  let names: Vec<_> = set.iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, vec!["a_plant", "b_plant"]);
  assert_eq!(set[0], sample("a_plant"));
}
