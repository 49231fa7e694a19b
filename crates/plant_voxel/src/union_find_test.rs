use super::*;

#[test]
fn test_singletons() {
  let mut uf = UnionFind::new(4);
  assert_eq!(uf.len(), 4);
  for i in 0..4 {
    assert_eq!(uf.find(i), i);
    assert_eq!(uf.size(i), 1);
  }
  assert!(UnionFind::new(0).is_empty());
}

#[test]
fn test_union_equal_rank_keeps_first_root() {
  let mut uf = UnionFind::new(3);
  assert_eq!(uf.union(2, 0), 2);
  assert_eq!(uf.find(0), 2);
  assert_eq!(uf.size(0), 2);
}

#[test]
fn test_union_by_rank() {
  let mut uf = UnionFind::new(3);
  let root = uf.union(0, 1);
  // rank(0) > rank(2), so 0 stays the root even when passed second
  assert_eq!(uf.union(2, 1), root);
  assert_eq!(uf.size(2), 3);
}

#[test]
fn test_union_idempotent() {
  let mut uf = UnionFind::new(5);
  let first = uf.union(1, 3);
  let second = uf.union(1, 3);
  let third = uf.union(3, 1);
  assert_eq!(first, second);
  assert_eq!(first, third);
  assert_eq!(uf.size(1), 2);
  assert_eq!(uf.find(1), uf.find(3));
}

#[test]
fn test_find_always_returns_root() {
  let mut uf = UnionFind::new(8);
  for i in 0..7 {
    uf.union(i, i + 1);
  }
  let root = uf.find(7);
  for i in 0..8 {
    let r = uf.find(i);
    assert_eq!(r, root);
    assert_eq!(uf.find(r), r);
  }
  assert_eq!(uf.size(3), 8);
}

#[test]
fn test_components_grouped_by_root() {
  let mut uf = UnionFind::new(6);
  uf.union(0, 4);
  uf.union(5, 2);
  let groups = uf.components();
  assert_eq!(groups.len(), 4);
  let sizes: Vec<usize> = groups.iter().map(|(_, m)| m.len()).collect();
  assert_eq!(sizes.iter().sum::<usize>(), 6);
  assert!(groups.iter().any(|(_, m)| m == &vec![0, 4]));
  assert!(groups.iter().any(|(_, m)| m == &vec![2, 5]));
  assert!(groups.windows(2).all(|w| w[0].0 < w[1].0));
}
