//! Disjoint-set forest with path compression and union by rank.

#[derive(Clone, Copy, Debug)]
struct Node {
  parent: usize,
  rank: u32,
  size: usize,
}

/// Disjoint sets over the nodes `0..len`.
#[derive(Clone, Debug)]
pub struct UnionFind {
  nodes: Vec<Node>,
}

impl UnionFind {
  /// Create `len` singleton sets.
  pub fn new(len: usize) -> Self {
    Self {
      nodes: (0..len).map(|i| Node { parent: i, rank: 0, size: 1 }).collect(),
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Root of `node`'s set. Compresses the visited path.
  pub fn find(&mut self, node: usize) -> usize {
    let mut root = node;
    while self.nodes[root].parent != root {
      root = self.nodes[root].parent;
    }
    let mut current = node;
    while self.nodes[current].parent != root {
      let next = self.nodes[current].parent;
      self.nodes[current].parent = root;
      current = next;
    }
    root
  }

  /// Merge the sets of `a` and `b` and return the surviving root.
  ///
  /// On equal ranks `a`'s root survives and its rank grows.
  pub fn union(&mut self, a: usize, b: usize) -> usize {
    let root_a = self.find(a);
    let root_b = self.find(b);
    if root_a == root_b {
      return root_a;
    }

    let (parent, child) = match self.nodes[root_a].rank.cmp(&self.nodes[root_b].rank) {
      std::cmp::Ordering::Less => (root_b, root_a),
      std::cmp::Ordering::Greater => (root_a, root_b),
      std::cmp::Ordering::Equal => {
        self.nodes[root_a].rank += 1;
        (root_a, root_b)
      }
    };
    self.nodes[child].parent = parent;
    self.nodes[parent].size += self.nodes[child].size;
    parent
  }

  /// Size of `node`'s set.
  pub fn size(&mut self, node: usize) -> usize {
    let root = self.find(node);
    self.nodes[root].size
  }

  /// Group every node by its root. Roots ascend, members ascend within a group.
  pub fn components(&mut self) -> Vec<(usize, Vec<usize>)> {
    let mut groups: std::collections::BTreeMap<usize, Vec<usize>> = Default::default();
    for node in 0..self.nodes.len() {
      let root = self.find(node);
      groups.entry(root).or_default().push(node);
    }
    groups.into_iter().collect()
  }
}

#[cfg(test)]
#[path = "union_find_test.rs"]
mod union_find_test;
