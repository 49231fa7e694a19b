//! Plain-text voxel, path and label formats.
//!
//! Voxel file: voxel count on the first line, then one `x y z` line per voxel.
//! Path file: path count, then per path its voxel count followed by its
//! `x y z` lines. Label file: whitespace-separated `0`/`1` tokens.
//!
//! Readers are lenient: a short read, an unparsable token or invalid UTF-8
//! ends the data silently. The `import_*` file wrappers never fail: a missing
//! or unreadable file logs a warning and yields an empty container.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::grid::VoxelGrid;
use crate::skeleton::SkeletonPath;
use crate::voxel::Voxel;

/// Decode lossily so invalid bytes end up as unparsable tokens.
fn read_text<R: Read>(mut reader: R) -> std::io::Result<String> {
  let mut bytes = Vec::new();
  reader.read_to_end(&mut bytes)?;
  Ok(String::from_utf8_lossy(&bytes).into_owned())
}

struct Tokens<'a> {
  inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
  fn new(text: &'a str) -> Self {
    Self {
      inner: text.split_whitespace(),
    }
  }

  fn next_usize(&mut self) -> Option<usize> {
    self.inner.next()?.parse().ok()
  }

  fn next_voxel(&mut self) -> Option<Voxel> {
    let x = self.inner.next()?.parse().ok()?;
    let y = self.inner.next()?.parse().ok()?;
    let z = self.inner.next()?.parse().ok()?;
    Some(Voxel::new(x, y, z))
  }
}

// =============================================================================
// Voxel grids
// =============================================================================

/// Write the grid's voxel list in list order.
pub fn write_voxels<W: Write>(grid: &VoxelGrid, mut writer: W) -> std::io::Result<()> {
  writeln!(writer, "{}", grid.len())?;
  for v in grid.voxels() {
    writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
  }
  writer.flush()
}

/// Replace the grid's contents with the voxels read from `reader`.
///
/// Voxels outside the grid are skipped. Returns the number of voxels added.
pub fn read_voxels<R: BufRead>(grid: &mut VoxelGrid, reader: R) -> std::io::Result<usize> {
  let text = read_text(reader)?;
  grid.clear();

  let mut tokens = Tokens::new(&text);
  let Some(count) = tokens.next_usize() else {
    return Ok(0);
  };
  for _ in 0..count {
    let Some(voxel) = tokens.next_voxel() else {
      break;
    };
    if grid.add(voxel).is_err() {
      tracing::debug!(?voxel, "skipping voxel outside the grid");
    }
  }
  Ok(grid.len())
}

pub fn export_voxels(grid: &VoxelGrid, path: impl AsRef<Path>) -> Result<()> {
  let file = File::create(path)?;
  write_voxels(grid, BufWriter::new(file))?;
  Ok(())
}

/// Load a voxel file into `grid`, returning the number of voxels read.
///
/// The grid is left empty when the file cannot be opened or read.
pub fn import_voxels(grid: &mut VoxelGrid, path: impl AsRef<Path>) -> usize {
  let path = path.as_ref();
  match File::open(path).and_then(|file| read_voxels(grid, BufReader::new(file))) {
    Ok(count) => count,
    Err(err) => {
      tracing::warn!(file = %path.display(), %err, "could not read voxel file");
      grid.clear();
      0
    }
  }
}

// =============================================================================
// Paths and labels
// =============================================================================

pub fn write_paths<W: Write>(paths: &[SkeletonPath], mut writer: W) -> std::io::Result<()> {
  writeln!(writer, "{}", paths.len())?;
  for path in paths {
    writeln!(writer, "{}", path.len())?;
    for v in path {
      writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
  }
  writer.flush()
}

/// Read paths in file order. A truncated trailing path is dropped.
pub fn read_paths<R: BufRead>(reader: R) -> std::io::Result<Vec<SkeletonPath>> {
  let text = read_text(reader)?;

  let mut tokens = Tokens::new(&text);
  let mut paths = Vec::new();
  let Some(count) = tokens.next_usize() else {
    return Ok(paths);
  };
  'paths: for _ in 0..count {
    let Some(len) = tokens.next_usize() else {
      break;
    };
    let mut path = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
      match tokens.next_voxel() {
        Some(v) => path.push(v),
        None => break 'paths,
      }
    }
    paths.push(path);
  }
  Ok(paths)
}

/// Read `0`/`1` flags. Any other token is ignored.
pub fn read_labels<R: BufRead>(reader: R) -> std::io::Result<Vec<bool>> {
  let text = read_text(reader)?;
  Ok(
    text
      .split_whitespace()
      .filter_map(|t| match t {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
      })
      .collect(),
  )
}

pub fn export_paths(paths: &[SkeletonPath], path: impl AsRef<Path>) -> Result<()> {
  let file = File::create(path)?;
  write_paths(paths, BufWriter::new(file))?;
  Ok(())
}

/// Paths from `path`, or none when the file cannot be read.
pub fn import_paths(path: impl AsRef<Path>) -> Vec<SkeletonPath> {
  let path = path.as_ref();
  File::open(path)
    .and_then(|file| read_paths(BufReader::new(file)))
    .unwrap_or_else(|err| {
      tracing::warn!(file = %path.display(), %err, "could not read path file");
      Vec::new()
    })
}

pub fn import_labels(path: impl AsRef<Path>) -> Vec<bool> {
  let path = path.as_ref();
  File::open(path)
    .and_then(|file| read_labels(BufReader::new(file)))
    .unwrap_or_else(|err| {
      tracing::warn!(file = %path.display(), %err, "could not read label file");
      Vec::new()
    })
}

#[cfg(test)]
#[path = "io_test.rs"]
mod io_test;
