//! Foreground masks for carving views.

use image::RgbImage;

/// Pixel-level foreground predicate of one view.
pub trait Silhouette: Send + Sync {
  fn width(&self) -> u32;
  fn height(&self) -> u32;
  /// Whether the pixel at (`row`, `col`) belongs to the plant.
  fn is_foreground(&self, row: u32, col: u32) -> bool;
}

/// Default HSV value threshold separating the plant from a white backdrop.
pub const DEFAULT_VALUE_THRESHOLD: u8 = 235;

/// Photograph against a white background. A pixel is foreground when its HSV
/// value (brightest channel) is below `threshold`.
#[derive(Clone, Debug)]
pub struct ValueThresholdMask {
  pub image: RgbImage,
  pub threshold: u8,
}

impl ValueThresholdMask {
  pub fn new(image: RgbImage) -> Self {
    Self {
      image,
      threshold: DEFAULT_VALUE_THRESHOLD,
    }
  }

  pub fn with_threshold(mut self, threshold: u8) -> Self {
    self.threshold = threshold;
    self
  }
}

impl Silhouette for ValueThresholdMask {
  fn width(&self) -> u32 {
    self.image.width()
  }

  fn height(&self) -> u32 {
    self.image.height()
  }

  #[inline]
  fn is_foreground(&self, row: u32, col: u32) -> bool {
    let [r, g, b] = self.image.get_pixel(col, row).0;
    r.max(g).max(b) < self.threshold
  }
}

/// Row-major boolean mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
  width: u32,
  height: u32,
  pixels: Vec<bool>,
}

impl BinaryMask {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      pixels: vec![false; width as usize * height as usize],
    }
  }

  /// Build a mask by evaluating `f(row, col)` for every pixel.
  pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
    let pixels = (0..height)
      .flat_map(|row| (0..width).map(move |col| (row, col)))
      .map(|(row, col)| f(row, col))
      .collect();
    Self { width, height, pixels }
  }

  pub fn set(&mut self, row: u32, col: u32, value: bool) {
    if row < self.height && col < self.width {
      self.pixels[(row * self.width + col) as usize] = value;
    }
  }

  pub fn count_foreground(&self) -> usize {
    self.pixels.iter().filter(|&&p| p).count()
  }
}

impl Silhouette for BinaryMask {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }

  #[inline]
  fn is_foreground(&self, row: u32, col: u32) -> bool {
    self.pixels[(row * self.width + col) as usize]
  }
}

#[cfg(test)]
mod tests {
  use image::Rgb;

  use super::*;

  #[test]
  fn test_value_threshold() {
    let mut image = RgbImage::from_pixel(4, 2, Rgb([255, 255, 255]));
    image.put_pixel(1, 0, Rgb([10, 200, 30]));
    image.put_pixel(3, 1, Rgb([240, 100, 100]));
    let mask = ValueThresholdMask::new(image);
    assert_eq!((mask.width(), mask.height()), (4, 2));
    assert!(mask.is_foreground(0, 1));
    assert!(!mask.is_foreground(1, 3));
    assert!(!mask.is_foreground(0, 0));

    let mask = mask.with_threshold(250);
    assert!(mask.is_foreground(1, 3));
  }

  #[test]
  fn test_binary_mask() {
    let mut mask = BinaryMask::from_fn(3, 2, |row, col| row == 1 && col > 0);
    assert!(mask.is_foreground(1, 2));
    assert!(!mask.is_foreground(0, 2));
    assert_eq!(mask.count_foreground(), 2);
    mask.set(0, 0, true);
    mask.set(5, 5, true);
    assert_eq!(mask.count_foreground(), 3);
  }
}
