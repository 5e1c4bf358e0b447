//! Per-pixel segment labels
//!
//! Path smoothing is reset whenever a sweep crosses from one label to
//! another.

use crate::{Error, Result};

/// Row-major grid of segment labels, one per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "SegmentationParts")
)]
pub struct SegmentationMap {
    pub data: Vec<u32>,
    pub rows: usize,
    pub cols: usize,
}

impl SegmentationMap {
    /// Every pixel in one segment; behaves exactly like passing no map.
    pub fn uniform(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn from_vec(data: Vec<u32>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::DimensionMismatch(format!(
                "Segmentation size mismatch: got {}, expected {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { data, rows, cols })
    }

    pub fn hw(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn label(&self, row: usize, col: usize) -> u32 {
        self.data[row * self.cols + col]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    pub fn set(&mut self, row: usize, col: usize, label: u32) {
        if row >= self.rows || col >= self.cols {
            return;
        }
        let idx = row * self.cols + col;
        if let Some(cell) = self.data.get_mut(idx) {
            *cell = label;
        }
    }

    /// Whether `a` and `b` share a segment, i.e. smoothing may flow between them.
    #[inline]
    pub fn connected(&self, a: (usize, usize), b: (usize, usize)) -> bool {
        self.label(a.0, a.1) == self.label(b.0, b.1)
    }

    pub fn num_segments(&self) -> usize {
        let mut labels = self.data.clone();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }
}

/// Unchecked deserialization target; converted through [`SegmentationMap::from_vec`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct SegmentationParts {
    data: Vec<u32>,
    rows: usize,
    cols: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<SegmentationParts> for SegmentationMap {
    type Error = Error;

    fn try_from(parts: SegmentationParts) -> Result<Self> {
        Self::from_vec(parts.data, parts.rows, parts.cols)
    }
}
