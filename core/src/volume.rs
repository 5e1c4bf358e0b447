use std::fmt;
use std::ops::{Index, IndexMut};

use crate::{Error, Result};

/// Extent of a dense 3-D volume.
///
/// `depth` is the disparity axis for cost volumes and the direction axis for
/// penalty fields and path-disparity maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeShape {
    pub rows: usize,
    pub cols: usize,
    pub depth: usize,
}

impl VolumeShape {
    pub fn new(rows: usize, cols: usize, depth: usize) -> Self {
        Self { rows, cols, depth }
    }

    pub fn hw(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of pixels in one depth slice.
    pub fn plane_len(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    pub fn len(&self) -> usize {
        self.plane_len().saturating_mul(self.depth)
    }

    pub fn checked_len(&self) -> Option<usize> {
        self.rows
            .checked_mul(self.cols)
            .and_then(|partial| partial.checked_mul(self.depth))
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0 || self.depth == 0
    }

    pub fn contains(&self, row: usize, col: usize, k: usize) -> bool {
        row < self.rows && col < self.cols && k < self.depth
    }

    /// Offset of the first element of the depth row at `(row, col)`.
    #[inline]
    pub fn pixel_offset(&self, row: usize, col: usize) -> usize {
        (row * self.cols + col) * self.depth
    }

    #[inline]
    pub fn offset(&self, row: usize, col: usize, k: usize) -> usize {
        self.pixel_offset(row, col) + k
    }
}

impl fmt::Display for VolumeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.rows, self.cols, self.depth)
    }
}

/// Dense row-major 3-D volume.
///
/// **Layout:** element `(row, col, k)` lives at
/// `(row * cols + col) * depth + k`, so the depth axis is contiguous and a
/// whole per-pixel row can be borrowed as a slice with [`Volume::pixel`].
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    pub data: Vec<T>,
    pub shape: VolumeShape,
}

/// Matching costs indexed by `(row, col, disparity)`. `NaN` marks an invalid match.
pub type CostVolume = Volume<f32>;

/// Smoothness penalties indexed by `(row, col, direction)`.
pub type PenaltyField = Volume<f32>;

/// Winning disparity per `(row, col, direction)`.
pub type PathDisparities = Volume<u32>;

impl<T: Copy + Default> Volume<T> {
    pub fn new(shape: VolumeShape) -> Self {
        Self::filled(shape, T::default())
    }

    pub fn zeros(rows: usize, cols: usize, depth: usize) -> Self {
        Self::new(VolumeShape::new(rows, cols, depth))
    }
}

impl<T: Copy> Volume<T> {
    pub fn filled(shape: VolumeShape, value: T) -> Self {
        Self {
            data: vec![value; shape.len()],
            shape,
        }
    }

    pub fn from_vec(data: Vec<T>, shape: VolumeShape) -> Result<Self> {
        match shape.checked_len() {
            Some(len) if len == data.len() => Ok(Self { data, shape }),
            Some(len) => Err(Error::DimensionMismatch(format!(
                "Data size mismatch: got {}, expected {} for shape {}",
                data.len(),
                len,
                shape
            ))),
            None => Err(Error::DimensionMismatch(format!(
                "Volume shape {} overflows usize",
                shape
            ))),
        }
    }

    /// Build a volume from nested `[row][col][k]` data, rejecting ragged input.
    pub fn from_nested(nested: &[Vec<Vec<T>>]) -> Result<Self> {
        let rows = nested.len();
        let cols = nested.first().map_or(0, Vec::len);
        let depth = nested
            .first()
            .and_then(|row| row.first())
            .map_or(0, Vec::len);

        let mut data = Vec::with_capacity(rows * cols * depth);
        for (r, row) in nested.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::DimensionMismatch(format!(
                    "Row {} has {} columns, expected {}",
                    r,
                    row.len(),
                    cols
                )));
            }
            for (c, values) in row.iter().enumerate() {
                if values.len() != depth {
                    return Err(Error::DimensionMismatch(format!(
                        "Pixel ({}, {}) has depth {}, expected {}",
                        r,
                        c,
                        values.len(),
                        depth
                    )));
                }
                data.extend_from_slice(values);
            }
        }

        Self::from_vec(data, VolumeShape::new(rows, cols, depth))
    }

    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    pub fn depth(&self) -> usize {
        self.shape.depth
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize, k: usize) -> Option<T> {
        if !self.shape.contains(row, col, k) {
            return None;
        }
        self.data.get(self.shape.offset(row, col, k)).copied()
    }

    pub fn set(&mut self, row: usize, col: usize, k: usize, value: T) {
        if !self.shape.contains(row, col, k) {
            return;
        }
        let idx = self.shape.offset(row, col, k);
        if let Some(cell) = self.data.get_mut(idx) {
            *cell = value;
        }
    }

    /// All `depth` values at one pixel.
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> &[T] {
        let start = self.shape.pixel_offset(row, col);
        &self.data[start..start + self.shape.depth]
    }

    #[inline]
    pub fn pixel_mut(&mut self, row: usize, col: usize) -> &mut [T] {
        let start = self.shape.pixel_offset(row, col);
        let depth = self.shape.depth;
        &mut self.data[start..start + depth]
    }
}

impl<T: Copy> Index<(usize, usize, usize)> for Volume<T> {
    type Output = T;

    fn index(&self, (row, col, k): (usize, usize, usize)) -> &T {
        assert!(
            self.shape.contains(row, col, k),
            "index ({row}, {col}, {k}) out of bounds for volume {}",
            self.shape
        );
        &self.data[self.shape.offset(row, col, k)]
    }
}

impl<T: Copy> IndexMut<(usize, usize, usize)> for Volume<T> {
    fn index_mut(&mut self, (row, col, k): (usize, usize, usize)) -> &mut T {
        assert!(
            self.shape.contains(row, col, k),
            "index ({row}, {col}, {k}) out of bounds for volume {}",
            self.shape
        );
        let idx = self.shape.offset(row, col, k);
        &mut self.data[idx]
    }
}

impl PenaltyField {
    /// Penalty field with the same value at every pixel and direction.
    pub fn uniform(rows: usize, cols: usize, num_directions: usize, value: f32) -> Self {
        Self::filled(VolumeShape::new(rows, cols, num_directions), value)
    }
}
