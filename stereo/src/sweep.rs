//! Wavefront scheduling for one sweep direction
//!
//! A sweep starts from one or two border fronts ("unit zero") and moves them
//! one pixel along the direction per step. Every step is an immutable
//! [`SweepStep`] value; [`SweepStep::advance`] derives the next one. Each
//! front of a later step records, per pixel, the position of its predecessor
//! in the same front of the previous step, so partial costs from the previous
//! step can be read without re-deriving coordinates.

use crate::Direction;

/// Identifies which border front a wavefront originated from.
///
/// Ids are stable for the whole sweep: the row front (if any) is `FrontId(0)`,
/// the column front follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrontId(pub usize);

/// Pixels at one wave index of a sweep.
///
/// No pixel of a front depends on another pixel of the same front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Front {
    id: FrontId,
    pixels: Vec<(usize, usize)>,
    predecessors: Option<Vec<usize>>,
}

impl Front {
    fn origin(id: FrontId, pixels: Vec<(usize, usize)>) -> Self {
        Self {
            id,
            pixels,
            predecessors: None,
        }
    }

    pub fn id(&self) -> FrontId {
        self.id
    }

    /// `(row, col)` coordinates in front order.
    pub fn pixels(&self) -> &[(usize, usize)] {
        &self.pixels
    }

    /// For each pixel, the index of its predecessor within the previous
    /// step's front with the same id. `None` on the first step.
    pub fn predecessors(&self) -> Option<&[usize]> {
        self.predecessors.as_deref()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// One step of a directional sweep over a `rows x cols` grid.
#[derive(Debug, Clone)]
pub struct SweepStep {
    direction: Direction,
    rows: usize,
    cols: usize,
    index: usize,
    fronts: Vec<Front>,
}

impl SweepStep {
    /// Border fronts for `direction`.
    ///
    /// A vertical component claims a whole border row; a horizontal component
    /// claims a border column restricted to the rows the row front did not
    /// take, so the shared corner of a diagonal sweep is visited once.
    pub fn origin(rows: usize, cols: usize, direction: Direction) -> Self {
        let mut fronts = Vec::with_capacity(2);
        let mut row_range = 0..rows;

        if rows > 0 && cols > 0 {
            let border_row = match direction.di() {
                1 => {
                    row_range.start = 1;
                    Some(0)
                }
                -1 => {
                    row_range.end = rows - 1;
                    Some(rows - 1)
                }
                _ => None,
            };
            if let Some(row) = border_row {
                let pixels = (0..cols).map(|col| (row, col)).collect();
                fronts.push(Front::origin(FrontId(fronts.len()), pixels));
            }

            let border_col = match direction.dj() {
                1 => Some(0),
                -1 => Some(cols - 1),
                _ => None,
            };
            if let Some(col) = border_col {
                let pixels: Vec<_> = row_range.map(|row| (row, col)).collect();
                if !pixels.is_empty() {
                    fronts.push(Front::origin(FrontId(fronts.len()), pixels));
                }
            }
        }

        Self {
            direction,
            rows,
            cols,
            index: 0,
            fronts,
        }
    }

    /// The next step: every pixel moved by the direction, pixels that leave
    /// the grid discarded, and fronts that became empty removed.
    pub fn advance(&self) -> SweepStep {
        let fronts = self
            .fronts
            .iter()
            .filter_map(|front| {
                let (pixels, predecessors): (Vec<_>, Vec<_>) = front
                    .pixels
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &(row, col))| {
                        self.direction
                            .step(row, col, self.rows, self.cols)
                            .map(|next| (next, i))
                    })
                    .unzip();

                (!pixels.is_empty()).then(|| Front {
                    id: front.id,
                    pixels,
                    predecessors: Some(predecessors),
                })
            })
            .collect();

        Self {
            direction: self.direction,
            rows: self.rows,
            cols: self.cols,
            index: self.index + 1,
            fronts,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Wave index; 0 for the border fronts.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn fronts(&self) -> &[Front] {
        &self.fronts
    }

    pub fn is_origin(&self) -> bool {
        self.index == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.fronts.is_empty()
    }

    /// Pixels across all fronts of this step.
    pub fn num_pixels(&self) -> usize {
        self.fronts.iter().map(Front::len).sum()
    }

    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.fronts.iter().flat_map(|f| f.pixels.iter().copied())
    }
}

/// Iterator over every non-empty step of a sweep, starting at the border.
#[derive(Debug, Clone)]
pub struct Sweep {
    next: Option<SweepStep>,
}

impl Sweep {
    pub fn new(rows: usize, cols: usize, direction: Direction) -> Self {
        let origin = SweepStep::origin(rows, cols, direction);
        Self {
            next: (!origin.is_exhausted()).then_some(origin),
        }
    }
}

impl Iterator for Sweep {
    type Item = SweepStep;

    fn next(&mut self) -> Option<SweepStep> {
        let current = self.next.take()?;
        let following = current.advance();
        if !following.is_exhausted() {
            self.next = Some(following);
        }
        Some(current)
    }
}

/// Aggregated path costs of one front: one row of `disparities` values per
/// front pixel, in front order. Kept for a single step as the predecessor
/// of the next front with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialCost {
    front: FrontId,
    disparities: usize,
    values: Vec<f32>,
}

impl PartialCost {
    pub fn new(front: FrontId, disparities: usize, values: Vec<f32>) -> Self {
        debug_assert!(disparities == 0 || values.len() % disparities == 0);
        Self {
            front,
            disparities,
            values,
        }
    }

    pub fn front(&self) -> FrontId {
        self.front
    }

    pub fn len(&self) -> usize {
        if self.disparities == 0 {
            0
        } else {
            self.values.len() / self.disparities
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.disparities..(i + 1) * self.disparities]
    }
}
