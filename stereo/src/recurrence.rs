//! Per-pixel path-cost recurrence
//!
//! For direction `r` and pixel `p` with predecessor `q = p - r`:
//!
//! ```text
//! Lr(p, d) = C(p, d) + min_d'[Lr(q, d') + P(d, d')] - min_d'[Lr(q, d')]
//! ```
//!
//! with `P(d, d') = 0` for `d' = d`, `P1` for `|d - d'| = 1` and `P2`
//! otherwise. Minima ignore `NaN` entries. When every predecessor entry is
//! `NaN` the smoothing term is neutral (zero); a `NaN` matching cost still
//! propagates. Border pixels and pixels whose predecessor lies in another
//! segment take `Lr(p, d) = C(p, d)`.

use sgm_core::VolumeShape;

use crate::{Direction, SweepInputs};

/// Smoothness penalties at one pixel for one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPenalty {
    pub p1: f32,
    pub p2: f32,
}

/// Reusable prefix/suffix minima for [`path_cost`].
///
/// Keep one per worker; it grows to the disparity count on first use.
#[derive(Debug, Clone, Default)]
pub struct PathScratch {
    prefix: Vec<f32>,
    suffix: Vec<f32>,
}

impl PathScratch {
    pub fn with_disparities(disparities: usize) -> Self {
        Self {
            prefix: vec![f32::NAN; disparities],
            suffix: vec![f32::NAN; disparities],
        }
    }

    /// Fill NaN-ignoring running minima of `previous` from both ends.
    fn load(&mut self, previous: &[f32]) {
        let n = previous.len();
        self.prefix.resize(n, f32::NAN);
        self.suffix.resize(n, f32::NAN);

        let mut acc = f32::NAN;
        for (slot, &v) in self.prefix.iter_mut().zip(previous) {
            acc = acc.min(v);
            *slot = acc;
        }
        acc = f32::NAN;
        for (slot, &v) in self.suffix.iter_mut().zip(previous).rev() {
            acc = acc.min(v);
            *slot = acc;
        }
    }
}

/// Aggregated cost row for one pixel.
///
/// `previous` is the predecessor's row, or `None` when the pixel starts a
/// path (sweep border or segment reset). `cost`, `previous` and `out` must
/// all have one entry per disparity.
///
/// The `|d - d'| >= 2` candidates are read from the prefix/suffix minima, so
/// a row costs `O(D)` and the result is exact for any `P1`/`P2` ordering.
pub fn path_cost(
    cost: &[f32],
    previous: Option<&[f32]>,
    penalty: PathPenalty,
    scratch: &mut PathScratch,
    out: &mut [f32],
) {
    debug_assert_eq!(cost.len(), out.len());

    let Some(prev) = previous else {
        out.copy_from_slice(cost);
        return;
    };
    debug_assert_eq!(prev.len(), cost.len());

    let n = cost.len();
    scratch.load(prev);
    let prev_min = scratch.suffix.first().copied().unwrap_or(f32::NAN);
    let PathPenalty { p1, p2 } = penalty;

    for d in 0..n {
        // f32::min returns the other operand when one side is NaN.
        let mut best = prev[d];
        if d >= 1 {
            best = best.min(prev[d - 1] + p1);
        }
        if d + 1 < n {
            best = best.min(prev[d + 1] + p1);
        }
        if d >= 2 {
            best = best.min(scratch.prefix[d - 2] + p2);
        }
        if d + 2 < n {
            best = best.min(scratch.suffix[d + 2] + p2);
        }

        let correction = if best.is_nan() { 0.0 } else { best - prev_min };
        out[d] = cost[d] + correction;
    }
}

/// Index of the smallest non-NaN entry.
///
/// Ties go to the lowest disparity. A row with no valid entry yields 0.
pub fn best_disparity(row: &[f32]) -> u32 {
    let mut best: Option<(usize, f32)> = None;
    for (d, &v) in row.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if current <= v => {}
            _ => best = Some((d, v)),
        }
    }
    best.map_or(0, |(d, _)| d as u32)
}

/// Applies [`path_cost`] along one direction of a validated input set.
///
/// This is the single recurrence shared by every execution strategy.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalAggregator<'a> {
    inputs: SweepInputs<'a>,
    direction: Direction,
    index: usize,
}

impl<'a> DirectionalAggregator<'a> {
    /// Aggregator for `inputs.directions[index]`.
    pub fn new(inputs: SweepInputs<'a>, index: usize) -> Self {
        Self {
            inputs,
            direction: inputs.directions[index],
            index,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Position of the direction in the caller's list; selects the penalty channel.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn shape(&self) -> VolumeShape {
        self.inputs.shape()
    }

    pub fn disparities(&self) -> usize {
        self.inputs.cost.depth()
    }

    pub fn penalty(&self, row: usize, col: usize) -> PathPenalty {
        PathPenalty {
            p1: self.inputs.p1[(row, col, self.index)],
            p2: self.inputs.p2[(row, col, self.index)],
        }
    }

    /// Whether smoothing flows from the predecessor into `(row, col)`.
    pub fn is_connected(&self, row: usize, col: usize) -> bool {
        let Some(seg) = self.inputs.segmentation else {
            return true;
        };
        let shape = self.inputs.shape();
        match self.direction.predecessor(row, col, shape.rows, shape.cols) {
            Some(pred) => seg.connected((row, col), pred),
            None => true,
        }
    }

    /// `Lr` at `(row, col)` into `out`, given the predecessor's row if the
    /// pixel is not on the sweep border.
    #[inline]
    pub fn compute(
        &self,
        row: usize,
        col: usize,
        previous: Option<&[f32]>,
        scratch: &mut PathScratch,
        out: &mut [f32],
    ) {
        let previous = previous.filter(|_| self.is_connected(row, col));
        path_cost(
            self.inputs.cost.pixel(row, col),
            previous,
            self.penalty(row, col),
            scratch,
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgm_core::{CostVolume, PenaltyField, SegmentationMap};

    const FRONT_COSTS: [[f32; 4]; 3] = [
        [1.0, 2.0, 3.0, 4.0],
        [5.0, 6.0, 7.0, 8.0],
        [9.0, 10.0, 11.0, 12.0],
    ];
    const PREVIOUS: [[f32; 4]; 3] = [
        [1.0, 1.0, 1.0, 0.0],
        [1.0, 8.0, 2.0, 9.0],
        [9.0, 10.0, 11.0, 1.0],
    ];

    fn nanmin(values: impl Iterator<Item = f32>) -> f32 {
        values.fold(f32::NAN, f32::min)
    }

    /// Direct O(D^2) evaluation of the recurrence with NaN-ignoring minima.
    fn naive(cost: &[f32], prev: &[f32], p1: f32, p2: f32) -> Vec<f32> {
        let prev_min = nanmin(prev.iter().copied());
        (0..cost.len())
            .map(|d| {
                let best = nanmin(prev.iter().enumerate().map(|(e, &v)| {
                    let pen = match d.abs_diff(e) {
                        0 => 0.0,
                        1 => p1,
                        _ => p2,
                    };
                    v + pen
                }));
                let corr = if best.is_nan() { 0.0 } else { best - prev_min };
                cost[d] + corr
            })
            .collect()
    }

    #[test]
    fn test_path_cost_known_rows() {
        let penalty = PathPenalty { p1: 3.0, p2: 4.0 };
        let mut scratch = PathScratch::default();
        let mut out = [0.0f32; 4];

        let expected_d1 = [3.0, 9.0, 14.0];
        for i in 0..3 {
            path_cost(
                &FRONT_COSTS[i],
                Some(&PREVIOUS[i]),
                penalty,
                &mut scratch,
                &mut out,
            );
            assert_eq!(out[1], expected_d1[i], "row {i}");
        }
    }

    #[test]
    fn test_missing_predecessor_keeps_raw_cost() {
        let penalty = PathPenalty { p1: 3.0, p2: 4.0 };
        let mut scratch = PathScratch::default();
        let mut out = [0.0f32; 4];

        let expected_d1 = [2.0, 6.0, 10.0];
        for i in 0..3 {
            path_cost(&FRONT_COSTS[i], None, penalty, &mut scratch, &mut out);
            assert_eq!(out, FRONT_COSTS[i]);
            assert_eq!(out[1], expected_d1[i]);
        }
    }

    #[test]
    fn test_matches_naive_for_any_penalty_order() {
        let cost = [4.0, 0.5, 7.0, 3.0, 9.0, 2.0];
        let prev = [6.0, 2.0, 8.0, 1.0, 5.0, 3.5];
        let mut scratch = PathScratch::with_disparities(6);
        let mut out = [0.0f32; 6];

        for (p1, p2) in [(1.0, 10.0), (10.0, 1.0), (2.0, 2.0), (0.0, 0.0)] {
            path_cost(
                &cost,
                Some(&prev),
                PathPenalty { p1, p2 },
                &mut scratch,
                &mut out,
            );
            assert_eq!(
                out.to_vec(),
                naive(&cost, &prev, p1, p2),
                "p1 = {p1}, p2 = {p2}"
            );
        }
    }

    #[test]
    fn test_all_nan_predecessor_is_neutral() {
        let cost = [3.0, 1.0, 2.0];
        let prev = [f32::NAN; 3];
        let mut scratch = PathScratch::default();
        let mut out = [0.0f32; 3];

        path_cost(
            &cost,
            Some(&prev),
            PathPenalty { p1: 8.0, p2: 32.0 },
            &mut scratch,
            &mut out,
        );
        assert_eq!(out, cost);
    }

    #[test]
    fn test_partial_nan_predecessor_is_skipped() {
        let cost = [3.0, 1.0, 2.0, 6.0];
        let prev = [f32::NAN, 4.0, f32::NAN, 1.0];
        let mut scratch = PathScratch::default();
        let mut out = [0.0f32; 4];

        path_cost(
            &cost,
            Some(&prev),
            PathPenalty { p1: 2.0, p2: 5.0 },
            &mut scratch,
            &mut out,
        );
        assert_eq!(out.to_vec(), naive(&cost, &prev, 2.0, 5.0));
        assert!(out.iter().all(|v| !v.is_nan()));
        // d = 3 keeps its own predecessor value: 6 + (1 - 1).
        assert_eq!(out[3], 6.0);
    }

    #[test]
    fn test_nan_cost_propagates() {
        let cost = [f32::NAN, 1.0];
        let prev = [0.0, 0.0];
        let mut scratch = PathScratch::default();
        let mut out = [0.0f32; 2];

        path_cost(
            &cost,
            Some(&prev),
            PathPenalty { p1: 1.0, p2: 2.0 },
            &mut scratch,
            &mut out,
        );
        assert!(out[0].is_nan());
        assert_eq!(out[1], 1.0);
    }

    #[test]
    fn test_best_disparity_tie_break() {
        assert_eq!(best_disparity(&[3.0, 1.0, 1.0, 2.0]), 1);
        assert_eq!(best_disparity(&[f32::NAN, 5.0, 4.0]), 2);
        assert_eq!(best_disparity(&[f32::NAN, f32::NAN]), 0);
        assert_eq!(best_disparity(&[]), 0);
    }

    #[test]
    fn test_segment_boundary_resets_smoothing() {
        let cost = CostVolume::from_nested(&[vec![vec![0.0, 9.0], vec![5.0, 1.0]]]).unwrap();
        let p1 = PenaltyField::uniform(1, 2, 1, 100.0);
        let p2 = PenaltyField::uniform(1, 2, 1, 100.0);
        let directions = [Direction::RIGHT];
        let mut seg = SegmentationMap::uniform(1, 2);

        let mut scratch = PathScratch::default();
        let mut out = [0.0f32; 2];
        let first = [0.0, 9.0];

        let inputs = SweepInputs::new(&cost, &p1, &p2, &directions, Some(&seg)).unwrap();
        let agg = DirectionalAggregator::new(inputs, 0);
        agg.compute(0, 1, Some(&first), &mut scratch, &mut out);
        // Smoothed: min(9, 0 + 100) - 0 added to d = 1.
        assert_eq!(out, [5.0, 10.0]);

        seg.set(0, 1, 7);
        let inputs = SweepInputs::new(&cost, &p1, &p2, &directions, Some(&seg)).unwrap();
        let agg = DirectionalAggregator::new(inputs, 0);
        assert!(!agg.is_connected(0, 1));
        agg.compute(0, 1, Some(&first), &mut scratch, &mut out);
        assert_eq!(out, [5.0, 1.0]);
    }
}
