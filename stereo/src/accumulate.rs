//! Summing per-direction path costs
//!
//! Each direction produces a [`DirectionalPass`]. The [`Accumulator`] folds
//! passes into the aggregated volume strictly in direction order, so the
//! floating-point result does not depend on which strategy produced the
//! passes or in what order they finished.

use std::collections::BTreeMap;

use rayon::prelude::*;
use sgm_core::{CostVolume, PathDisparities, VolumeShape};

use crate::recurrence::best_disparity;

/// Path costs of a single direction over the whole grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalPass {
    index: usize,
    costs: CostVolume,
    best: Option<Vec<u32>>,
}

impl DirectionalPass {
    /// Empty pass for direction `index`; `record_best` also tracks the
    /// per-pixel arg-min.
    pub fn new(index: usize, shape: VolumeShape, record_best: bool) -> Self {
        Self {
            index,
            costs: CostVolume::new(shape),
            best: record_best.then(|| vec![0; shape.plane_len()]),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn costs(&self) -> &CostVolume {
        &self.costs
    }

    /// Arg-min disparity per pixel, row-major, if requested.
    pub fn best(&self) -> Option<&[u32]> {
        self.best.as_deref()
    }

    /// Store the path-cost row of `(row, col)`.
    ///
    /// Each pixel is written once per direction.
    #[inline]
    pub fn record(&mut self, row: usize, col: usize, values: &[f32]) {
        self.costs.pixel_mut(row, col).copy_from_slice(values);
        if let Some(best) = self.best.as_mut() {
            best[row * self.costs.cols() + col] = best_disparity(values);
        }
    }

    /// Store one row per pixel of `pixels`; `values` is laid out in the same order.
    pub fn record_rows(&mut self, pixels: &[(usize, usize)], values: &[f32]) {
        let depth = self.costs.depth();
        for (&(row, col), row_values) in pixels.iter().zip(values.chunks_exact(depth)) {
            self.record(row, col, row_values);
        }
    }
}

/// Final result of an aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationOutput {
    /// Sum of all directions' path costs, `rows x cols x disparities`.
    pub aggregated: CostVolume,
    /// Arg-min disparity per pixel and direction, `rows x cols x directions`.
    pub best_disparity_per_direction: Option<PathDisparities>,
    /// Each direction's own path-cost volume keyed by direction index.
    pub directional_costs: Option<BTreeMap<usize, CostVolume>>,
}

/// Folds [`DirectionalPass`]es into the aggregated volume.
#[derive(Debug)]
pub struct Accumulator {
    aggregated: CostVolume,
    best: Option<PathDisparities>,
    directional: Option<BTreeMap<usize, CostVolume>>,
    num_directions: usize,
    absorbed: usize,
}

impl Accumulator {
    pub fn new(
        shape: VolumeShape,
        num_directions: usize,
        record_best: bool,
        keep_directional: bool,
    ) -> Self {
        let best_shape = VolumeShape::new(shape.rows, shape.cols, num_directions);
        Self {
            aggregated: CostVolume::new(shape),
            best: record_best.then(|| PathDisparities::new(best_shape)),
            directional: keep_directional.then(BTreeMap::new),
            num_directions,
            absorbed: 0,
        }
    }

    /// Add one direction's costs. Callers must pass directions in index
    /// order to keep the summation order fixed.
    pub fn add_pass(&mut self, pass: DirectionalPass) {
        debug_assert_eq!(
            pass.index, self.absorbed,
            "passes must arrive in direction order"
        );
        debug_assert_eq!(pass.costs.shape, self.aggregated.shape);

        self.aggregated
            .data
            .par_iter_mut()
            .zip(pass.costs.data.par_iter())
            .for_each(|(acc, &v)| *acc += v);

        if let (Some(best), Some(pass_best)) = (self.best.as_mut(), pass.best.as_ref()) {
            let k = pass.index;
            let pixels = best.data.chunks_exact_mut(self.num_directions);
            for (pixel, &d) in pixels.zip(pass_best) {
                pixel[k] = d;
            }
        }

        if let Some(directional) = self.directional.as_mut() {
            directional.insert(pass.index, pass.costs);
        }
        self.absorbed += 1;
    }

    /// Add path-cost rows of direction `index` straight into the aggregate,
    /// without buffering a whole [`DirectionalPass`].
    ///
    /// Only valid when per-direction volumes are not kept. Every pixel of the
    /// direction must be added exactly once before [`Accumulator::close_direction`].
    pub fn add_rows(&mut self, index: usize, pixels: &[(usize, usize)], values: &[f32]) {
        debug_assert_eq!(index, self.absorbed, "rows must arrive in direction order");
        debug_assert!(self.directional.is_none());

        let depth = self.aggregated.depth();
        for (&(row, col), row_values) in pixels.iter().zip(values.chunks_exact(depth)) {
            let slots = self.aggregated.pixel_mut(row, col);
            for (acc, &v) in slots.iter_mut().zip(row_values) {
                *acc += v;
            }
            if let Some(best) = self.best.as_mut() {
                let offset = best.shape.offset(row, col, index);
                best.data[offset] = best_disparity(row_values);
            }
        }
    }

    /// Mark direction `index` as fully added through [`Accumulator::add_rows`].
    pub fn close_direction(&mut self, index: usize) {
        debug_assert_eq!(index, self.absorbed);
        self.absorbed += 1;
    }

    pub fn absorbed(&self) -> usize {
        self.absorbed
    }

    pub fn records_best(&self) -> bool {
        self.best.is_some()
    }

    pub fn keeps_directional(&self) -> bool {
        self.directional.is_some()
    }

    /// Finish the run, removing the duplicated baseline cost first when
    /// `overcounting` is given the input cost volume.
    pub fn finish(mut self, overcounting: Option<&CostVolume>) -> AggregationOutput {
        if let Some(cost) = overcounting {
            correct_overcounting(&mut self.aggregated, cost, self.num_directions);
        }
        AggregationOutput {
            aggregated: self.aggregated,
            best_disparity_per_direction: self.best,
            directional_costs: self.directional,
        }
    }
}

/// `aggregated -= (num_directions - 1) * cost`.
///
/// Every direction's path cost contains the raw matching cost once; this
/// leaves a single copy of it in the sum.
pub fn correct_overcounting(
    aggregated: &mut CostVolume,
    cost: &CostVolume,
    num_directions: usize,
) {
    debug_assert_eq!(aggregated.shape, cost.shape);
    let factor = num_directions.saturating_sub(1) as f32;

    #[cfg(feature = "tracing")]
    tracing::debug!(factor, "correcting overcounted matching cost");

    aggregated
        .data
        .par_iter_mut()
        .zip(cost.data.par_iter())
        .for_each(|(acc, &c)| *acc -= factor * c);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass_with(index: usize, value: f32, record_best: bool) -> DirectionalPass {
        let shape = VolumeShape::new(2, 2, 3);
        let mut pass = DirectionalPass::new(index, shape, record_best);
        for row in 0..2 {
            for col in 0..2 {
                pass.record(row, col, &[value + 1.0, value, value + 2.0]);
            }
        }
        pass
    }

    #[test]
    fn test_passes_are_summed() {
        let shape = VolumeShape::new(2, 2, 3);
        let mut acc = Accumulator::new(shape, 2, false, false);
        acc.add_pass(pass_with(0, 1.0, false));
        acc.add_pass(pass_with(1, 10.0, false));
        assert_eq!(acc.absorbed(), 2);

        let out = acc.finish(None);
        assert_eq!(out.aggregated.pixel(1, 1), &[13.0, 11.0, 15.0]);
        assert!(out.best_disparity_per_direction.is_none());
        assert!(out.directional_costs.is_none());
    }

    #[test]
    fn test_best_and_directional_volumes() {
        let shape = VolumeShape::new(2, 2, 3);
        let mut acc = Accumulator::new(shape, 2, true, true);
        let mut second = pass_with(1, 4.0, true);
        second.record(0, 1, &[0.0, 3.0, 0.0]);
        acc.add_pass(pass_with(0, 1.0, true));
        acc.add_pass(second);

        let out = acc.finish(None);
        let best = out.best_disparity_per_direction.unwrap();
        assert_eq!(best.shape, VolumeShape::new(2, 2, 2));
        assert_eq!(best[(0, 0, 0)], 1);
        assert_eq!(best[(0, 1, 1)], 0);

        let directional = out.directional_costs.unwrap();
        assert_eq!(directional.len(), 2);
        assert_eq!(directional[&1].pixel(0, 1), &[0.0, 3.0, 0.0]);
        assert_eq!(directional[&0].pixel(1, 0), &[2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_added_rows_match_buffered_passes() {
        let shape = VolumeShape::new(2, 2, 3);
        let pixels = [(0, 0), (0, 1), (1, 0), (1, 1)];

        let mut buffered = Accumulator::new(shape, 2, true, false);
        let mut streamed = Accumulator::new(shape, 2, true, false);
        assert!(streamed.records_best());
        assert!(!streamed.keeps_directional());

        for (index, value) in [(0, 1.5), (1, 7.25)] {
            let pass = pass_with(index, value, true);
            for &(row, col) in &pixels {
                streamed.add_rows(index, &[(row, col)], pass.costs().pixel(row, col));
            }
            streamed.close_direction(index);
            buffered.add_pass(pass);
        }

        assert_eq!(streamed.absorbed(), 2);
        assert_eq!(streamed.finish(None), buffered.finish(None));
    }

    #[test]
    fn test_record_rows_follows_pixel_order() {
        let mut pass = DirectionalPass::new(0, VolumeShape::new(1, 3, 2), true);
        pass.record_rows(&[(0, 2), (0, 0)], &[4.0, 1.0, 0.0, 9.0]);

        assert_eq!(pass.costs().pixel(0, 2), &[4.0, 1.0]);
        assert_eq!(pass.costs().pixel(0, 0), &[0.0, 9.0]);
        assert_eq!(pass.best(), Some(&[0, 0, 1][..]));
    }

    #[test]
    fn test_overcounting_correction() {
        let cost = CostVolume::from_vec(vec![2.0, f32::NAN], VolumeShape::new(1, 1, 2)).unwrap();
        let mut aggregated =
            CostVolume::from_vec(vec![30.0, 5.0], VolumeShape::new(1, 1, 2)).unwrap();

        correct_overcounting(&mut aggregated, &cost, 8);
        assert_eq!(aggregated[(0, 0, 0)], 30.0 - 7.0 * 2.0);
        assert!(aggregated[(0, 0, 1)].is_nan());
    }

    #[test]
    fn test_single_direction_overcounting_is_identity() {
        let cost = CostVolume::from_vec(vec![2.0, 3.0], VolumeShape::new(1, 1, 2)).unwrap();
        let mut aggregated = cost.clone();
        correct_overcounting(&mut aggregated, &cost, 1);
        assert_eq!(aggregated, cost);
    }
}
