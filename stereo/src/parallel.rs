//! Execution strategies
//!
//! Two interchangeable ways of running the same recurrence over the grid:
//!
//! * [`WavefrontSweeper`] walks the fronts of a direction in order and
//!   computes the pixels of one front in parallel.
//! * [`RaySweeper`] starts an independent ray at every border pixel and
//!   walks each ray to the far border on its own; rays and directions all
//!   run concurrently.
//!
//! Both call [`DirectionalAggregator::compute`] with identical arguments for
//! every pixel and hand their passes to the accumulator in direction order,
//! so they produce bit-identical output.

use rayon::prelude::*;

use crate::accumulate::{Accumulator, DirectionalPass};
use crate::recurrence::{DirectionalAggregator, PathScratch};
use crate::sweep::{PartialCost, Sweep, SweepStep};
use crate::SweepInputs;

/// Smallest number of front pixels handed to one rayon task.
const MIN_PIXELS_PER_TASK: usize = 32;

/// Which strategy runs the sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ExecutionStrategy {
    /// Directions one after another; pixels of a front in parallel.
    #[default]
    Wavefront,
    /// Every `(border pixel, direction)` ray in parallel.
    RayParallel,
}

impl ExecutionStrategy {
    pub fn sweeper(&self) -> &'static dyn PathSweeper {
        match self {
            ExecutionStrategy::Wavefront => &WavefrontSweeper,
            ExecutionStrategy::RayParallel => &RaySweeper,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExecutionStrategy::Wavefront => "wavefront",
            ExecutionStrategy::RayParallel => "ray_parallel",
        }
    }
}

/// Computes one direction's path costs.
pub trait PathSweeper: Send + Sync {
    fn sweep(&self, aggregator: &DirectionalAggregator<'_>, record_best: bool) -> DirectionalPass;

    /// Sweep one direction into `accumulator`. The default buffers a whole pass.
    fn sweep_into(&self, aggregator: &DirectionalAggregator<'_>, accumulator: &mut Accumulator) {
        accumulator.add_pass(self.sweep(aggregator, accumulator.records_best()));
    }

    /// Whether independent directions may be swept at the same time.
    fn concurrent_directions(&self) -> bool {
        false
    }
}

/// Front-by-front sweep: front `i + 1` starts once front `i` is complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavefrontSweeper;

impl WavefrontSweeper {
    /// Walk the sweep, handing every finished front to `emit` as its pixels
    /// and their path-cost rows.
    fn walk(
        aggregator: &DirectionalAggregator<'_>,
        mut emit: impl FnMut(&[(usize, usize)], &[f32]),
    ) {
        let shape = aggregator.shape();
        let disparities = aggregator.disparities();
        let mut previous: Vec<PartialCost> = Vec::new();

        for step in Sweep::new(shape.rows, shape.cols, aggregator.direction()) {
            let current: Vec<PartialCost> = step
                .fronts()
                .iter()
                .map(|front| {
                    let parent = previous.iter().find(|p| p.front() == front.id());
                    let predecessors = front.predecessors();
                    let pixels = front.pixels();

                    let mut values = vec![0.0f32; front.len() * disparities];
                    values
                        .par_chunks_mut(disparities)
                        .enumerate()
                        .with_min_len(MIN_PIXELS_PER_TASK)
                        .for_each_init(
                            || PathScratch::with_disparities(disparities),
                            |scratch, (i, out)| {
                                let (row, col) = pixels[i];
                                let prev = parent
                                    .zip(predecessors)
                                    .map(|(parent, preds)| parent.row(preds[i]));
                                aggregator.compute(row, col, prev, scratch, out);
                            },
                        );

                    emit(pixels, &values);
                    PartialCost::new(front.id(), disparities, values)
                })
                .collect();

            #[cfg(feature = "tracing")]
            tracing::trace!(
                direction = %step.direction(),
                step = step.index(),
                pixels = step.num_pixels(),
                "front step done"
            );

            previous = current;
        }
    }
}

impl PathSweeper for WavefrontSweeper {
    fn sweep(&self, aggregator: &DirectionalAggregator<'_>, record_best: bool) -> DirectionalPass {
        let mut pass = DirectionalPass::new(aggregator.index(), aggregator.shape(), record_best);
        Self::walk(aggregator, |px, vals| pass.record_rows(px, vals));
        pass
    }

    /// Adds each front straight into the aggregate unless per-direction
    /// volumes are kept, so no full volume is buffered per direction.
    fn sweep_into(&self, aggregator: &DirectionalAggregator<'_>, accumulator: &mut Accumulator) {
        if accumulator.keeps_directional() {
            accumulator.add_pass(self.sweep(aggregator, accumulator.records_best()));
            return;
        }

        let index = aggregator.index();
        Self::walk(aggregator, |px, vals| accumulator.add_rows(index, px, vals));
        accumulator.close_direction(index);
    }
}

/// Independent per-ray sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaySweeper;

/// Path costs along one ray, one row per visited pixel.
struct RayTrace {
    start: (usize, usize),
    values: Vec<f32>,
}

impl RaySweeper {
    fn walk(
        aggregator: &DirectionalAggregator<'_>,
        start: (usize, usize),
        scratch: &mut PathScratch,
    ) -> RayTrace {
        let shape = aggregator.shape();
        let disparities = shape.depth;
        let direction = aggregator.direction();

        let mut previous = vec![0.0f32; disparities];
        let mut current = vec![0.0f32; disparities];
        let mut values = Vec::with_capacity(disparities * shape.rows.max(shape.cols));

        let (mut row, mut col) = start;
        aggregator.compute(row, col, None, scratch, &mut previous);
        values.extend_from_slice(&previous);

        while let Some((r, c)) = direction.step(row, col, shape.rows, shape.cols) {
            aggregator.compute(r, c, Some(&previous), scratch, &mut current);
            values.extend_from_slice(&current);
            std::mem::swap(&mut previous, &mut current);
            (row, col) = (r, c);
        }

        RayTrace { start, values }
    }
}

impl PathSweeper for RaySweeper {
    fn sweep(&self, aggregator: &DirectionalAggregator<'_>, record_best: bool) -> DirectionalPass {
        let shape = aggregator.shape();
        let disparities = aggregator.disparities();
        let direction = aggregator.direction();

        // Every border pixel of the first wavefront starts exactly one ray.
        let origin = SweepStep::origin(shape.rows, shape.cols, direction);
        let starts: Vec<(usize, usize)> = origin.pixels().collect();

        let traces: Vec<RayTrace> = starts
            .par_iter()
            .map_init(
                || PathScratch::with_disparities(disparities),
                |scratch, &start| Self::walk(aggregator, start, scratch),
            )
            .collect();

        #[cfg(feature = "tracing")]
        tracing::trace!(direction = %direction, rays = traces.len(), "rays done");

        // Rays of one direction never share a pixel, so the scatter order is free.
        let mut pass = DirectionalPass::new(aggregator.index(), shape, record_best);
        for trace in traces {
            let (mut row, mut col) = trace.start;
            for row_values in trace.values.chunks_exact(disparities) {
                pass.record(row, col, row_values);
                if let Some(next) = direction.step(row, col, shape.rows, shape.cols) {
                    (row, col) = next;
                }
            }
        }

        pass
    }

    fn concurrent_directions(&self) -> bool {
        true
    }
}

/// Sweep every direction of `inputs` with `strategy` and fold the results.
pub fn execute(
    inputs: SweepInputs<'_>,
    strategy: ExecutionStrategy,
    record_best: bool,
    keep_directional: bool,
) -> Accumulator {
    let sweeper = strategy.sweeper();
    let num_directions = inputs.num_directions();
    let mut accumulator = Accumulator::new(
        inputs.shape(),
        num_directions,
        record_best,
        keep_directional,
    );

    let aggregator_for = |index: usize| {
        let aggregator = DirectionalAggregator::new(inputs, index);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            direction = %aggregator.direction(),
            index,
            strategy = strategy.name(),
            "sweeping direction"
        );
        aggregator
    };

    if sweeper.concurrent_directions() {
        // Buffer every direction, then reduce in index order.
        let passes: Vec<DirectionalPass> = (0..num_directions)
            .into_par_iter()
            .map(|index| sweeper.sweep(&aggregator_for(index), record_best))
            .collect();
        for pass in passes {
            accumulator.add_pass(pass);
        }
    } else {
        for index in 0..num_directions {
            sweeper.sweep_into(&aggregator_for(index), &mut accumulator);
        }
    }

    accumulator
}
