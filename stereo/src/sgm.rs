use rayon::ThreadPoolBuilder;
use sgm_core::{CostVolume, PenaltyField, SegmentationMap};

use crate::accumulate::AggregationOutput;
use crate::parallel::{execute, ExecutionStrategy};
use crate::{Direction, Error, Result, SweepInputs};

/// Settings of an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SgmOptions {
    /// Sweep directions; penalty fields are indexed in this order.
    pub directions: Vec<Direction>,
    pub strategy: ExecutionStrategy,
    /// Record the arg-min disparity of every direction at every pixel.
    pub cost_paths: bool,
    /// Subtract `(directions - 1) * cost` from the aggregated volume.
    pub overcounting: bool,
    /// Keep each direction's own volume in the output.
    pub directional_volumes: bool,
    /// Run on a private pool of this many threads instead of the global one.
    pub num_threads: Option<usize>,
}

impl Default for SgmOptions {
    fn default() -> Self {
        Self {
            directions: Direction::EIGHT_CONNECTED.to_vec(),
            strategy: ExecutionStrategy::default(),
            cost_paths: false,
            overcounting: false,
            directional_volumes: false,
            num_threads: None,
        }
    }
}

/// Semi-Global Matching cost aggregator
#[derive(Debug, Clone, Default)]
pub struct SgmAggregator {
    options: SgmOptions,
}

impl SgmAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: SgmOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SgmOptions {
        &self.options
    }

    pub fn with_directions(mut self, directions: impl IntoIterator<Item = Direction>) -> Self {
        self.options.directions = directions.into_iter().collect();
        self
    }

    pub fn with_cost_paths(mut self, enabled: bool) -> Self {
        self.options.cost_paths = enabled;
        self
    }

    pub fn with_overcounting(mut self, enabled: bool) -> Self {
        self.options.overcounting = enabled;
        self
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    pub fn with_directional_volumes(mut self, enabled: bool) -> Self {
        self.options.directional_volumes = enabled;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.options.num_threads = Some(num_threads);
        self
    }

    /// Aggregate `cost` along every configured direction.
    ///
    /// `p1` and `p2` are `rows x cols x directions`. Pixels whose predecessor
    /// carries a different `segmentation` label restart their path. All
    /// inputs are validated before the first sweep.
    pub fn aggregate(
        &self,
        cost: &CostVolume,
        p1: &PenaltyField,
        p2: &PenaltyField,
        segmentation: Option<&SegmentationMap>,
    ) -> Result<AggregationOutput> {
        let opts = &self.options;
        let inputs = SweepInputs::new(cost, p1, p2, &opts.directions, segmentation)?;
        if opts.num_threads == Some(0) {
            return Err(Error::invalid_parameters("num_threads must be >= 1"));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            shape = %inputs.shape(),
            directions = inputs.num_directions(),
            strategy = opts.strategy.name(),
            cost_paths = opts.cost_paths,
            overcounting = opts.overcounting,
            segmented = segmentation.is_some(),
            "starting SGM aggregation"
        );

        let run = || {
            execute(
                inputs,
                opts.strategy,
                opts.cost_paths,
                opts.directional_volumes,
            )
        };

        let accumulator = match opts.num_threads {
            None => run(),
            Some(n) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|idx| format!("sgm-worker-{idx}"))
                    .build()
                    .map_err(|e| Error::RuntimeError(format!("pool build failed: {e}")))?;

                #[cfg(feature = "tracing")]
                tracing::debug!(threads = n, "running on a private thread pool");

                pool.install(run)
            }
        };

        Ok(accumulator.finish(opts.overcounting.then_some(cost)))
    }
}

/// Aggregate a cost volume with SGM.
///
/// `directions` are raw `(di, dj)` pairs; a pair outside `{-1, 0, 1}^2` or
/// equal to `(0, 0)` is rejected before any work starts.
pub fn aggregate(
    cost: &CostVolume,
    p1: &PenaltyField,
    p2: &PenaltyField,
    directions: &[(i32, i32)],
    segmentation: Option<&SegmentationMap>,
    cost_paths: bool,
    overcounting: bool,
) -> Result<AggregationOutput> {
    let directions = Direction::parse_all(directions)?;
    SgmAggregator::new()
        .with_directions(directions)
        .with_cost_paths(cost_paths)
        .with_overcounting(overcounting)
        .aggregate(cost, p1, p2, segmentation)
}
