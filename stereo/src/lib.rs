//! Semi-Global Matching cost aggregation
//!
//! Given a matching-cost volume `C[row, col, disparity]`, path-dependent
//! penalties and an optional segmentation, this crate sweeps the grid along
//! each configured direction, accumulates the 1-D path costs and sums them
//! into the aggregated cost volume.
//!
//! ```no_run
//! use sgm_stereo::{CostVolume, Direction, PenaltyField, SgmAggregator};
//!
//! let cost = CostVolume::zeros(480, 640, 64);
//! let p1 = PenaltyField::uniform(480, 640, 8, 8.0);
//! let p2 = PenaltyField::uniform(480, 640, 8, 32.0);
//!
//! let output = SgmAggregator::new()
//!     .with_directions(Direction::EIGHT_CONNECTED)
//!     .with_overcounting(true)
//!     .aggregate(&cost, &p1, &p2, None)?;
//! # Ok::<(), sgm_stereo::Error>(())
//! ```

pub mod accumulate;
pub mod direction;
pub mod inputs;
pub mod parallel;
pub mod recurrence;
pub mod sgm;
pub mod sweep;

pub use accumulate::{correct_overcounting, AggregationOutput};
pub use direction::Direction;
pub use inputs::SweepInputs;
pub use parallel::{ExecutionStrategy, PathSweeper, RaySweeper, WavefrontSweeper};
pub use recurrence::{best_disparity, path_cost, PathPenalty};
pub use sgm::{aggregate, SgmAggregator, SgmOptions};
pub use sweep::{Front, FrontId, Sweep, SweepStep};

pub use sgm_core::{
    CostVolume, Error, PathDisparities, PenaltyField, Result, SegmentationMap, VolumeShape,
};
