pub use sgm_core as core;
pub use sgm_stereo as stereo;

pub use sgm_stereo::{
    aggregate, AggregationOutput, Direction, ExecutionStrategy, SgmAggregator, SgmOptions,
};

/// Initialize a single global Rayon thread pool for all CPU-parallel routines.
///
/// Call this once at application startup before aggregating. Repeated calls
/// are idempotent and return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `SGM_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> sgm_core::Result<()> {
    sgm_core::init_global_thread_pool(num_threads)
}
