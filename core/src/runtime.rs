use rayon::ThreadPoolBuilder;
use std::env;
use std::sync::OnceLock;

use crate::{Error, Result};

/// Environment variable read by [`init_global_thread_pool`] when no explicit
/// thread count is given.
pub const CPU_THREADS_ENV: &str = "SGM_CPU_THREADS";

static THREAD_POOL_INIT: OnceLock<Result<()>> = OnceLock::new();

/// Initialize the global Rayon thread pool used by the aggregation strategies.
///
/// Priority:
/// 1. `num_threads` argument
/// 2. `SGM_CPU_THREADS` environment variable
/// 3. Rayon default
///
/// Repeated calls are idempotent and return the first initialization result.
/// A zero `num_threads` is rejected without touching that result. If Rayon's
/// global pool was already started (for example by an earlier aggregation),
/// the build fails with [`Error::RuntimeError`].
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<()> {
    if num_threads == Some(0) {
        return Err(Error::invalid_parameters("num_threads must be >= 1"));
    }
    THREAD_POOL_INIT
        .get_or_init(|| build_global_pool(num_threads))
        .clone()
}

fn build_global_pool(num_threads: Option<usize>) -> Result<()> {
    let configured_threads = match num_threads {
        Some(n) => Some(n),
        None => read_cpu_threads_from_env()?,
    };

    let mut builder = ThreadPoolBuilder::new();
    if let Some(n) = configured_threads {
        builder = builder.num_threads(n);
    }

    builder
        .thread_name(|idx| format!("sgm-{idx}"))
        .build_global()
        .map_err(|e| {
            Error::RuntimeError(format!(
                "failed to initialize global thread pool: {e}"
            ))
        })
}

pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

fn read_cpu_threads_from_env() -> Result<Option<usize>> {
    match env::var(CPU_THREADS_ENV) {
        Ok(raw) => parse_thread_count(&raw).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::InvalidParameters(format!(
            "failed to read {CPU_THREADS_ENV}: {e}"
        ))),
    }
}

fn parse_thread_count(raw: &str) -> Result<usize> {
    let parsed: usize = raw.trim().parse().map_err(|_| {
        Error::InvalidParameters(format!(
            "{CPU_THREADS_ENV} must be a positive integer, got '{raw}'"
        ))
    })?;
    if parsed == 0 {
        return Err(Error::InvalidParameters(format!(
            "{CPU_THREADS_ENV} must be >= 1"
        )));
    }
    Ok(parsed)
}
