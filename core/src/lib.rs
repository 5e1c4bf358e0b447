//! Core data types shared by the SGM crates
//!
//! Cost volumes, penalty fields and path-disparity maps are all dense
//! row-major 3-D volumes (see [`Volume`]); segmentation maps are 2-D label
//! grids. The workspace-wide [`Error`] type lives here as well.

pub mod runtime;
pub mod segmentation;
pub mod volume;

pub use runtime::{current_cpu_threads, init_global_thread_pool, CPU_THREADS_ENV};
pub use segmentation::*;
pub use volume::*;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(
        "Invalid direction ({di}, {dj}): components must be in {{-1, 0, 1}} and not both zero"
    )]
    InvalidDirection { di: i32, dj: i32 },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

impl Error {
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// True for errors caused by a rejected configuration (directions, thread counts).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidDirection { .. } | Error::InvalidParameters(_)
        )
    }

    /// True for errors caused by inputs whose shapes disagree.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Error::DimensionMismatch(_))
    }
}
