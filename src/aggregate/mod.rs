//! Parallel aggregation engine.
//!
//! Everything here drives the compute capability in `crate::accel`:
//! work partitioning, the multi-pass tree reduction, the elementwise
//! squared-deviation transform, histogram binning, and the pipeline that
//! sequences them into a statistics summary.

pub mod histogram;
pub mod partition;
pub mod pipeline;
pub mod reduce;
pub mod transform;

use thiserror::Error;

use crate::accel::ComputeError;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("empty input: statistics require at least one value")]
    EmptyInput,

    #[error("invalid histogram range: maximum {maximum} is below minimum {minimum}")]
    InvalidRange { minimum: f32, maximum: f32 },

    #[error(transparent)]
    Compute(#[from] ComputeError),
}

pub use pipeline::{run_pipeline, StatsSummary};
