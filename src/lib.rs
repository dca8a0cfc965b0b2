//! gridstat -- descriptive statistics over large datasets via data-parallel
//! kernel dispatch.
//!
//! This crate provides the parallel aggregation engine (tree reductions,
//! elementwise transforms, histogram binning, percentile estimation), the
//! compute-device capability layer it dispatches to, and the dataset loader.

pub mod accel;
pub mod aggregate;
pub mod dataset;

use std::path::Path;

use anyhow::Result;

pub use accel::{select_device, ComputeDevice};
pub use aggregate::{run_pipeline, StatsSummary};

/// Load a dataset file and run the full statistics pipeline on `device`.
pub fn analyze_file(path: &Path, device: &dyn ComputeDevice) -> Result<StatsSummary> {
    let values = dataset::load_values(path)?;
    let summary = aggregate::run_pipeline(device, &values)?;
    Ok(summary)
}
