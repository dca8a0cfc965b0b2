//! The statistics pipeline: sequences reductions, the squared-deviation
//! transform, and histogram binning into one summary record.

use std::time::Instant;

use crate::accel::{CombineOp, ComputeDevice};
use crate::aggregate::histogram::{build_histogram, percentile_markers};
use crate::aggregate::reduce::reduce;
use crate::aggregate::transform::squared_deviations;
use crate::aggregate::StatsError;

/// Result record for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct StatsSummary {
    pub count: usize,
    pub mean: f32,
    pub minimum: f32,
    pub maximum: f32,
    pub variance: f32,
    pub std_dev: f32,
    pub p25: f32,
    pub median: f32,
    pub p75: f32,
    pub duration_us: u64,
}

/// Run the full pipeline over an immutable value buffer.
///
/// Steps run strictly in sequence -- each depends on an earlier result
/// (the mean feeds the deviation transform, min/max feed the histogram).
/// Any failure aborts the remaining steps; there is no partial summary.
pub fn run_pipeline(
    device: &dyn ComputeDevice,
    values: &[f32],
) -> Result<StatsSummary, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let started = Instant::now();
    let count = values.len();
    let n = count as f32;

    let sum = reduce(device, values, CombineOp::Add)?;
    let mean = sum / n;

    let maximum = reduce(device, values, CombineOp::Max)?;
    let minimum = reduce(device, values, CombineOp::Min)?;

    let deviations = squared_deviations(device, values, mean)?;
    let variance = reduce(device, &deviations, CombineOp::Add)? / n;
    let std_dev = variance.sqrt();

    let bins = build_histogram(device, values, minimum, maximum)?;
    let markers = percentile_markers(&bins, count, minimum);

    let duration_us = started.elapsed().as_micros() as u64;
    tracing::info!(
        device = device.name(),
        count,
        duration_us,
        "Statistics pipeline complete"
    );

    Ok(StatsSummary {
        count,
        mean,
        minimum,
        maximum,
        variance,
        std_dev,
        p25: markers.p25,
        median: markers.median,
        p75: markers.p75,
        duration_us,
    })
}
