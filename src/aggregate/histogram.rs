//! Histogram binning and percentile markers.

use crate::accel::{ComputeDevice, Grid, KernelArgs};
use crate::aggregate::partition::choose_partition;
use crate::aggregate::StatsError;

/// Bins per unit of the input domain (bin width 0.1).
const BINS_PER_UNIT: f32 = 10.0;

/// Count `values` into fixed-width 0.1 bins spanning `[minimum, maximum]`.
///
/// `bin_count = floor((maximum - minimum) * 10) + 1`; each element lands in
/// `floor((value - minimum) * 10)` via one dispatch with atomic increments.
/// The input must be the original, unpadded buffer -- reduction padding fed
/// through here would shift every percentile whenever the true minimum is
/// not 0.
pub fn build_histogram(
    device: &dyn ComputeDevice,
    values: &[f32],
    minimum: f32,
    maximum: f32,
) -> Result<Vec<u64>, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    if maximum < minimum {
        return Err(StatsError::InvalidRange { minimum, maximum });
    }

    let bin_count = ((maximum - minimum) * BINS_PER_UNIT).floor() as usize + 1;
    let mut bins = vec![0u64; bin_count];

    let group_size = choose_partition(values.len(), device.max_group_size());
    let timing = device.dispatch(
        Grid {
            elements: values.len(),
            group_size,
        },
        KernelArgs::Histogram {
            input: values,
            bins: &mut bins,
            origin: minimum,
        },
    )?;
    tracing::debug!(
        kernel = "histogram",
        elements = values.len(),
        bin_count,
        group_size,
        duration_us = timing.duration_us,
        "Histogram dispatch complete"
    );
    Ok(bins)
}

/// Quartile estimates derived from a histogram walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileMarkers {
    pub p25: f32,
    pub median: f32,
    pub p75: f32,
}

/// Walk the bins in ascending order and emit each marker at the lower edge
/// of the first bin whose cumulative count reaches its rank. Ranks are
/// `ceil(N/4)`, `ceil(N/2)` and `ceil(3N/4)`; ties therefore always resolve
/// to the earliest qualifying bin.
pub fn percentile_markers(bins: &[u64], count: usize, minimum: f32) -> PercentileMarkers {
    let ranks = [
        count.div_ceil(4) as u64,
        count.div_ceil(2) as u64,
        (3 * count).div_ceil(4) as u64,
    ];
    let mut markers = [minimum; 3];
    let mut found = [false; 3];

    let mut cumulative = 0u64;
    for (index, &bin) in bins.iter().enumerate() {
        cumulative += bin;
        let edge = index as f32 / BINS_PER_UNIT + minimum;
        for slot in 0..3 {
            if !found[slot] && cumulative >= ranks[slot] {
                found[slot] = true;
                markers[slot] = edge;
            }
        }
    }

    PercentileMarkers {
        p25: markers[0],
        median: markers[1],
        p75: markers[2],
    }
}
