//! Elementwise transforms over a value buffer.

use crate::accel::{ComputeDevice, Grid, KernelArgs};
use crate::aggregate::partition::choose_partition;
use crate::aggregate::StatsError;

/// Apply `x -> (x - mean)^2` across `values` with one dispatch.
///
/// The kernel runs in place on a copy, so the caller's buffer is never
/// observably mutated regardless of how the backend reuses memory.
pub fn squared_deviations(
    device: &dyn ComputeDevice,
    values: &[f32],
    mean: f32,
) -> Result<Vec<f32>, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let mut deviations = values.to_vec();
    let group_size = choose_partition(deviations.len(), device.max_group_size());
    let timing = device.dispatch(
        Grid {
            elements: deviations.len(),
            group_size,
        },
        KernelArgs::SquaredDeviation {
            buffer: &mut deviations,
            mean,
        },
    )?;
    tracing::debug!(
        kernel = "diff_squared",
        elements = deviations.len(),
        group_size,
        duration_us = timing.duration_us,
        "Transform dispatch complete"
    );
    Ok(deviations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::cpu::CpuDevice;
    use crate::accel::threaded::ThreadedDevice;

    #[test]
    fn squares_deviation_from_the_parameter() {
        let values = vec![1.0f32, 2.0, 3.0, 4.0, 5.0];
        for device in [
            Box::new(CpuDevice::new()) as Box<dyn ComputeDevice>,
            Box::new(ThreadedDevice::new()),
        ] {
            let out = squared_deviations(device.as_ref(), &values, 3.0).unwrap();
            assert_eq!(out, vec![4.0, 1.0, 0.0, 1.0, 4.0]);
        }
    }

    #[test]
    fn input_is_left_untouched() {
        let values = vec![1.5f32, -2.5];
        let snapshot = values.clone();
        squared_deviations(&CpuDevice::new(), &values, 0.5).unwrap();
        assert_eq!(values, snapshot);
    }

    #[test]
    fn output_length_matches_input_length() {
        let values = vec![0.25f32; 37]; // prime length, partitioner returns 1
        let out = squared_deviations(&ThreadedDevice::new(), &values, 0.0).unwrap();
        assert_eq!(out.len(), values.len());
    }
}
