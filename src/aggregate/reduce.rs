//! Multi-pass tree reduction over a device buffer.

use crate::accel::{CombineOp, ComputeDevice, Grid, KernelArgs};
use crate::aggregate::partition::choose_partition;
use crate::aggregate::StatsError;

/// First-pass alignment: the working copy is padded to a multiple of this
/// before any dispatch, so the opening pass has a uniform shape.
pub const REDUCE_BLOCK: usize = 16;

/// Reduce `values` to a single scalar with `op`.
///
/// Works on a padded copy; the input is never mutated. Padding uses the
/// op-specific neutral element -- zero-padding a min/max reduction would
/// corrupt results whenever the data sits entirely on one side of zero.
///
/// Each pass combines contiguous spans of strided elements in place and
/// compacts the survivors toward the front of the buffer:
/// `remaining = ceil(remaining / span)` (a ragged trailing span counts as one
/// extra partial group) and `stride *= span`. Every dispatch blocks before
/// the next pass is issued, because each pass reads the previous pass's
/// output. When the partitioner can only offer a group of 1 (remaining is
/// prime and above the device limit), the pass falls back to single-item
/// groups spanning two strided elements so the reduction still terminates.
pub fn reduce(
    device: &dyn ComputeDevice,
    values: &[f32],
    op: CombineOp,
) -> Result<f32, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let mut buffer = values.to_vec();
    let tail = buffer.len() % REDUCE_BLOCK;
    if tail != 0 {
        buffer.resize(buffer.len() + (REDUCE_BLOCK - tail), op.neutral());
    }

    let limit = device.max_group_size();
    let mut stride: usize = 1;
    let mut remaining = buffer.len();
    let mut passes = 0u32;

    while remaining > 1 {
        let chosen = choose_partition(remaining, limit);
        let (span, group_size) = if chosen > 1 { (chosen, chosen) } else { (2, 1) };

        let timing = device.dispatch(
            Grid {
                elements: remaining,
                group_size,
            },
            KernelArgs::Combine {
                buffer: &mut buffer,
                op,
                stride,
                span,
            },
        )?;
        passes += 1;
        tracing::debug!(
            kernel = op.kernel_name(),
            pass = passes,
            elements = remaining,
            group_size,
            span,
            duration_us = timing.duration_us,
            "Reduction pass complete"
        );

        remaining = remaining.div_ceil(span);
        stride *= span;
    }

    Ok(buffer[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::cpu::CpuDevice;
    use crate::accel::threaded::ThreadedDevice;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn devices_with_limit(limit: usize) -> Vec<Box<dyn ComputeDevice>> {
        vec![
            Box::new(CpuDevice::with_group_limit(limit)),
            Box::new(ThreadedDevice::with_group_limit(limit)),
        ]
    }

    // Limits the sum property must hold under: 1 forces the pairwise
    // fallback, 17 and 31 are prime, 10_000 exceeds every test input.
    const LIMITS: [usize; 5] = [1, 4, 17, 31, 10_000];

    #[test]
    fn sum_matches_arithmetic_sum_across_group_limits() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in [1usize, 5, 16, 17, 160, 251] {
            let values: Vec<f32> = (0..len).map(|_| rng.gen_range(-50.0..50.0)).collect();
            let expected: f64 = values.iter().map(|&v| v as f64).sum();
            for limit in LIMITS {
                for device in devices_with_limit(limit) {
                    let got = reduce(device.as_ref(), &values, CombineOp::Add).unwrap();
                    let tolerance = 1e-3 * (len as f64).max(1.0);
                    assert!(
                        (got as f64 - expected).abs() < tolerance,
                        "len={len} limit={limit} device={} got={got} expected={expected}",
                        device.name()
                    );
                }
            }
        }
    }

    #[test]
    fn min_and_max_are_exact_including_padded_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        // Length 1, exact multiple of 16, and one past a multiple of 16.
        for len in [1usize, 32, 33] {
            let values: Vec<f32> = (0..len).map(|_| rng.gen_range(-100.0..100.0)).collect();
            let true_min = values.iter().cloned().fold(f32::INFINITY, f32::min);
            let true_max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            for limit in LIMITS {
                for device in devices_with_limit(limit) {
                    assert_eq!(
                        reduce(device.as_ref(), &values, CombineOp::Min).unwrap(),
                        true_min
                    );
                    assert_eq!(
                        reduce(device.as_ref(), &values, CombineOp::Max).unwrap(),
                        true_max
                    );
                }
            }
        }
    }

    /// Padding must be op-neutral: an all-positive dataset's minimum is not
    /// 0.0, and an all-negative dataset's maximum is not 0.0.
    #[test]
    fn padding_never_leaks_into_min_max() {
        let positives = vec![3.5f32; 17]; // forces padding to 32
        let negatives = vec![-3.5f32; 17];
        let device = CpuDevice::new();
        assert_eq!(reduce(&device, &positives, CombineOp::Min).unwrap(), 3.5);
        assert_eq!(reduce(&device, &negatives, CombineOp::Max).unwrap(), -3.5);
    }

    #[test]
    fn single_element_reduction_is_a_no_op() {
        let device = ThreadedDevice::new();
        for op in [CombineOp::Add, CombineOp::Min, CombineOp::Max] {
            assert_eq!(reduce(&device, &[42.5], op).unwrap(), 42.5);
        }
    }

    #[test]
    fn empty_input_fails_fast() {
        let device = CpuDevice::new();
        assert!(matches!(
            reduce(&device, &[], CombineOp::Add),
            Err(StatsError::EmptyInput)
        ));
    }

    #[test]
    fn input_buffer_is_not_mutated() {
        let values = vec![5.0f32, -1.0, 2.0];
        let snapshot = values.clone();
        let device = ThreadedDevice::new();
        reduce(&device, &values, CombineOp::Add).unwrap();
        assert_eq!(values, snapshot);
    }
}
