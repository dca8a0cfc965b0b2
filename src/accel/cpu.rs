//! Scalar reference backend.
//!
//! Runs every kernel contract on a single thread, one element at a time.
//! This is the baseline the parallel backends are checked against; it keeps
//! the exact same tiling and write placement so results are comparable
//! pass-for-pass.

use std::time::Instant;

use super::{ComputeDevice, ComputeError, DispatchTiming, Grid, KernelArgs};

const DEFAULT_GROUP_LIMIT: usize = 64;

#[derive(Debug)]
pub struct CpuDevice {
    group_limit: usize,
}

impl CpuDevice {
    pub fn new() -> Self {
        Self::with_group_limit(DEFAULT_GROUP_LIMIT)
    }

    /// Override the reported group-size limit. Tests use this to force the
    /// engine through awkward partitionings (limit 1, primes, etc.).
    pub fn with_group_limit(group_limit: usize) -> Self {
        Self { group_limit }
    }
}

impl Default for CpuDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeDevice for CpuDevice {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn max_group_size(&self) -> usize {
        self.group_limit
    }

    fn dispatch(&self, grid: Grid, args: KernelArgs<'_>) -> Result<DispatchTiming, ComputeError> {
        grid.validate(self.group_limit)?;
        let started = Instant::now();

        match args {
            KernelArgs::Combine {
                buffer,
                op,
                stride,
                span,
            } => {
                let tiles = grid.elements.div_ceil(span);
                for tile in 0..tiles {
                    let first = tile * span;
                    let last = ((tile + 1) * span).min(grid.elements);
                    let mut acc = buffer[first * stride];
                    for id in first + 1..last {
                        acc = op.apply(acc, buffer[id * stride]);
                    }
                    buffer[first * stride] = acc;
                }
            }
            KernelArgs::SquaredDeviation { buffer, mean } => {
                for value in buffer[..grid.elements].iter_mut() {
                    let dev = *value - mean;
                    *value = dev * dev;
                }
            }
            KernelArgs::Histogram {
                input,
                bins,
                origin,
            } => {
                let top = bins.len() - 1;
                for &value in &input[..grid.elements] {
                    let bin = (((value - origin) * 10.0).floor() as usize).min(top);
                    bins[bin] += 1;
                }
            }
        }

        Ok(DispatchTiming {
            duration_us: started.elapsed().as_micros() as u64,
        })
    }
}
