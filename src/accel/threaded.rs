//! Threaded CPU backend -- work-groups run in parallel via rayon.
//!
//! Each reduction tile owns a disjoint contiguous region of the buffer
//! (`span * stride` elements), so tiles can be handed to the pool as
//! `par_chunks_mut` with no shared mutable state. Histogram increments go
//! through atomics, matching the race-free guarantee the kernel contract
//! promises.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use super::{ComputeDevice, ComputeError, DispatchTiming, Grid, KernelArgs};

const DEFAULT_GROUP_LIMIT: usize = 256;

#[derive(Debug)]
pub struct ThreadedDevice {
    group_limit: usize,
}

impl ThreadedDevice {
    pub fn new() -> Self {
        Self::with_group_limit(DEFAULT_GROUP_LIMIT)
    }

    /// Override the reported group-size limit (tests force degenerate
    /// partitionings through this).
    pub fn with_group_limit(group_limit: usize) -> Self {
        Self { group_limit }
    }
}

impl Default for ThreadedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeDevice for ThreadedDevice {
    fn name(&self) -> &'static str {
        "threaded"
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
                let elements = grid.elements;
                // One chunk per tile. Chunking may also produce trailing
                // chunks that hold only padding left over from earlier
                // passes; those cover no live element ids and are skipped.
                buffer
                    .par_chunks_mut(span * stride)
                    .enumerate()
                    .for_each(|(tile, chunk)| {
                        let first = tile * span;
                        if first >= elements {
                            return;
                        }
                        let last = ((tile + 1) * span).min(elements);
                        let mut acc = chunk[0];
                        for local in 1..last - first {
                            acc = op.apply(acc, chunk[local * stride]);
                        }
                        chunk[0] = acc;
                    });
            }
            KernelArgs::SquaredDeviation { buffer, mean } => {
                buffer[..grid.elements]
                    .par_chunks_mut(grid.group_size)
                    .for_each(|group| {
                        for value in group {
                            let dev = *value - mean;
                            *value = dev * dev;
                        }
                    });
            }
            KernelArgs::Histogram {
                input,
                bins,
                origin,
            } => {
                let counters: Vec<AtomicU64> =
                    (0..bins.len()).map(|_| AtomicU64::new(0)).collect();
                let top = bins.len() - 1;
                input[..grid.elements].par_iter().for_each(|&value| {
                    let bin = (((value - origin) * 10.0).floor() as usize).min(top);
                    counters[bin].fetch_add(1, Ordering::Relaxed);
                });
                for (bin, counter) in bins.iter_mut().zip(counters) {
                    *bin = counter.into_inner();
                }
            }
        }

        Ok(DispatchTiming {
            duration_us: started.elapsed().as_micros() as u64,
        })
    }
}
