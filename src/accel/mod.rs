//! Compute capability layer -- abstract device dispatch for the aggregation engine.
//!
//! The engine never talks to a concrete backend directly. It sees a
//! [`ComputeDevice`]: something that reports a maximum work-group size and
//! executes named kernels over N elements partitioned into groups, blocking
//! until the dispatch completes and reporting how long it took. Backends
//! implement the same kernel contracts once each; the engine stays identical
//! across them.

pub mod cpu;
pub mod threaded;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("work-group size {requested} exceeds device limit {limit}")]
    GroupTooLarge { requested: usize, limit: usize },

    #[error("work-group size must be at least 1")]
    ZeroGroup,

    #[error("dispatch over zero elements")]
    EmptyDispatch,

    #[error("unknown device '{0}' (expected one of: auto, threaded, cpu)")]
    UnknownDevice(String),
}

/// Binary combining operations supported by the reduction kernel.
///
/// All three are commutative and associative, so group-local combine order
/// inside a dispatch does not affect the result (beyond float rounding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    Add,
    Min,
    Max,
}

impl CombineOp {
    /// The value that leaves this operation's result unchanged. Reduction
    /// padding must use this, never a blanket zero: padding a min reduction
    /// with 0.0 would clobber any all-positive dataset's minimum.
    pub fn neutral(self) -> f32 {
        match self {
            CombineOp::Add => 0.0,
            CombineOp::Min => f32::INFINITY,
            CombineOp::Max => f32::NEG_INFINITY,
        }
    }

    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            CombineOp::Add => a + b,
            CombineOp::Min => a.min(b),
            CombineOp::Max => a.max(b),
        }
    }

    /// Kernel name, for logs.
    pub fn kernel_name(self) -> &'static str {
        match self {
            CombineOp::Add => "reduce_add",
            CombineOp::Min => "reduce_min",
            CombineOp::Max => "reduce_max",
        }
    }
}

/// Launch shape for one dispatch: how many elements the kernel covers and
/// how wide each work-group is.
#[derive(Debug, Clone, Copy)]
pub struct Grid {
    pub elements: usize,
    pub group_size: usize,
}

impl Grid {
    /// Every backend checks legality before touching a buffer.
    pub fn validate(&self, limit: usize) -> Result<(), ComputeError> {
        if self.elements == 0 {
            return Err(ComputeError::EmptyDispatch);
        }
        if self.group_size == 0 {
            return Err(ComputeError::ZeroGroup);
        }
        if self.group_size > limit {
            return Err(ComputeError::GroupTooLarge {
                requested: self.group_size,
                limit,
            });
        }
        Ok(())
    }
}

/// Named kernels with their scalar/buffer arguments.
///
/// `Combine` is the tree-reduction pass: element ids `0..elements` are tiled
/// into contiguous spans of `span`; each tile folds `buffer[id * stride]` for
/// its ids with `op` and writes the result to the tile's first strided slot
/// (`tile * span * stride`). A trailing ragged tile folds whatever ids remain.
/// `span` normally equals the group size; a device limited to single-item
/// groups still makes progress with `group_size = 1, span = 2`.
///
/// `SquaredDeviation` maps `x -> (x - mean)^2` over the buffer in place.
///
/// `Histogram` computes `floor((input[id] - origin) * 10.0)` per element and
/// increments that bin; increments are race-free within the dispatch. Callers
/// pass pre-zeroed bins.
pub enum KernelArgs<'a> {
    Combine {
        buffer: &'a mut [f32],
        op: CombineOp,
        stride: usize,
        span: usize,
    },
    SquaredDeviation {
        buffer: &'a mut [f32],
        mean: f32,
    },
    Histogram {
        input: &'a [f32],
        bins: &'a mut [u64],
        origin: f32,
    },
}

impl KernelArgs<'_> {
    pub fn kernel_name(&self) -> &'static str {
        match self {
            KernelArgs::Combine { op, .. } => op.kernel_name(),
            KernelArgs::SquaredDeviation { .. } => "diff_squared",
            KernelArgs::Histogram { .. } => "histogram",
        }
    }
}

/// Profiling record for one completed dispatch.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DispatchTiming {
    pub duration_us: u64,
}

/// The device capability the engine is written against.
///
/// `dispatch` is synchronous: when it returns, the kernel's effects are
/// visible in the argument buffers and the timing covers the whole execution.
pub trait ComputeDevice: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Maximum legal work-group size for any kernel on this device.
    fn max_group_size(&self) -> usize;

    fn dispatch(&self, grid: Grid, args: KernelArgs<'_>) -> Result<DispatchTiming, ComputeError>;
}

/// Resolve a device by name. `auto` prefers the threaded backend.
pub fn select_device(
    name: &str,
    group_limit: Option<usize>,
) -> Result<Box<dyn ComputeDevice>, ComputeError> {
    let device: Box<dyn ComputeDevice> = match name {
        "auto" | "threaded" => Box::new(match group_limit {
            Some(limit) => threaded::ThreadedDevice::with_group_limit(limit),
            None => threaded::ThreadedDevice::new(),
        }),
        "cpu" => Box::new(match group_limit {
            Some(limit) => cpu::CpuDevice::with_group_limit(limit),
            None => cpu::CpuDevice::new(),
        }),
        other => return Err(ComputeError::UnknownDevice(other.to_string())),
    };

    tracing::info!(
        device = device.name(),
        max_group_size = device.max_group_size(),
        "Compute device selected"
    );
    Ok(device)
}

/// Backend roster for `list-devices`: (name, default group limit).
pub fn available_devices() -> Vec<(&'static str, usize)> {
    vec![
        ("threaded", threaded::ThreadedDevice::new().max_group_size()),
        ("cpu", cpu::CpuDevice::new().max_group_size()),
    ]
}
