//! Vector-addition strategies sharing one execution contract.

use crate::partition::partition_ranges;
use crate::timing::StrategyDuration;
use anyhow::{ensure, Result};
use std::sync::Arc;
use std::time::Instant;

/// Output buffer and duration produced by one strategy invocation.
#[derive(Debug, Clone)]
pub struct StrategyResult {
    pub output: Vec<f32>,
    pub duration: StrategyDuration,
}

/// One algorithm + execution-model pairing for the benchmark kernel.
///
/// `execute` computes `output[i] = a[i] + b[i]` for every index and times
/// its own execution window only; workload generation and verification are
/// measured elsewhere. Inputs must have equal length. A `workers` of zero
/// is clamped to 1.
pub trait AddStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Device the strategy runs on, for the report header. Host strategies
    /// have no device to name.
    fn device_description(&self) -> Option<String> {
        None
    }

    fn execute(&self, a: &[f32], b: &[f32], workers: usize) -> Result<StrategyResult>;
}

pub type DynAddStrategy = Arc<dyn AddStrategy>;

fn validate_inputs(a: &[f32], b: &[f32]) -> Result<()> {
    ensure!(
        a.len() == b.len(),
        "input length mismatch: {} vs {}",
        a.len(),
        b.len()
    );
    Ok(())
}

/// Single control flow, one pass over all indices. `workers` is ignored.
///
/// This is the timing and correctness baseline the other strategies are
/// judged against.
#[derive(Default)]
pub struct SequentialAdd;

impl SequentialAdd {
    pub fn new() -> Self {
        Self
    }
}

impl AddStrategy for SequentialAdd {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn execute(&self, a: &[f32], b: &[f32], _workers: usize) -> Result<StrategyResult> {
        validate_inputs(a, b)?;
        if a.is_empty() {
            return Ok(StrategyResult {
                output: Vec::new(),
                duration: StrategyDuration::HostTimed(0),
            });
        }
        let mut output = vec![0.0f32; a.len()];

        let start = Instant::now();
        for (out, (x, y)) in output.iter_mut().zip(a.iter().zip(b)) {
            *out = x + y;
        }
        let duration = StrategyDuration::host_window(start);

        Ok(StrategyResult { output, duration })
    }
}

/// One OS thread per partition, each writing a disjoint slice of the
/// shared output.
///
/// The timing window opens before partition computation and closes after
/// the last worker joins: launch/join overhead is part of the strategy's
/// real cost.
#[derive(Default)]
pub struct ThreadedAdd;

impl ThreadedAdd {
    pub fn new() -> Self {
        Self
    }
}

impl AddStrategy for ThreadedAdd {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn execute(&self, a: &[f32], b: &[f32], workers: usize) -> Result<StrategyResult> {
        validate_inputs(a, b)?;
        if a.is_empty() {
            return Ok(StrategyResult {
                output: Vec::new(),
                duration: StrategyDuration::HostTimed(0),
            });
        }
        let mut output = vec![0.0f32; a.len()];

        let start = Instant::now();
        let partitions = partition_ranges(a.len(), workers);
        std::thread::scope(|scope| {
            // Partitions are contiguous and ordered, so carving the output
            // front-to-back hands each worker exactly its own range.
            let mut rest: &mut [f32] = &mut output;
            for part in &partitions {
                let (slot, tail) = std::mem::take(&mut rest).split_at_mut(part.len());
                rest = tail;
                let a_part = &a[part.start..part.stop];
                let b_part = &b[part.start..part.stop];
                scope.spawn(move || {
                    for (out, (x, y)) in slot.iter_mut().zip(a_part.iter().zip(b_part)) {
                        *out = x + y;
                    }
                });
            }
        });
        let duration = StrategyDuration::host_window(start);

        Ok(StrategyResult { output, duration })
    }
}
