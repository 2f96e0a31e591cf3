//! Workload configuration structures.

use serde::{Deserialize, Serialize};

/// Descriptor for one element-wise addition workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddProblem {
    pub len: usize,
}

impl AddProblem {
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    /// One addition per element.
    pub fn flops(&self) -> f64 {
        self.len as f64
    }

    pub fn data_footprint_bytes(&self) -> usize {
        // Two buffers read, one written, all f32.
        3 * self.len * std::mem::size_of::<f32>()
    }
}
