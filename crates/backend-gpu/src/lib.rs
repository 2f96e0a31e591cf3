//! Accelerator offload interface for vecbench.

pub mod planner;
pub mod runtime;

pub use planner::*;
pub use runtime::*;
