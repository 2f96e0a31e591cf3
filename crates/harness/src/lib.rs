//! Benchmark harness: workload generation, verification, orchestration.
//!
//! The pipeline is generator → strategies → verifier → report. Inputs are
//! generated once and every strategy consumes the same borrowed slices
//! while owning its private output; durations are only reported when all
//! outputs agree within tolerance.

pub mod cli;
pub mod report;
pub mod runner;
pub mod verifier;
pub mod workload;

pub use cli::{run_cli, Cli};
pub use report::{BenchmarkReport, StrategyTiming};
pub use runner::{run, BenchmarkConfig, StrategyRun};
pub use verifier::{Mismatch, VerificationResult, Verifier};
pub use workload::Workload;
