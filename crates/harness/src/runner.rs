//! Orchestration: generate → execute → verify → report.

use crate::report::{BenchmarkReport, StrategyTiming};
use crate::verifier::{VerificationResult, Verifier};
use crate::workload::Workload;
use anyhow::{ensure, Context, Result};
use tracing::{info, warn};
use vecbench_kernels::add::StrategyResult;
use vecbench_kernels::registry::StrategyRegistry;

/// Configuration for one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Length of each input vector.
    pub element_count: usize,
    /// Worker fan-out for the threaded and accelerator strategies.
    pub worker_count: usize,
    /// Seed for workload generation.
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            element_count: 1,
            worker_count: 1,
            seed: 0,
        }
    }
}

/// One executed strategy with its private output and duration.
pub struct StrategyRun {
    pub strategy: String,
    pub result: StrategyResult,
}

/// Run every registered strategy over one shared workload and verify the
/// outputs against the first strategy's.
///
/// Each strategy owns its output exclusively; the inputs are shared
/// read-only borrows, so no strategy can contaminate another's data or
/// timing. Verification failure withholds all timings from the report.
pub fn run(config: &BenchmarkConfig, registry: &StrategyRegistry) -> Result<BenchmarkReport> {
    info!(
        elements = config.element_count,
        workers = config.worker_count,
        strategies = registry.strategies().len(),
        "starting benchmark run"
    );
    let workload = Workload::generate(config.element_count, config.seed);

    let mut runs = Vec::with_capacity(registry.strategies().len());
    for strategy in registry.strategies() {
        let result = strategy
            .execute(&workload.a, &workload.b, config.worker_count)
            .with_context(|| format!("strategy '{}' failed", strategy.name()))?;
        ensure!(
            result.output.len() == workload.len(),
            "strategy '{}' produced {} elements, expected {}",
            strategy.name(),
            result.output.len(),
            workload.len()
        );
        info!(
            strategy = strategy.name(),
            duration = %result.duration,
            "strategy completed"
        );
        runs.push(StrategyRun {
            strategy: strategy.name().to_string(),
            result,
        });
    }

    let outputs: Vec<(&str, &[f32])> = runs
        .iter()
        .map(|run| (run.strategy.as_str(), run.result.output.as_slice()))
        .collect();
    let verification = Verifier::new().verify(&outputs)?;

    let device = registry
        .strategies()
        .iter()
        .find_map(|strategy| strategy.device_description());

    let timings = match &verification {
        VerificationResult::Consistent => runs
            .iter()
            .map(|run| StrategyTiming {
                strategy: run.strategy.clone(),
                duration: run.result.duration,
            })
            .collect(),
        VerificationResult::Inconsistent { mismatch } => {
            warn!(
                strategy = %mismatch.strategy,
                index = mismatch.index,
                "strategy outputs diverged; withholding durations"
            );
            Vec::new()
        }
    };

    Ok(BenchmarkReport {
        device,
        element_count: config.element_count,
        worker_count: config.worker_count,
        verification,
        timings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecbench_kernels::add::{AddStrategy, SequentialAdd};
    use vecbench_kernels::timing::StrategyDuration;

    /// Computes the sum correctly, then nudges one element past tolerance.
    struct CorruptedAdd;

    impl AddStrategy for CorruptedAdd {
        fn name(&self) -> &'static str {
            "corrupted"
        }

        fn execute(&self, a: &[f32], b: &[f32], workers: usize) -> Result<StrategyResult> {
            let mut result = SequentialAdd::new().execute(a, b, workers)?;
            if let Some(value) = result.output.get_mut(3) {
                *value += 0.02;
            }
            Ok(result)
        }
    }

    #[test]
    fn host_strategies_agree_and_timings_are_reported() {
        let registry = StrategyRegistry::with_host_strategies();
        let config = BenchmarkConfig {
            element_count: 1003,
            worker_count: 4,
            seed: 42,
        };
        let report = run(&config, &registry).expect("run");
        assert!(report.verification.is_consistent());
        assert_eq!(report.timings.len(), 2);
        assert_eq!(report.timings[0].strategy, "sequential");
        assert!(report.device.is_none());
        for timing in &report.timings {
            assert!(matches!(timing.duration, StrategyDuration::HostTimed(_)));
        }
    }

    #[test]
    fn corruption_withholds_timings() {
        let mut registry = StrategyRegistry::with_host_strategies();
        registry.register(CorruptedAdd);
        let config = BenchmarkConfig {
            element_count: 16,
            worker_count: 2,
            seed: 7,
        };
        let report = run(&config, &registry).expect("run");
        match &report.verification {
            VerificationResult::Inconsistent { mismatch } => {
                assert_eq!(mismatch.strategy, "corrupted");
                assert_eq!(mismatch.index, 3);
            }
            VerificationResult::Consistent => panic!("corruption went undetected"),
        }
        assert!(report.timings.is_empty());
    }

    #[test]
    fn empty_workload_reports_zero_durations() {
        let registry = StrategyRegistry::with_host_strategies();
        let config = BenchmarkConfig {
            element_count: 0,
            worker_count: 3,
            seed: 1,
        };
        let report = run(&config, &registry).expect("run");
        assert!(report.verification.is_consistent());
        for timing in &report.timings {
            assert_eq!(timing.duration.micros(), Some(0));
        }
    }
}
