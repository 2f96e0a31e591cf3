//! CLI wiring for the vecbench binary.

use crate::runner::{run, BenchmarkConfig};
use crate::verifier::VerificationResult;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use vecbench_backend_gpu::runtime::GpuAdd;
use vecbench_kernels::add::{SequentialAdd, ThreadedAdd};
use vecbench_kernels::registry::StrategyRegistry;

#[derive(Parser, Debug)]
#[command(name = "vecbench", about = "Vector-addition strategy micro-benchmark")]
pub struct Cli {
    /// Number of elements in each input vector.
    #[arg(short = 'c', long = "count", default_value_t = 1)]
    pub count: usize,

    /// Worker fan-out for the threaded and accelerator strategies.
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Workload seed; drawn from entropy when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the report as JSON to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let gpu = GpuAdd::new().context("no accelerator device available")?;

    // Sequential first: it is the verification reference.
    let mut registry = StrategyRegistry::new();
    registry.register(SequentialAdd::new());
    registry.register(gpu);
    registry.register(ThreadedAdd::new());

    let config = BenchmarkConfig {
        element_count: cli.count,
        worker_count: cli.threads,
        seed: cli.seed.unwrap_or_else(|| fastrand::u64(..)),
    };

    let report = run(&config, &registry)?;
    print!("{}", report.render());

    if let Some(path) = &cli.output {
        report
            .save(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    if let VerificationResult::Inconsistent { mismatch } = &report.verification {
        bail!(
            "strategy '{}' diverged from the reference at index {}; durations withheld",
            mismatch.strategy,
            mismatch.index
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_element_one_worker() {
        let cli = Cli::try_parse_from(["vecbench"]).expect("parse");
        assert_eq!(cli.count, 1);
        assert_eq!(cli.threads, 1);
        assert!(cli.seed.is_none());
        assert!(cli.output.is_none());
    }

    #[test]
    fn short_flags_set_count_and_threads() {
        let cli = Cli::try_parse_from(["vecbench", "-c", "1000000", "-t", "8"]).expect("parse");
        assert_eq!(cli.count, 1_000_000);
        assert_eq!(cli.threads, 8);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["vecbench", "--frobnicate"]).is_err());
        assert!(Cli::try_parse_from(["vecbench", "-x"]).is_err());
    }
}
