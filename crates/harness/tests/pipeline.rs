//! End-to-end pipeline tests: generate → execute → verify → report.

use anyhow::Result;
use vecbench_backend_gpu::runtime::GpuAdd;
use vecbench_harness::runner::{run, BenchmarkConfig};
use vecbench_harness::verifier::Verifier;
use vecbench_kernels::add::{AddStrategy, SequentialAdd, ThreadedAdd};
use vecbench_kernels::registry::StrategyRegistry;

#[test]
fn host_pipeline_is_consistent() -> Result<()> {
    let registry = StrategyRegistry::with_host_strategies();
    let config = BenchmarkConfig {
        element_count: 100_003,
        worker_count: 4,
        seed: 42,
    };
    let report = run(&config, &registry)?;
    assert!(report.verification.is_consistent());
    assert_eq!(report.timings.len(), 2);
    assert!(report.device.is_none());
    Ok(())
}

#[test]
fn empty_pipeline_is_a_noop_with_zero_durations() -> Result<()> {
    let registry = StrategyRegistry::with_host_strategies();
    let config = BenchmarkConfig {
        element_count: 0,
        worker_count: 3,
        seed: 7,
    };
    let report = run(&config, &registry)?;
    assert!(report.verification.is_consistent());
    assert_eq!(report.timings.len(), 2);
    for timing in &report.timings {
        assert_eq!(timing.duration.micros(), Some(0));
    }
    Ok(())
}

#[test]
fn full_pipeline_with_accelerator() -> Result<()> {
    let gpu = match GpuAdd::new() {
        Ok(gpu) => gpu,
        Err(err) => {
            eprintln!("skipping accelerator pipeline test: {err}");
            return Ok(());
        }
    };

    let mut registry = StrategyRegistry::new();
    registry.register(SequentialAdd::new());
    registry.register(gpu);
    registry.register(ThreadedAdd::new());

    let config = BenchmarkConfig {
        element_count: 8,
        worker_count: 2,
        seed: 1,
    };
    let report = run(&config, &registry)?;
    assert!(report.verification.is_consistent());
    assert_eq!(report.timings.len(), 3);
    assert!(report.device.is_some());
    Ok(())
}

#[test]
fn accelerator_handles_non_divisible_fan_out() -> Result<()> {
    let gpu = match GpuAdd::new() {
        Ok(gpu) => gpu,
        Err(err) => {
            eprintln!("skipping accelerator fan-out test: {err}");
            return Ok(());
        }
    };

    let a: Vec<f32> = (0..1003).map(|i| i as f32 * 0.001).collect();
    let b: Vec<f32> = (0..1003).map(|i| (1003 - i) as f32 * 0.002).collect();
    let reference = SequentialAdd::new().execute(&a, &b, 1)?;
    let offloaded = gpu.execute(&a, &b, 7)?;

    let verifier = Verifier::new();
    let result = verifier.verify(&[
        ("sequential", reference.output.as_slice()),
        ("gpu-wgpu", offloaded.output.as_slice()),
    ])?;
    assert!(result.is_consistent());
    Ok(())
}
