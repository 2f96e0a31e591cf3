//! Benchmark report model, text rendering, and JSON persistence.

use crate::verifier::VerificationResult;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use vecbench_kernels::timing::StrategyDuration;

/// Duration of one strategy, as reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyTiming {
    pub strategy: String,
    pub duration: StrategyDuration,
}

/// Complete outcome of one benchmark run.
///
/// When verification fails the timings are withheld: the harness declines
/// to report durations it cannot trust.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Device used by the accelerator strategy, if one ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub element_count: usize,
    pub worker_count: usize,
    pub verification: VerificationResult,
    /// Per-strategy durations; empty when verification failed.
    pub timings: Vec<StrategyTiming>,
}

impl BenchmarkReport {
    /// Render the plain-text report lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(device) = &self.device {
            let _ = writeln!(out, "Accelerator device: {}", device);
        }
        let _ = writeln!(
            out,
            "Using {} workers. Using {} elements.",
            self.worker_count, self.element_count
        );
        match &self.verification {
            VerificationResult::Consistent => {
                let _ = writeln!(out, "Note: all durations are in microseconds.");
                for timing in &self.timings {
                    let _ = writeln!(out, "{:<12} {}", timing.strategy, timing.duration);
                }
            }
            VerificationResult::Inconsistent { mismatch } => {
                let _ = writeln!(
                    out,
                    "Results are not consistent: '{}' diverges from the reference at index {} ({} vs {})",
                    mismatch.strategy, mismatch.index, mismatch.candidate, mismatch.reference
                );
            }
        }
        out
    }

    /// Save the report as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
