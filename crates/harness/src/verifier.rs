//! Numerical equivalence checking across strategy outputs.

use anyhow::{ensure, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use vecbench_kernels::partition::{partition_ranges, Partition};

/// Maximum absolute difference still considered equivalent.
///
/// Chosen to absorb floating-point accumulation differences between
/// summation orders and backends, not to hide correctness bugs.
pub const DEFAULT_TOLERANCE: f32 = 0.01;

/// First observed divergence between a strategy output and the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub strategy: String,
    pub index: usize,
    pub reference: f32,
    pub candidate: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum VerificationResult {
    Consistent,
    Inconsistent { mismatch: Mismatch },
}

impl VerificationResult {
    pub fn is_consistent(&self) -> bool {
        matches!(self, VerificationResult::Consistent)
    }
}

/// Compares every strategy output against the first one, index by index,
/// fanning the scan out across disjoint partitions.
pub struct Verifier {
    tolerance: f32,
    fan_out: usize,
}

impl Verifier {
    /// Verifier with the default tolerance, fanned out over half the
    /// available hardware threads (minimum one).
    pub fn new() -> Self {
        let fan_out = std::thread::available_parallelism()
            .map(|n| n.get() / 2)
            .unwrap_or(1)
            .max(1);
        Self {
            tolerance: DEFAULT_TOLERANCE,
            fan_out,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out.max(1);
        self
    }

    /// Decide equivalence of all outputs; `outputs[0]` is the reference.
    ///
    /// Fewer than two outputs, or zero-length outputs, are vacuously
    /// consistent. Differing lengths are a harness bug and reported as an
    /// error rather than a numerical mismatch.
    pub fn verify(&self, outputs: &[(&str, &[f32])]) -> Result<VerificationResult> {
        if outputs.len() < 2 {
            return Ok(VerificationResult::Consistent);
        }
        let (_, reference) = outputs[0];
        let candidates = &outputs[1..];
        for (name, output) in candidates {
            ensure!(
                output.len() == reference.len(),
                "output length mismatch for '{}': {} vs reference {}",
                name,
                output.len(),
                reference.len()
            );
        }

        let mismatch = partition_ranges(reference.len(), self.fan_out)
            .into_par_iter()
            .find_map_any(|part| self.scan_partition(part, reference, candidates));

        Ok(match mismatch {
            None => VerificationResult::Consistent,
            Some(mismatch) => VerificationResult::Inconsistent { mismatch },
        })
    }

    /// Scan one partition, stopping at its first mismatch.
    fn scan_partition(
        &self,
        part: Partition,
        reference: &[f32],
        candidates: &[(&str, &[f32])],
    ) -> Option<Mismatch> {
        for index in part.start..part.stop {
            let expected = reference[index];
            for (name, output) in candidates {
                let actual = output[index];
                if (actual - expected).abs() > self.tolerance {
                    return Some(Mismatch {
                        strategy: (*name).to_string(),
                        index,
                        reference: expected,
                        candidate: actual,
                    });
                }
            }
        }
        None
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}
