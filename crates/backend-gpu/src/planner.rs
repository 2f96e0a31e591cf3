//! Offload planning: work-item fan-out sizing.

use anyhow::{bail, Result};
use vecbench_kernels::config::AddProblem;

/// Workgroups wgpu guarantees per dispatch dimension at default limits.
const MAX_FAN_OUT: usize = 65_535;

/// Work-item layout for one offloaded addition.
///
/// Work item `i` covers `[i * division, min((i + 1) * division, len))`.
/// `division` is the ceiling of `len / fan_out`, so every index lands in
/// exactly one item's sub-range and the last item shrinks at the tail.
#[derive(Debug, Clone, Copy)]
pub struct GpuAddPlan {
    pub problem: AddProblem,
    pub fan_out: u32,
    pub division: u32,
}

pub struct GpuPlanner;

impl GpuPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan_add(&self, problem: AddProblem, workers: usize) -> Result<GpuAddPlan> {
        let fan_out = workers.max(1);
        if fan_out > MAX_FAN_OUT {
            bail!(
                "work-item fan-out {} exceeds the dispatch limit {}",
                fan_out,
                MAX_FAN_OUT
            );
        }
        let division = problem.len.div_ceil(fan_out).max(1);
        Ok(GpuAddPlan {
            problem,
            fan_out: fan_out as u32,
            division: division as u32,
        })
    }
}

impl Default for GpuPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays the work-item index arithmetic the shader performs.
    fn item_ranges(plan: &GpuAddPlan) -> Vec<(usize, usize)> {
        (0..plan.fan_out as usize)
            .map(|i| {
                let begin = i * plan.division as usize;
                let end = (begin + plan.division as usize).min(plan.problem.len);
                (begin.min(plan.problem.len), end)
            })
            .collect()
    }

    fn assert_exact_cover(len: usize, workers: usize) {
        let plan = GpuPlanner::new()
            .plan_add(AddProblem::new(len), workers)
            .expect("plan");
        let mut covered = vec![0usize; len];
        for (begin, end) in item_ranges(&plan) {
            for i in begin..end {
                covered[i] += 1;
            }
        }
        assert!(
            covered.iter().all(|&count| count == 1),
            "fan-out of len={} across {} items dropped or duplicated an index",
            len,
            workers
        );
    }

    #[test]
    fn items_cover_every_index_exactly_once() {
        assert_exact_cover(8, 2);
        assert_exact_cover(10, 4);
        assert_exact_cover(7, 3);
        assert_exact_cover(1, 5);
        assert_exact_cover(1_000_003, 64);
    }

    #[test]
    fn zero_length_plans_are_empty() {
        let plan = GpuPlanner::new()
            .plan_add(AddProblem::new(0), 3)
            .expect("plan");
        assert!(item_ranges(&plan).iter().all(|&(b, e)| b == e));
    }

    #[test]
    fn zero_workers_clamps_to_one_item() {
        let plan = GpuPlanner::new()
            .plan_add(AddProblem::new(9), 0)
            .expect("plan");
        assert_eq!(plan.fan_out, 1);
        assert_eq!(plan.division, 9);
    }

    #[test]
    fn oversized_fan_out_is_rejected() {
        let err = GpuPlanner::new().plan_add(AddProblem::new(10), 100_000);
        assert!(err.is_err());
    }
}
