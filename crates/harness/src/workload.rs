//! Workload generation shared by every strategy.

use tracing::debug;

/// SplitMix64 increment, used to derive the second task's seed stream.
const SEED_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// The two input vectors every strategy consumes.
///
/// Generated once and treated as read-only afterwards, so all strategies
/// observe bit-identical inputs.
#[derive(Debug, Clone)]
pub struct Workload {
    pub a: Vec<f32>,
    pub b: Vec<f32>,
}

impl Workload {
    /// Fill both vectors concurrently with uniform values over `[0, 1)`.
    ///
    /// Each generation task owns its own seeded source; sharing one mutable
    /// generator across concurrent writers is not sound. Both tasks join
    /// before this returns, and the result is deterministic for a given
    /// `(len, seed)` pair.
    pub fn generate(len: usize, seed: u64) -> Self {
        let (a, b) = std::thread::scope(|scope| {
            let task_a = scope.spawn(move || fill_uniform(len, seed));
            let task_b = scope.spawn(move || fill_uniform(len, seed.wrapping_add(SEED_STREAM)));
            (
                task_a.join().expect("generator task panicked"),
                task_b.join().expect("generator task panicked"),
            )
        });
        debug!(len, seed, "workload generated");
        Self { a, b }
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

fn fill_uniform(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..len).map(|_| rng.f32()).collect()
}
