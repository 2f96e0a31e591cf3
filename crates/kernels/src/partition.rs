//! Index partitioning shared by the host strategies and the verifier.

use serde::{Deserialize, Serialize};

/// A contiguous half-open index range `[start, stop)` assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub start: usize,
    pub stop: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }
}

/// Split `[0, len)` into `workers` contiguous partitions.
///
/// The partitions are pairwise disjoint and their union is exactly
/// `[0, len)`; the last partition absorbs the remainder when `len` is not
/// evenly divisible. `workers == 0` is clamped to 1 so the division size is
/// always defined.
pub fn partition_ranges(len: usize, workers: usize) -> Vec<Partition> {
    let workers = workers.max(1);
    let division = len / workers;
    (0..workers)
        .map(|i| Partition {
            start: i * division,
            stop: if i == workers - 1 {
                len
            } else {
                (i + 1) * division
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(len: usize, workers: usize) {
        let parts = partition_ranges(len, workers);
        assert_eq!(parts.len(), workers.max(1));

        let mut covered = vec![0usize; len];
        for part in &parts {
            assert!(part.start <= part.stop);
            assert!(part.stop <= len);
            for i in part.start..part.stop {
                covered[i] += 1;
            }
        }
        assert!(
            covered.iter().all(|&count| count == 1),
            "partitioning of len={} into {} workers left gaps or overlaps",
            len,
            workers
        );
    }

    #[test]
    fn evenly_divisible() {
        assert_exact_cover(8, 2);
        assert_exact_cover(100, 10);
    }

    #[test]
    fn remainder_goes_to_last_partition() {
        let parts = partition_ranges(10, 4);
        assert_eq!(parts[3], Partition { start: 6, stop: 10 });
        assert_exact_cover(10, 4);
        assert_exact_cover(7, 3);
        assert_exact_cover(1_000_003, 8);
    }

    #[test]
    fn more_workers_than_elements() {
        assert_exact_cover(3, 8);
        let parts = partition_ranges(3, 8);
        // Division size is zero, so only the last partition carries work.
        assert!(parts[..7].iter().all(|p| p.is_empty()));
        assert_eq!(parts[7], Partition { start: 0, stop: 3 });
    }

    #[test]
    fn zero_length_is_vacuous() {
        let parts = partition_ranges(0, 4);
        assert!(parts.iter().all(|p| p.is_empty()));
    }

    #[test]
    fn zero_workers_clamps_to_one() {
        let parts = partition_ranges(5, 0);
        assert_eq!(parts, vec![Partition { start: 0, stop: 5 }]);
    }
}
