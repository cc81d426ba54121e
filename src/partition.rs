//! Load-balancing partitioner.
//!
//! Splits jobs into one [`Batch`] per worker so the most loaded worker
//! finishes as early as possible. Job costs are very uneven (a few large
//! photos among many thumbnails and text files), so equal-count chunking
//! leaves most workers idle while one grinds through the big images.
//!
//! The algorithm is greedy longest-processing-time-first (LPT):
//!
//! 1. Sort jobs by estimated cost, descending. The sort is stable, so equal
//!    costs keep their input order.
//! 2. Give each job to the batch with the lowest running cost, breaking ties
//!    by the lowest batch index.
//!
//! LPT's makespan is at most `4/3 - 1/(3m)` times the optimum for `m`
//! workers and runs in `O(n log n)`.

use crate::config::WorkerCount;
use crate::job::{Batch, JobDescriptor};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Partition `jobs` into exactly `workers` batches.
///
/// Every job lands in exactly one batch. Batches are returned in worker-index
/// order; some are empty when there are fewer jobs than workers.
pub fn partition(mut jobs: Vec<JobDescriptor>, workers: WorkerCount) -> Vec<Batch> {
    let count = workers.get();
    let mut batches: Vec<Batch> = (0..count).map(|_| Batch::new()).collect();

    jobs.sort_by_key(|job| Reverse(job.estimated_cost));

    // Min-heap on (accumulated cost, batch index).
    let mut loads: BinaryHeap<Reverse<(u64, usize)>> =
        (0..count).map(|index| Reverse((0, index))).collect();

    for job in jobs {
        let Some(Reverse((load, index))) = loads.pop() else {
            break;
        };
        let load = load + job.estimated_cost;
        batches[index].push(job);
        loads.push(Reverse((load, index)));
    }

    batches
}

/// The largest accumulated cost among `batches`.
pub fn makespan(batches: &[Batch]) -> u64 {
    batches.iter().map(Batch::total_cost).max().unwrap_or(0)
}
