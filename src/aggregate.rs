//! Result aggregation.
//!
//! The [`Aggregator`] is the single consumer of the outcome stream. It keeps
//! outcomes in arrival order, counts successes and failures, and reports a
//! [`Progress`] snapshot after each one. The completed count only ever goes
//! up by one per outcome.

use crate::job::JobOutcome;
use serde::{Serialize, Serializer};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// Totals for a finished (or aborted) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(rename = "elapsed_seconds", serialize_with = "seconds")]
    pub elapsed: Duration,
}

fn seconds<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Summary plus every outcome, in the order they arrived.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub outcomes: Vec<JobOutcome>,
}

/// One step of progress: `completed` of `expected` jobs are done.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub completed: usize,
    pub expected: usize,
    pub outcome: &'a JobOutcome,
}

/// Collects outcomes as workers produce them.
#[derive(Debug)]
pub struct Aggregator {
    expected: usize,
    started: Instant,
    succeeded: usize,
    failed: usize,
    outcomes: Vec<JobOutcome>,
}

impl Aggregator {
    /// Start the clock for a run of `expected` jobs.
    pub fn new(expected: usize) -> Self {
        Self::started_at(expected, Instant::now())
    }

    pub fn started_at(expected: usize, started: Instant) -> Self {
        Self {
            expected,
            started,
            succeeded: 0,
            failed: 0,
            outcomes: Vec::with_capacity(expected),
        }
    }

    /// Record one outcome and return the progress it represents.
    pub fn record(&mut self, outcome: JobOutcome) -> Progress<'_> {
        if outcome.succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
        Progress {
            completed: self.outcomes.len(),
            expected: self.expected,
            outcome: &self.outcomes[self.outcomes.len() - 1],
        }
    }

    /// Drain `outcomes` until every sender is gone, calling `on_progress`
    /// after each one.
    pub fn consume<F>(mut self, outcomes: Receiver<JobOutcome>, mut on_progress: F) -> RunReport
    where
        F: FnMut(Progress<'_>),
    {
        for outcome in outcomes {
            on_progress(self.record(outcome));
        }
        self.finish()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.outcomes.len(),
            succeeded: self.succeeded,
            failed: self.failed,
            elapsed: self.started.elapsed(),
        }
    }

    pub fn finish(self) -> RunReport {
        RunReport {
            summary: self.summary(),
            outcomes: self.outcomes,
        }
    }
}
