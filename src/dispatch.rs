//! Worker pool and dispatcher.
//!
//! The dispatcher owns a dedicated rayon pool with one thread per configured
//! worker. [`Dispatcher::run`] submits each non-empty batch as one task; the
//! task runs its jobs strictly in batch order. Workers share nothing mutable
//! except the outcome channel and the abort flag.
//!
//! ## Outcome delivery
//!
//! Each outcome is sent as soon as its job finishes, first to the optional
//! progress sender (for live reporting) and then to the dispatcher's own
//! channel. The returned `Vec` is that channel drained after the join, so it
//! is in completion order, not submission order.
//!
//! ## Failure handling
//!
//! A recoverable [`JobError`] becomes a failed outcome and the worker moves
//! on. A fatal one is stored (first one wins), the abort flag is raised, and
//! every worker stops before its next job. The run then fails with
//! [`DispatchError::Aborted`], which still carries every outcome produced.

use crate::config::WorkerCount;
use crate::executor::JobRunner;
use crate::job::{Batch, JobError, JobOutcome};
use log::{debug, error, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to start worker threads: {0}")]
    WorkerSpawn(#[from] rayon::ThreadPoolBuildError),
    #[error("Run aborted after {} completed jobs: {source}", .completed.len())]
    Aborted {
        completed: Vec<JobOutcome>,
        #[source]
        source: JobError,
    },
}

/// A fixed-size pool of workers.
pub struct Dispatcher {
    pool: rayon::ThreadPool,
}

impl Dispatcher {
    /// Start `workers` threads. Fails only if the OS refuses to spawn them.
    pub fn new(workers: WorkerCount) -> Result<Self, DispatchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|index| format!("filter-worker-{index}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Run every batch and block until all of them have finished.
    ///
    /// Empty batches are not submitted. Returns one outcome per job, in
    /// completion order.
    pub fn run<R: JobRunner>(
        &self,
        batches: Vec<Batch>,
        runner: &R,
        progress: Option<Sender<JobOutcome>>,
    ) -> Result<Vec<JobOutcome>, DispatchError> {
        let (tx, rx) = mpsc::channel();
        let state = RunState {
            abort: AtomicBool::new(false),
            fatal: Mutex::new(None),
            active: AtomicUsize::new(0),
        };

        self.pool.scope(|scope| {
            for (index, batch) in batches.into_iter().enumerate() {
                if batch.is_empty() {
                    continue;
                }
                state.active.fetch_add(1, Ordering::AcqRel);
                debug!(
                    "worker {index}: submitted {} jobs (cost {})",
                    batch.len(),
                    batch.total_cost()
                );
                let worker = Worker {
                    index,
                    runner,
                    outcomes: tx.clone(),
                    progress: progress.clone(),
                    state: &state,
                };
                scope.spawn(move |_| worker.run(batch));
            }
        });
        drop(tx);
        drop(progress);

        let outcomes: Vec<JobOutcome> = rx.into_iter().collect();
        let fatal = state
            .fatal
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        match fatal {
            Some(source) => Err(DispatchError::Aborted {
                completed: outcomes,
                source,
            }),
            None => Ok(outcomes),
        }
    }
}

/// State shared by every worker of one run.
struct RunState {
    abort: AtomicBool,
    fatal: Mutex<Option<JobError>>,
    /// Workers that have not finished their batch yet.
    active: AtomicUsize,
}

struct Worker<'a, R> {
    index: usize,
    runner: &'a R,
    outcomes: Sender<JobOutcome>,
    progress: Option<Sender<JobOutcome>>,
    state: &'a RunState,
}

impl<R: JobRunner> Worker<'_, R> {
    fn run(self, batch: Batch) {
        for job in batch {
            if self.state.abort.load(Ordering::Acquire) {
                debug!("worker {}: stopping, run aborted", self.index);
                break;
            }
            let outcome = match self.runner.run_job(&job) {
                Ok(()) => JobOutcome::success(job.label, self.index),
                Err(err) if err.is_fatal() => {
                    error!("{} for {:?}: {err}", job.label.filter, job.label.item);
                    self.record_fatal(err);
                    break;
                }
                Err(err) => {
                    match &err {
                        JobError::Skipped(_) => debug!("{err}"),
                        _ => warn!("{} for {:?}: {err}", job.label.filter, job.label.item),
                    }
                    JobOutcome::failure(job.label, self.index, &err)
                }
            };
            self.emit(outcome);
        }
        let remaining = self.state.active.fetch_sub(1, Ordering::AcqRel) - 1;
        debug!("worker {} done, {remaining} still running", self.index);
    }

    fn emit(&self, outcome: JobOutcome) {
        // A dropped progress receiver only means nobody is watching.
        if let Some(progress) = &self.progress {
            let _ = progress.send(outcome.clone());
        }
        let _ = self.outcomes.send(outcome);
    }

    fn record_fatal(&self, err: JobError) {
        self.state.abort.store(true, Ordering::Release);
        let mut slot = self
            .state
            .fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}
