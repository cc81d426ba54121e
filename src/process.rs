//! Run orchestration.
//!
//! One call to [`process`] is one batch run:
//!
//! ```text
//! RunConfig ─► plan_jobs ─► partition ─► Dispatcher::run ─► Aggregator ─► RunReport
//!                                              │                 │
//!                                              └── outcomes ─────┘──► ProcessEvent
//! ```
//!
//! The aggregator runs on its own scoped thread and consumes outcomes while
//! the workers are still busy, so callers see progress live through the
//! optional event sender. Printing is the caller's job; see
//! [`crate::output::format_process_event`].

use crate::aggregate::{Aggregator, RunReport};
use crate::config::{ConfigError, RunConfig};
use crate::dispatch::{DispatchError, Dispatcher};
use crate::executor::FilterExecutor;
use crate::filters::Filter;
use crate::imaging::{ImageBackend, RustBackend};
use crate::job::{JobError, JobOutcome};
use crate::partition::{makespan, partition};
use crate::plan::{PlanError, PlanRequest, plan_jobs};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("Run aborted after {} of {planned} jobs: {source}", .report.summary.total)]
    Aborted {
        report: Box<RunReport>,
        planned: usize,
        #[source]
        source: JobError,
    },
}

impl ProcessError {
    /// The partial report of a run that started and then aborted.
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            ProcessError::Aborted { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: RunConfig,
    /// Compute every result but write nothing.
    pub dry_run: bool,
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// Planning is done and workers are about to start.
    Started {
        jobs: usize,
        workers: usize,
        filters: Vec<Filter>,
    },
    /// One job finished; `completed` counts every outcome so far.
    JobFinished {
        completed: usize,
        total: usize,
        outcome: JobOutcome,
    },
}

/// Run with the pure-Rust image backend.
pub fn process(
    request: &ProcessRequest,
    events: Option<Sender<ProcessEvent>>,
) -> Result<RunReport, ProcessError> {
    process_with_backend(RustBackend::new(), request, events)
}

/// Run with any backend (tests use a mock).
pub fn process_with_backend<B: ImageBackend>(
    backend: B,
    request: &ProcessRequest,
    events: Option<Sender<ProcessEvent>>,
) -> Result<RunReport, ProcessError> {
    let started = Instant::now();
    let config = &request.config;
    config.validate()?;
    let workers = config.worker_count()?;
    let encoding = config.text_encoding()?;
    let (filters, unknown) = config.selected_filters()?;
    for name in &unknown {
        warn!("Ignoring unknown filter {name:?}");
    }

    let plan = PlanRequest {
        input: request.input.clone(),
        output: request.output.clone(),
        filters: filters.clone(),
        sort_by_filter: config.sort_by_filter,
        dry_run: request.dry_run,
    };
    let jobs = plan_jobs(&plan, &backend)?;
    let planned = jobs.len();
    if planned == 0 {
        warn!("Nothing to do: no files under {}", request.input.display());
    }

    let batches = partition(jobs, workers);
    info!(
        "{planned} jobs over {} workers, largest batch cost {}",
        workers.get(),
        makespan(&batches)
    );
    let dispatcher = Dispatcher::new(workers)?;

    if let Some(events) = &events {
        let _ = events.send(ProcessEvent::Started {
            jobs: planned,
            workers: workers.get(),
            filters,
        });
    }

    let executor = FilterExecutor::new(backend, config.other_files, encoding);
    let aggregator = Aggregator::started_at(planned, started);
    let (progress_tx, progress_rx) = mpsc::channel();

    let (report, result) = std::thread::scope(|scope| {
        let consumer = scope.spawn(move || {
            aggregator.consume(progress_rx, |progress| {
                if let Some(events) = &events {
                    let _ = events.send(ProcessEvent::JobFinished {
                        completed: progress.completed,
                        total: progress.expected,
                        outcome: progress.outcome.clone(),
                    });
                }
            })
        });
        let result = dispatcher.run(batches, &executor, Some(progress_tx));
        let report = match consumer.join() {
            Ok(report) => report,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        (report, result)
    });

    match result {
        Ok(_) => Ok(report),
        Err(DispatchError::Aborted { source, .. }) => Err(ProcessError::Aborted {
            report: Box::new(report),
            planned,
            source,
        }),
        Err(err) => Err(err.into()),
    }
}
