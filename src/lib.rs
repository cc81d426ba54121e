//! # File Filters
//!
//! Applies pixel colour filters to every image under a directory, in
//! parallel. Each (file, filter) pair is one job; jobs are balanced across a
//! fixed pool of workers by estimated cost so the slowest worker finishes as
//! early as possible.
//!
//! # Architecture
//!
//! ```text
//! 1. Plan       input/   →  Vec<JobDescriptor>   (walk, estimate cost, name destinations)
//! 2. Partition  jobs     →  Vec<Batch>           (greedy LPT, one batch per worker)
//! 3. Dispatch   batches  →  JobOutcome stream    (one worker thread per batch)
//! 4. Aggregate  outcomes →  RunReport            (progress + summary)
//! ```
//!
//! Each stage is a plain function or a small type with no global state, so
//! the stages can be tested alone: the partitioner with synthetic costs, the
//! dispatcher with a scripted runner, the executor with a mock backend.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`filters`] | The closed set of named filters and their pixel functions |
//! | [`job`] | Job descriptors, batches, outcomes and per-job errors |
//! | [`plan`] | Input traversal, cost estimation and destination naming |
//! | [`partition`] | Greedy longest-processing-time partitioner |
//! | [`dispatch`] | Worker pool, batch submission and run abort |
//! | [`executor`] | Runs one job: decode, transform, write; non-image policies |
//! | [`aggregate`] | Collects outcomes into progress and a run report |
//! | [`process`] | Ties the stages together for one run |
//! | [`config`] | `RunConfig` TOML loading, layering and validation |
//! | [`imaging`] | Image backend trait, the pure-Rust backend, transform application |
//! | [`template`] | Filter-name substitution in text files |
//! | [`output`] | CLI output formatting |
//!
//! # Failure Model
//!
//! A job that cannot read or decode its source fails on its own: the outcome
//! is recorded and its worker moves on. A job that cannot write its result
//! aborts the run, because every later write to the same output would most
//! likely fail the same way. See [`job::JobError::is_fatal`].

pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod filters;
pub mod imaging;
pub mod job;
pub mod output;
pub mod partition;
pub mod plan;
pub mod process;
pub mod template;

#[cfg(test)]
pub(crate) mod test_helpers;
