//! Job descriptors, batches and outcomes.
//!
//! A [`JobDescriptor`] is one unit of work: one source item under one
//! filter. Descriptors are built once by [`plan`](crate::plan), read by the
//! partitioner and the workers, and dropped after their single
//! [`JobOutcome`] has been emitted. Nothing mutates a descriptor after
//! construction, so workers share them without locking.

use crate::filters::Transform;
use crate::imaging::{SourceError, WriteError};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Cost assigned to a non-image item. Image costs are pixel counts, so a
/// plain copy or template job is cheap next to any real picture.
pub const OTHER_FILE_COST: u64 = 1;

/// How the source item is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Decoded to RGBA and run through the pixel transform.
    Image,
    /// Handled by the run's [`OtherFilePolicy`](crate::config::OtherFilePolicy).
    Other,
}

/// Reporting name of a job: which filter on which item.
///
/// `filter` is also the destination grouping key in sorted-output mode;
/// nothing else branches on the label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JobLabel {
    pub filter: String,
    pub item: String,
}

impl JobLabel {
    pub fn new(filter: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            item: item.into(),
        }
    }
}

/// One filter application.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub source: PathBuf,
    pub kind: SourceKind,
    pub transform: Transform,
    /// `None` means the result is computed but not persisted.
    pub destination: Option<PathBuf>,
    pub estimated_cost: u64,
    pub label: JobLabel,
}

/// The ordered jobs one worker runs, in the order it runs them.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    jobs: Vec<JobDescriptor>,
    total_cost: u64,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: JobDescriptor) {
        self.total_cost += job.estimated_cost;
        self.jobs.push(job);
    }

    pub fn jobs(&self) -> &[JobDescriptor] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Sum of the estimated costs of every job in the batch.
    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }
}

impl IntoIterator for Batch {
    type Item = JobDescriptor;
    type IntoIter = std::vec::IntoIter<JobDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.into_iter()
    }
}

/// Why a job did not succeed.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("cannot decode {path} as {encoding}")]
    TemplateDecode { path: PathBuf, encoding: String },
    #[error("skipped non-image file {0}")]
    Skipped(PathBuf),
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl JobError {
    /// Fatal errors point at the environment rather than at one item and
    /// abort the whole run. Everything else becomes a failed outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, JobError::Write(_))
    }
}

/// The result of one job, emitted exactly once per descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub label: JobLabel,
    pub succeeded: bool,
    /// Index of the worker that ran the job.
    pub worker: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl JobOutcome {
    pub fn success(label: JobLabel, worker: usize) -> Self {
        Self {
            label,
            succeeded: true,
            worker,
            reason: None,
        }
    }

    pub fn failure(label: JobLabel, worker: usize, error: &JobError) -> Self {
        Self {
            label,
            succeeded: false,
            worker,
            reason: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::job;

    #[test]
    fn batch_tracks_total_cost() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());
        batch.push(job("a", 10));
        batch.push(job("b", 3));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.total_cost(), 13);
        let items: Vec<String> = batch.into_iter().map(|j| j.label.item).collect();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn only_write_errors_are_fatal() {
        let skipped = JobError::Skipped(PathBuf::from("notes.txt"));
        assert!(!skipped.is_fatal());

        let missing = JobError::Source(SourceError::NotFound(PathBuf::from("gone.png")));
        assert!(!missing.is_fatal());

        let write = JobError::Write(WriteError {
            path: PathBuf::from("/out/x.png"),
            source: std::io::Error::other("disk full"),
        });
        assert!(write.is_fatal());
    }

    #[test]
    fn failure_outcome_keeps_reason() {
        let err = JobError::Skipped(PathBuf::from("notes.txt"));
        let outcome = JobOutcome::failure(JobLabel::new("ORIGINAL", "notes"), 2, &err);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.worker, 2);
        assert_eq!(
            outcome.reason.as_deref(),
            Some("skipped non-image file notes.txt")
        );
    }
}
