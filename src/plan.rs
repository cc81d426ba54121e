//! Job planning: turns an input path and a filter selection into job
//! descriptors.
//!
//! ## Inputs
//!
//! - A single file yields one job per selected filter.
//! - A directory is walked recursively (files only, sorted by name so plans
//!   are reproducible) and yields one job per file per filter.
//!
//! ## Destination layout
//!
//! Filtered images are always written as PNG. Non-image files keep their
//! own extension. Sorted output keeps the full source file name and appends
//! `.png`, so `cat.jpg` and `cat.png` side by side never share a destination.
//!
//! ```text
//! unsorted                                  sorted (--sort-by-filter)
//! output/                                   output/
//! ├── photos/cat.jpg/                       ├── white_black/
//! │   ├── white_black.png                   │   ├── photos/cat.jpg.png
//! │   └── only_red.png                      │   └── notes.txt
//! └── notes.txt/                            └── only_red/
//!     └── white_black.txt                       └── photos/cat.jpg.png
//! ```
//!
//! For a single-file input the relative part is dropped: `output/<filter>.png`
//! unsorted, `output/<filter>/<file name>.png` sorted.
//!
//! Every (source, filter) pair maps to its own destination. The output
//! directory is only excluded from the walk when it sits strictly inside the
//! input; an output at or above the input is walked like any other tree.
//!
//! ## Cost
//!
//! Images cost their pixel count, read from the header only. If the header
//! cannot be read the file size stands in (the job will most likely fail
//! fast, but it still needs a place in a batch). Non-image files cost
//! [`OTHER_FILE_COST`].

use crate::filters::Filter;
use crate::imaging::{ImageBackend, OUTPUT_EXTENSION, is_image};
use crate::job::{JobDescriptor, JobLabel, OTHER_FILE_COST, SourceKind};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Failed to read input directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Everything the planner needs to know about a run.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub filters: Vec<Filter>,
    pub sort_by_filter: bool,
    /// Compute results without writing them.
    pub dry_run: bool,
}

/// A source item found under the input path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceItem {
    path: PathBuf,
    /// Path relative to the input directory; `None` for single-file input.
    relative: Option<PathBuf>,
}

/// Build one descriptor per source item per selected filter.
pub fn plan_jobs(
    request: &PlanRequest,
    backend: &impl ImageBackend,
) -> Result<Vec<JobDescriptor>, PlanError> {
    let items = collect_items(&request.input, &request.output)?;
    debug!(
        "planning {} items x {} filters",
        items.len(),
        request.filters.len()
    );

    let mut jobs = Vec::with_capacity(items.len() * request.filters.len());
    for item in &items {
        let kind = if is_image(&item.path) {
            SourceKind::Image
        } else {
            SourceKind::Other
        };
        let cost = estimate_cost(&item.path, kind, backend);
        let name = item_name(item);

        for &filter in &request.filters {
            let destination =
                (!request.dry_run).then(|| destination_for(request, filter, item, kind));
            jobs.push(JobDescriptor {
                source: item.path.clone(),
                kind,
                transform: filter.transform(),
                destination,
                estimated_cost: cost,
                label: JobLabel::new(filter.name(), name.clone()),
            });
        }
    }
    Ok(jobs)
}

fn collect_items(input: &Path, output: &Path) -> Result<Vec<SourceItem>, PlanError> {
    if input.is_file() {
        return Ok(vec![SourceItem {
            path: input.to_path_buf(),
            relative: None,
        }]);
    }
    if !input.is_dir() {
        return Err(PlanError::InputNotFound(input.to_path_buf()));
    }

    let mut items = Vec::new();
    // Skip the output directory when it lives inside the input, otherwise a
    // second run would filter the first run's results. An output at or above
    // the input prunes nothing.
    let walker = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.path() != output);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(PlanError::Walk(err)),
            Err(err) => {
                warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let relative = path.strip_prefix(input).ok().map(Path::to_path_buf);
        items.push(SourceItem { path, relative });
    }
    Ok(items)
}

fn estimate_cost(path: &Path, kind: SourceKind, backend: &impl ImageBackend) -> u64 {
    match kind {
        SourceKind::Other => OTHER_FILE_COST,
        SourceKind::Image => match backend.identify(path) {
            Ok(dims) => dims.pixels().max(1),
            Err(err) => {
                debug!("cannot identify {}: {err}", path.display());
                match std::fs::metadata(path) {
                    Ok(meta) => meta.len().max(1),
                    Err(err) => {
                        debug!("cannot stat {}: {err}", path.display());
                        1
                    }
                }
            }
        },
    }
}

fn item_name(item: &SourceItem) -> String {
    match &item.relative {
        Some(relative) => relative.to_string_lossy().into_owned(),
        None => item
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn output_extension<'a>(item: &'a SourceItem, kind: SourceKind) -> Option<&'a str> {
    match kind {
        SourceKind::Image => Some(OUTPUT_EXTENSION),
        SourceKind::Other => item.path.extension().and_then(|e| e.to_str()),
    }
}

fn destination_for(
    request: &PlanRequest,
    filter: Filter,
    item: &SourceItem,
    kind: SourceKind,
) -> PathBuf {
    let filter_dir = filter.name().to_lowercase();
    let extension = output_extension(item, kind);

    if request.sort_by_filter {
        let relative = match &item.relative {
            Some(relative) => relative.clone(),
            None => PathBuf::from(item.path.file_name().unwrap_or_default()),
        };
        // The source extension stays in the name so `cat.png` and
        // `cat.tiff` land on different files.
        let mut path = request.output.join(filter_dir).join(relative).into_os_string();
        if let (SourceKind::Image, Some(ext)) = (kind, extension) {
            path.push(".");
            path.push(ext);
        }
        PathBuf::from(path)
    } else {
        let base = match &item.relative {
            Some(relative) => request.output.join(relative),
            None => request.output.clone(),
        };
        let path = base.join(filter_dir);
        match extension {
            Some(ext) => path.with_extension(ext),
            None => path,
        }
    }
}
