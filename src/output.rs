//! CLI output formatting.
//!
//! Each kind of output has a `format_*` function returning lines, and a
//! `print_*` wrapper that writes them to stdout. Format functions are pure,
//! so tests can check exact text without capturing stdout.
//!
//! # Output Format
//!
//! ```text
//! Input:        photos
//! Output:       filtered
//! Filters:      WHITE_BLACK, ONLY_RED
//! Sorted:       no
//! Workers:      4
//! Other files:  copy
//! Running 6 jobs on 4 workers
//! [1/6] WHITE_BLACK for 'cat.jpg' is done!
//! [2/6] ONLY_RED for 'notes.txt' failed!
//!     skipped non-image file photos/notes.txt
//! ...
//! Done: 6 jobs, 5 succeeded, 1 failed in 0.42s
//! Output folder: filtered
//! ```

use crate::aggregate::RunSummary;
use crate::filters::Filter;
use crate::job::JobOutcome;
use crate::process::{ProcessEvent, ProcessRequest};
use std::path::Path;

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

// ============================================================================
// Run header
// ============================================================================

pub fn format_run_header(request: &ProcessRequest) -> Vec<String> {
    let config = &request.config;
    let filters = match &config.filters {
        Some(names) => names.join(", "),
        None => "all".to_string(),
    };
    let mut lines = vec![
        format!("Input:        {}", request.input.display()),
        format!("Output:       {}", request.output.display()),
        format!("Filters:      {}", filters),
        format!("Sorted:       {}", yes_no(config.sort_by_filter)),
        format!("Workers:      {}", config.workers),
        format!("Other files:  {}", config.other_files),
    ];
    if request.dry_run {
        lines.push("Dry run:      nothing will be written".to_string());
    }
    lines
}

pub fn print_run_header(request: &ProcessRequest) {
    print_lines(format_run_header(request));
}

// ============================================================================
// Progress
// ============================================================================

/// `[ 3/18] WHITE_BLACK for 'cat.jpg' is done!`
///
/// The counter is padded to the width of `total` so lines stay aligned.
fn outcome_line(completed: usize, total: usize, outcome: &JobOutcome) -> String {
    let width = total.to_string().len();
    let status = if outcome.succeeded { "is done!" } else { "failed!" };
    format!(
        "[{:>width$}/{}] {} for '{}' {}",
        completed, total, outcome.label.filter, outcome.label.item, status
    )
}

pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { jobs, workers, .. } => {
            vec![format!("Running {} jobs on {} workers", jobs, workers)]
        }
        ProcessEvent::JobFinished {
            completed,
            total,
            outcome,
        } => {
            let mut lines = vec![outcome_line(*completed, *total, outcome)];
            if let Some(reason) = &outcome.reason {
                lines.push(format!("    {}", reason));
            }
            lines
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

pub fn format_summary(summary: &RunSummary, output: &Path) -> Vec<String> {
    vec![
        format!(
            "Done: {} jobs, {} succeeded, {} failed in {:.2}s",
            summary.total,
            summary.succeeded,
            summary.failed,
            summary.elapsed.as_secs_f64()
        ),
        format!("Output folder: {}", output.display()),
    ]
}

pub fn print_summary(summary: &RunSummary, output: &Path) {
    print_lines(format_summary(summary, output));
}

// ============================================================================
// Filter list
// ============================================================================

pub fn format_filter_list() -> Vec<String> {
    Filter::ALL
        .iter()
        .map(|filter| filter.name().to_string())
        .collect()
}

pub fn print_filter_list() {
    print_lines(format_filter_list());
}
