//! Run configuration.
//!
//! Settings come from three layers, each overriding the one before:
//!
//! ```text
//! stock defaults  →  --config file.toml  →  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # Filters to apply. Omit to apply every registered filter.
//! # filters = ["WHITE_BLACK", "ONLY_RED"]
//!
//! workers = 10              # Parallel workers (1-61)
//! sort_by_filter = false    # Group output by filter name
//! other_files = "copy"      # Non-image files: "copy", "template" or "skip"
//! encoding = "utf-8"        # Text encoding for templated files
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filters::{self, Filter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on parallel workers.
pub const MAX_WORKERS: usize = 61;

/// Worker count used when neither the config file nor the CLI sets one.
pub const DEFAULT_WORKERS: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// What happens to files that are not decodable images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtherFilePolicy {
    /// Copy the bytes verbatim to each filter's destination.
    #[default]
    Copy,
    /// Substitute the filter-name tokens, then write.
    Template,
    /// Produce no output; the job is reported as failed.
    Skip,
}

impl fmt::Display for OtherFilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OtherFilePolicy::Copy => "copy",
            OtherFilePolicy::Template => "template",
            OtherFilePolicy::Skip => "skip",
        })
    }
}

impl FromStr for OtherFilePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(OtherFilePolicy::Copy),
            "template" => Ok(OtherFilePolicy::Template),
            "skip" => Ok(OtherFilePolicy::Skip),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "other_files must be copy, template or skip (got {other:?})"
            ))),
        }
    }
}

/// A worker count known to be within `1..=MAX_WORKERS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub fn new(count: usize) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "workers must be positive".into(),
            ));
        }
        if count > MAX_WORKERS {
            return Err(ConfigError::InvalidConfiguration(format!(
                "workers must be less than or equal to {MAX_WORKERS}"
            )));
        }
        Ok(Self(count))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Run settings loaded from TOML and overridden by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Filter names to apply. `None` applies every registered filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<String>>,
    /// Number of parallel workers.
    pub workers: usize,
    /// Write output as `<output>/<filter>/<relative path>` instead of
    /// `<output>/<relative path>/<filter>.png`.
    pub sort_by_filter: bool,
    /// Policy for non-image files.
    pub other_files: OtherFilePolicy,
    /// Encoding label (WHATWG) used to read and write templated files.
    pub encoding: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            filters: None,
            workers: DEFAULT_WORKERS,
            sort_by_filter: false,
            other_files: OtherFilePolicy::default(),
            encoding: "utf-8".to_string(),
        }
    }
}

impl RunConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        WorkerCount::new(self.workers)?;
        self.text_encoding()?;
        Ok(())
    }

    pub fn worker_count(&self) -> Result<WorkerCount, ConfigError> {
        WorkerCount::new(self.workers)
    }

    /// Resolve the configured encoding label.
    pub fn text_encoding(&self) -> Result<&'static encoding_rs::Encoding, ConfigError> {
        encoding_rs::Encoding::for_label(self.encoding.trim().as_bytes()).ok_or_else(|| {
            ConfigError::InvalidConfiguration(format!("unknown encoding {:?}", self.encoding))
        })
    }

    /// Resolve the filter selection.
    ///
    /// Unknown names are dropped and returned alongside the selection so the
    /// caller can warn about them. Selecting nothing valid is an error.
    pub fn selected_filters(&self) -> Result<(Vec<Filter>, Vec<String>), ConfigError> {
        let Some(names) = &self.filters else {
            return Ok((Filter::ALL.to_vec(), Vec::new()));
        };
        let (selected, unknown) = filters::resolve_names(names);
        if selected.is_empty() {
            return Err(ConfigError::InvalidConfiguration(format!(
                "no valid filters selected (got {names:?})"
            )));
        }
        Ok((selected, unknown))
    }
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(RunConfig::default())
        .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse a config document on top of the stock defaults and validate it.
pub fn parse_config(content: &str) -> Result<RunConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value()?, overlay);
    let config: RunConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file, or the stock defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, ConfigError> {
    match path {
        Some(path) => parse_config(&fs::read_to_string(path)?),
        None => Ok(RunConfig::default()),
    }
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# File Filters Configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# Filters to apply, by name. Omit to apply every registered filter.
# Run `file-filters filters` for the list.
# filters = ["WHITE_BLACK", "IN_THREE_STEPS"]

# Number of parallel workers (1-61).
workers = 10

# Group output by filter name:
#   false -> <output>/<relative path>/<filter>.png
#   true  -> <output>/<filter>/<relative path>.png
sort_by_filter = false

# What to do with files that are not images:
#   "copy"     -> copy the file unchanged for every filter
#   "template" -> replace {{FILTER}}, {{filter}} and {{filter name}}
#   "skip"     -> leave them out (reported as failed jobs)
other_files = "copy"

# Text encoding for templated files (any WHATWG label).
encoding = "utf-8"
"##
}
