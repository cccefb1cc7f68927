//! Run configuration for depfence.
//!
//! The core crate does not read flags or environment variables. Callers
//! (the CLI, embedders) build a [`RunConfig`] explicitly and validate it
//! before starting a run.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use crate::errors::{FenceError, FenceResult};

/// Selector used when none is given: every package under the current module.
pub const DEFAULT_SELECTOR: &str = "./...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Package selector handed to the enumerator.
    pub selector: String,
    /// Resolver depth; 0 means unbounded.
    pub max_depth: usize,
    /// Size of the checking worker pool.
    pub workers: usize,
    /// Component labels left out of graphs.
    pub skip: BTreeSet<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
            max_depth: 0,
            workers: default_workers(),
            skip: BTreeSet::new(),
        }
    }
}

/// One worker per available CPU.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Split a comma-separated skip list, trimming entries and dropping empty ones.
pub fn parse_skip_list(s: &str) -> BTreeSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &RunConfig) -> FenceResult<()> {
    if cfg.selector.trim().is_empty() {
        return Err(FenceError::invalid_argument("package selector must not be empty"));
    }

    if cfg.workers == 0 {
        return Err(FenceError::invalid_argument("workers must be greater than zero"));
    }

    if cfg.skip.iter().any(|s| s.trim().is_empty()) {
        return Err(FenceError::invalid_argument("skip entries must not be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = RunConfig::default();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.selector, "./...");
        assert!(cfg.workers >= 1);
    }

    #[test]
    fn zero_workers_detected() {
        let cfg = RunConfig {
            workers: 0,
            ..RunConfig::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn empty_selector_detected() {
        let cfg = RunConfig {
            selector: " ".to_string(),
            ..RunConfig::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn skip_list_parsing() {
        let skip = parse_skip_list("B, C,,  ");
        assert_eq!(skip.into_iter().collect::<Vec<_>>(), vec!["B", "C"]);
        assert!(parse_skip_list("").is_empty());
    }
}
