//! Traversal bounds configuration.
//!
//! Mirrors the shape of the teacher's stage configs (e.g. `TaintConfig`'s
//! `max_depth` / `max_paths` with range validation and chained builder
//! setters): a small `serde`-derived struct, validated before use, with the
//! spec's literal defaults (depth 50, iterations 1000, 30s per entry point,
//! 300s global).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounds for [`crate::traversal::BoundedAnyPathFinder`], one set applied
/// per entry point plus one global wall-clock ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalBounds {
    /// Maximum path depth per entry point (spec §4.5: 50).
    pub max_depth: usize,
    /// Maximum DFS advance-steps per entry point (spec §4.5: 1000).
    pub max_iterations: usize,
    /// Wall-clock ceiling per entry point, in seconds (spec §4.5: 30).
    pub per_entry_wall_clock_secs: u64,
    /// Wall-clock ceiling for the whole traversal, in seconds (spec §4.5: 300).
    pub global_wall_clock_secs: u64,
}

impl Default for TraversalBounds {
    fn default() -> Self {
        Self {
            max_depth: 50,
            max_iterations: 1000,
            per_entry_wall_clock_secs: 30,
            global_wall_clock_secs: 300,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
        hint: &'static str,
    },
    #[error("'{field}' must be <= '{other_field}' ({value} > {other_value})")]
    CrossField {
        field: &'static str,
        value: u64,
        other_field: &'static str,
        other_value: u64,
    },
}

impl TraversalBounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 || self.max_depth > 10_000 {
            return Err(ConfigError::Range {
                field: "max_depth",
                value: self.max_depth,
                min: 1,
                max: 10_000,
                hint: "path depth must be a small, finite bound",
            });
        }
        if self.max_iterations == 0 || self.max_iterations > 1_000_000 {
            return Err(ConfigError::Range {
                field: "max_iterations",
                value: self.max_iterations,
                min: 1,
                max: 1_000_000,
                hint: "iteration budget must be finite",
            });
        }
        if self.per_entry_wall_clock_secs as usize > self.global_wall_clock_secs as usize {
            return Err(ConfigError::CrossField {
                field: "per_entry_wall_clock_secs",
                value: self.per_entry_wall_clock_secs,
                other_field: "global_wall_clock_secs",
                other_value: self.global_wall_clock_secs,
            });
        }
        Ok(())
    }

    pub fn max_depth(mut self, v: usize) -> Self {
        self.max_depth = v;
        self
    }

    pub fn max_iterations(mut self, v: usize) -> Self {
        self.max_iterations = v;
        self
    }

    pub fn per_entry_wall_clock_secs(mut self, v: u64) -> Self {
        self.per_entry_wall_clock_secs = v;
        self
    }

    pub fn global_wall_clock_secs(mut self, v: u64) -> Self {
        self.global_wall_clock_secs = v;
        self
    }
}
