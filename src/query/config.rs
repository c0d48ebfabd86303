//! Configuration for query compilation and execution.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// Tunables threaded through prepare and execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Disjunctions with up to this many branches scan linearly; larger ones
    /// use a heap. Two branches always use the dedicated pair iterator.
    pub small_disjunction_threshold: usize,
    /// Order conjunction branches by ascending cost before iterating.
    pub sort_conjunction_by_cost: bool,
    /// Apply filter tree rewrites while preparing.
    pub optimize: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            small_disjunction_threshold: 5,
            sort_conjunction_by_cost: true,
            optimize: true,
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.small_disjunction_threshold < 2 {
            return Err(QueryError::invalid_config(format!(
                "small_disjunction_threshold must be at least 2, got {}",
                self.small_disjunction_threshold
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: QueryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}
