// Copyright 2025 Rageval Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Evaluation run configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Cutoff depths for retrieval metrics. Each K is computed
    /// independently by truncating the full ranked list afresh.
    pub k_values: Vec<usize>,

    /// Similarity threshold tau for content-equal matching, in (0, 1].
    /// This is the tuning knob for evaluators who find the containment
    /// rule too generous on long passages.
    pub content_similarity_threshold: f64,

    /// Judge worker-pool size. An explicit parameter rather than a CPU
    /// count derivation: the bottleneck is oracle latency, not compute.
    pub batch_size: usize,

    /// Skip the generation-judging stage entirely.
    pub only_retrieval: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            k_values: vec![1, 3, 5, 10],
            content_similarity_threshold: 0.7,
            batch_size: 3,
            only_retrieval: false,
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k_values.is_empty() {
            return Err(ConfigError::EmptyKValues);
        }
        if self.k_values.contains(&0) {
            return Err(ConfigError::ZeroCutoff);
        }
        if !(self.content_similarity_threshold > 0.0 && self.content_similarity_threshold <= 1.0) {
            return Err(ConfigError::ThresholdOutOfRange(
                self.content_similarity_threshold,
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("k_values must not be empty")]
    EmptyKValues,

    #[error("k_values must be positive")]
    ZeroCutoff,

    #[error("content_similarity_threshold must be in (0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("batch_size must be positive")]
    ZeroBatchSize,
}
