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

//! Rageval Evaluation Engine
//!
//! Scores a RAG pipeline on a question benchmark along two axes:
//!
//! - **Retrieval**: Recall@K and MRR@K over the ranked document list,
//!   with both exact page identity and content-similarity matching.
//! - **Generation**: an LLM judge renders boolean verdicts for
//!   correctness, completeness, and faithfulness per sample.
//!
//! The [`orchestrator::RagEvaluator`] drives the full run: load,
//! align, score, aggregate, persist.

pub mod cache;
pub mod judge;
pub mod loader;
pub mod oracle;
pub mod orchestrator;
pub mod retrieval;
pub mod similarity;

pub use cache::{CacheStats, CachedOracle};
pub use judge::{GenerationJudge, GenerationMetric};
pub use loader::{load_answers, load_questions};
pub use oracle::{JudgeOracle, OpenAiJudge, OracleError, OracleResponse, TokenUsage};
pub use orchestrator::{write_report, RagEvaluator};

use thiserror::Error;

/// Errors surfaced by the evaluation engine.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("unsupported input format: {0} (expected .json, .jsonl, .yaml, or .yml)")]
    UnsupportedFormat(String),

    #[error("no evaluable samples in {path}")]
    EmptyQuestionSet { path: String },

    #[error("no answers matched the question set")]
    NoAlignedSamples,

    #[error(transparent)]
    Config(#[from] rageval_core::ConfigError),

    #[error("failed to write {path}: {message}")]
    Persistence { path: String, message: String },
}
