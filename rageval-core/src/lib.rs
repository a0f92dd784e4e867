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

//! Rageval Core
//!
//! Typed data model shared by the evaluation engine and the CLI:
//! benchmark samples, document references, judge verdicts, and the
//! persisted evaluation report.

pub mod config;
pub mod report;
pub mod sample;
pub mod verdict;

pub use config::{ConfigError, EvalConfig};
pub use report::{
    EvaluationReport, GenerationSummary, RetrievalMetricSet, RetrievalSummary, SampleDetail,
    SampleRetrievalMetrics,
};
pub use sample::{AnswerRecord, DocumentRef, QuestionRecord, Sample};
pub use verdict::{GenerationVerdict, ManualJudgment};
