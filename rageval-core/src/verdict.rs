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

//! Judge verdicts: automated and human-reviewed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Automated judge output for one sample: three independent booleans.
///
/// Written once by the generation judge and never mutated afterwards.
/// Human corrections live in [`ManualJudgment`] so both values stay
/// recoverable for agreement analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationVerdict {
    pub correctness: bool,
    pub completeness: bool,
    pub faithfulness: bool,
}

/// Human review of an automated verdict, appended by the review tool.
///
/// All fields are nullable until reviewed; an absent block means
/// "unreviewed". The engine never requires this to be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualJudgment {
    pub correctness: Option<bool>,
    pub completeness: Option<bool>,
    pub faithfulness: Option<bool>,

    /// When the reviewer recorded the judgment.
    pub judge_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub notes: String,
}
