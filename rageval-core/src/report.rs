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

//! Evaluation report types
//!
//! The report is immutable once written: re-runs produce a new report
//! rather than patching an old one. Retrieval metrics serialize flat as
//! `page_recall_at_<K>` / `page_mrr_at_<K>` / `content_recall_at_<K>` /
//! `content_mrr_at_<K>` keys, grouped by K, matching the schema the
//! downstream review tool consumes.

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::sample::DocumentRef;
use crate::verdict::{GenerationVerdict, ManualJudgment};

/// Four retrieval metric families, each keyed by cutoff K.
///
/// Used both for corpus-level means and for per-sample values; the K
/// values are independent cutoffs, not cumulative buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalMetricSet {
    pub page_recall: BTreeMap<usize, f64>,
    pub page_mrr: BTreeMap<usize, f64>,
    pub content_recall: BTreeMap<usize, f64>,
    pub content_mrr: BTreeMap<usize, f64>,
}

/// Corpus-level retrieval means.
pub type RetrievalSummary = RetrievalMetricSet;

/// Per-sample retrieval values.
pub type SampleRetrievalMetrics = RetrievalMetricSet;

impl RetrievalMetricSet {
    /// Zero-initialized set for the given cutoffs.
    pub fn new(k_values: &[usize]) -> Self {
        let zeros: BTreeMap<usize, f64> = k_values.iter().map(|&k| (k, 0.0)).collect();
        Self {
            page_recall: zeros.clone(),
            page_mrr: zeros.clone(),
            content_recall: zeros.clone(),
            content_mrr: zeros,
        }
    }

    /// Sorted cutoffs present in this set.
    pub fn k_values(&self) -> Vec<usize> {
        self.page_recall.keys().copied().collect()
    }
}

impl Serialize for RetrievalMetricSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.page_recall.len() * 4))?;
        for (&k, recall) in &self.page_recall {
            map.serialize_entry(&format!("page_recall_at_{k}"), recall)?;
            if let Some(v) = self.page_mrr.get(&k) {
                map.serialize_entry(&format!("page_mrr_at_{k}"), v)?;
            }
            if let Some(v) = self.content_recall.get(&k) {
                map.serialize_entry(&format!("content_recall_at_{k}"), v)?;
            }
            if let Some(v) = self.content_mrr.get(&k) {
                map.serialize_entry(&format!("content_mrr_at_{k}"), v)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RetrievalMetricSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flat = BTreeMap::<String, f64>::deserialize(deserializer)?;
        let mut set = RetrievalMetricSet::default();
        for (key, value) in flat {
            let (family, k) = key
                .rsplit_once("_at_")
                .ok_or_else(|| D::Error::custom(format!("unrecognized metric key: {key}")))?;
            let k: usize = k
                .parse()
                .map_err(|_| D::Error::custom(format!("bad cutoff in metric key: {key}")))?;
            match family {
                "page_recall" => set.page_recall.insert(k, value),
                "page_mrr" => set.page_mrr.insert(k, value),
                "content_recall" => set.content_recall.insert(k, value),
                "content_mrr" => set.content_mrr.insert(k, value),
                _ => return Err(D::Error::custom(format!("unrecognized metric key: {key}"))),
            };
        }
        Ok(set)
    }
}

/// Corpus-level generation means: fraction of samples judged positive
/// for each criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub correctness: f64,
    pub completeness: f64,
    pub faithfulness: f64,
}

impl GenerationSummary {
    pub fn is_zero(&self) -> bool {
        self.correctness == 0.0 && self.completeness == 0.0 && self.faithfulness == 0.0
    }
}

/// Per-sample record in the report, preserving the original question
/// order. The review tool may append `manual_judgment` later; the engine
/// treats its absence as "unreviewed".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleDetail {
    pub id: String,
    pub query: String,
    pub answer: String,
    pub golden_answer: String,
    pub retrieved_documents: Vec<DocumentRef>,
    pub related_documents: Vec<DocumentRef>,
    pub retrieval_metrics: SampleRetrievalMetrics,
    pub generation_metrics: GenerationVerdict,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_judgment: Option<ManualJudgment>,
}

/// Full evaluation output for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub sample_count: usize,
    pub retrieval_metrics: RetrievalSummary,
    pub generation_metrics: GenerationSummary,
    pub detailed_results: Vec<SampleDetail>,
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Samples: {}", self.sample_count)?;
        writeln!(f, "\nRetrieval metrics:")?;
        for (k, v) in &self.retrieval_metrics.page_recall {
            writeln!(f, "  Page Recall@{k:<2}:    {v:.4}")?;
        }
        for (k, v) in &self.retrieval_metrics.page_mrr {
            writeln!(f, "  Page MRR@{k:<2}:       {v:.4}")?;
        }
        for (k, v) in &self.retrieval_metrics.content_recall {
            writeln!(f, "  Content Recall@{k:<2}: {v:.4}")?;
        }
        for (k, v) in &self.retrieval_metrics.content_mrr {
            writeln!(f, "  Content MRR@{k:<2}:    {v:.4}")?;
        }
        if !self.generation_metrics.is_zero() {
            writeln!(f, "\nGeneration metrics:")?;
            writeln!(f, "  Correctness:  {:.4}", self.generation_metrics.correctness)?;
            writeln!(f, "  Completeness: {:.4}", self.generation_metrics.completeness)?;
            writeln!(f, "  Faithfulness: {:.4}", self.generation_metrics.faithfulness)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> RetrievalMetricSet {
        let mut set = RetrievalMetricSet::new(&[1, 3]);
        set.page_recall.insert(1, 0.5);
        set.page_mrr.insert(1, 0.25);
        set.content_recall.insert(3, 1.0);
        set.content_mrr.insert(3, 0.75);
        set
    }

    #[test]
    fn test_metric_set_flat_serialization() {
        let json = serde_json::to_value(sample_set()).unwrap();
        assert_eq!(json["page_recall_at_1"], 0.5);
        assert_eq!(json["page_mrr_at_1"], 0.25);
        assert_eq!(json["content_recall_at_3"], 1.0);
        assert_eq!(json["content_mrr_at_3"], 0.75);
        assert_eq!(json["page_recall_at_3"], 0.0);
    }

    #[test]
    fn test_metric_set_round_trip() {
        let set = sample_set();
        let json = serde_json::to_string(&set).unwrap();
        let back: RetrievalMetricSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_metric_set_rejects_unknown_keys() {
        let result: Result<RetrievalMetricSet, _> =
            serde_json::from_str(r#"{"ndcg_at_5": 0.9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_report_tolerates_missing_manual_judgment() {
        let json = r#"{
            "sample_count": 1,
            "retrieval_metrics": {"page_recall_at_1": 1.0, "page_mrr_at_1": 1.0,
                                   "content_recall_at_1": 0.0, "content_mrr_at_1": 0.0},
            "generation_metrics": {"correctness": 1.0, "completeness": 0.0, "faithfulness": 1.0},
            "detailed_results": [{
                "id": "Q1", "query": "q", "answer": "a", "golden_answer": "g",
                "retrieved_documents": [], "related_documents": [],
                "retrieval_metrics": {"page_recall_at_1": 1.0},
                "generation_metrics": {"correctness": true, "completeness": false, "faithfulness": true}
            }]
        }"#;
        let report: EvaluationReport = serde_json::from_str(json).unwrap();
        assert!(report.detailed_results[0].manual_judgment.is_none());

        let out = serde_json::to_value(&report).unwrap();
        assert!(out["detailed_results"][0].get("manual_judgment").is_none());
    }

    #[test]
    fn test_display_hides_zero_generation_block() {
        let report = EvaluationReport {
            sample_count: 2,
            retrieval_metrics: RetrievalMetricSet::new(&[1]),
            generation_metrics: GenerationSummary::default(),
            detailed_results: vec![],
        };
        let text = report.to_string();
        assert!(text.contains("Page Recall@1"));
        assert!(!text.contains("Correctness"));
    }
}
