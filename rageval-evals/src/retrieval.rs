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

//! Retrieval metrics: Recall@K and MRR@K
//!
//! Two matching regimes over the same ranked list. Page matching
//! compares `{source_file}_page_{page_no}` identity keys. Content
//! matching compares passage text with [`string_similarity`] against a
//! threshold, so a chunk that carries the golden evidence counts even
//! when it comes from an unexpected page.
//!
//! Each K truncates the full ranked list afresh; no state carries
//! between cutoffs.

use std::collections::HashSet;

use rageval_core::{Sample, SampleRetrievalMetrics};

use crate::similarity::string_similarity;

/// Fraction of distinct relevant pages found in the top K.
pub fn recall_at_k(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    let relevant_set: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    if relevant_set.is_empty() {
        return 0.0;
    }
    let top_k: HashSet<&str> = retrieved.iter().take(k).map(String::as_str).collect();
    let hits = top_k.intersection(&relevant_set).count();
    hits as f64 / relevant_set.len() as f64
}

/// Reciprocal rank of the first relevant page in the top K, 0.0 if none.
pub fn mrr_at_k(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    let relevant_set: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    if relevant_set.is_empty() {
        return 0.0;
    }
    for (rank, key) in retrieved.iter().take(k).enumerate() {
        if relevant_set.contains(key.as_str()) {
            return 1.0 / (rank + 1) as f64;
        }
    }
    0.0
}

/// Fraction of relevant passages whose content is covered by some
/// top-K retrieved passage at similarity >= `threshold`.
///
/// Each relevant passage counts at most once, against the first
/// retrieved passage that covers it. Denominator is the relevant list
/// length, duplicates included, matching the persisted benchmark shape.
pub fn content_recall_at_k(
    retrieved: &[String],
    relevant: &[String],
    k: usize,
    threshold: f64,
) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let top_k = &retrieved[..k.min(retrieved.len())];
    let mut hits = 0usize;
    for golden in relevant {
        for candidate in top_k {
            if string_similarity(golden, candidate) >= threshold {
                hits += 1;
                break;
            }
        }
    }
    hits as f64 / relevant.len() as f64
}

/// Reciprocal rank of the first top-K retrieved passage that covers any
/// relevant passage at similarity >= `threshold`, 0.0 if none.
pub fn content_mrr_at_k(
    retrieved: &[String],
    relevant: &[String],
    k: usize,
    threshold: f64,
) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    for (rank, candidate) in retrieved.iter().take(k).enumerate() {
        if relevant
            .iter()
            .any(|golden| string_similarity(golden, candidate) >= threshold)
        {
            return 1.0 / (rank + 1) as f64;
        }
    }
    0.0
}

/// Compute all four metric families for one sample at every cutoff.
pub fn score_sample(sample: &Sample, k_values: &[usize], threshold: f64) -> SampleRetrievalMetrics {
    let retrieved_keys: Vec<String> = sample
        .retrieved_documents
        .iter()
        .map(|d| d.page_key())
        .collect();
    let relevant_keys: Vec<String> = sample
        .related_documents
        .iter()
        .map(|d| d.page_key())
        .collect();
    let retrieved_contents: Vec<String> = sample
        .retrieved_documents
        .iter()
        .map(|d| d.content.trim().to_string())
        .collect();
    let relevant_contents: Vec<String> = sample
        .related_documents
        .iter()
        .map(|d| d.content.trim().to_string())
        .collect();

    let mut metrics = SampleRetrievalMetrics::new(k_values);
    for &k in k_values {
        metrics
            .page_recall
            .insert(k, recall_at_k(&retrieved_keys, &relevant_keys, k));
        metrics
            .page_mrr
            .insert(k, mrr_at_k(&retrieved_keys, &relevant_keys, k));
        metrics.content_recall.insert(
            k,
            content_recall_at_k(&retrieved_contents, &relevant_contents, k, threshold),
        );
        metrics.content_mrr.insert(
            k,
            content_mrr_at_k(&retrieved_contents, &relevant_contents, k, threshold),
        );
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use rageval_core::DocumentRef;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_recall_counts_distinct_pages() {
        let retrieved = keys(&["a_page_1", "b_page_2", "c_page_3"]);
        let relevant = keys(&["a_page_1", "d_page_4"]);
        assert_eq!(recall_at_k(&retrieved, &relevant, 3), 0.5);
        assert_eq!(recall_at_k(&retrieved, &relevant, 1), 0.5);
    }

    #[test]
    fn test_recall_duplicate_relevant_collapses() {
        let retrieved = keys(&["a_page_1"]);
        let relevant = keys(&["a_page_1", "a_page_1"]);
        assert_eq!(recall_at_k(&retrieved, &relevant, 1), 1.0);
    }

    #[test]
    fn test_recall_empty_relevant_is_zero() {
        let retrieved = keys(&["a_page_1"]);
        assert_eq!(recall_at_k(&retrieved, &[], 5), 0.0);
        assert_eq!(mrr_at_k(&retrieved, &[], 5), 0.0);
    }

    #[test]
    fn test_recall_cutoff_boundary() {
        let retrieved = keys(&["a", "b", "c"]);
        let relevant = keys(&["b"]);
        assert_eq!(recall_at_k(&retrieved, &relevant, 2), 1.0);
        assert_eq!(recall_at_k(&retrieved, &relevant, 1), 0.0);
    }

    #[test]
    fn test_mrr_deep_hit_and_total_miss() {
        let retrieved = keys(&["a", "b", "c"]);
        assert!((mrr_at_k(&retrieved, &keys(&["c"]), 3) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(mrr_at_k(&retrieved, &keys(&["z"]), 3), 0.0);
    }

    #[test]
    fn test_mrr_first_hit_rank() {
        let retrieved = keys(&["x_page_9", "a_page_1", "d_page_4"]);
        let relevant = keys(&["a_page_1", "d_page_4"]);
        assert_eq!(mrr_at_k(&retrieved, &relevant, 3), 0.5);
        assert_eq!(mrr_at_k(&retrieved, &relevant, 1), 0.0);
    }

    #[test]
    fn test_recall_monotone_in_k() {
        let retrieved = keys(&["a_page_1", "b_page_2", "c_page_3", "d_page_4"]);
        let relevant = keys(&["b_page_2", "d_page_4"]);
        let mut last = 0.0;
        for k in 1..=4 {
            let r = recall_at_k(&retrieved, &relevant, k);
            assert!(r >= last, "recall fell from {last} to {r} at k={k}");
            last = r;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_content_recall_first_hit_per_relevant() {
        let retrieved = keys(&["注册资本15000万元整", "无关内容"]);
        let relevant = keys(&["注册资本15000万元", "完全不同的句子啊"]);
        let score = content_recall_at_k(&retrieved, &relevant, 2, 0.7);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_content_recall_duplicates_in_denominator() {
        let retrieved = keys(&["注册资本15000万元整"]);
        let relevant = keys(&["注册资本15000万元", "注册资本15000万元"]);
        assert_eq!(content_recall_at_k(&retrieved, &relevant, 1, 0.7), 1.0);
    }

    #[test]
    fn test_content_mrr_positional() {
        let retrieved = keys(&["毫不相关的检索结果", "注册资本15000万元整"]);
        let relevant = keys(&["注册资本15000万元"]);
        assert_eq!(content_mrr_at_k(&retrieved, &relevant, 2, 0.7), 0.5);
        assert_eq!(content_mrr_at_k(&retrieved, &relevant, 1, 0.7), 0.0);
    }

    #[test]
    fn test_score_sample_all_families() {
        let sample = Sample {
            id: "Q1".into(),
            query: "q".into(),
            golden_answer: "g".into(),
            answer: "a".into(),
            retrieved_documents: vec![
                DocumentRef::new("doc.pdf", 3, "注册资本15000万元"),
                DocumentRef::new("doc.pdf", 7, "别的内容"),
            ],
            related_documents: vec![DocumentRef::new("doc.pdf", 3, "注册资本15000万元")],
        };
        let metrics = score_sample(&sample, &[1, 2], 0.7);
        assert_eq!(metrics.page_recall[&1], 1.0);
        assert_eq!(metrics.page_mrr[&1], 1.0);
        assert_eq!(metrics.content_recall[&1], 1.0);
        assert_eq!(metrics.content_mrr[&2], 1.0);
    }

    #[test]
    fn test_score_sample_miss_at_shallow_k() {
        let sample = Sample {
            id: "Q2".into(),
            query: "q".into(),
            golden_answer: "g".into(),
            answer: "a".into(),
            retrieved_documents: vec![
                DocumentRef::new("doc.pdf", 1, "噪声段落甲"),
                DocumentRef::new("doc.pdf", 5, "目标证据段落"),
            ],
            related_documents: vec![DocumentRef::new("doc.pdf", 5, "目标证据段落")],
        };
        let metrics = score_sample(&sample, &[1, 2], 0.7);
        assert_eq!(metrics.page_recall[&1], 0.0);
        assert_eq!(metrics.page_recall[&2], 1.0);
        assert_eq!(metrics.page_mrr[&2], 0.5);
    }
}
