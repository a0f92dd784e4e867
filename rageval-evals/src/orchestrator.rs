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

//! Evaluation run orchestration
//!
//! Stages run strictly in order: align, score retrieval, score
//! generation, aggregate, persist. Generation judging fans out over a
//! bounded worker pool sized by `batch_size`; results are written back
//! by sample index, so completion order never leaks into the report.

use std::path::Path;
use std::sync::Arc;

use rageval_core::{
    AnswerRecord, EvalConfig, EvaluationReport, GenerationSummary, GenerationVerdict,
    QuestionRecord, RetrievalSummary, Sample, SampleDetail, SampleRetrievalMetrics,
};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::judge::GenerationJudge;
use crate::oracle::JudgeOracle;
use crate::retrieval::score_sample;
use crate::EvalError;

/// Drives one evaluation run end to end.
pub struct RagEvaluator {
    config: EvalConfig,
    oracle: Option<Arc<dyn JudgeOracle>>,
}

impl RagEvaluator {
    /// Evaluator with a judge oracle for the generation stage.
    pub fn new(config: EvalConfig, oracle: Arc<dyn JudgeOracle>) -> Result<Self, EvalError> {
        config.validate()?;
        Ok(Self {
            config,
            oracle: Some(oracle),
        })
    }

    /// Evaluator that scores retrieval only; no oracle is ever called.
    pub fn retrieval_only(config: EvalConfig) -> Result<Self, EvalError> {
        config.validate()?;
        Ok(Self {
            config,
            oracle: None,
        })
    }

    /// Join questions with answers by id, preserving question order.
    ///
    /// Questions without a matching answer are dropped with a warning;
    /// the returned count says how many.
    pub fn align_samples(
        questions: &[QuestionRecord],
        answers: &[AnswerRecord],
    ) -> (Vec<Sample>, usize) {
        let by_id: std::collections::HashMap<&str, &AnswerRecord> =
            answers.iter().map(|a| (a.id.as_str(), a)).collect();

        let mut samples = Vec::with_capacity(questions.len());
        let mut dropped = 0usize;
        for question in questions {
            match by_id.get(question.id.as_str()) {
                Some(answer) => samples.push(Sample::from_records(question, answer)),
                None => {
                    warn!(id = %question.id, "no answer for question, skipping");
                    dropped += 1;
                }
            }
        }
        (samples, dropped)
    }

    fn score_retrieval(&self, samples: &[Sample]) -> Vec<SampleRetrievalMetrics> {
        samples
            .iter()
            .map(|s| {
                score_sample(
                    s,
                    &self.config.k_values,
                    self.config.content_similarity_threshold,
                )
            })
            .collect()
    }

    /// Judge every sample through the bounded worker pool.
    ///
    /// A panicked worker leaves its sample at the default negative
    /// verdict; the rest of the run is unaffected.
    async fn score_generation(&self, samples: &[Sample]) -> Vec<GenerationVerdict> {
        let oracle = match (&self.oracle, self.config.only_retrieval) {
            (Some(oracle), false) => Arc::clone(oracle),
            _ => return vec![GenerationVerdict::default(); samples.len()],
        };

        let judge = GenerationJudge::new(oracle);
        let semaphore = Arc::new(Semaphore::new(self.config.batch_size));
        let mut handles = Vec::with_capacity(samples.len());
        for (index, sample) in samples.iter().cloned().enumerate() {
            let judge = judge.clone();
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, GenerationVerdict::default()),
                };
                (index, judge.judge_sample(&sample).await)
            }));
        }

        let mut verdicts = vec![GenerationVerdict::default(); samples.len()];
        for handle in handles {
            match handle.await {
                Ok((index, verdict)) => verdicts[index] = verdict,
                Err(e) => error!(error = %e, "judge worker panicked"),
            }
        }
        verdicts
    }

    fn aggregate(
        &self,
        samples: Vec<Sample>,
        retrieval: Vec<SampleRetrievalMetrics>,
        verdicts: Vec<GenerationVerdict>,
    ) -> EvaluationReport {
        let n = samples.len() as f64;

        let mut summary = RetrievalSummary::new(&self.config.k_values);
        for metrics in &retrieval {
            for (k, v) in &metrics.page_recall {
                *summary.page_recall.entry(*k).or_insert(0.0) += v;
            }
            for (k, v) in &metrics.page_mrr {
                *summary.page_mrr.entry(*k).or_insert(0.0) += v;
            }
            for (k, v) in &metrics.content_recall {
                *summary.content_recall.entry(*k).or_insert(0.0) += v;
            }
            for (k, v) in &metrics.content_mrr {
                *summary.content_mrr.entry(*k).or_insert(0.0) += v;
            }
        }
        for map in [
            &mut summary.page_recall,
            &mut summary.page_mrr,
            &mut summary.content_recall,
            &mut summary.content_mrr,
        ] {
            for value in map.values_mut() {
                *value /= n;
            }
        }

        let positives = |pick: fn(&GenerationVerdict) -> bool| {
            verdicts.iter().filter(|v| pick(v)).count() as f64 / n
        };
        let generation = GenerationSummary {
            correctness: positives(|v| v.correctness),
            completeness: positives(|v| v.completeness),
            faithfulness: positives(|v| v.faithfulness),
        };

        let detailed_results = samples
            .into_iter()
            .zip(retrieval)
            .zip(verdicts)
            .map(|((sample, retrieval_metrics), generation_metrics)| SampleDetail {
                id: sample.id,
                query: sample.query,
                answer: sample.answer,
                golden_answer: sample.golden_answer,
                retrieved_documents: sample.retrieved_documents,
                related_documents: sample.related_documents,
                retrieval_metrics,
                generation_metrics,
                manual_judgment: None,
            })
            .collect::<Vec<_>>();

        EvaluationReport {
            sample_count: detailed_results.len(),
            retrieval_metrics: summary,
            generation_metrics: generation,
            detailed_results,
        }
    }

    /// Run every stage and return the finished report.
    pub async fn evaluate(
        &self,
        questions: Vec<QuestionRecord>,
        answers: Vec<AnswerRecord>,
    ) -> Result<EvaluationReport, EvalError> {
        let (samples, dropped) = Self::align_samples(&questions, &answers);
        if samples.is_empty() {
            return Err(EvalError::NoAlignedSamples);
        }
        info!(
            aligned = samples.len(),
            dropped, "samples aligned with answers"
        );

        let retrieval = self.score_retrieval(&samples);
        info!(samples = samples.len(), "retrieval metrics computed");

        let verdicts = self.score_generation(&samples).await;
        if !self.config.only_retrieval && self.oracle.is_some() {
            info!(samples = samples.len(), "generation verdicts collected");
        }

        Ok(self.aggregate(samples, retrieval, verdicts))
    }
}

/// Persist the report as pretty-printed JSON, creating parent
/// directories as needed.
pub fn write_report(report: &EvaluationReport, path: &Path) -> Result<(), EvalError> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| EvalError::Persistence {
                path: display.clone(),
                message: e.to_string(),
            })?;
        }
    }
    let file = std::fs::File::create(path).map_err(|e| EvalError::Persistence {
        path: display.clone(),
        message: e.to_string(),
    })?;
    serde_json::to_writer_pretty(file, report).map_err(|e| EvalError::Persistence {
        path: display,
        message: e.to_string(),
    })?;
    info!(path = %path.display(), "report written");
    Ok(())
}
