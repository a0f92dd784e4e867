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

//! Generation judging: three boolean criteria per sample
//!
//! Each criterion is a separate oracle call with its own prompt, so a
//! flaky verdict on one axis never contaminates the others. The oracle
//! is asked to end with a `<result>` tag; free-text affirmatives are
//! accepted as a fallback because smaller judge models drop the tag
//! under long contexts.
//!
//! A sample whose oracle calls exhaust their retries degrades to a
//! negative verdict rather than failing the run. A lost verdict is a
//! pessimistic data point, not a crashed evaluation.

use std::sync::Arc;
use std::time::Duration;

use rageval_core::{GenerationVerdict, Sample};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::oracle::JudgeOracle;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

static RESULT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<result>(.*?)</result>")
        .unwrap_or_else(|e| panic!("result pattern must compile: {e}"))
});

/// The three judged criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMetric {
    Correctness,
    Completeness,
    Faithfulness,
}

impl GenerationMetric {
    pub const ALL: [GenerationMetric; 3] = [
        GenerationMetric::Correctness,
        GenerationMetric::Completeness,
        GenerationMetric::Faithfulness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMetric::Correctness => "correctness",
            GenerationMetric::Completeness => "completeness",
            GenerationMetric::Faithfulness => "faithfulness",
        }
    }

    /// Affirmative phrasings accepted when the result tag is absent.
    fn affirmative_markers(&self) -> &'static [&'static str] {
        match self {
            GenerationMetric::Correctness => &["yes", "correct", "consistent"],
            GenerationMetric::Completeness => &["yes", "complete"],
            GenerationMetric::Faithfulness => &["yes", "faithful", "grounded"],
        }
    }

    /// Render the judging prompt for one sample.
    fn build_prompt(&self, sample: &Sample) -> String {
        match self {
            GenerationMetric::Correctness => format!(
                "Judge whether the candidate answer is factually consistent with the \
                 reference answer for the given question.\n\
                 The candidate may phrase things differently, include extra detail, or \
                 answer only partially; it is correct as long as nothing in it \
                 contradicts the reference answer on the facts the question asks about.\n\
                 Example: if the reference says the registered capital is 150 million \
                 yuan and the candidate says 1.5 billion, that is a contradiction and \
                 the verdict is no.\n\n\
                 Question: {}\n\
                 Reference answer: {}\n\
                 Candidate answer: {}\n\n\
                 Think through the comparison, then end your reply with exactly \
                 <result>yes</result> or <result>no</result>.",
                sample.query, sample.golden_answer, sample.answer
            ),
            GenerationMetric::Completeness => format!(
                "Judge whether the candidate answer covers every point made by the \
                 reference answer for the given question.\n\
                 Extra correct information does not hurt completeness, but any point \
                 present in the reference and missing from the candidate makes the \
                 verdict no.\n\
                 Example: if the reference lists three subsidiaries and the candidate \
                 names only two, the verdict is no.\n\n\
                 Question: {}\n\
                 Reference answer: {}\n\
                 Candidate answer: {}\n\n\
                 Think through the comparison, then end your reply with exactly \
                 <result>yes</result> or <result>no</result>.",
                sample.query, sample.golden_answer, sample.answer
            ),
            GenerationMetric::Faithfulness => {
                let context = sample
                    .retrieved_documents
                    .iter()
                    .map(|d| d.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n---\n");
                format!(
                    "Judge whether every claim in the candidate answer is supported by \
                     the retrieved passages below.\n\
                     The answer is faithful only if it asserts nothing the passages do \
                     not state; a single unsupported claim makes the verdict no.\n\
                     Example: if the passages never mention a founding date and the \
                     answer states one, the verdict is no.\n\n\
                     Question: {}\n\
                     Retrieved passages:\n{}\n\
                     Candidate answer: {}\n\n\
                     Think through the evidence, then end your reply with exactly \
                     <result>yes</result> or <result>no</result>.",
                    sample.query, context, sample.answer
                )
            }
        }
    }
}

/// Parse an oracle completion into a boolean verdict.
///
/// The result tag wins when present (first match, case-insensitive).
/// Without a tag, the reply is affirmative iff it contains one of the
/// metric's accepted markers.
pub fn parse_verdict(metric: GenerationMetric, reply: &str) -> bool {
    if let Some(caps) = RESULT_TAG.captures(reply) {
        return caps[1].to_lowercase().contains("yes");
    }
    let lowered = reply.to_lowercase();
    metric
        .affirmative_markers()
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Judges one sample on all three criteria through a shared oracle.
#[derive(Clone)]
pub struct GenerationJudge {
    oracle: Arc<dyn JudgeOracle>,
}

impl GenerationJudge {
    pub fn new(oracle: Arc<dyn JudgeOracle>) -> Self {
        Self { oracle }
    }

    /// Judge one criterion, retrying transient oracle failures.
    ///
    /// Exhausted retries degrade to `false` with a warning rather than
    /// aborting the sample.
    async fn judge_metric(&self, metric: GenerationMetric, sample: &Sample) -> bool {
        let prompt = metric.build_prompt(sample);
        for attempt in 1..=MAX_ATTEMPTS {
            match self.oracle.invoke(&prompt).await {
                Ok(response) => {
                    let verdict = parse_verdict(metric, &response.content);
                    debug!(
                        sample = %sample.id,
                        metric = metric.as_str(),
                        verdict,
                        tokens = response.usage.total_tokens,
                        "judged"
                    );
                    return verdict;
                }
                Err(e) => {
                    warn!(
                        sample = %sample.id,
                        metric = metric.as_str(),
                        attempt,
                        error = %e,
                        "oracle call failed"
                    );
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        warn!(
            sample = %sample.id,
            metric = metric.as_str(),
            "retries exhausted, recording negative verdict"
        );
        false
    }

    /// Render the full verdict for one sample.
    pub async fn judge_sample(&self, sample: &Sample) -> GenerationVerdict {
        let (correctness, completeness, faithfulness) = tokio::join!(
            self.judge_metric(GenerationMetric::Correctness, sample),
            self.judge_metric(GenerationMetric::Completeness, sample),
            self.judge_metric(GenerationMetric::Faithfulness, sample),
        );
        GenerationVerdict {
            correctness,
            completeness,
            faithfulness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleError, OracleResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedOracle {
        reply: String,
    }

    #[async_trait]
    impl JudgeOracle for ScriptedOracle {
        async fn invoke(&self, _prompt: &str) -> Result<OracleResponse, OracleError> {
            Ok(OracleResponse {
                content: self.reply.clone(),
                model: "scripted".into(),
                usage: Default::default(),
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct AlwaysFailingOracle {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JudgeOracle for AlwaysFailingOracle {
        async fn invoke(&self, _prompt: &str) -> Result<OracleResponse, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(OracleError::RateLimited)
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn sample() -> Sample {
        Sample {
            id: "Q1".into(),
            query: "What is the registered capital?".into(),
            answer: "150 million yuan".into(),
            golden_answer: "150 million yuan".into(),
            retrieved_documents: vec![],
            related_documents: vec![],
        }
    }

    #[test]
    fn test_parse_tag_wins() {
        assert!(parse_verdict(
            GenerationMetric::Correctness,
            "Reasoning...\n<result>yes</result>"
        ));
        assert!(!parse_verdict(
            GenerationMetric::Correctness,
            "The answer looks correct. <result>no</result>"
        ));
    }

    #[test]
    fn test_parse_tag_case_insensitive_first_match() {
        assert!(parse_verdict(
            GenerationMetric::Completeness,
            "<RESULT> Yes </RESULT> ... <result>no</result>"
        ));
    }

    #[test]
    fn test_parse_fallback_markers() {
        assert!(parse_verdict(
            GenerationMetric::Faithfulness,
            "Every claim is grounded in the passages."
        ));
        assert!(parse_verdict(
            GenerationMetric::Correctness,
            "The candidate is consistent with the reference."
        ));
        assert!(!parse_verdict(
            GenerationMetric::Completeness,
            "Several reference points are missing."
        ));
    }

    #[test]
    fn test_prompts_embed_sample_fields() {
        let s = sample();
        for metric in GenerationMetric::ALL {
            let prompt = metric.build_prompt(&s);
            assert!(prompt.contains(&s.query));
            assert!(prompt.contains("<result>yes</result>"));
        }
    }

    #[tokio::test]
    async fn test_judge_sample_positive() {
        let judge = GenerationJudge::new(Arc::new(ScriptedOracle {
            reply: "<result>yes</result>".into(),
        }));
        let verdict = judge.judge_sample(&sample()).await;
        assert!(verdict.correctness && verdict.completeness && verdict.faithfulness);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_degrade_to_negative() {
        let oracle = Arc::new(AlwaysFailingOracle {
            calls: AtomicUsize::new(0),
        });
        let judge = GenerationJudge::new(oracle.clone());
        let verdict = judge.judge_sample(&sample()).await;
        assert_eq!(verdict, GenerationVerdict::default());
        // three criteria, three attempts each
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 9);
    }
}
