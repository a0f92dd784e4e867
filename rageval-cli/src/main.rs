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

//! `rageval` command-line interface
//!
//! Loads a question benchmark and a produced-answers file, runs the
//! evaluation, prints the summary table, and persists the full report.
//! The judge endpoint is configured through `OPENAI_BASE_URL`,
//! `OPENAI_API_KEY`, and `JUDGE_MODEL`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use rageval_core::EvalConfig;
use rageval_evals::{
    load_answers, load_questions, write_report, CachedOracle, JudgeOracle, OpenAiJudge,
    RagEvaluator,
};

const ORACLE_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Parser, Debug)]
#[command(name = "rageval", about = "Evaluate a RAG pipeline against a question benchmark")]
struct Args {
    /// Question benchmark file (.json, .jsonl, or .yaml)
    #[arg(long = "input_file")]
    input_file: PathBuf,

    /// Answers produced by the system under test (.json or .jsonl)
    #[arg(long = "answer_file")]
    answer_file: PathBuf,

    /// Where to write the evaluation report
    #[arg(long = "eval_results_file", default_value = "eval_results.json")]
    eval_results_file: PathBuf,

    /// Cutoff depths for retrieval metrics
    #[arg(long = "k_values", num_args = 1.., default_values_t = vec![1, 3, 5, 10])]
    k_values: Vec<usize>,

    /// Similarity threshold for content-equal matching, in (0, 1]
    #[arg(long = "content_similarity_threshold", default_value_t = 0.7)]
    content_similarity_threshold: f64,

    /// Concurrent judge workers
    #[arg(long = "batch_size", default_value_t = 3)]
    batch_size: usize,

    /// Skip generation judging entirely
    #[arg(long = "only_retrieval")]
    only_retrieval: bool,

    /// Disable oracle response caching
    #[arg(long = "no_cache")]
    no_cache: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = EvalConfig {
        k_values: args.k_values,
        content_similarity_threshold: args.content_similarity_threshold,
        batch_size: args.batch_size,
        only_retrieval: args.only_retrieval,
    };

    let questions = load_questions(&args.input_file)
        .with_context(|| format!("loading questions from {}", args.input_file.display()))?;
    let answers = load_answers(&args.answer_file)
        .with_context(|| format!("loading answers from {}", args.answer_file.display()))?;
    info!(
        questions = questions.len(),
        answers = answers.len(),
        "inputs loaded"
    );

    let evaluator = if config.only_retrieval {
        RagEvaluator::retrieval_only(config)?
    } else {
        let judge = OpenAiJudge::from_env().context("configuring the judge oracle")?;
        info!(model = judge.model_name(), "judge oracle ready");
        let oracle: Arc<dyn JudgeOracle> = if args.no_cache {
            Arc::new(judge)
        } else {
            Arc::new(CachedOracle::new(Arc::new(judge), ORACLE_CACHE_TTL))
        };
        RagEvaluator::new(config, oracle)?
    };

    let report = evaluator.evaluate(questions, answers).await?;
    println!("{report}");

    write_report(&report, &args.eval_results_file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let args = Args::parse_from([
            "rageval",
            "--input_file",
            "questions.json",
            "--answer_file",
            "answers.json",
        ]);
        assert_eq!(args.k_values, vec![1, 3, 5, 10]);
        assert_eq!(args.content_similarity_threshold, 0.7);
        assert_eq!(args.batch_size, 3);
        assert!(!args.only_retrieval);
        assert!(!args.no_cache);
        assert_eq!(
            args.eval_results_file,
            PathBuf::from("eval_results.json")
        );
    }

    #[test]
    fn test_k_values_accept_multiple_tokens() {
        let args = Args::parse_from([
            "rageval",
            "--input_file",
            "q.json",
            "--answer_file",
            "a.json",
            "--k_values",
            "2",
            "4",
            "8",
        ]);
        assert_eq!(args.k_values, vec![2, 4, 8]);
    }

    #[test]
    fn test_flags_toggle() {
        let args = Args::parse_from([
            "rageval",
            "--input_file",
            "q.json",
            "--answer_file",
            "a.json",
            "--only_retrieval",
            "--no_cache",
            "-v",
        ]);
        assert!(args.only_retrieval);
        assert!(args.no_cache);
        assert!(args.verbose);
    }
}
