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

//! Benchmark input loading
//!
//! Format is dispatched on file extension. Questions ship as JSON,
//! JSONL, or YAML; produced answers as JSON or JSONL. Record order in
//! the file is preserved because the report keeps question order.

use std::path::Path;

use serde::de::DeserializeOwned;

use rageval_core::{AnswerRecord, QuestionRecord};

use crate::EvalError;

/// Load the benchmark question set.
pub fn load_questions(path: &Path) -> Result<Vec<QuestionRecord>, EvalError> {
    let records: Vec<QuestionRecord> = load_records(path, true)?;
    if records.is_empty() {
        return Err(EvalError::EmptyQuestionSet {
            path: path.display().to_string(),
        });
    }
    Ok(records)
}

/// Load the answers produced by the system under test.
pub fn load_answers(path: &Path) -> Result<Vec<AnswerRecord>, EvalError> {
    load_records(path, false)
}

fn load_records<T: DeserializeOwned>(path: &Path, allow_yaml: bool) -> Result<Vec<T>, EvalError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| EvalError::Io {
        path: display.clone(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => serde_json::from_str(&text).map_err(|e| EvalError::Parse {
            path: display,
            message: e.to_string(),
        }),
        "jsonl" => text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(no, line)| {
                serde_json::from_str(line).map_err(|e| EvalError::Parse {
                    path: display.clone(),
                    message: format!("line {}: {e}", no + 1),
                })
            })
            .collect(),
        "yaml" | "yml" if allow_yaml => serde_yaml::from_str(&text).map_err(|e| EvalError::Parse {
            path: display,
            message: e.to_string(),
        }),
        _ => Err(EvalError::UnsupportedFormat(display)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_questions_json_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "questions.json",
            r#"[
                {"id": "Q2", "query": "second", "golden_answer": "b"},
                {"id": "Q1", "query": "first", "golden_answer": "a"}
            ]"#,
        );
        let questions = load_questions(&path).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, "Q2");
        assert_eq!(questions[1].id, "Q1");
    }

    #[test]
    fn test_load_answers_jsonl_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "answers.jsonl",
            "{\"id\": \"Q1\", \"answer\": \"a\"}\n\n{\"id\": \"Q2\", \"answer\": \"b\"}\n",
        );
        let answers = load_answers(&path).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[1].id, "Q2");
    }

    #[test]
    fn test_load_questions_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "questions.yaml",
            "- id: Q1\n  query: what\n  golden_answer: that\n  related_documents:\n    - source_file: f.pdf\n      page_no: 2\n      content: evidence\n",
        );
        let questions = load_questions(&path).unwrap();
        assert_eq!(questions[0].related_documents[0].page_no, 2);
    }

    #[test]
    fn test_yaml_answers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "answers.yaml", "- id: Q1\n  answer: a\n");
        assert!(matches!(
            load_answers(&path),
            Err(EvalError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_questions(Path::new("/nonexistent/questions.json"));
        assert!(matches!(result, Err(EvalError::Io { .. })));
    }

    #[test]
    fn test_empty_question_set_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "questions.json", "[]");
        assert!(matches!(
            load_questions(&path),
            Err(EvalError::EmptyQuestionSet { .. })
        ));
    }

    #[test]
    fn test_jsonl_parse_error_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "answers.jsonl",
            "{\"id\": \"Q1\", \"answer\": \"a\"}\nnot json\n",
        );
        match load_answers(&path) {
            Err(EvalError::Parse { message, .. }) => assert!(message.starts_with("line 2")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
