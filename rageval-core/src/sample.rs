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

//! Benchmark samples and document references

use serde::{Deserialize, Serialize};

/// Reference to a document passage, identified by source file and page.
///
/// Two references are exact-equal iff their page keys match; they are
/// content-equal at threshold tau iff their contents score at least tau
/// under the similarity scorer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DocumentRef {
    #[serde(default)]
    pub source_file: String,

    #[serde(default)]
    pub page_no: i64,

    #[serde(default)]
    pub content: String,

    /// Retriever-specific relevance score. Carried through to the report
    /// untouched; never consulted by the metric calculator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl DocumentRef {
    pub fn new(source_file: impl Into<String>, page_no: i64, content: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            page_no,
            content: content.into(),
            score: None,
        }
    }

    /// Derived exact-match key: `{source_file}_page_{page_no}`.
    pub fn page_key(&self) -> String {
        format!("{}_page_{}", self.source_file, self.page_no)
    }
}

/// One record from the questions source, in benchmark file order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,

    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub golden_answer: String,

    #[serde(default)]
    pub related_documents: Vec<DocumentRef>,
}

/// One record from the produced-answers source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: String,

    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub answer: String,

    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

/// One aligned evaluation unit: a benchmark question joined with the
/// answer the system under test produced for it.
///
/// Samples are constructed once by alignment and read-only afterwards;
/// workers never mutate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub query: String,
    pub answer: String,
    pub golden_answer: String,

    /// Retrieved passages in relevance-ranked order. Duplicates permitted.
    pub retrieved_documents: Vec<DocumentRef>,

    /// Ground-truth relevant passages. Unranked.
    pub related_documents: Vec<DocumentRef>,
}

impl Sample {
    /// Join a question with its produced answer.
    pub fn from_records(question: &QuestionRecord, answer: &AnswerRecord) -> Self {
        Self {
            id: question.id.clone(),
            query: answer.query.clone(),
            answer: answer.answer.clone(),
            golden_answer: question.golden_answer.clone(),
            retrieved_documents: answer.documents.clone(),
            related_documents: question.related_documents.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_key() {
        let doc = DocumentRef::new("prospectus.pdf", 42, "text");
        assert_eq!(doc.page_key(), "prospectus.pdf_page_42");
    }

    #[test]
    fn test_document_ref_deserialize_defaults() {
        let doc: DocumentRef = serde_json::from_str(r#"{"source_file": "a.pdf"}"#).unwrap();
        assert_eq!(doc.source_file, "a.pdf");
        assert_eq!(doc.page_no, 0);
        assert!(doc.content.is_empty());
        assert!(doc.score.is_none());
    }

    #[test]
    fn test_answer_record_keeps_retriever_score() {
        let rec: AnswerRecord = serde_json::from_str(
            r#"{
                "id": "Q1",
                "query": "q",
                "answer": "a",
                "documents": [{"source_file": "f.pdf", "page_no": 3, "content": "c", "score": 7.25}]
            }"#,
        )
        .unwrap();
        assert_eq!(rec.documents[0].score, Some(7.25));

        let json = serde_json::to_value(&rec.documents[0]).unwrap();
        assert_eq!(json["score"], 7.25);
    }

    #[test]
    fn test_sample_from_records() {
        let question: QuestionRecord = serde_json::from_str(
            r#"{
                "id": "Q1",
                "query": "What is the registered capital?",
                "golden_answer": "150 million yuan",
                "related_documents": [{"source_file": "f.pdf", "page_no": 10, "content": "cap"}]
            }"#,
        )
        .unwrap();
        let answer: AnswerRecord = serde_json::from_str(
            r#"{
                "id": "Q1",
                "query": "What is the registered capital?",
                "answer": "150 million yuan",
                "documents": []
            }"#,
        )
        .unwrap();

        let sample = Sample::from_records(&question, &answer);
        assert_eq!(sample.id, "Q1");
        assert_eq!(sample.golden_answer, "150 million yuan");
        assert_eq!(sample.related_documents.len(), 1);
        assert!(sample.retrieved_documents.is_empty());
    }
}
