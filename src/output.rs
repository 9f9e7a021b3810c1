//! Result types returned by the scraping entry points.

use crate::error::ParseFailure;
use crate::record::ProductRecord;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Records and statistics for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentOutput {
    /// Normalised records, or `None` when the reply held no usable JSON array.
    pub records: Option<Vec<ProductRecord>>,
    /// Why `records` is `None`.
    pub parse_error: Option<ParseFailure>,
    pub stats: DocumentStats,
}

impl DocumentOutput {
    /// True when there is at least one record to write.
    pub fn has_records(&self) -> bool {
        self.records.as_ref().is_some_and(|r| !r.is_empty())
    }
}

/// Timings and sizes for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub page_count: usize,
    pub text_chars: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub record_count: usize,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// What happened to one input of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentStatus {
    /// A spreadsheet was written.
    Written { path: PathBuf, rows: usize },
    /// The model reply held no records; nothing was written.
    NoData { reason: String },
    /// The document failed at some stage; nothing was written.
    Failed { error: String },
}

impl DocumentStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, DocumentStatus::Written { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DocumentStatus::Failed { .. })
    }
}

/// Outcome for one input, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub input: String,
    pub status: DocumentStatus,
    /// Present when the pipeline got as far as the model call.
    pub stats: Option<DocumentStats>,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
    pub total_duration_ms: u64,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.documents.iter().filter(|d| d.status.is_written()).count()
    }

    pub fn no_data(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.status, DocumentStatus::NoData { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.documents.iter().filter(|d| d.status.is_failed()).count()
    }

    pub fn total_input_tokens(&self) -> u64 {
        self.documents
            .iter()
            .filter_map(|d| d.stats.as_ref())
            .map(|s| s.input_tokens as u64)
            .sum()
    }

    pub fn total_output_tokens(&self) -> u64 {
        self.documents
            .iter()
            .filter_map(|d| d.stats.as_ref())
            .map(|s| s.output_tokens as u64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: DocumentStatus, tokens: Option<usize>) -> DocumentReport {
        DocumentReport {
            input: "a.pdf".into(),
            status,
            stats: tokens.map(|t| DocumentStats {
                input_tokens: t,
                output_tokens: t / 2,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn batch_counts() {
        let batch = BatchReport {
            documents: vec![
                report(
                    DocumentStatus::Written {
                        path: "a_.xlsx".into(),
                        rows: 3,
                    },
                    Some(100),
                ),
                report(DocumentStatus::NoData { reason: "no JSON".into() }, Some(40)),
                report(DocumentStatus::Failed { error: "corrupt".into() }, None),
            ],
            total_duration_ms: 5,
        };
        assert_eq!(batch.written(), 1);
        assert_eq!(batch.no_data(), 1);
        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.total_input_tokens(), 140);
        assert_eq!(batch.total_output_tokens(), 70);
    }

    #[test]
    fn status_serialises_with_tag() {
        let json = serde_json::to_string(&DocumentStatus::NoData {
            reason: "empty".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"no_data","reason":"empty"}"#);
    }

    #[test]
    fn has_records_requires_non_empty_batch() {
        let mut out = DocumentOutput::default();
        assert!(!out.has_records());
        out.records = Some(vec![]);
        assert!(!out.has_records());
        out.records = Some(vec![ProductRecord::new()]);
        assert!(out.has_records());
    }
}
