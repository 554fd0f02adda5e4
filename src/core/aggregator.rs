use crate::core::parser::ParseOutcome;
use crate::domain::model::{DocumentResult, FailureKind, ResultTable};

/// What happened to one document before aggregation.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Extracted(ParseOutcome),
    Failed { kind: FailureKind, reason: String },
}

/// 按呼叫順序累積每份文件的結果
#[derive(Debug, Default)]
pub struct BatchAggregator {
    results: Vec<DocumentResult>,
}

impl BatchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, document_id: impl Into<String>, outcome: DocumentOutcome) {
        self.results.push(into_result(document_id.into(), outcome));
    }

    pub fn add_result(&mut self, result: DocumentResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn to_table(&self) -> ResultTable {
        ResultTable::new(self.results.clone())
    }

    pub fn into_table(self) -> ResultTable {
        ResultTable::new(self.results)
    }
}

pub(crate) fn into_result(document_id: String, outcome: DocumentOutcome) -> DocumentResult {
    match outcome {
        DocumentOutcome::Extracted(ParseOutcome::Parsed(record)) => {
            DocumentResult::success(document_id, record)
        }
        DocumentOutcome::Extracted(ParseOutcome::Malformed { raw, cause }) => {
            let reason = format!("unusable model response ({}): {}", cause, excerpt(&raw, 120));
            DocumentResult::failed(document_id, FailureKind::MalformedResponse, reason)
        }
        DocumentOutcome::Failed { kind, reason } => {
            DocumentResult::failed(document_id, kind, reason)
        }
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= max_chars {
        flattened
    } else {
        let cut: String = flattened.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_response;
    use crate::domain::model::DocumentStatus;
    use crate::domain::schema::{Field, SENTINEL};

    #[test]
    fn test_rows_follow_add_order() {
        let mut aggregator = BatchAggregator::new();
        aggregator.add(
            "b.pdf",
            DocumentOutcome::Extracted(parse_response(r#"{"exporters_country":"India"}"#)),
        );
        aggregator.add(
            "a.pdf",
            DocumentOutcome::Extracted(parse_response(r#"{"exporters_country":"Thailand"}"#)),
        );

        let rows = aggregator.into_table().rows();
        assert_eq!(rows[0][0], "b.pdf");
        assert_eq!(rows[0][1 + Field::ExportersCountry.index()], "India");
        assert_eq!(rows[1][0], "a.pdf");
        assert_eq!(rows[1][1 + Field::ExportersCountry.index()], "Thailand");
    }

    #[test]
    fn test_upstream_failure_keeps_reason() {
        let mut aggregator = BatchAggregator::new();
        aggregator.add(
            "broken.pdf",
            DocumentOutcome::Failed {
                kind: FailureKind::Ocr,
                reason: "HTTP 429 quota exceeded".to_string(),
            },
        );

        let table = aggregator.to_table();
        let result = &table.results()[0];
        assert!(result.record.is_unresolved());
        assert_eq!(
            result.status,
            DocumentStatus::Failed {
                kind: FailureKind::Ocr,
                reason: "HTTP 429 quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_response_is_failed_row() {
        let mut aggregator = BatchAggregator::new();
        aggregator.add(
            "garbage.pdf",
            DocumentOutcome::Extracted(parse_response("I could not read this document.")),
        );

        let table = aggregator.into_table();
        let result = &table.results()[0];
        assert!(!result.is_success());
        assert!(result.record.values().iter().all(|v| v == SENTINEL));
        assert_eq!(
            result.status.reason(),
            Some("unusable model response (no JSON object found): I could not read this document.")
        );
    }

    #[test]
    fn test_invalid_json_reason_is_not_reported_as_missing() {
        let mut aggregator = BatchAggregator::new();
        aggregator.add(
            "trailing-comma.pdf",
            DocumentOutcome::Extracted(parse_response(r#"{"exporters_country": "India",}"#)),
        );

        let table = aggregator.into_table();
        let reason = table.results()[0].status.reason().unwrap();
        assert!(reason.starts_with("unusable model response (invalid JSON:"), "{}", reason);
        assert!(!reason.contains("no JSON object found"));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut aggregator = BatchAggregator::with_capacity(2);
        for _ in 0..2 {
            aggregator.add(
                "same.pdf",
                DocumentOutcome::Extracted(parse_response("{}")),
            );
        }
        assert_eq!(aggregator.len(), 2);
        assert_eq!(aggregator.into_table().len(), 2);
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(300);
        assert_eq!(excerpt(&long, 10).chars().count(), 11);
        assert_eq!(excerpt("a\n b", 10), "a b");
    }
}
