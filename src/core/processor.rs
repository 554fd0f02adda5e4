//! Per-document extraction (OCR -> prompt -> LLM -> parse) and ordered batch runs.

use crate::core::aggregator::{into_result, BatchAggregator, DocumentOutcome};
use crate::core::parser::parse_response;
use crate::core::prompt::build_extraction_prompt;
use crate::domain::model::{DocumentResult, FailureKind, ResultTable, SourceDocument};
use crate::domain::ports::{LanguageModel, TextExtractor};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Progress reported after each finished document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub document_id: String,
    pub succeeded: bool,
}

#[derive(Clone)]
pub struct DocumentProcessor {
    text_extractor: Arc<dyn TextExtractor>,
    model: Arc<dyn LanguageModel>,
    concurrency: usize,
    document_timeout: Option<Duration>,
}

impl DocumentProcessor {
    pub fn new(text_extractor: Arc<dyn TextExtractor>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            text_extractor,
            model,
            concurrency: 1,
            document_timeout: None,
        }
    }

    /// Documents processed at the same time; `1` keeps the batch sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_document_timeout(mut self, document_timeout: Option<Duration>) -> Self {
        self.document_timeout = document_timeout;
        self
    }

    /// 處理單一文件；任何失敗都轉為 failed 結果，不會回傳錯誤
    pub async fn process(&self, document_id: &str, pdf: &[u8]) -> DocumentResult {
        tracing::info!("📄 Processing: {}", document_id);

        let outcome = match self.document_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_stages(document_id, pdf))
                .await
                .unwrap_or_else(|_| DocumentOutcome::Failed {
                    kind: FailureKind::Timeout,
                    reason: format!("no result within {:?}", limit),
                }),
            None => self.run_stages(document_id, pdf).await,
        };

        let result = into_result(document_id.to_string(), outcome);
        match result.status.reason() {
            None => tracing::info!(
                "✅ {}: {} of {} fields found",
                document_id,
                result.record.resolved_count(),
                result.record.values().len()
            ),
            Some(reason) => tracing::warn!("❌ Error processing {}: {}", document_id, reason),
        }
        result
    }

    async fn run_stages(&self, document_id: &str, pdf: &[u8]) -> DocumentOutcome {
        let text = match self.text_extractor.extract_text(document_id, pdf).await {
            Ok(text) => text,
            Err(e) => {
                return DocumentOutcome::Failed {
                    kind: FailureKind::Ocr,
                    reason: e.to_string(),
                }
            }
        };

        let prompt = build_extraction_prompt(&text);
        let raw = match self.model.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                return DocumentOutcome::Failed {
                    kind: FailureKind::Llm,
                    reason: e.to_string(),
                }
            }
        };

        DocumentOutcome::Extracted(parse_response(&raw))
    }

    /// Processes every document and returns the table in submission order,
    /// whatever order the documents finish in.
    pub async fn process_batch<F>(&self, documents: Vec<SourceDocument>, mut on_progress: F) -> ResultTable
    where
        F: FnMut(&BatchProgress),
    {
        let total = documents.len();
        tracing::info!(
            "🚀 Processing {} document(s), up to {} at a time",
            total,
            self.concurrency
        );

        let mut finished: Vec<(usize, DocumentResult)> = Vec::with_capacity(total);
        let mut in_flight = stream::iter(documents.into_iter().enumerate())
            .map(|(position, document)| async move {
                let result = self.process(&document.id, &document.bytes).await;
                (position, result)
            })
            .buffer_unordered(self.concurrency);

        while let Some((position, result)) = in_flight.next().await {
            on_progress(&BatchProgress {
                completed: finished.len() + 1,
                total,
                document_id: result.document_id.clone(),
                succeeded: result.is_success(),
            });
            finished.push((position, result));
        }

        // 依提交順序重新排列
        finished.sort_by_key(|(position, _)| *position);

        let mut aggregator = BatchAggregator::with_capacity(total);
        for (_, result) in finished {
            aggregator.add_result(result);
        }
        aggregator.into_table()
    }
}
