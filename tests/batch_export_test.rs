use async_trait::async_trait;
use calamine::{Reader, Xlsx};
use coo_extract::core::{LanguageModel, SourceDocument, TextExtractor};
use coo_extract::utils::error::ExtractorError;
use coo_extract::{export, DocumentProcessor, ExportFormat, Field, FailureKind, ResultTable, SENTINEL};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// 文件內容即 OCR 文字；`BROKEN` 觸發 OCR 失敗，較小的編號延遲較久
struct ScriptedOcr;

#[async_trait]
impl TextExtractor for ScriptedOcr {
    async fn extract_text(&self, _document_id: &str, pdf: &[u8]) -> coo_extract::Result<String> {
        let text = String::from_utf8_lossy(pdf).to_string();
        if text == "BROKEN" {
            return Err(ExtractorError::OcrError {
                message: "HTTP 500 upstream failure".to_string(),
            });
        }
        let delay: u64 = text.trim_start_matches("doc-").parse().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(delay * 5))).await;
        Ok(text)
    }
}

/// 將文件文字填入 invoice_number_date
struct EchoModel;

#[async_trait]
impl LanguageModel for EchoModel {
    async fn generate(&self, prompt: &str) -> coo_extract::Result<String> {
        let text = prompt
            .split("Document Text:\n")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap_or_default();
        Ok(serde_json::json!({ "invoice_number_date": text }).to_string())
    }
}

fn documents(count: usize, broken_at: usize) -> Vec<SourceDocument> {
    (0..count)
        .map(|position| {
            let content = if position == broken_at {
                "BROKEN".to_string()
            } else {
                format!("doc-{}", position)
            };
            SourceDocument::new(format!("file-{}.pdf", position), content.into_bytes())
        })
        .collect()
}

fn processor(concurrency: usize) -> DocumentProcessor {
    DocumentProcessor::new(Arc::new(ScriptedOcr), Arc::new(EchoModel)).with_concurrency(concurrency)
}

#[tokio::test]
async fn test_failure_at_any_position_keeps_order() {
    let count = 5;
    for concurrency in [1, 3] {
        for broken_at in 0..count {
            let mut progress = Vec::new();
            let table = processor(concurrency)
                .process_batch(documents(count, broken_at), |p| progress.push(p.completed))
                .await;

            assert_eq!(table.len(), count);
            assert_eq!(progress, (1..=count).collect::<Vec<_>>());

            for (position, result) in table.results().iter().enumerate() {
                assert_eq!(result.document_id, format!("file-{}.pdf", position));
                if position == broken_at {
                    assert!(!result.is_success());
                    assert!(result.record.is_unresolved());
                    assert!(matches!(
                        &result.status,
                        coo_extract::DocumentStatus::Failed { kind: FailureKind::Ocr, .. }
                    ));
                } else {
                    assert!(result.is_success());
                    assert_eq!(
                        result.record.get(Field::InvoiceNumberDate),
                        format!("doc-{}", position)
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn test_empty_batch_exports_header_only_workbook() {
    let table = processor(2).process_batch(Vec::new(), |_| {}).await;
    assert!(table.is_empty());

    let bytes = export(&table, ExportFormat::Xlsx).unwrap();
    let mut workbook = Xlsx::new(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range("Extracted_Data").unwrap();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    assert_eq!(rows, vec![ResultTable::header()]);
}

#[tokio::test]
async fn test_exported_workbook_matches_table() {
    let table = processor(2).process_batch(documents(3, 1), |_| {}).await;

    let bytes = export(&table, ExportFormat::Xlsx).unwrap();
    let mut workbook = Xlsx::new(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range("Extracted_Data").unwrap();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    assert_eq!(rows[0], ResultTable::header());
    assert_eq!(&rows[1..], table.rows().as_slice());
    assert!(rows[2][1..].iter().all(|value| value == SENTINEL));
}

#[tokio::test]
async fn test_exported_workbook_keeps_markup_and_unicode_verbatim() {
    let documents = vec![
        SourceDocument::new(" lead.pdf ", b"Smith & Sons <Ltd> \"Q1\" 'A'".to_vec()),
        SourceDocument::new("R&D <draft>.pdf", "Café Zürich 東京".as_bytes().to_vec()),
        SourceDocument::new("ctrl.pdf", "USD\u{1} 100\u{7}".as_bytes().to_vec()),
    ];
    let table = processor(2).process_batch(documents, |_| {}).await;

    assert_eq!(table.successful(), 3);
    let invoice = |position: usize| table.results()[position].record.get(Field::InvoiceNumberDate);
    assert_eq!(invoice(0), "Smith & Sons <Ltd> \"Q1\" 'A'");
    assert_eq!(invoice(1), "Café Zürich 東京");
    assert_eq!(invoice(2), "USD 100");

    let bytes = export(&table, ExportFormat::Xlsx).unwrap();
    let mut workbook = Xlsx::new(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range("Extracted_Data").unwrap();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    assert_eq!(&rows[1..], table.rows().as_slice());
    assert_eq!(rows[1][0], " lead.pdf ");
    assert_eq!(rows[2][0], "R&D <draft>.pdf");
}
