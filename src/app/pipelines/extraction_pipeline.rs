use crate::adapters::storage::document_id_for;
use crate::core::export::{export, ExportFormat};
use crate::core::processor::{BatchProgress, DocumentProcessor};
use crate::core::{ConfigProvider, Pipeline, ResultTable, SourceDocument, Storage};
use crate::utils::error::Result;
use std::path::Path;

pub const OUTPUT_STEM_PREFIX: &str = "certificate_of_origin_data";

pub struct ExtractionPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) processor: DocumentProcessor,
}

impl<S: Storage, C: ConfigProvider> ExtractionPipeline<S, C> {
    pub fn new(storage: S, config: C, processor: DocumentProcessor) -> Self {
        let processor = processor
            .with_concurrency(config.concurrent_requests())
            .with_document_timeout(config.document_timeout());
        Self {
            storage,
            config,
            processor,
        }
    }

    /// 輸出檔名 (不含副檔名)；未指定時加上時間戳記
    fn output_stem(&self) -> String {
        match self.config.output_stem() {
            Some(stem) => stem.to_string(),
            None => format!(
                "{}_{}",
                OUTPUT_STEM_PREFIX,
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            ),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ExtractionPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SourceDocument>> {
        let mut documents = Vec::with_capacity(self.config.input_files().len());

        for path in self.config.input_files() {
            tracing::debug!("Reading input file: {}", path);
            let bytes = self.storage.read_file(path).await?;
            documents.push(SourceDocument::new(document_id_for(path), bytes));
        }

        Ok(documents)
    }

    async fn transform(&self, documents: Vec<SourceDocument>) -> Result<ResultTable> {
        let table = self
            .processor
            .process_batch(documents, |progress: &BatchProgress| {
                tracing::info!(
                    "⏳ Progress: {}/{} ({} {})",
                    progress.completed,
                    progress.total,
                    progress.document_id,
                    if progress.succeeded { "ok" } else { "failed" }
                );
            })
            .await;

        Ok(table)
    }

    async fn load(&self, table: &ResultTable) -> Result<Vec<String>> {
        let stem = self.output_stem();
        let mut outputs = Vec::with_capacity(self.config.output_formats().len());

        for format in self.config.output_formats() {
            let format: ExportFormat = format.parse()?;
            let bytes = export(table, format)?;

            let output_path = Path::new(self.config.output_path())
                .join(format!("{}.{}", stem, format.extension()))
                .to_string_lossy()
                .to_string();

            tracing::debug!("Writing {} file ({} bytes) to storage", format, bytes.len());
            self.storage.write_file(&output_path, &bytes).await?;
            outputs.push(output_path);
        }

        Ok(outputs)
    }
}
