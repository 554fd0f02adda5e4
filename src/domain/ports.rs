use crate::domain::model::{ResultTable, SourceDocument};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// OCR 服務：PDF 位元組 -> 純文字
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, document_id: &str, pdf: &[u8]) -> Result<String>;
}

/// LLM 服務：提示詞 -> 原始回應文字
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn input_files(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    /// Fixed output file stem; `None` means a timestamped name.
    fn output_stem(&self) -> Option<&str>;
    fn concurrent_requests(&self) -> usize;
    fn document_timeout(&self) -> Option<Duration>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceDocument>>;
    async fn transform(&self, documents: Vec<SourceDocument>) -> Result<ResultTable>;
    async fn load(&self, table: &ResultTable) -> Result<Vec<String>>;
}
