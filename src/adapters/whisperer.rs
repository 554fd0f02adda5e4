//! LLMWhisperer v2 client: submit a PDF, poll until processed, fetch the text.

use crate::domain::ports::TextExtractor;
use crate::utils::error::{ExtractorError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_WHISPERER_ENDPOINT: &str =
    "https://llmwhisperer-api.us-central.unstract.com/api/v2";

/// 電子副本上的浮水印文字
const ELECTRONIC_COPY_MARKER: &str = "(ELECTRONIC COPY)";

#[derive(Clone)]
pub struct WhispererConfig {
    pub endpoint: String,
    pub api_key: String,
    pub mode: String,
    pub output_mode: String,
    pub pages_to_extract: String,
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl WhispererConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_WHISPERER_ENDPOINT.to_string(),
            api_key: api_key.into(),
            mode: "native_text".to_string(),
            output_mode: "layout_preserving".to_string(),
            pages_to_extract: "1".to_string(),
            wait_timeout: Duration::from_secs(200),
            poll_interval: Duration::from_secs(3),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl fmt::Debug for WhispererConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhispererConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .field("mode", &self.mode)
            .field("output_mode", &self.output_mode)
            .field("pages_to_extract", &self.pages_to_extract)
            .field("wait_timeout", &self.wait_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    whisper_hash: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    result_text: Option<String>,
    extraction: Option<Extraction>,
}

#[derive(Debug, Deserialize)]
struct Extraction {
    result_text: Option<String>,
}

pub struct WhispererClient {
    client: Client,
    config: WhispererConfig,
}

impl WhispererClient {
    pub fn new(config: WhispererConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn submit(&self, pdf: &[u8]) -> Result<String> {
        let response = self
            .client
            .post(self.url("whisper"))
            .header("unstract-key", &self.config.api_key)
            .header("Content-Type", "application/octet-stream")
            .query(&[
                ("mode", self.config.mode.as_str()),
                ("output_mode", self.config.output_mode.as_str()),
                ("pages_to_extract", self.config.pages_to_extract.as_str()),
                ("mark_vertical_lines", "true"),
                ("mark_horizontal_lines", "true"),
            ])
            .body(pdf.to_vec())
            .send()
            .await?;

        let submitted: SubmitResponse = checked(response, "whisper").await?.json().await?;
        submitted.whisper_hash.ok_or_else(|| ExtractorError::OcrError {
            message: format!(
                "whisper job was not accepted: {}",
                submitted.message.unwrap_or_else(|| "no whisper_hash returned".to_string())
            ),
        })
    }

    async fn wait_until_processed(&self, whisper_hash: &str) -> Result<()> {
        let deadline = Instant::now() + self.config.wait_timeout;

        loop {
            let response = self
                .client
                .get(self.url("whisper-status"))
                .header("unstract-key", &self.config.api_key)
                .query(&[("whisper_hash", whisper_hash)])
                .send()
                .await?;
            let status: StatusResponse = checked(response, "whisper-status").await?.json().await?;

            match status.status.as_str() {
                "processed" => return Ok(()),
                "error" | "failed" => {
                    return Err(ExtractorError::OcrError {
                        message: format!(
                            "whisper job {} failed: {}",
                            whisper_hash,
                            status.message.unwrap_or_else(|| "no details".to_string())
                        ),
                    });
                }
                other => tracing::debug!("⏳ whisper job {} is {}", whisper_hash, other),
            }

            if Instant::now() + self.config.poll_interval > deadline {
                return Err(ExtractorError::OcrError {
                    message: format!(
                        "whisper job {} not processed within {:?}",
                        whisper_hash, self.config.wait_timeout
                    ),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn retrieve(&self, whisper_hash: &str) -> Result<String> {
        let response = self
            .client
            .get(self.url("whisper-retrieve"))
            .header("unstract-key", &self.config.api_key)
            .query(&[("whisper_hash", whisper_hash)])
            .send()
            .await?;
        let retrieved: RetrieveResponse =
            checked(response, "whisper-retrieve").await?.json().await?;

        retrieved
            .result_text
            .or_else(|| retrieved.extraction.and_then(|e| e.result_text))
            .ok_or_else(|| ExtractorError::OcrError {
                message: format!("whisper job {} returned no result_text", whisper_hash),
            })
    }
}

#[async_trait]
impl TextExtractor for WhispererClient {
    async fn extract_text(&self, document_id: &str, pdf: &[u8]) -> Result<String> {
        tracing::debug!("📤 Submitting {} ({} bytes) to LLMWhisperer", document_id, pdf.len());
        let whisper_hash = self.submit(pdf).await?;

        self.wait_until_processed(&whisper_hash).await?;
        let raw_text = self.retrieve(&whisper_hash).await?;

        let text = clean_extracted_text(&raw_text);
        if text.is_empty() {
            return Err(ExtractorError::OcrError {
                message: format!("no text extracted from the first page of {}", document_id),
            });
        }

        tracing::debug!("📝 Extracted {} chars from {}", text.len(), document_id);
        Ok(text)
    }
}

pub fn clean_extracted_text(raw: &str) -> String {
    raw.replace(ELECTRONIC_COPY_MARKER, "").trim().to_string()
}

/// 非 2xx 回應轉成 OcrError，保留部分回應內容
async fn checked(response: Response, call: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ExtractorError::OcrError {
        message: format!(
            "{} returned HTTP {}: {}",
            call,
            status,
            body.chars().take(200).collect::<String>()
        ),
    })
}
