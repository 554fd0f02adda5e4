use crate::adapters::gemini::{GeminiConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
use crate::adapters::whisperer::{WhispererConfig, DEFAULT_WHISPERER_ENDPOINT};
use crate::core::export::ExportFormat;
use crate::core::ConfigProvider;
use crate::utils::error::{ExtractorError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_path, validate_positive_number, validate_range,
    validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub extraction: ExtractionConfig,
    pub whisperer: WhispererSection,
    pub gemini: GeminiSection,
    pub batch: BatchConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WhispererSection {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub wait_timeout_seconds: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiSection {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub inputs: Vec<String>,
    pub concurrent_requests: Option<usize>,
    pub document_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    /// 輸出檔名 (不含副檔名)
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

// API key 不寫進日誌
impl std::fmt::Debug for WhispererSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhispererSection")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("wait_timeout_seconds", &self.wait_timeout_seconds)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

impl std::fmt::Debug for GeminiSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSection")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ExtractorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ExtractorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})；未設定的變數保留原字串
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.batch.inputs.is_empty() {
            return Err(ExtractorError::MissingConfigError {
                field: "batch.inputs".to_string(),
            });
        }
        validate_file_extensions("batch.inputs", &self.batch.inputs, &["pdf"])?;

        // 未替換的 ${VAR} 視同缺少
        for (field, key) in [
            ("whisperer.api_key", &self.whisperer.api_key),
            ("gemini.api_key", &self.gemini.api_key),
        ] {
            let key = validate_required_field(field, key)?;
            if key.trim().is_empty() || key.starts_with("${") {
                return Err(ExtractorError::MissingConfigError {
                    field: field.to_string(),
                });
            }
        }

        if let Some(endpoint) = &self.whisperer.endpoint {
            validate_url("whisperer.endpoint", endpoint)?;
        }
        if let Some(endpoint) = &self.gemini.endpoint {
            validate_url("gemini.endpoint", endpoint)?;
        }
        if let Some(temperature) = self.gemini.temperature {
            validate_range("gemini.temperature", temperature, 0.0, 2.0)?;
        }

        if let Some(concurrent) = self.batch.concurrent_requests {
            validate_positive_number("batch.concurrent_requests", concurrent, 1)?;
        }

        validate_path("output.path", &self.output.path)?;
        for format in &self.output.formats {
            format.parse::<ExportFormat>()?;
        }

        Ok(())
    }

    pub fn whisperer_config(&self) -> WhispererConfig {
        let section = &self.whisperer;
        let mut config = WhispererConfig::new(section.api_key.clone().unwrap_or_default())
            .with_endpoint(
                section
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| DEFAULT_WHISPERER_ENDPOINT.to_string()),
            );
        if let Some(seconds) = section.wait_timeout_seconds {
            config = config.with_wait_timeout(Duration::from_secs(seconds));
        }
        if let Some(ms) = section.poll_interval_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        config
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        let section = &self.gemini;
        let mut config = GeminiConfig::new(section.api_key.clone().unwrap_or_default())
            .with_endpoint(
                section
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
            )
            .with_model(
                section
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            );
        if let Some(temperature) = section.temperature {
            config.temperature = temperature;
        }
        config
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_files(&self) -> &[String] {
        &self.batch.inputs
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn output_stem(&self) -> Option<&str> {
        self.output.filename.as_deref()
    }

    fn concurrent_requests(&self) -> usize {
        self.batch.concurrent_requests.unwrap_or(1)
    }

    fn document_timeout(&self) -> Option<Duration> {
        self.batch.document_timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
