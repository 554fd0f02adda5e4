pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::adapters::gemini::{GeminiConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
    use crate::adapters::whisperer::{WhispererConfig, DEFAULT_WHISPERER_ENDPOINT};
    use crate::core::export::ExportFormat;
    use crate::core::ConfigProvider;
    use crate::utils::error::{ExtractorError, Result};
    use crate::utils::validation::{
        validate_file_extensions, validate_non_empty_string, validate_path,
        validate_positive_number, validate_url, Validate,
    };
    use clap::Parser;
    use std::fmt;
    use std::time::Duration;

    #[derive(Clone, Parser)]
    #[command(name = "coo-extract")]
    #[command(about = "Extract Certificate of Origin fields from PDFs into a spreadsheet")]
    pub struct CliConfig {
        /// PDF files to process, in output order
        pub inputs: Vec<String>,

        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, default_value = "")]
        pub gemini_api_key: String,

        #[arg(long, env = "LLMWHISPERER_API_KEY", hide_env_values = true, default_value = "")]
        pub whisperer_api_key: String,

        #[arg(long, default_value = DEFAULT_GEMINI_ENDPOINT)]
        pub gemini_endpoint: String,

        #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
        pub gemini_model: String,

        #[arg(long, default_value = DEFAULT_WHISPERER_ENDPOINT)]
        pub whisperer_endpoint: String,

        /// Seconds to wait for LLMWhisperer to finish one document
        #[arg(long, default_value = "200")]
        pub whisper_timeout_secs: u64,

        #[arg(long, default_value = "3000")]
        pub poll_interval_ms: u64,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, value_delimiter = ',', default_value = "xlsx")]
        pub output_formats: Vec<String>,

        /// Output file name without extension (default: timestamped)
        #[arg(long)]
        pub output_name: Option<String>,

        #[arg(long, default_value = "1")]
        pub concurrent_requests: usize,

        #[arg(long)]
        pub document_timeout_secs: Option<u64>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log CPU and memory usage per phase")]
        pub monitor: bool,

        #[arg(long, help = "Print each extracted record")]
        pub show_records: bool,

        #[arg(long, help = "List what would be processed without calling any service")]
        pub dry_run: bool,
    }

    impl CliConfig {
        pub fn gemini_config(&self) -> GeminiConfig {
            GeminiConfig::new(self.gemini_api_key.clone())
                .with_endpoint(self.gemini_endpoint.clone())
                .with_model(self.gemini_model.clone())
        }

        pub fn whisperer_config(&self) -> WhispererConfig {
            WhispererConfig::new(self.whisperer_api_key.clone())
                .with_endpoint(self.whisperer_endpoint.clone())
                .with_wait_timeout(Duration::from_secs(self.whisper_timeout_secs))
                .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
        }
    }

    impl fmt::Debug for CliConfig {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("CliConfig")
                .field("inputs", &self.inputs)
                .field("gemini", &self.gemini_config())
                .field("whisperer", &self.whisperer_config())
                .field("output_path", &self.output_path)
                .field("output_formats", &self.output_formats)
                .field("output_name", &self.output_name)
                .field("concurrent_requests", &self.concurrent_requests)
                .field("document_timeout_secs", &self.document_timeout_secs)
                .finish()
        }
    }

    impl ConfigProvider for CliConfig {
        fn input_files(&self) -> &[String] {
            &self.inputs
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_formats(&self) -> &[String] {
            &self.output_formats
        }

        fn output_stem(&self) -> Option<&str> {
            self.output_name.as_deref()
        }

        fn concurrent_requests(&self) -> usize {
            self.concurrent_requests
        }

        fn document_timeout(&self) -> Option<Duration> {
            self.document_timeout_secs.map(Duration::from_secs)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if self.inputs.is_empty() {
                return Err(ExtractorError::MissingConfigError {
                    field: "inputs".to_string(),
                });
            }
            validate_file_extensions("inputs", &self.inputs, &["pdf"])?;

            validate_non_empty_string("gemini_api_key", &self.gemini_api_key)?;
            validate_non_empty_string("whisperer_api_key", &self.whisperer_api_key)?;
            validate_url("gemini_endpoint", &self.gemini_endpoint)?;
            validate_url("whisperer_endpoint", &self.whisperer_endpoint)?;
            validate_non_empty_string("gemini_model", &self.gemini_model)?;

            validate_path("output_path", &self.output_path)?;
            validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
            validate_positive_number("poll_interval_ms", self.poll_interval_ms as usize, 1)?;

            for format in &self.output_formats {
                format.parse::<ExportFormat>()?;
            }
            Ok(())
        }
    }

}
