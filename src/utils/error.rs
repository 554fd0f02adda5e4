use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("XML writing failed: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Text extraction failed: {message}")]
    OcrError { message: String },

    #[error("Field extraction failed: {message}")]
    LlmError { message: String },

    #[error("Export failed: {message}")]
    ExportError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    ExternalService,
    Export,
    Storage,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ExtractorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExtractorError::ConfigError { .. }
            | ExtractorError::MissingConfigError { .. }
            | ExtractorError::InvalidConfigValueError { .. }
            | ExtractorError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ExtractorError::ApiError(_) => ErrorCategory::Network,
            ExtractorError::OcrError { .. } | ExtractorError::LlmError { .. } => {
                ErrorCategory::ExternalService
            }
            ExtractorError::ZipError(_)
            | ExtractorError::XmlError(_)
            | ExtractorError::CsvError(_)
            | ExtractorError::ExportError { .. } => ErrorCategory::Export,
            ExtractorError::IoError(_) => ErrorCategory::Storage,
            ExtractorError::SerializationError(_) | ExtractorError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::ExternalService => ErrorSeverity::Medium,
            ErrorCategory::Export | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ExtractorError::MissingConfigError { .. } => {
                "Provide the missing value via command-line flag, environment variable or config file"
            }
            ExtractorError::InvalidConfigValueError { .. }
            | ExtractorError::ConfigValidationError { .. }
            | ExtractorError::ConfigError { .. } => "Check the configuration values and try again",
            ExtractorError::ApiError(_) => "Check network connectivity and the service endpoints",
            ExtractorError::OcrError { .. } => {
                "Verify the LLMWhisperer API key and quota, and that the PDF is readable"
            }
            ExtractorError::LlmError { .. } => "Verify the Gemini API key, model name and quota",
            ExtractorError::IoError(_) => "Check that the file exists and that permissions allow access",
            ExtractorError::ZipError(_)
            | ExtractorError::XmlError(_)
            | ExtractorError::CsvError(_)
            | ExtractorError::ExportError { .. } => {
                "Re-run the export; the extracted results are unaffected"
            }
            ExtractorError::SerializationError(_) | ExtractorError::ProcessingError { .. } => {
                "Re-submit the affected documents"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not reach a remote service: {}", self),
            ErrorCategory::ExternalService => format!("A remote service reported an error: {}", self),
            ErrorCategory::Export => format!("Could not write the results: {}", self),
            ErrorCategory::Storage => format!("File access problem: {}", self),
            ErrorCategory::Processing => format!("Processing problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractorError>;
