pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::pipelines::extraction_pipeline::ExtractionPipeline;
pub use adapters::{GeminiClient, GeminiConfig, LocalStorage, WhispererClient, WhispererConfig};
pub use config::toml_config::TomlConfig;
pub use crate::core::{
    etl::{EtlEngine, RunReport},
    export::{export, ExportFormat},
    parser::{parse_response, ParseOutcome},
    processor::DocumentProcessor,
};
pub use domain::model::{DocumentResult, DocumentStatus, ExtractedRecord, FailureKind, ResultTable};
pub use domain::schema::{Field, FIELDS, SENTINEL};
pub use utils::error::{ExtractorError, Result};
