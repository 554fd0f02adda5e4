pub mod aggregator;
pub mod etl;
pub mod export;
pub mod parser;
pub mod processor;
pub mod prompt;
pub mod xlsx;

pub use crate::domain::model::{DocumentResult, ExtractedRecord, ResultTable, SourceDocument};
pub use crate::domain::ports::{ConfigProvider, LanguageModel, Pipeline, Storage, TextExtractor};
pub use crate::utils::error::Result;
