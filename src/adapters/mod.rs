// Adapters layer: concrete implementations for external systems (http services, storage).

pub mod gemini;
pub mod storage;
pub mod whisperer;

pub use gemini::{GeminiClient, GeminiConfig};
pub use storage::LocalStorage;
pub use whisperer::{WhispererClient, WhispererConfig};
