//! Error types for triage-core.
//!
//! Only configuration can fail in this crate. Model invocation and output
//! parsing problems are absorbed into diagnostics and the keyword fallback,
//! so they never surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TriageError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
