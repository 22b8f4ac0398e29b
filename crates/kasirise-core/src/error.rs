//! Error types for kasirise-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Agent identifier outside the closed catalog
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] kasirise_llm::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
