//! KasiRise LLM - Gemini adapter for the KasiRise Scholar client
//!
//! This crate provides the upstream model integration:
//! - Provider: trait the dispatcher is written against
//! - Gemini: Google Gemini `generateContent` over HTTP (API-key auth)
//! - Completion: provider-neutral request/response types, including the
//!   web-search and structured-JSON output modes
//! - Mock: queueing test double used by dependent crates

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod gemini;
pub mod message;
pub mod mock;
pub mod provider;
pub mod util;

pub use completion::{
    GenerateRequest, GenerateResponse, GroundingChunk, OutputMode, TokenUsage,
};
pub use error::{Error, Result};
pub use gemini::{GeminiConfig, GeminiProvider, DEFAULT_MODEL};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use provider::LlmProvider;
