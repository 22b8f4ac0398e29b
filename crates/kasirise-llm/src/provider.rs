//! Provider trait for text-generation backends

use crate::completion::{GenerateRequest, GenerateResponse};
use crate::error::Result;

/// Trait for text-generation providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Run a single generation request
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;
}
