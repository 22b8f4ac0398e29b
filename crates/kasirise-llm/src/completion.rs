//! Generation request and response types
//!
//! These are the provider-neutral shapes the dispatcher is written against.
//! The Gemini adapter translates them to and from the REST wire format.

use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Output mode for a generation request
#[derive(Debug, Clone, Default)]
pub enum OutputMode {
    /// Free-form text
    #[default]
    Text,
    /// Structured JSON constrained to a declared schema
    Json {
        /// JSON schema the response must conform to
        schema: serde_json::Value,
    },
}

impl OutputMode {
    /// Whether this mode constrains the response to JSON
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json { .. })
    }
}

/// A single generation request
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Model to use (provider default when empty)
    pub model: String,
    /// Conversation history, oldest first
    pub messages: Vec<Message>,
    /// System instruction carried out-of-band
    pub system_instruction: Option<String>,
    /// Enable the live web-search tool
    pub web_search: bool,
    /// Output mode (text or schema-constrained JSON)
    pub output: OutputMode,
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_output_tokens: Option<u32>,
}

impl GenerateRequest {
    /// Create a new request for a model
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add messages
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Add a message
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set the system instruction
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Enable the live web-search tool
    #[must_use]
    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    /// Constrain the output to JSON matching a schema
    #[must_use]
    pub fn with_json_output(mut self, schema: serde_json::Value) -> Self {
        self.output = OutputMode::Json { schema };
        self
    }

    /// Set max output tokens
    #[must_use]
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }
}

/// Raw citation metadata attached to a grounded response.
///
/// Fields stay optional here on purpose: filtering out incomplete entries
/// is the caller's contract, not the adapter's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// Source page title, if the model attached one
    pub title: Option<String>,
    /// Source URI, if the model attached one
    pub uri: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// A generation response
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Generated text, empty when the model produced none
    pub content: String,
    /// Raw grounding citations (present only for web-search requests)
    pub grounding: Vec<GroundingChunk>,
    /// Token usage
    pub usage: Option<TokenUsage>,
    /// Finish reason reported by the provider
    pub finish_reason: Option<String>,
    /// Model that served the request
    pub model: String,
}

impl GenerateResponse {
    /// Response with just text content (test and mock convenience)
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: Some("STOP".to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerateRequest::new("gemini-2.5-flash")
            .with_message(Message::user("hi"))
            .with_system_instruction("be brief")
            .with_web_search()
            .with_max_output_tokens(1024);

        assert_eq!(request.model, "gemini-2.5-flash");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.system_instruction.as_deref(), Some("be brief"));
        assert!(request.web_search);
        assert_eq!(request.max_output_tokens, Some(1024));
        assert!(!request.output.is_json());
    }

    #[test]
    fn test_json_output_mode() {
        let schema = serde_json::json!({"type": "OBJECT"});
        let request = GenerateRequest::new("m").with_json_output(schema.clone());
        match request.output {
            OutputMode::Json { schema: s } => assert_eq!(s, schema),
            OutputMode::Text => panic!("expected json output mode"),
        }
    }
}
