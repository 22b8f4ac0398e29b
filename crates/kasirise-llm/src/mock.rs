//! Mock provider for testing
//!
//! Returns queued responses (or errors) and records the last request so
//! dependent crates can assert on the shape of what was sent.

use crate::completion::{GenerateRequest, GenerateResponse};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A mock provider that returns queued outcomes or a default response.
pub struct MockProvider {
    outcomes: Arc<Mutex<VecDeque<Result<GenerateResponse>>>>,
    last_request: Arc<Mutex<Option<GenerateRequest>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue a successful response.
    pub fn push_response(&self, response: GenerateResponse) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(response));
    }

    /// Queue an error outcome.
    pub fn push_error(&self, error: Error) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// The most recent request handed to `generate`.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        *self
            .last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(request);

        let mut outcomes = self.outcomes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(outcome) = outcomes.pop_front() {
            outcome
        } else {
            Ok(GenerateResponse::text("mock response"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn test_queued_outcomes_in_order() {
        let mock = MockProvider::new();
        mock.push_response(GenerateResponse::text("first"));
        mock.push_error(Error::RateLimit);

        let request = GenerateRequest::new("m").with_message(Message::user("hi"));
        let first = mock.generate(request.clone()).await.unwrap();
        assert_eq!(first.content, "first");

        let second = mock.generate(request.clone()).await;
        assert!(matches!(second, Err(Error::RateLimit)));

        // Queue drained: default response
        let third = mock.generate(request).await.unwrap();
        assert_eq!(third.content, "mock response");
    }

    #[tokio::test]
    async fn test_records_last_request() {
        let mock = MockProvider::new();
        let request = GenerateRequest::new("m")
            .with_message(Message::user("question"))
            .with_web_search();
        mock.generate(request).await.unwrap();

        let seen = mock.last_request().expect("request recorded");
        assert!(seen.web_search);
        assert_eq!(seen.messages[0].content, "question");
    }
}
