//! Agent dispatcher
//!
//! Shapes one upstream request per agent, interprets the raw response into a
//! normalized assistant turn, and contains every upstream failure: dispatch
//! never returns an error, it returns an apology turn flagged `is_error` so
//! callers can always append the result unconditionally.

use crate::agent::AgentId;
use crate::conversation::{GroundingSource, Role, Turn};
use kasirise_llm::{GenerateRequest, GroundingChunk, LlmProvider, Message};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, instrument};

/// System instruction for the Resource Discovery agent
const RESOURCE_SYSTEM_INSTRUCTION: &str = "You are a Resource Discovery Agent for the KasiRise Scholar Platform. Your mission is to help township learners access high-quality IEB (Independent Examinations Board) mathematics learning materials. Prioritize South African platforms like Siyavula and Mindset Learn. You MUST use the googleSearch tool to find the most current links.";

/// System instruction for the Socratic Mentor agent
const MENTOR_SYSTEM_INSTRUCTION: &str = "You are a Socratic Mathematics Mentor.\n1. NEVER solve problems directly.\n2. Ask probing questions.\n3. Use analogies from South African township life.\n4. Break complex concepts into small steps.";

/// System instruction for the Aptitude Assessment agent
const ASSESSMENT_SYSTEM_INSTRUCTION: &str = "You are a Cognitive Aptitude Assessment Agent. You measure fluid intelligence, not prior schooling. Generate abstract reasoning and pattern recognition puzzles. You MUST respond in JSON format.";

/// System instruction for the Advocacy Assistant agent
const ADVOCACY_SYSTEM_INSTRUCTION: &str = "You are an Advocacy Assistant.\n1. Draft personalized scholarship application letters.\n2. Emphasize potential and growth mindset.\n3. Always end with: \"Review required by human mentor before submission.\"";

/// Fixed apology shown when the upstream call fails, whatever the cause
pub const CONNECTION_APOLOGY: &str =
    "I'm having trouble connecting to the KasiRise network. Please try again.";

/// Fallback when the resource agent returns no text alongside its citations
const RESOURCE_EMPTY_FALLBACK: &str =
    "I found some resources, but I couldn't generate a summary.";

/// Fallback when a text agent returns an empty response
const TEXT_EMPTY_FALLBACK: &str = "I apologize, I could not generate a response.";

/// Fallback payload when the assessment agent returns an empty response
const ASSESSMENT_EMPTY_FALLBACK: &str = "{}";

/// Rewrite the user's message into the puzzle-generation prompt.
fn assessment_prompt(user_message: &str) -> String {
    format!(
        "Generate a cognitive aptitude assessment question based on fluid intelligence (pattern recognition, logic).\nReturn ONLY a JSON object. Do not include markdown formatting like ```json.\n\nThe user says: \"{user_message}\""
    )
}

/// Response schema for the assessment agent's structured output mode.
fn assessment_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "question": {
                "type": "STRING",
                "description": "The text description of the logic puzzle."
            },
            "options": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": "Multiple choice options"
            },
            "explanation": {
                "type": "STRING",
                "description": "Hidden explanation of the logic (for internal use/grading)"
            }
        },
        "required": ["question", "options", "explanation"]
    })
}

/// Convert prior turns into upstream history messages.
///
/// The new user message is supplied separately by the caller and must not
/// already be part of `history`.
fn convert_history(history: &[Turn]) -> Vec<Message> {
    history
        .iter()
        .map(|turn| match turn.role {
            Role::User => Message::user(&turn.content),
            Role::Assistant => Message::assistant(&turn.content),
        })
        .collect()
}

/// Normalize raw grounding metadata into renderable citations.
///
/// Entries missing a title or uri (or carrying empty ones) are dropped,
/// duplicates by uri are dropped, and the order of the survivors is kept.
#[must_use]
pub fn filter_grounding(chunks: Vec<GroundingChunk>) -> Vec<GroundingSource> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut sources = Vec::new();

    for chunk in chunks {
        let (Some(title), Some(uri)) = (chunk.title, chunk.uri) else {
            continue;
        };
        if title.is_empty() || uri.is_empty() {
            continue;
        }
        if !seen.insert(uri.clone()) {
            continue;
        }
        sources.push(GroundingSource { title, uri });
    }

    sources
}

fn non_empty_or(content: String, fallback: &str) -> String {
    if content.is_empty() {
        fallback.to_string()
    } else {
        content
    }
}

/// Routes one user message to the right agent request shape and normalizes
/// the outcome into exactly one assistant turn.
pub struct Dispatcher {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl Dispatcher {
    /// Create a dispatcher using the provider's default model.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let model = provider.default_model().to_string();
        Self { provider, model }
    }

    /// Override the model for all agents.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The model requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user message to an agent and return the resulting assistant
    /// turn. Never fails: upstream errors become an apology turn with
    /// `is_error` set, so the caller can append the result unconditionally.
    #[instrument(skip(self, history, user_message), fields(agent = %agent, history_len = history.len()))]
    pub async fn dispatch(&self, agent: AgentId, history: &[Turn], user_message: &str) -> Turn {
        match self.try_dispatch(agent, history, user_message).await {
            Ok(turn) => turn,
            Err(e) => {
                error!(agent = %agent, error = %e, "dispatch failed, returning error turn");
                Turn::assistant(CONNECTION_APOLOGY).with_error()
            }
        }
    }

    async fn try_dispatch(
        &self,
        agent: AgentId,
        history: &[Turn],
        user_message: &str,
    ) -> kasirise_llm::Result<Turn> {
        let messages = convert_history(history);

        match agent {
            AgentId::Resource => {
                let request = GenerateRequest::new(&self.model)
                    .with_messages(messages)
                    .with_message(Message::user(user_message))
                    .with_system_instruction(RESOURCE_SYSTEM_INSTRUCTION)
                    .with_web_search();

                let response = self.provider.generate(request).await?;
                let sources = filter_grounding(response.grounding);
                Ok(
                    Turn::assistant(non_empty_or(response.content, RESOURCE_EMPTY_FALLBACK))
                        .with_grounding_sources(sources),
                )
            }
            AgentId::Mentor => {
                let request = GenerateRequest::new(&self.model)
                    .with_messages(messages)
                    .with_message(Message::user(user_message))
                    .with_system_instruction(MENTOR_SYSTEM_INSTRUCTION);

                let response = self.provider.generate(request).await?;
                Ok(Turn::assistant(non_empty_or(
                    response.content,
                    TEXT_EMPTY_FALLBACK,
                )))
            }
            AgentId::Assessment => {
                let request = GenerateRequest::new(&self.model)
                    .with_messages(messages)
                    .with_message(Message::user(assessment_prompt(user_message)))
                    .with_system_instruction(ASSESSMENT_SYSTEM_INSTRUCTION)
                    .with_json_output(assessment_schema());

                let response = self.provider.generate(request).await?;
                // No parsing here: structural validation is deferred to
                // render time so a malformed payload degrades to plain text
                // instead of failing the dispatch.
                Ok(
                    Turn::assistant(non_empty_or(response.content, ASSESSMENT_EMPTY_FALLBACK))
                        .with_json_assessment(),
                )
            }
            AgentId::Advocacy => {
                let request = GenerateRequest::new(&self.model)
                    .with_messages(messages)
                    .with_message(Message::user(user_message))
                    .with_system_instruction(ADVOCACY_SYSTEM_INSTRUCTION);

                let response = self.provider.generate(request).await?;
                Ok(Turn::assistant(non_empty_or(
                    response.content,
                    TEXT_EMPTY_FALLBACK,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasirise_llm::{Error, GenerateResponse, MockProvider, MessageRole, OutputMode};

    fn dispatcher(mock: Arc<MockProvider>) -> Dispatcher {
        Dispatcher::new(mock).with_model("gemini-2.5-flash")
    }

    #[tokio::test]
    async fn test_mentor_request_shape() {
        let mock = Arc::new(MockProvider::new());
        mock.push_response(GenerateResponse::text("What is a fraction to you?"));
        let dispatcher = dispatcher(mock.clone());

        let history = vec![Turn::assistant("Sawubona!")];
        let turn = dispatcher
            .dispatch(AgentId::Mentor, &history, "I don't understand fractions")
            .await;

        assert_eq!(turn.content, "What is a fraction to you?");
        assert!(!turn.is_error);

        let request = mock.last_request().unwrap();
        assert_eq!(
            request.system_instruction.as_deref(),
            Some(MENTOR_SYSTEM_INSTRUCTION)
        );
        assert!(!request.web_search);
        assert!(!request.output.is_json());
        // history + exactly one new user message, not duplicated
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::Assistant);
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_eq!(request.messages[1].content, "I don't understand fractions");
    }

    #[tokio::test]
    async fn test_resource_enables_web_search_and_filters_grounding() {
        let mock = Arc::new(MockProvider::new());
        mock.push_response(GenerateResponse {
            content: "Try Siyavula.".to_string(),
            grounding: vec![
                GroundingChunk {
                    title: Some("Siyavula".to_string()),
                    uri: Some("https://siyavula.com".to_string()),
                },
                GroundingChunk {
                    title: None,
                    uri: Some("https://nolink.example".to_string()),
                },
                GroundingChunk {
                    title: Some("".to_string()),
                    uri: Some("https://empty-title.example".to_string()),
                },
                GroundingChunk {
                    title: Some("Siyavula again".to_string()),
                    uri: Some("https://siyavula.com".to_string()),
                },
                GroundingChunk {
                    title: Some("Mindset Learn".to_string()),
                    uri: Some("https://mindset.africa".to_string()),
                },
            ],
            ..Default::default()
        });
        let dispatcher = dispatcher(mock.clone());

        let turn = dispatcher.dispatch(AgentId::Resource, &[], "algebra").await;

        assert!(mock.last_request().unwrap().web_search);
        assert_eq!(turn.grounding_sources.len(), 2);
        assert_eq!(turn.grounding_sources[0].uri, "https://siyavula.com");
        assert_eq!(turn.grounding_sources[1].uri, "https://mindset.africa");
    }

    #[tokio::test]
    async fn test_resource_empty_content_fallback() {
        let mock = Arc::new(MockProvider::new());
        mock.push_response(GenerateResponse::default());
        let dispatcher = dispatcher(mock);

        let turn = dispatcher.dispatch(AgentId::Resource, &[], "algebra").await;
        assert_eq!(turn.content, RESOURCE_EMPTY_FALLBACK);
        assert!(!turn.is_error);
    }

    #[tokio::test]
    async fn test_assessment_rewrites_prompt_and_constrains_output() {
        let mock = Arc::new(MockProvider::new());
        let payload = r#"{"question":"2,4,8,16,?","options":["24","32","20"],"explanation":"doubling"}"#;
        mock.push_response(GenerateResponse::text(payload));
        let dispatcher = dispatcher(mock.clone());

        let turn = dispatcher.dispatch(AgentId::Assessment, &[], "Start").await;

        assert!(turn.is_json_assessment);
        assert_eq!(turn.content, payload);

        let request = mock.last_request().unwrap();
        assert!(matches!(request.output, OutputMode::Json { .. }));
        let sent = &request.messages.last().unwrap().content;
        assert!(sent.contains("pattern recognition, logic"));
        assert!(sent.contains("The user says: \"Start\""));
        // The raw user message is rewritten, not forwarded verbatim
        assert_ne!(sent, "Start");
    }

    #[tokio::test]
    async fn test_assessment_empty_response_fallback() {
        let mock = Arc::new(MockProvider::new());
        mock.push_response(GenerateResponse::default());
        let dispatcher = dispatcher(mock);

        let turn = dispatcher.dispatch(AgentId::Assessment, &[], "Start").await;
        assert_eq!(turn.content, "{}");
        assert!(turn.is_json_assessment);
    }

    #[tokio::test]
    async fn test_advocacy_system_instruction() {
        let mock = Arc::new(MockProvider::new());
        mock.push_response(GenerateResponse::text("Dear Selection Committee,"));
        let dispatcher = dispatcher(mock.clone());

        dispatcher
            .dispatch(AgentId::Advocacy, &[], "I want to apply to St Alban's")
            .await;

        let instruction = mock.last_request().unwrap().system_instruction.unwrap();
        assert!(instruction.contains("Review required by human mentor before submission."));
    }

    #[tokio::test]
    async fn test_upstream_failure_contained_for_every_agent() {
        for agent in AgentId::ALL {
            let mock = Arc::new(MockProvider::new());
            mock.push_error(Error::Network("connection refused".to_string()));
            let dispatcher = dispatcher(mock);

            let turn = dispatcher.dispatch(agent, &[], "hello").await;
            assert!(turn.is_error, "agent {agent} must contain the failure");
            assert_eq!(turn.content, CONNECTION_APOLOGY);
            assert_eq!(turn.role, Role::Assistant);
        }
    }

    #[tokio::test]
    async fn test_empty_user_message_passes_through() {
        let mock = Arc::new(MockProvider::new());
        mock.push_response(GenerateResponse::text("Hm?"));
        let dispatcher = dispatcher(mock.clone());

        let turn = dispatcher.dispatch(AgentId::Mentor, &[], "").await;
        assert!(!turn.is_error);
        assert_eq!(mock.last_request().unwrap().messages.last().unwrap().content, "");
    }

    #[test]
    fn test_filter_grounding_preserves_order() {
        let chunks = vec![
            GroundingChunk {
                title: Some("b".to_string()),
                uri: Some("https://b".to_string()),
            },
            GroundingChunk {
                title: Some("a".to_string()),
                uri: Some("https://a".to_string()),
            },
        ];
        let sources = filter_grounding(chunks);
        assert_eq!(sources[0].uri, "https://b");
        assert_eq!(sources[1].uri, "https://a");
    }

    #[test]
    fn test_assessment_schema_requires_all_fields() {
        let schema = assessment_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["question", "options", "explanation"]);
    }
}
