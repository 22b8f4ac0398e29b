//! Conversation state
//!
//! An ordered, append-only transcript owned by the active session. Turns are
//! never reordered or mutated after append; the only way in is one of the
//! two push operations.

use crate::agent::{AgentDescriptor, AgentId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Speaker role of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The learner
    User,
    /// The agent
    Assistant,
}

/// A verified citation attached to a grounded assistant turn.
///
/// Both fields are non-empty by construction; the dispatcher's grounding
/// filter drops incomplete entries before they get here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    /// Source page title
    pub title: String,
    /// Source URI
    pub uri: String,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker role
    pub role: Role,
    /// Message text (a JSON payload carried as text for assessment turns)
    pub content: String,
    /// Citations from web grounding (resource agent only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_sources: Vec<GroundingSource>,
    /// Content is a structured assessment payload
    #[serde(default)]
    pub is_json_assessment: bool,
    /// Normalized upstream-failure turn
    #[serde(default)]
    pub is_error: bool,
}

impl Turn {
    /// Create a user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            grounding_sources: Vec::new(),
            is_json_assessment: false,
            is_error: false,
        }
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            grounding_sources: Vec::new(),
            is_json_assessment: false,
            is_error: false,
        }
    }

    /// Attach grounding sources
    #[must_use]
    pub fn with_grounding_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.grounding_sources = sources;
        self
    }

    /// Mark the content as a structured assessment payload
    #[must_use]
    pub fn with_json_assessment(mut self) -> Self {
        self.is_json_assessment = true;
        self
    }

    /// Mark as a normalized error turn
    #[must_use]
    pub fn with_error(mut self) -> Self {
        self.is_error = true;
        self
    }
}

/// Append-only transcript of one agent session.
///
/// Starts as a single welcome turn and grows by exactly one turn per push.
/// The `id` gives each session its own identity so a result of an in-flight
/// dispatch can be discarded when it no longer belongs to the active session.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    agent: AgentId,
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a fresh session seeded with the agent's welcome turn.
    #[must_use]
    pub fn start(descriptor: &AgentDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent: descriptor.id,
            turns: vec![Turn::assistant(descriptor.welcome_message)],
        }
    }

    /// Session identity
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The agent this session belongs to
    #[must_use]
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// The transcript in append order
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: a session is never without its welcome turn
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Append the dispatcher's assistant turn
    pub fn push_assistant(&mut self, turn: Turn) {
        debug_assert_eq!(turn.role, Role::Assistant);
        self.turns.push(turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::describe;

    #[test]
    fn test_start_seeds_welcome_turn() {
        let descriptor = describe(AgentId::Mentor);
        let conversation = Conversation::start(descriptor);

        assert_eq!(conversation.agent(), AgentId::Mentor);
        assert_eq!(conversation.len(), 1);
        let welcome = &conversation.turns()[0];
        assert_eq!(welcome.role, Role::Assistant);
        assert_eq!(welcome.content, descriptor.welcome_message);
    }

    #[test]
    fn test_append_only_keeps_welcome_at_position_zero() {
        let descriptor = describe(AgentId::Mentor);
        let mut conversation = Conversation::start(descriptor);
        let welcome = conversation.turns()[0].clone();

        conversation.push_user("I don't understand fractions");
        conversation.push_assistant(Turn::assistant(
            "What does it mean to split something into equal parts?",
        ));
        conversation.push_user("Oh, like sharing bread?");
        conversation.push_assistant(Turn::assistant("Exactly. How would you share one loaf among four?"));

        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation.turns()[0], welcome);
        assert_eq!(conversation.turns()[1].role, Role::User);
        assert_eq!(conversation.turns()[2].role, Role::Assistant);
    }

    #[test]
    fn test_sessions_have_distinct_identities() {
        let descriptor = describe(AgentId::Resource);
        let first = Conversation::start(descriptor);
        let second = Conversation::start(descriptor);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_turn_builders() {
        let turn = Turn::assistant("{}")
            .with_json_assessment()
            .with_error();
        assert!(turn.is_json_assessment);
        assert!(turn.is_error);
        assert!(turn.grounding_sources.is_empty());
    }
}
