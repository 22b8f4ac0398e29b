//! Agent registry
//!
//! The static catalog of the four KasiRise agents. The id set is closed: a
//! fifth agent means extending both this catalog and the dispatcher's
//! per-agent match, which the compiler then enforces exhaustively.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a KasiRise agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    /// Resource Discovery (web-grounded search)
    Resource,
    /// Socratic Mentor (guided discovery)
    Mentor,
    /// Aptitude Assessment (structured puzzles)
    Assessment,
    /// Advocacy Assistant (scholarship letters)
    Advocacy,
}

impl AgentId {
    /// All agent ids, in catalog order
    pub const ALL: [AgentId; 4] = [
        AgentId::Resource,
        AgentId::Mentor,
        AgentId::Assessment,
        AgentId::Advocacy,
    ];

    /// Returns the string identifier
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Mentor => "mentor",
            Self::Assessment => "assessment",
            Self::Advocacy => "advocacy",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource" => Ok(Self::Resource),
            "mentor" => Ok(Self::Mentor),
            "assessment" => Ok(Self::Assessment),
            "advocacy" => Ok(Self::Advocacy),
            other => Err(Error::UnknownAgent(other.to_string())),
        }
    }
}

/// Presentation accent for an agent (terminal color hint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    /// Resource Discovery
    Blue,
    /// Socratic Mentor
    Green,
    /// Aptitude Assessment
    Purple,
    /// Advocacy Assistant
    Amber,
}

/// Immutable descriptor of one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDescriptor {
    /// Agent identifier
    pub id: AgentId,
    /// Display name
    pub name: &'static str,
    /// One-line description shown on the selection screen
    pub description: &'static str,
    /// First assistant turn of every session with this agent
    pub welcome_message: &'static str,
    /// Input placeholder shown while composing
    pub input_placeholder: &'static str,
    /// Presentation accent
    pub accent: Accent,
}

/// The static agent catalog, fixed length and order.
static AGENTS: [AgentDescriptor; 4] = [
    AgentDescriptor {
        id: AgentId::Resource,
        name: "Resource Discovery",
        description: "Find IEB-aligned learning materials via live web search",
        welcome_message: "Welcome! I'm here to help you find the best IEB mathematics learning materials. I can search the live web for Siyavula, Mindset Learn, and other South African resources. What topic are you studying?",
        input_placeholder: "Type your message...",
        accent: Accent::Blue,
    },
    AgentDescriptor {
        id: AgentId::Mentor,
        name: "Socratic Mentor",
        description: "Master math concepts through guided discovery",
        welcome_message: "Sawubona! I'm your mathematics mentor. I won't give you answers - instead, I'll guide you to discover them yourself using examples from our daily lives. What math concept are you working on today?",
        input_placeholder: "Type your message...",
        accent: Accent::Green,
    },
    AgentDescriptor {
        id: AgentId::Assessment,
        name: "Aptitude Assessment",
        description: "Measure fluid intelligence & potential",
        welcome_message: "Welcome to the Aptitude Assessment. I will present pattern recognition and logic puzzles to test your learning potential, not your past schooling. Type 'Start' to begin your first puzzle.",
        input_placeholder: "Type 'Ready' to begin the next puzzle...",
        accent: Accent::Purple,
    },
    AgentDescriptor {
        id: AgentId::Advocacy,
        name: "Advocacy Assistant",
        description: "Draft scholarship applications",
        welcome_message: "Hello! I'll help you prepare a strong scholarship application. I can draft letters that highlight your potential. To start, tell me your name, grade, and the school you wish to apply to.",
        input_placeholder: "Type your message...",
        accent: Accent::Amber,
    },
];

/// The full catalog in stable order.
#[must_use]
pub fn list_agents() -> &'static [AgentDescriptor] {
    &AGENTS
}

/// Look up the descriptor for an agent id.
///
/// Total by construction: the id set is closed, so there is no miss case.
#[must_use]
pub fn describe(id: AgentId) -> &'static AgentDescriptor {
    match id {
        AgentId::Resource => &AGENTS[0],
        AgentId::Mentor => &AGENTS[1],
        AgentId::Assessment => &AGENTS[2],
        AgentId::Advocacy => &AGENTS[3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_length() {
        let agents = list_agents();
        assert_eq!(agents.len(), 4);
        let ids: Vec<AgentId> = agents.iter().map(|a| a.id).collect();
        assert_eq!(ids, AgentId::ALL);
    }

    #[test]
    fn test_describe_is_idempotent() {
        for id in AgentId::ALL {
            assert_eq!(describe(id), describe(id));
            assert_eq!(describe(id).id, id);
        }
    }

    #[test]
    fn test_from_str_roundtrip() {
        for id in AgentId::ALL {
            assert_eq!(id.as_str().parse::<AgentId>().unwrap(), id);
        }
    }

    #[test]
    fn test_from_str_unknown_fails_loudly() {
        let result = "oracle".parse::<AgentId>();
        assert!(matches!(result, Err(Error::UnknownAgent(ref s)) if s == "oracle"));
    }

    #[test]
    fn test_assessment_placeholder_differs() {
        assert_ne!(
            describe(AgentId::Assessment).input_placeholder,
            describe(AgentId::Mentor).input_placeholder
        );
    }
}
