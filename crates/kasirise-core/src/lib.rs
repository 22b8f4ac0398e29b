//! KasiRise Core - dispatch and conversation contract
//!
//! This crate provides the core logic of the KasiRise Scholar client:
//! - Agent: the static four-agent catalog
//! - Conversation: append-only session transcripts
//! - Dispatcher: per-agent request shaping, response interpretation, and
//!   upstream-failure containment
//! - Assessment: the render-time decode view over puzzle payloads

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod assessment;
pub mod conversation;
pub mod dispatcher;
pub mod error;

pub use agent::{describe, list_agents, Accent, AgentDescriptor, AgentId};
pub use assessment::{option_label, AssessmentQuestion};
pub use conversation::{Conversation, GroundingSource, Role, Turn};
pub use dispatcher::{filter_grounding, Dispatcher, CONNECTION_APOLOGY};
pub use error::{Error, Result};
