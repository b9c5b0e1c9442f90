//! Conversation session — history, active agent, profile copies.
//!
//! A session is created when a caller first writes to it, mutated every
//! turn, and dropped when the caller discards it; there is no implicit
//! persistence. History is append-only during normal operation — the
//! one exception is the orchestrator's rollback after a completion
//! failure, which truncates back to the pre-turn length so a retry sees
//! exactly the state the failed attempt saw.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, SessionId};
use crate::profile::CustomerProfile;

/// One conversation's durable-within-process state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,

    /// Ordered message history
    pub messages: Vec<Message>,

    /// Name of the agent that currently owns the conversation
    pub active_agent: String,

    /// Per-agent profile copies. Each agent mutates only its own copy;
    /// the orchestrator copies fields across on handoff.
    pub profiles: HashMap<String, CustomerProfile>,

    /// When this session was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session owned by the entry-point agent.
    pub fn new(entry_agent: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            messages: Vec::new(),
            active_agent: entry_agent.into(),
            profiles: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a session with a caller-chosen id.
    pub fn with_id(id: SessionId, entry_agent: impl Into<String>) -> Self {
        let mut session = Self::new(entry_agent);
        session.id = id;
        session
    }

    /// Append a message to the history.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// The named agent's profile copy, created empty on first access.
    pub fn profile_mut(&mut self, agent: &str) -> &mut CustomerProfile {
        self.profiles.entry(agent.to_string()).or_default()
    }

    /// The named agent's profile copy, if it has one yet.
    pub fn profile(&self, agent: &str) -> Option<&CustomerProfile> {
        self.profiles.get(agent)
    }

    /// Discard history and profiles and hand the session back to the
    /// entry-point agent.
    pub fn reset(&mut self, entry_agent: impl Into<String>) {
        self.messages.clear();
        self.profiles.clear();
        self.active_agent = entry_agent.into();
        self.updated_at = Utc::now();
    }

    /// Check the referential invariant: every `tool` message answers a
    /// tool call some earlier `assistant` message emitted. Used by tests
    /// and debug assertions; O(n^2) and not meant for hot paths.
    pub fn tool_messages_are_consistent(&self) -> bool {
        self.messages.iter().enumerate().all(|(idx, msg)| {
            match (&msg.tool_call_id, msg.role) {
                (Some(call_id), crate::message::Role::Tool) => self.messages[..idx]
                    .iter()
                    .any(|m| m.tool_calls.iter().any(|tc| &tc.id == call_id)),
                (Some(_), _) => false,
                (None, crate::message::Role::Tool) => false,
                (None, _) => true,
            }
        })
    }
}
