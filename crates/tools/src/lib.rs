//! Built-in capabilities for Baton agents.
//!
//! Capabilities give a specialist agent its verbs: record extracted
//! customer facts, report what is still unknown, search the product
//! knowledge base, and pass the conversation to another agent.
//!
//! Handoff capabilities are generated per roster edge with
//! [`HandoffCapability::to`]; the rest are registered by name on the
//! agents that need them.

pub mod handoff;
pub mod knowledge_search;
pub mod profile_missing;
pub mod profile_update;

pub use handoff::HandoffCapability;
pub use knowledge_search::{
    InMemoryKnowledge, KnowledgeBackend, KnowledgeError, KnowledgeSearchCapability, KnowledgeSnippet,
};
pub use profile_missing::MissingInfoCapability;
pub use profile_update::ProfileUpdateCapability;
