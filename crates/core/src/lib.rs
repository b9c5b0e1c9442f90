//! # Baton Core
//!
//! Domain types, traits, and error definitions for the Baton multi-agent
//! conversation runtime. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! The central ideas:
//!
//! - An [`AgentDefinition`] binds instructions, a model id, and a set of
//!   [`Capability`] implementations the model may invoke.
//! - A [`Session`] holds the append-only message history, the currently
//!   active agent, and per-agent [`CustomerProfile`] copies.
//! - A capability returns either data or a typed [`AgentHandle`], which
//!   signals that control of the session should pass to another agent.
//!   Handoff is never detected by scanning response text.

pub mod agent;
pub mod capability;
pub mod completion;
pub mod error;
pub mod event;
pub mod message;
pub mod profile;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentDefinition, AgentHandle, AgentRegistry};
pub use capability::{
    Capability, CapabilityContext, CapabilityOutcome, ParameterSpec, ParameterType, descriptor_for,
};
pub use completion::{
    CompletionRequest, CompletionResponse, CompletionService, ToolDescriptor, Usage,
};
pub use error::{CapabilityError, Error, ProviderError, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, MessageToolCall, Role, SessionId};
pub use profile::CustomerProfile;
pub use session::Session;
