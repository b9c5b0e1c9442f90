//! Error types for the Baton domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The split matters:
//! capability errors are absorbed by the execution loop and fed back to
//! the model as tool-message text, while `ServiceUnavailable` is the one
//! failure a caller ever sees — the session is rolled back and stays
//! retryable.

use thiserror::Error;

/// The top-level error type for all Baton operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The completion service is unreachable, timed out, or rejected the
    /// request. The turn that hit this has been rolled back.
    #[error("completion service unavailable: {0}")]
    ServiceUnavailable(#[from] ProviderError),

    /// A capability signalled a no-op handoff loop. Recovered locally by
    /// staying on the prior agent; surfaced only through logs and events.
    #[error("handoff cycle detected on agent '{agent}'")]
    HandoffCycle { agent: String },

    /// A handoff target or entry-point agent is not in the registry.
    #[error("agent not registered: {0}")]
    UnknownAgent(String),

    /// A session id the caller referenced does not exist.
    #[error("session not found: {0}")]
    UnknownSession(String),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Failures raised while dispatching a capability call.
///
/// None of these abort the execution loop: each is converted into a
/// human-readable `tool` message so the model can react and the
/// conversation can self-correct.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The model named a capability the active agent does not have.
    #[error("unknown capability: {0}")]
    Unknown(String),

    /// The call's JSON argument payload was malformed.
    #[error("invalid capability arguments: {0}")]
    ArgumentParse(String),

    /// The capability itself failed.
    #[error("capability '{name}' failed: {reason}")]
    ExecutionFailed { name: String, reason: String },
}
