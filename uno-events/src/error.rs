//! Error types for the event bus.

use thiserror::Error;

/// Failure reported by a single listener.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The listener gave up with a message.
    #[error("{0}")]
    Failed(String),

    /// The listener propagated another error.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ListenerError {
    /// Convenience constructor for message-only failures.
    pub fn failed(message: impl Into<String>) -> Self {
        ListenerError::Failed(message.into())
    }
}

/// Errors surfaced by [`crate::EventBus::emit`].
#[derive(Error, Debug)]
pub enum EventBusError {
    /// A listener failed; listeners after it were not invoked.
    #[error("listener #{index} for event '{event}' failed: {source}")]
    ListenerFailed {
        event: String,
        index: usize,
        #[source]
        source: ListenerError,
    },
}

/// Result type for listener bodies.
pub type ListenerResult = Result<(), ListenerError>;
