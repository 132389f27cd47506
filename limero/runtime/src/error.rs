//! Error types for the limero runtime.

use limero_codec::CodecError;
use limero_value::ValueError;
use thiserror::Error;

use crate::envelope::Envelope;
use crate::transport::TransportError;

/// Errors that can occur in the limero runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The target mailbox stayed full for the whole enqueue timeout. The
    /// undelivered envelope is handed back to the producer.
    #[error("mailbox of '{actor}' is full")]
    MailboxFull { actor: String, envelope: Envelope },

    /// The target actor has stopped and no longer accepts envelopes.
    #[error("actor '{0}' has stopped")]
    ActorStopped(String),

    /// No actor is registered under the name.
    #[error("actor not found: {0}")]
    ActorNotFound(String),

    /// An actor is already registered under the name.
    #[error("actor already registered: {0}")]
    DuplicateActor(String),

    /// The actor's startup hook failed; it will not be restarted.
    #[error("startup of '{actor}' failed: {message}")]
    StartupFailure { actor: String, message: String },

    /// A fixed construction-time limit was reached.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// An actor or runtime configuration value is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The topic binding table no longer accepts changes.
    #[error("topic bindings are sealed")]
    BindingsSealed,

    /// Subscriptions may only be made from `on_start`.
    #[error("'{0}' subscribed outside of startup")]
    NotStarting(String),

    /// A topic or topic pattern is malformed.
    #[error("invalid topic '{topic}': {message}")]
    InvalidTopic { topic: String, message: String },

    /// The transport refused an outbound payload.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A property declaration or write was refused.
    #[error("property '{name}': {message}")]
    Property { name: String, message: String },

    /// A message handler failed.
    #[error("handler error: {0}")]
    Handler(String),

    /// A value operation failed.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Encoding or decoding a payload failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

}

impl RuntimeError {
    pub fn handler(message: impl Into<String>) -> Self {
        RuntimeError::Handler(message.into())
    }

    pub fn property(name: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Property {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The undelivered envelope, if this error carries one.
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            RuntimeError::MailboxFull { envelope, .. } => Some(envelope),
            _ => None,
        }
    }
}

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message;

    struct Ping;
    message!(Ping);

    #[test]
    fn mailbox_full_returns_envelope() {
        let err = RuntimeError::MailboxFull {
            actor: "led".to_string(),
            envelope: Envelope::new(Ping),
        };
        assert_eq!(err.to_string(), "mailbox of 'led' is full");

        let envelope = err.into_envelope().unwrap();
        assert!(envelope.is::<Ping>());
    }

    #[test]
    fn error_display() {
        let e = RuntimeError::StartupFailure {
            actor: "wifi".to_string(),
            message: "no radio".to_string(),
        };
        assert_eq!(e.to_string(), "startup of 'wifi' failed: no radio");
        assert!(RuntimeError::ActorNotFound("x".into()).into_envelope().is_none());
        assert_eq!(
            RuntimeError::property("rpm", "read-only").to_string(),
            "property 'rpm': read-only"
        );
    }

    #[test]
    fn errors_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuntimeError>();
    }
}
