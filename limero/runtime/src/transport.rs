//! The outbound side of the pub/sub fabric.
//!
//! The runtime never talks to a network itself. It hands encoded payloads
//! to a [`Transport`], which must not block.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors a transport may report for a single hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport cannot take more payloads right now.
    #[error("transport backlogged")]
    Backlogged,

    /// The transport has shut down.
    #[error("transport closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// Hands encoded payloads to the pub/sub session. Fire-and-forget: `send`
/// returns once the payload is queued, never waiting on the network.
pub trait Transport: Send + Sync {
    fn send(&self, topic: &str, payload: Bytes) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        (**self).send(topic, payload)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        (**self).send(topic, payload)
    }
}

/// One published payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub topic: String,
    pub payload: Bytes,
}

/// A transport backed by a bounded tokio channel.
///
/// The receiving half goes to whatever owns the network session (or to a
/// test). A full channel reports [`TransportError::Backlogged`].
///
/// ```rust
/// use limero_runtime::{ChannelTransport, Transport};
///
/// let (transport, mut rx) = ChannelTransport::pair(8);
/// transport.send("node/led/props", "{}".into()).unwrap();
/// assert_eq!(rx.try_recv().unwrap().topic, "node/led/props");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Outbound>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its payloads arrive on.
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        self.tx
            .try_send(Outbound {
                topic: topic.to_string(),
                payload,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::Backlogged,
                mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            })
    }
}

/// A transport that accepts and discards everything, for nodes without a
/// network session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, _topic: &str, _payload: Bytes) -> Result<(), TransportError> {
        Ok(())
    }
}
