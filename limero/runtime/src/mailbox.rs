//! Bounded FIFO mailboxes.
//!
//! A mailbox is a bounded tokio channel of envelopes. Capacity is the only
//! backpressure signal: producers wait at most their enqueue timeout and then
//! get the envelope back.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::envelope::Envelope;

/// Why an envelope could not be enqueued. Either way the caller keeps it.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("mailbox full")]
    Full(Envelope),

    #[error("mailbox closed")]
    Closed(Envelope),
}

impl EnqueueError {
    pub fn into_envelope(self) -> Envelope {
        match self {
            EnqueueError::Full(env) | EnqueueError::Closed(env) => env,
        }
    }
}

/// The producing side of a mailbox. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MailboxSender {
    tx: mpsc::Sender<Envelope>,
}

impl MailboxSender {
    /// Enqueue, waiting up to `timeout` for a free slot.
    pub async fn enqueue(&self, mut env: Envelope, timeout: Duration) -> Result<(), EnqueueError> {
        env.stamp();
        self.tx.send_timeout(env, timeout).await.map_err(|e| match e {
            mpsc::error::SendTimeoutError::Timeout(env) => EnqueueError::Full(env),
            mpsc::error::SendTimeoutError::Closed(env) => EnqueueError::Closed(env),
        })
    }

    /// Enqueue only if a slot is free right now.
    pub fn try_enqueue(&self, mut env: Envelope) -> Result<(), EnqueueError> {
        env.stamp();
        self.tx.try_send(env).map_err(|e| match e {
            mpsc::error::TrySendError::Full(env) => EnqueueError::Full(env),
            mpsc::error::TrySendError::Closed(env) => EnqueueError::Closed(env),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots at this instant.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// The consuming side of a mailbox, owned by exactly one actor.
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::Receiver<Envelope>,
}

impl Mailbox {
    /// Create a mailbox holding at most `capacity` envelopes. A capacity of
    /// zero is treated as one.
    pub fn new(capacity: usize) -> (MailboxSender, Mailbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (MailboxSender { tx }, Mailbox { rx })
    }

    /// Wait for the next envelope. Returns `None` once `stop` turns true or
    /// every sender is gone. A pending stop wins over queued envelopes.
    pub async fn dequeue(&mut self, stop: &mut watch::Receiver<bool>) -> Option<Envelope> {
        if *stop.borrow() {
            return None;
        }
        tokio::select! {
            biased;
            _ = stop.wait_for(|stopped| *stopped) => None,
            env = self.rx.recv() => env,
        }
    }

    pub fn try_dequeue(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Close the mailbox and discard everything still queued. Returns how
    /// many envelopes were dropped unhandled.
    pub fn drain(&mut self) -> usize {
        self.rx.close();
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}
