//! Envelopes: one owned message plus delivery metadata.

use std::any::Any;
use std::fmt;
use std::time::Instant;

use crate::actor::ActorId;
use crate::message::{Message, MsgId};

/// A single message in transit.
///
/// An envelope owns its message. Taking the message out consumes the
/// envelope, so a message is handled at most once.
pub struct Envelope {
    id: MsgId,
    name: &'static str,
    sender: Option<ActorId>,
    enqueued_at: Instant,
    payload: Box<dyn Any + Send + Sync>,
}

impl Envelope {
    pub fn new<T: Message>(msg: T) -> Self {
        Self {
            id: T::ID,
            name: T::NAME,
            sender: None,
            enqueued_at: Instant::now(),
            payload: Box::new(msg),
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: Option<ActorId>) -> Self {
        self.sender = sender;
        self
    }

    pub(crate) fn stamp(&mut self) {
        self.enqueued_at = Instant::now();
    }

    pub fn id(&self) -> MsgId {
        self.id
    }

    /// Declared name of the carried message type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn sender(&self) -> Option<ActorId> {
        self.sender
    }

    /// When the envelope last entered a mailbox.
    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// True when the id matches `T` and the payload really is a `T`.
    pub fn is<T: Message>(&self) -> bool {
        self.id == T::ID && self.payload.is::<T>()
    }

    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        if self.id != T::ID {
            return None;
        }
        self.payload.downcast_ref::<T>()
    }

    /// Take the message out, or get the envelope back untouched if it does
    /// not carry a `T`.
    pub fn take<T: Message>(self) -> Result<T, Envelope> {
        if !self.is::<T>() {
            return Err(self);
        }
        let Envelope {
            id,
            name,
            sender,
            enqueued_at,
            payload,
        } = self;
        payload.downcast::<T>().map(|b| *b).map_err(|payload| Envelope {
            id,
            name,
            sender,
            enqueued_at,
            payload,
        })
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message;

    #[derive(Debug, PartialEq)]
    struct Blink {
        interval_ms: u32,
    }

    #[derive(Debug, PartialEq)]
    enum LedCmd {
        On,
    }

    message!(Blink, LedCmd);

    // Shares Blink's id on purpose.
    struct Impostor;
    message!(Impostor => "Blink");

    #[test]
    fn take_matching_type() {
        let env = Envelope::new(Blink { interval_ms: 250 });
        assert_eq!(env.name(), "Blink");
        assert_eq!(env.id(), Blink::ID);
        assert_eq!(env.take::<Blink>().unwrap(), Blink { interval_ms: 250 });
    }

    #[test]
    fn take_wrong_type_returns_envelope() {
        let env = Envelope::new(LedCmd::On);
        let env = env.take::<Blink>().unwrap_err();
        assert_eq!(env.take::<LedCmd>().unwrap(), LedCmd::On);
    }

    #[test]
    fn colliding_id_is_not_reinterpreted() {
        let env = Envelope::new(Impostor);
        assert_eq!(env.id(), Blink::ID);
        assert!(!env.is::<Blink>());
        assert!(env.downcast_ref::<Blink>().is_none());
        let env = env.take::<Blink>().unwrap_err();
        assert!(env.is::<Impostor>());
    }

    #[test]
    fn sender_metadata() {
        let id = ActorId::new();
        let env = Envelope::new(LedCmd::On).with_sender(Some(id));
        assert_eq!(env.sender(), Some(id));
        assert!(env.enqueued_at() <= Instant::now());
        assert!(format!("{:?}", env).contains("LedCmd"));
    }
}
