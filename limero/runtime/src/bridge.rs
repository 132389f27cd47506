//! The pub/sub bridge.
//!
//! Outbound, the bridge encodes messages with the configured wire format and
//! hands them to the [`Transport`]. Inbound, it decodes a payload once and
//! enqueues a typed envelope into every actor bound to a matching topic
//! pattern.
//!
//! Bindings are made during startup. Once the runtime seals the bridge the
//! table is read-only, so inbound delivery only ever takes a read lock.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use limero_codec::{from_snapshot, to_snapshot, Codec, CodecError, Format, MultiCodec};
use limero_value::{Snapshot, Value};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::actor::ActorRef;
use crate::envelope::Envelope;
use crate::error::{Result, RuntimeError};
use crate::message::Message;
use crate::property::SetProps;
use crate::transport::Transport;

/// An inbound payload delivered without conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Snapshot,
}

crate::message!(RawMessage);

/// The default topic of a message published by an actor:
/// `device/actor/MessageName`.
pub fn topic_for(device: &str, actor: &str, message: &str) -> String {
    format!("{}/{}/{}", device, actor, message)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment.
    One,
    /// `**`: zero or more segments.
    Rest,
}

/// A slash-separated topic pattern. `*` matches one segment, `**` any
/// number of segments including none.
///
/// ```rust
/// use limero_runtime::TopicPattern;
///
/// let pattern: TopicPattern = "node/*/props".parse().unwrap();
/// assert!(pattern.matches("node/led/props"));
/// assert!(!pattern.matches("node/led/Blink"));
///
/// let all: TopicPattern = "node/**".parse().unwrap();
/// assert!(all.matches("node"));
/// assert!(all.matches("node/led/props"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl TopicPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |message: &str| RuntimeError::InvalidTopic {
            topic: pattern.to_string(),
            message: message.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("empty pattern"));
        }

        let mut segments = Vec::new();
        for segment in pattern.split('/') {
            let segment = match segment {
                "" => return Err(invalid("empty segment")),
                "*" => Segment::One,
                "**" => Segment::Rest,
                s if s.contains('*') => return Err(invalid("wildcards must fill a segment")),
                s => Segment::Literal(s.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, topic: &str) -> bool {
        let parts: Vec<&str> = topic.split('/').collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], topic: &[&str]) -> bool {
    match pattern.split_first() {
        None => topic.is_empty(),
        Some((Segment::Rest, rest)) => {
            (0..=topic.len()).any(|skip| match_segments(rest, &topic[skip..]))
        }
        Some((segment, rest)) => match topic.split_first() {
            None => false,
            Some((part, tail)) => {
                let head = match segment {
                    Segment::Literal(literal) => literal == part,
                    _ => !part.is_empty(),
                };
                head && match_segments(rest, tail)
            }
        },
    }
}

impl FromStr for TopicPattern {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

type Convert = fn(&str, &Snapshot) -> std::result::Result<Envelope, CodecError>;

fn convert_typed<T: Message + DeserializeOwned>(
    _topic: &str,
    payload: &Snapshot,
) -> std::result::Result<Envelope, CodecError> {
    from_snapshot::<T>(payload).map(Envelope::new)
}

fn convert_raw(topic: &str, payload: &Snapshot) -> std::result::Result<Envelope, CodecError> {
    Ok(Envelope::new(RawMessage {
        topic: topic.to_string(),
        payload: payload.clone(),
    }))
}

fn convert_set_props(topic: &str, payload: &Snapshot) -> std::result::Result<Envelope, CodecError> {
    Ok(Envelope::new(SetProps {
        topic: topic.to_string(),
        payload: payload.clone(),
    }))
}

/// The outcome of delivering one inbound payload to one binding.
#[derive(Debug)]
pub struct Delivery {
    pub actor: String,
    pub message: &'static str,
    /// `Codec` when the payload does not fit the bound type, `MailboxFull`
    /// (carrying the envelope back) or `ActorStopped` when enqueueing failed.
    pub outcome: Result<()>,
}

/// Per-binding outcomes of one inbound payload, in binding order.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    deliveries: Vec<Delivery>,
}

impl DeliveryReport {
    /// How many envelopes were enqueued.
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.outcome.is_ok()).count()
    }

    /// True when no binding matched the topic.
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|d| d.outcome.is_err())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter()
    }
}

impl IntoIterator for DeliveryReport {
    type Item = Delivery;
    type IntoIter = std::vec::IntoIter<Delivery>;

    fn into_iter(self) -> Self::IntoIter {
        self.deliveries.into_iter()
    }
}

struct Binding {
    pattern: TopicPattern,
    target: ActorRef,
    message: &'static str,
    convert: Convert,
}

struct Inner {
    transport: Box<dyn Transport>,
    codec: MultiCodec,
    format: Format,
    bindings: RwLock<Vec<Binding>>,
    sealed: AtomicBool,
}

/// Connects actors to the pub/sub fabric. Clones share the binding table.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    pub fn new(transport: impl Transport + 'static, format: Format) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport: Box::new(transport),
                codec: MultiCodec::standard(),
                format,
                bindings: RwLock::new(Vec::new()),
                sealed: AtomicBool::new(false),
            }),
        }
    }

    /// Wire format of every payload this bridge sends and receives.
    pub fn format(&self) -> &Format {
        &self.inner.format
    }

    /// Encode `msg` and hand it to the transport.
    pub fn publish<T: Message + Serialize>(&self, topic: &str, msg: &T) -> Result<()> {
        let snapshot = to_snapshot(msg)?;
        self.publish_snapshot(topic, &snapshot)
    }

    pub fn publish_value(&self, topic: &str, value: &Value) -> Result<()> {
        self.publish_snapshot(topic, &value.freeze())
    }

    pub fn publish_snapshot(&self, topic: &str, snapshot: &Snapshot) -> Result<()> {
        let payload = self.inner.codec.encode(snapshot, &self.inner.format)?;
        self.inner.transport.send(topic, payload).map_err(|e| {
            warn!(topic, error = %e, "publish failed");
            RuntimeError::from(e)
        })
    }

    /// Deliver payloads on topics matching `pattern` to `target` as `T`.
    pub fn bind<T: Message + DeserializeOwned>(&self, pattern: &str, target: &ActorRef) -> Result<()> {
        self.add(pattern, target, T::NAME, convert_typed::<T>)
    }

    /// Deliver payloads on topics matching `pattern` to `target` as
    /// [`RawMessage`]s.
    pub fn bind_raw(&self, pattern: &str, target: &ActorRef) -> Result<()> {
        self.add(pattern, target, RawMessage::NAME, convert_raw)
    }

    /// Deliver payloads on topics matching `pattern` to `target` as
    /// [`SetProps`] writes.
    pub fn bind_props(&self, pattern: &str, target: &ActorRef) -> Result<()> {
        self.add(pattern, target, SetProps::NAME, convert_set_props)
    }

    fn add(&self, pattern: &str, target: &ActorRef, message: &'static str, convert: Convert) -> Result<()> {
        let pattern = TopicPattern::parse(pattern)?;
        let mut bindings = self.inner.bindings.write();
        // checked under the lock so a concurrent seal cannot slip in between
        if self.is_sealed() {
            return Err(RuntimeError::BindingsSealed);
        }
        debug!(pattern = %pattern, actor = target.name(), message, "topic bound");
        bindings.push(Binding {
            pattern,
            target: target.clone(),
            message,
            convert,
        });
        Ok(())
    }

    /// Freeze the binding table.
    pub fn seal(&self) {
        let _bindings = self.inner.bindings.write();
        self.inner.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.sealed.load(Ordering::Acquire)
    }

    /// `(pattern, actor, message)` of every binding, in binding order.
    pub fn bindings(&self) -> Vec<(String, String, &'static str)> {
        self.inner
            .bindings
            .read()
            .iter()
            .map(|b| (b.pattern.to_string(), b.target.name().to_string(), b.message))
            .collect()
    }

    /// Decode an inbound payload and deliver it to every matching binding.
    ///
    /// Enqueueing waits up to each target's enqueue timeout. A failure for
    /// one binding does not stop delivery to the others; every outcome,
    /// including `MailboxFull` with its envelope, is in the report.
    ///
    /// # Errors
    ///
    /// `Codec` when the payload cannot be decoded in the wire format.
    pub async fn deliver(&self, topic: &str, payload: &[u8]) -> Result<DeliveryReport> {
        let snapshot = self
            .inner
            .codec
            .decode(payload, &self.inner.format)
            .map_err(|e| {
                warn!(topic, error = %e, "undecodable inbound payload");
                e
            })?;
        Ok(self.deliver_snapshot(topic, &snapshot).await)
    }

    pub async fn deliver_snapshot(&self, topic: &str, snapshot: &Snapshot) -> DeliveryReport {
        // enqueue may wait, so never hold the lock across it
        let targets: Vec<(ActorRef, &'static str, Convert)> = self
            .inner
            .bindings
            .read()
            .iter()
            .filter(|b| b.pattern.matches(topic))
            .map(|b| (b.target.clone(), b.message, b.convert))
            .collect();

        if targets.is_empty() {
            debug!(topic, "no binding for inbound topic");
        }

        let mut report = DeliveryReport::default();
        for (target, message, convert) in targets {
            let outcome = match convert(topic, snapshot) {
                Ok(envelope) => target.enqueue(envelope).await,
                Err(e) => Err(RuntimeError::from(e)),
            };
            if let Err(e) = &outcome {
                warn!(topic, actor = target.name(), message, error = %e, "inbound delivery failed");
            }
            report.deliveries.push(Delivery {
                actor: target.name().to_string(),
                message,
                outcome,
            });
        }
        report
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("format", &self.inner.format)
            .field("bindings", &self.inner.bindings.read().len())
            .field("sealed", &self.is_sealed())
            .finish_non_exhaustive()
    }
}
