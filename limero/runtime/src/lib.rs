//! # Limero Runtime
//!
//! The actor layer of limero: small, long-lived actors that exchange typed
//! messages through bounded mailboxes, react to their own timers and talk
//! to the outside world through a pub/sub bridge.
//!
//! ## Core Concepts
//!
//! ### Actors
//!
//! An **Actor** is private state plus an ordered table of typed handlers.
//! Each actor:
//!
//! - Runs on its own thread, hosting a single-threaded async executor
//! - Owns one bounded FIFO mailbox and handles one envelope at a time
//! - Owns its timers; a timer fire is just another envelope
//! - Goes through `Created → Starting → Running → Draining → Stopped`
//!
//! Actors never share mutable state. What crosses between them is an
//! [`Envelope`] holding an owned, `Send` message; dynamic data travels as a
//! frozen [`Snapshot`](limero_value::Snapshot).
//!
//! ### Messages
//!
//! A message type is any `Send + Sync + 'static` type implementing
//! [`Message`], usually through [`message!`]. Its id is the FNV-1a hash of
//! its name, computed at compile time. Dispatch checks the id and then the
//! concrete type, so an id collision can never hand a handler the wrong
//! type.
//!
//! ### Events and properties
//!
//! An actor can [raise](ActorContext::raise) a typed event; listeners
//! registered with [`Runtime::on_event`] run on the raising thread and
//! usually tell another actor something. Properties an actor declares with
//! [`ActorContext::declare`] are described under `device/actor/info` and,
//! when writable, set through `device/actor/set`.
//!
//! ### Backpressure
//!
//! Mailbox capacity is the only flow control. A sender waits at most the
//! target's enqueue timeout and then gets the envelope back in
//! [`RuntimeError::MailboxFull`]. Timer drivers never wait: a fire that finds
//! the mailbox full is dropped and counted.
//!
//! ### The Bridge
//!
//! The [`Bridge`] encodes outbound messages with the node's wire format
//! and hands them to a [`Transport`]. Inbound payloads are decoded once and
//! delivered, as the bound type, to every actor subscribed to a matching
//! topic pattern. Subscriptions are made in `on_start` and frozen by
//! [`Runtime::seal`].
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use limero_runtime::{
//!     message, Actor, ActorConfig, ActorContext, ChannelTransport, Handlers, Result,
//!     Runtime, RuntimeConfig, TimerHandle,
//! };
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Heartbeat {
//!     beat: u32,
//! }
//! message!(Heartbeat);
//!
//! struct Pulse {
//!     beats: u32,
//! }
//!
//! #[async_trait::async_trait(?Send)]
//! impl Actor for Pulse {
//!     fn handlers() -> Handlers<Self> {
//!         Handlers::<Self>::new()
//!     }
//!
//!     async fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
//!         ctx.timers().repeating(Duration::from_millis(10));
//!         Ok(())
//!     }
//!
//!     async fn on_timer(&mut self, ctx: &mut ActorContext, _timer: TimerHandle) -> Result<()> {
//!         self.beats += 1;
//!         ctx.announce(&Heartbeat { beat: self.beats })
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let (transport, mut outbound) = ChannelTransport::pair(16);
//! let mut runtime = Runtime::new(RuntimeConfig::default(), transport);
//! runtime.spawn(ActorConfig::new("pulse"), || Pulse { beats: 0 }).unwrap();
//!
//! let first = outbound.recv().await.unwrap();
//! assert_eq!(first.topic, "node/pulse/Heartbeat");
//! runtime.shutdown().await;
//! # });
//! ```

pub mod actor;
pub mod bridge;
mod cell;
pub mod context;
pub mod envelope;
pub mod error;
pub mod event;
pub mod group;
pub mod mailbox;
pub mod message;
pub mod property;
pub mod runtime;
pub mod timer;
pub mod transport;

pub use actor::{
    Actor, ActorConfig, ActorHandle, ActorId, ActorRef, ActorState, ActorStats, HandlerFn,
    HandlerFuture, Handlers, MIN_STACK_SIZE,
};
pub use bridge::{topic_for, Bridge, Delivery, DeliveryReport, RawMessage, TopicPattern};
pub use context::{ActorContext, PROPS_TOPIC};
pub use envelope::Envelope;
pub use error::{Result, RuntimeError};
pub use event::Events;
pub use group::{ThreadConfig, ThreadGroup};
pub use mailbox::{EnqueueError, Mailbox, MailboxSender};
pub use message::{fnv1a_32, Message, MsgId};
pub use property::{PropMode, PropType, PropertyInfo, SetProps, INFO_TOPIC, SET_TOPIC};
pub use runtime::{Registry, Runtime, RuntimeConfig};
pub use timer::{TimerFired, TimerHandle, Timers};
pub use transport::{ChannelTransport, NullTransport, Outbound, Transport, TransportError};
