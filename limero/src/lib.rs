//! Limero: actors, dynamic values and a pub/sub bridge for small telemetry nodes.
//!
//! Limero splits a node into independent actors that exchange typed messages through
//! bounded mailboxes. Dynamic data is a [`Value`](value::Value) tree, frozen into a
//! [`Snapshot`](value::Snapshot) whenever it crosses an actor boundary or the network.
//!
//! - [`value`]: the dynamic value tree and its frozen form
//! - [`codec`]: wire codecs (CBOR subset and JSON) and serde conversion
//! - [`runtime`]: actors, mailboxes, timers and the pub/sub bridge

pub use limero_codec as codec;
pub use limero_runtime as runtime;
pub use limero_value as value;

pub use limero_runtime::{
    message, Actor, ActorConfig, ActorContext, ActorHandle, ActorRef, Handlers, Message, PropMode,
    PropType, PropertyInfo, Result, Runtime, RuntimeConfig, RuntimeError, ThreadConfig,
    ThreadGroup,
};
pub use limero_value::{path, Snapshot, Value};
