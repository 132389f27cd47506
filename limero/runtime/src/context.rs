//! What an actor sees of the runtime while it runs.

use std::sync::Arc;

use limero_codec::to_snapshot;
use limero_value::{Frozen, Snapshot, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::actor::{ActorHandle, ActorId, ActorRef};
use crate::bridge::{topic_for, Bridge};
use crate::envelope::Envelope;
use crate::error::{Result, RuntimeError};
use crate::event::Events;
use crate::message::Message;
use crate::property::{PropertyInfo, INFO_TOPIC, SET_TOPIC};
use crate::runtime::Registry;
use crate::timer::Timers;

/// Topic segment under which an actor's properties are published.
pub const PROPS_TOPIC: &str = "props";

/// Handed to every hook and handler of an actor.
///
/// Lives on the actor's thread together with the actor, so it may own
/// `!Send` state such as the actor's property [`Value`].
pub struct ActorContext {
    handle: ActorHandle,
    timers: Timers,
    registry: Registry,
    bridge: Bridge,
    events: Events,
    device: Arc<str>,
    props: Value,
    properties: Vec<PropertyInfo>,
    starting: bool,
}

impl ActorContext {
    pub(crate) fn new(
        handle: ActorHandle,
        timers: Timers,
        registry: Registry,
        bridge: Bridge,
        events: Events,
        device: Arc<str>,
    ) -> Self {
        Self {
            handle,
            timers,
            registry,
            bridge,
            events,
            device,
            props: Value::map(),
            properties: Vec::new(),
            starting: false,
        }
    }

    pub(crate) fn set_starting(&mut self, starting: bool) {
        self.starting = starting;
    }

    pub fn id(&self) -> ActorId {
        self.handle.id()
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// The device segment that prefixes this node's topics.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// An address for this actor, to hand to others.
    pub fn myself(&self) -> &ActorRef {
        self.handle.actor_ref()
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// The actor's exported properties. Handles share the node, so writes
    /// through the returned value are what [`publish_props`](Self::publish_props)
    /// sends.
    pub fn props(&self) -> &Value {
        &self.props
    }

    /// Send `msg` to the sibling registered as `target`, waiting up to the
    /// target's enqueue timeout.
    pub async fn emit<T: Message>(&self, target: &str, msg: T) -> Result<()> {
        let target = self
            .registry
            .get(target)
            .ok_or_else(|| RuntimeError::ActorNotFound(target.to_string()))?;
        self.tell(target.actor_ref(), msg).await
    }

    /// Send `msg` to `to`, stamped with this actor as sender.
    pub async fn tell<T: Message>(&self, to: &ActorRef, msg: T) -> Result<()> {
        to.enqueue(Envelope::new(msg).with_sender(Some(self.id())))
            .await
    }

    pub fn publish<T: Message + Serialize>(&self, topic: &str, msg: &T) -> Result<()> {
        self.bridge.publish(topic, msg)
    }

    pub fn publish_value(&self, topic: &str, value: &Value) -> Result<()> {
        self.bridge.publish_value(topic, value)
    }

    /// Publish `msg` on this actor's own topic for `T`,
    /// `device/actor/MessageName`.
    pub fn announce<T: Message + Serialize>(&self, msg: &T) -> Result<()> {
        let topic = topic_for(&self.device, self.name(), T::NAME);
        self.bridge.publish(&topic, msg)
    }

    /// Publish the current properties under `device/actor/props`.
    pub fn publish_props(&self) -> Result<()> {
        let topic = topic_for(&self.device, self.name(), PROPS_TOPIC);
        self.bridge.publish_value(&topic, &self.props)
    }

    /// Declare an exported property and store its initial value in
    /// [`props`](Self::props). The first writable declaration subscribes
    /// this actor to `device/actor/set`. Only allowed from `on_start`.
    ///
    /// # Errors
    ///
    /// `Property` for a duplicate name or an initial value the declared type
    /// does not admit; `NotStarting` outside of startup.
    pub fn declare(&mut self, mut info: PropertyInfo, initial: impl Into<Value>) -> Result<()> {
        self.check_starting()?;
        if self.property(&info.name).is_some() {
            return Err(RuntimeError::property(&info.name, "declared twice"));
        }
        let initial = initial.into();
        if !info.kind.admits(&initial) {
            return Err(RuntimeError::property(
                &info.name,
                format!("initial {} is not a {:?}", initial.kind(), info.kind),
            ));
        }

        if info.mode.writable() && !self.properties.iter().any(|p| p.mode.writable()) {
            let topic = topic_for(&self.device, self.name(), SET_TOPIC);
            self.bridge.bind_props(&topic, self.myself())?;
        }
        info.id = self.properties.len() as u32;
        self.props.insert(info.name.clone(), initial)?;
        self.properties.push(info);
        Ok(())
    }

    /// Declared properties, in declaration order.
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Publish the property table under `device/actor/info`.
    pub fn publish_info(&self) -> Result<()> {
        let topic = topic_for(&self.device, self.name(), INFO_TOPIC);
        let table = to_snapshot(&self.properties)?;
        self.bridge.publish_snapshot(&topic, &table)
    }

    /// Apply a write of several properties at once, all or nothing.
    ///
    /// Returns the names written together with their previous values, for
    /// [`restore_props`](Self::restore_props).
    pub(crate) fn apply_props(&mut self, update: &Snapshot) -> Result<Vec<(String, Snapshot)>> {
        let Frozen::Map(entries) = &**update else {
            return Err(RuntimeError::property(
                self.name(),
                format!("write must be a map, got {}", update.kind()),
            ));
        };

        let mut staged = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            let info = self
                .property(name)
                .ok_or_else(|| RuntimeError::property(name, "not declared"))?;
            if !info.mode.writable() {
                return Err(RuntimeError::property(name, "read-only"));
            }
            let value = value.thaw();
            if !info.kind.admits(&value) {
                return Err(RuntimeError::property(
                    name,
                    format!("{} is not a {:?}", value.kind(), info.kind),
                ));
            }
            staged.push((name.clone(), value));
        }

        let mut previous = Vec::with_capacity(staged.len());
        for (name, value) in staged {
            let old = self.props.get(name.as_str())?.freeze();
            self.props.insert(name.clone(), value)?;
            previous.push((name, old));
        }
        Ok(previous)
    }

    pub(crate) fn restore_props(&mut self, previous: Vec<(String, Snapshot)>) -> Result<()> {
        for (name, old) in previous {
            self.props.insert(name, old.thaw())?;
        }
        Ok(())
    }

    /// Run every listener registered for `event` raised by this actor, on
    /// this thread. Returns how many ran, or the first listener failure.
    pub fn raise<E: Message>(&self, event: &E) -> Result<usize> {
        self.events.raise(self.id(), event)
    }

    /// Receive payloads published on topics matching `pattern` as `T`.
    /// Only allowed from `on_start`.
    pub fn subscribe<T: Message + DeserializeOwned>(&self, pattern: &str) -> Result<()> {
        self.check_starting()?;
        self.bridge.bind::<T>(pattern, self.myself())
    }

    /// Like [`subscribe`](Self::subscribe), delivering
    /// [`RawMessage`](crate::RawMessage)s.
    pub fn subscribe_raw(&self, pattern: &str) -> Result<()> {
        self.check_starting()?;
        self.bridge.bind_raw(pattern, self.myself())
    }

    fn check_starting(&self) -> Result<()> {
        if self.starting {
            Ok(())
        } else {
            Err(RuntimeError::NotStarting(self.name().to_string()))
        }
    }

    /// Stop this actor once the current handler returns.
    pub fn stop(&self) {
        self.handle.stop();
    }
}
