//! The runtime: actor registry, spawning and shutdown.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use limero_codec::Format;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::actor::{Actor, ActorConfig, ActorHandle, ActorId, ActorRef, ActorState, ActorStats, MIN_STACK_SIZE};
use crate::bridge::Bridge;
use crate::cell::Cell;
use crate::error::{Result, RuntimeError};
use crate::event::Events;
use crate::group::{self, ThreadGroup};
use crate::mailbox::Mailbox;
use crate::message::Message;
use crate::transport::Transport;

/// Runtime-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on spawned actors.
    pub max_actors: usize,
    /// First segment of every topic this node publishes.
    pub device: String,
    pub wire_format: Format,
    /// Mailbox capacity of actors whose config leaves it unset.
    pub mailbox_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_actors: 64,
            device: "node".to_string(),
            wire_format: Format::CBOR,
            mailbox_capacity: 16,
        }
    }
}

/// Name to actor lookup, shared by the runtime and every actor context.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    actors: Arc<RwLock<BTreeMap<String, ActorHandle>>>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<ActorHandle> {
        self.actors.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.actors.read().keys().cloned().collect()
    }

    pub fn handles(&self) -> Vec<ActorHandle> {
        self.actors.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.actors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, handle: ActorHandle, limit: usize) -> Result<()> {
        let mut actors = self.actors.write();
        if actors.contains_key(handle.name()) {
            return Err(RuntimeError::DuplicateActor(handle.name().to_string()));
        }
        if actors.len() >= limit {
            return Err(RuntimeError::ResourceExhausted(format!(
                "actor limit of {} reached",
                limit
            )));
        }
        actors.insert(handle.name().to_string(), handle);
        Ok(())
    }

    fn remove(&self, name: &str) -> Option<ActorHandle> {
        self.actors.write().remove(name)
    }
}

/// Owns every actor of one node and the bridge they publish through.
///
/// # Example
///
/// ```rust
/// use limero_runtime::{
///     message, Actor, ActorConfig, ActorContext, ActorState, Handlers, NullTransport,
///     Result, Runtime, RuntimeConfig,
/// };
///
/// struct Ping;
/// message!(Ping);
///
/// #[derive(Default)]
/// struct Counter {
///     pings: u32,
/// }
///
/// impl Counter {
///     async fn ping(&mut self, _ctx: &mut ActorContext, _msg: Ping) -> Result<()> {
///         self.pings += 1;
///         Ok(())
///     }
/// }
///
/// impl Actor for Counter {
///     fn handlers() -> Handlers<Self> {
///         Handlers::<Self>::new().on::<Ping>(|c, ctx, m| Box::pin(c.ping(ctx, m)))
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let mut runtime = Runtime::new(RuntimeConfig::default(), NullTransport);
/// let counter = runtime.spawn(ActorConfig::new("counter"), Counter::default).unwrap();
/// counter.tell(Ping).await.unwrap();
/// runtime.shutdown().await;
/// assert_eq!(counter.state(), ActorState::Stopped);
/// # });
/// ```
pub struct Runtime {
    config: RuntimeConfig,
    device: Arc<str>,
    registry: Registry,
    bridge: Bridge,
    events: Events,
    threads: Vec<thread::JoinHandle<()>>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig, transport: impl Transport + 'static) -> Self {
        let bridge = Bridge::new(transport, config.wire_format.clone());
        Self {
            device: Arc::from(config.device.as_str()),
            config,
            registry: Registry::default(),
            bridge,
            events: Events::default(),
            threads: Vec::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn actor(&self, name: &str) -> Option<ActorHandle> {
        self.registry.get(name)
    }

    /// Run `f` on the raising actor's thread whenever the actor registered
    /// as `source` raises an `E` through [`ActorContext::raise`].
    ///
    /// [`ActorContext::raise`]: crate::ActorContext::raise
    pub fn on_event<E, F>(&self, source: &str, f: F) -> Result<()>
    where
        E: Message,
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        let source = self
            .registry
            .get(source)
            .ok_or_else(|| RuntimeError::ActorNotFound(source.to_string()))?;
        self.events.listen(source.id(), f);
        debug!(source = source.name(), event = E::NAME, "event listener added");
        Ok(())
    }

    /// Tell `target` a copy of every `E` that `source` raises. A full
    /// target mailbox surfaces as `MailboxFull` from the raise.
    pub fn forward<E: Message + Clone>(&self, source: &str, target: &str) -> Result<()> {
        let target = self
            .registry
            .get(target)
            .ok_or_else(|| RuntimeError::ActorNotFound(target.to_string()))?
            .actor_ref()
            .clone();
        self.on_event(source, move |event: &E| target.try_tell(event.clone()))
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    /// Create an actor on its own thread. `factory` runs on that thread, so
    /// the actor itself need not be `Send`.
    ///
    /// Returns as soon as the actor is registered; startup runs
    /// concurrently. A startup failure shows up as the actor reaching
    /// `Stopped` with [`ActorHandle::startup_error`] set.
    pub fn spawn<A, F>(&mut self, config: ActorConfig, factory: F) -> Result<ActorHandle>
    where
        A: Actor,
        F: FnOnce() -> A + Send + 'static,
    {
        let (handle, cell) = self.prepare(&config)?;
        let spawned = thread::Builder::new()
            .name(format!("actor-{}", config.name))
            .stack_size(config.stack_size.max(MIN_STACK_SIZE))
            .spawn(move || cell.run(factory));

        match spawned {
            Ok(thread) => {
                self.threads.push(thread);
                debug!(actor = %config.name, id = %handle.id(), "spawned");
                Ok(handle)
            }
            Err(e) => {
                self.registry.remove(&config.name);
                warn!(actor = %config.name, error = %e, "failed to spawn actor thread");
                Err(RuntimeError::ResourceExhausted(format!(
                    "thread for '{}': {}",
                    config.name, e
                )))
            }
        }
    }

    /// Create every actor of `group` on one shared thread. Their handlers
    /// interleave at await points; each keeps its own mailbox and timers.
    ///
    /// Registration is all or nothing: if any member is refused, none of
    /// them is registered.
    pub fn spawn_group(&mut self, group: ThreadGroup) -> Result<Vec<ActorHandle>> {
        let (thread_config, members) = group.into_parts();
        if members.is_empty() {
            return Err(RuntimeError::InvalidConfig(format!(
                "thread group '{}' has no actors",
                thread_config.name
            )));
        }

        let mut handles = Vec::with_capacity(members.len());
        let mut cells = Vec::with_capacity(members.len());
        for (config, launch) in members {
            match self.prepare(&config) {
                Ok((handle, cell)) => {
                    handles.push(handle);
                    cells.push((cell, launch));
                }
                Err(e) => {
                    for handle in &handles {
                        self.registry.remove(handle.name());
                    }
                    return Err(e);
                }
            }
        }

        let spawned = thread::Builder::new()
            .name(format!("group-{}", thread_config.name))
            .stack_size(thread_config.stack_size.max(MIN_STACK_SIZE))
            .spawn(move || group::run(cells));

        match spawned {
            Ok(thread) => {
                self.threads.push(thread);
                debug!(group = %thread_config.name, actors = handles.len(), "group spawned");
                Ok(handles)
            }
            Err(e) => {
                for handle in &handles {
                    self.registry.remove(handle.name());
                }
                warn!(group = %thread_config.name, error = %e, "failed to spawn group thread");
                Err(RuntimeError::ResourceExhausted(format!(
                    "thread for group '{}': {}",
                    thread_config.name, e
                )))
            }
        }
    }

    /// Validate `config`, register the actor and build the cell its thread
    /// will run.
    fn prepare(&self, config: &ActorConfig) -> Result<(ActorHandle, Cell)> {
        let capacity = config
            .mailbox_capacity
            .unwrap_or(self.config.mailbox_capacity);
        if capacity == 0 {
            return Err(RuntimeError::InvalidConfig(format!(
                "actor '{}' has a zero mailbox capacity",
                config.name
            )));
        }
        if config.name.is_empty() || config.name.contains(['/', '*']) {
            return Err(RuntimeError::InvalidConfig(format!(
                "'{}' is not a valid actor name",
                config.name
            )));
        }

        let name: Arc<str> = Arc::from(config.name.as_str());
        let (sender, mailbox) = Mailbox::new(capacity);
        let actor = ActorRef::new(ActorId::new(), name.clone(), sender, config.enqueue_timeout);
        let (state_tx, state_rx) = watch::channel(ActorState::Created);
        let (stop_tx, stop_rx) = watch::channel(false);
        let stats = Arc::new(ActorStats::default());
        let handle = ActorHandle::new(actor, state_rx, Arc::new(stop_tx), stats.clone());

        self.registry.insert(handle.clone(), self.config.max_actors)?;
        debug!(actor = %name, capacity, "registered");

        let cell = Cell {
            handle: handle.clone(),
            name,
            mailbox,
            state: state_tx,
            stop: stop_rx,
            stats,
            registry: self.registry.clone(),
            bridge: self.bridge.clone(),
            events: self.events.clone(),
            device: self.device.clone(),
            priority: config.priority,
        };
        Ok((handle, cell))
    }

    /// Wait until every actor is past startup, then freeze the bridge's
    /// binding table.
    pub async fn seal(&self) {
        for handle in self.registry.handles() {
            handle.wait_for(ActorState::Running).await;
        }
        self.bridge.seal();
        info!(actors = self.registry.len(), "bindings sealed");
    }

    /// Stop every actor and wait for their threads to finish.
    pub async fn shutdown(&mut self) {
        let handles = self.registry.handles();
        for handle in &handles {
            handle.stop();
        }
        for handle in &handles {
            handle.wait_for(ActorState::Stopped).await;
        }

        for thread in self.threads.drain(..) {
            let name = thread.thread().name().map(str::to_string);
            let joined = tokio::task::spawn_blocking(move || thread.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                warn!(thread = ?name, "actor thread panicked");
            }
        }
        info!(actors = handles.len(), "runtime shut down");
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        for handle in self.registry.handles() {
            handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_config_defaults_and_serde() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_actors, 64);
        assert_eq!(config.wire_format, Format::CBOR);

        let parsed: RuntimeConfig =
            serde_json::from_str(r#"{"device": "esp32-01", "wire_format": "json"}"#).unwrap();
        assert_eq!(parsed.device, "esp32-01");
        assert_eq!(parsed.wire_format, Format::JSON);
        assert_eq!(parsed.mailbox_capacity, 16);
    }
}
