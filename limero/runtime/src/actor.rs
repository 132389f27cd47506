//! Actor types for the limero runtime.
//!
//! An actor owns one mailbox, one thread and a set of timers. Its receive
//! loop handles one envelope at a time, so actor state needs no locking.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::context::ActorContext;
use crate::envelope::Envelope;
use crate::error::{Result, RuntimeError};
use crate::mailbox::{EnqueueError, MailboxSender};
use crate::message::{Message, MsgId};
use crate::timer::TimerHandle;

/// Unique identifier for an actor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Create a new random ActorId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an actor. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActorState {
    /// Mailbox and thread allocated; startup has not begun.
    Created,
    /// `on_start` is running.
    Starting,
    /// The receive loop is handling envelopes.
    Running,
    /// Stop requested: queued envelopes are discarded and timers cancelled.
    Draining,
    /// Terminal.
    Stopped,
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Counters kept by each actor's receive loop and timer driver.
#[derive(Debug, Default)]
pub struct ActorStats {
    delivered: AtomicU64,
    unmatched: AtomicU64,
    failed: AtomicU64,
    discarded_on_stop: AtomicU64,
    timer_fires_dropped: AtomicU64,
    startup_error: Mutex<Option<String>>,
}

impl ActorStats {
    /// Envelopes handed to a handler or `on_timer`.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Envelopes discarded because no handler matched.
    pub fn unmatched(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }

    /// Handler invocations that returned an error.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Envelopes dropped unhandled when the actor stopped.
    pub fn discarded_on_stop(&self) -> u64 {
        self.discarded_on_stop.load(Ordering::Relaxed)
    }

    pub fn timer_fires_dropped(&self) -> u64 {
        self.timer_fires_dropped.load(Ordering::Relaxed)
    }

    pub fn startup_failed(&self) -> bool {
        self.startup_error.lock().is_some()
    }

    /// Why startup failed, if it did.
    pub fn startup_error(&self) -> Option<String> {
        self.startup_error.lock().clone()
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unmatched(&self) {
        self.unmatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, n: usize) {
        self.discarded_on_stop.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_timer_fire_dropped(&self) {
        self.timer_fires_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_startup_failed(&self, message: impl Into<String>) {
        self.startup_error.lock().get_or_insert_with(|| message.into());
    }
}

/// Per-actor construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Registry name, also the actor's topic segment.
    pub name: String,
    /// Mailbox slots; the runtime default applies when unset.
    pub mailbox_capacity: Option<usize>,
    /// How long `tell` waits for a free slot before `MailboxFull`.
    #[serde(with = "millis")]
    pub enqueue_timeout: Duration,
    /// Stack of the actor's thread, in bytes.
    pub stack_size: usize,
    /// Scheduling hint. Recorded and logged only.
    pub priority: u8,
}

/// Smallest stack an actor thread is given, whatever the config says.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

impl ActorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }

    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            name: "actor".to_string(),
            mailbox_capacity: None,
            enqueue_timeout: Duration::from_millis(100),
            stack_size: 256 * 1024,
            priority: 1,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// An actor: private state plus typed handlers.
///
/// Actors are built on their own thread by a factory closure and never
/// leave it, so they may hold [`Value`](limero_value::Value)s and other
/// `!Send` state.
#[async_trait(?Send)]
pub trait Actor: 'static {
    /// Handlers in the order they are tried.
    fn handlers() -> Handlers<Self>
    where
        Self: Sized;

    /// Runs once before any envelope is handled. An error stops the actor
    /// for good.
    async fn on_start(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    /// A timer owned by this actor fired.
    async fn on_timer(&mut self, _ctx: &mut ActorContext, _timer: TimerHandle) -> Result<()> {
        Ok(())
    }

    /// Declared properties named in `changed` were written from outside and
    /// already hold their new values. An error rolls the whole write back.
    async fn on_props(&mut self, _ctx: &mut ActorContext, _changed: &[String]) -> Result<()> {
        Ok(())
    }

    /// Runs once after the mailbox is drained and timers are cancelled.
    async fn on_stop(&mut self, _ctx: &mut ActorContext) {}
}

/// Future returned by a message handler.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

/// A handler for messages of type `T`.
///
/// Written as a non-capturing closure that forwards to an `async fn`:
///
/// ```ignore
/// Handlers::<Self>::new().on::<Blink>(|led, ctx, msg| Box::pin(led.blink(ctx, msg)))
/// ```
pub type HandlerFn<A, T> = for<'a> fn(&'a mut A, &'a mut ActorContext, T) -> HandlerFuture<'a>;

trait ErasedHandler<A> {
    fn accepts(&self, env: &Envelope) -> bool;

    fn id(&self) -> MsgId;

    fn call<'a>(
        &self,
        actor: &'a mut A,
        ctx: &'a mut ActorContext,
        env: Envelope,
    ) -> std::result::Result<HandlerFuture<'a>, Envelope>;
}

struct Typed<A, T> {
    f: HandlerFn<A, T>,
    _msg: PhantomData<fn(T)>,
}

impl<A: 'static, T: Message> ErasedHandler<A> for Typed<A, T> {
    fn accepts(&self, env: &Envelope) -> bool {
        env.is::<T>()
    }

    fn id(&self) -> MsgId {
        T::ID
    }

    fn call<'a>(
        &self,
        actor: &'a mut A,
        ctx: &'a mut ActorContext,
        env: Envelope,
    ) -> std::result::Result<HandlerFuture<'a>, Envelope> {
        let msg = env.take::<T>()?;
        Ok((self.f)(actor, ctx, msg))
    }
}

/// Ordered message handlers of one actor type.
pub struct Handlers<A> {
    bindings: Vec<Box<dyn ErasedHandler<A>>>,
}

impl<A: 'static> Handlers<A> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a handler for `T`. Earlier bindings win.
    #[must_use]
    pub fn on<T: Message>(mut self, f: HandlerFn<A, T>) -> Self {
        self.bindings.push(Box::new(Typed {
            f,
            _msg: PhantomData,
        }));
        self
    }

    /// Message ids in binding order.
    pub fn ids(&self) -> impl Iterator<Item = MsgId> + '_ {
        self.bindings.iter().map(|b| b.id())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Start the first handler whose id matches and whose type checks out.
    /// An envelope nobody accepts is handed back.
    pub(crate) fn dispatch<'a>(
        &self,
        actor: &'a mut A,
        ctx: &'a mut ActorContext,
        env: Envelope,
    ) -> std::result::Result<HandlerFuture<'a>, Envelope> {
        match self
            .bindings
            .iter()
            .find(|b| b.id() == env.id() && b.accepts(&env))
        {
            Some(binding) => binding.call(actor, ctx, env),
            None => Err(env),
        }
    }
}

impl<A: 'static> Default for Handlers<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// A cloneable, thread-safe address for sending to one actor.
#[derive(Debug, Clone)]
pub struct ActorRef {
    id: ActorId,
    name: Arc<str>,
    mailbox: MailboxSender,
    enqueue_timeout: Duration,
}

impl ActorRef {
    pub(crate) fn new(
        id: ActorId,
        name: Arc<str>,
        mailbox: MailboxSender,
        enqueue_timeout: Duration,
    ) -> Self {
        Self {
            id,
            name,
            mailbox,
            enqueue_timeout,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn mailbox(&self) -> &MailboxSender {
        &self.mailbox
    }

    /// Send a message, waiting up to the actor's enqueue timeout for room.
    pub async fn tell<T: Message>(&self, msg: T) -> Result<()> {
        self.enqueue(Envelope::new(msg)).await
    }

    /// Send without waiting; fails at once if the mailbox is full.
    pub fn try_tell<T: Message>(&self, msg: T) -> Result<()> {
        self.mailbox
            .try_enqueue(Envelope::new(msg))
            .map_err(|e| self.enqueue_error(e))
    }

    /// Enqueue a prepared envelope with the actor's enqueue timeout.
    pub async fn enqueue(&self, env: Envelope) -> Result<()> {
        self.mailbox
            .enqueue(env, self.enqueue_timeout)
            .await
            .map_err(|e| self.enqueue_error(e))
    }

    fn enqueue_error(&self, e: EnqueueError) -> RuntimeError {
        match e {
            EnqueueError::Full(envelope) => RuntimeError::MailboxFull {
                actor: self.name.to_string(),
                envelope,
            },
            EnqueueError::Closed(_) => RuntimeError::ActorStopped(self.name.to_string()),
        }
    }
}

/// Observes and controls one actor from outside.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    actor: ActorRef,
    state: watch::Receiver<ActorState>,
    stop: Arc<watch::Sender<bool>>,
    stats: Arc<ActorStats>,
}

impl ActorHandle {
    pub(crate) fn new(
        actor: ActorRef,
        state: watch::Receiver<ActorState>,
        stop: Arc<watch::Sender<bool>>,
        stats: Arc<ActorStats>,
    ) -> Self {
        Self {
            actor,
            state,
            stop,
            stats,
        }
    }

    pub fn actor_ref(&self) -> &ActorRef {
        &self.actor
    }

    pub fn id(&self) -> ActorId {
        self.actor.id()
    }

    pub fn name(&self) -> &str {
        self.actor.name()
    }

    pub fn state(&self) -> ActorState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> &ActorStats {
        &self.stats
    }

    /// `StartupFailure` if `on_start` failed (or the actor's executor could
    /// not be built) and the actor stopped without running.
    pub fn startup_error(&self) -> Option<RuntimeError> {
        self.stats
            .startup_error()
            .map(|message| RuntimeError::StartupFailure {
                actor: self.name().to_string(),
                message,
            })
    }

    /// Wait until the actor has reached `state` or any later state, and
    /// return the state observed.
    pub async fn wait_for(&self, state: ActorState) -> ActorState {
        let mut rx = self.state.clone();
        // Err means the actor thread is gone; its last published state is final
        let _ = rx.wait_for(|s| *s >= state).await;
        let reached = *rx.borrow();
        reached
    }

    /// Ask the actor to stop. The in-flight handler, if any, completes first.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Stop and wait for `Stopped`.
    pub async fn shutdown(&self) {
        self.stop();
        self.wait_for(ActorState::Stopped).await;
    }
}

impl std::ops::Deref for ActorHandle {
    type Target = ActorRef;

    fn deref(&self) -> &ActorRef {
        &self.actor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::Mailbox;
    use crate::message;

    #[test]
    fn actor_id_display() {
        let id = ActorId::new();
        assert_eq!(format!("{}", id).len(), 36);
        assert_ne!(ActorId::default(), ActorId::default());
        let uuid = Uuid::new_v4();
        assert_eq!(ActorId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn states_are_ordered() {
        assert!(ActorState::Created < ActorState::Starting);
        assert!(ActorState::Running < ActorState::Draining);
        assert!(ActorState::Draining < ActorState::Stopped);
        assert_eq!(ActorState::Running.to_string(), "Running");
    }

    #[test]
    fn actor_config_builder_and_serde() {
        let config = ActorConfig::new("led")
            .mailbox_capacity(4)
            .enqueue_timeout(Duration::from_millis(50))
            .priority(5);
        assert_eq!(config.mailbox_capacity, Some(4));
        assert_eq!(config.stack_size, 256 * 1024);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["enqueue_timeout"], 50);

        let parsed: ActorConfig =
            serde_json::from_str(r#"{"name": "wifi", "enqueue_timeout": 250}"#).unwrap();
        assert_eq!(parsed.name, "wifi");
        assert_eq!(parsed.enqueue_timeout, Duration::from_millis(250));
        assert_eq!(parsed.mailbox_capacity, None);
        assert_eq!(parsed.priority, 1);
    }

    #[test]
    fn stats_counters() {
        let stats = ActorStats::default();
        stats.record_delivered();
        stats.record_discarded(3);
        assert_eq!(stats.startup_error(), None);
        stats.record_startup_failed("no radio");
        stats.record_startup_failed("second reason is ignored");
        assert_eq!(stats.delivered(), 1);
        assert_eq!(stats.discarded_on_stop(), 3);
        assert!(stats.startup_failed());
        assert_eq!(stats.startup_error().as_deref(), Some("no radio"));
        assert_eq!(stats.unmatched(), 0);
    }

    struct Ping;
    struct Pong;
    message!(Ping, Pong);

    struct Dummy;

    impl Dummy {
        async fn ping(&mut self, _ctx: &mut ActorContext, _msg: Ping) -> Result<()> {
            Ok(())
        }

        async fn pong(&mut self, _ctx: &mut ActorContext, _msg: Pong) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn handlers_keep_binding_order() {
        let handlers = Handlers::<Dummy>::new()
            .on::<Pong>(|d, ctx, m| Box::pin(d.pong(ctx, m)))
            .on::<Ping>(|d, ctx, m| Box::pin(d.ping(ctx, m)));
        let ids: Vec<MsgId> = handlers.ids().collect();
        assert_eq!(ids, vec![Pong::ID, Ping::ID]);
        assert_eq!(handlers.len(), 2);
    }

    #[tokio::test]
    async fn tell_maps_backpressure_to_mailbox_full() {
        let (tx, mut mailbox) = Mailbox::new(1);
        let actor = ActorRef::new(ActorId::new(), Arc::from("led"), tx, Duration::from_millis(10));

        actor.tell(Ping).await.unwrap();
        match actor.tell(Pong).await {
            Err(RuntimeError::MailboxFull { actor, envelope }) => {
                assert_eq!(actor, "led");
                assert!(envelope.is::<Pong>());
            }
            other => panic!("expected MailboxFull, got {:?}", other),
        }
        assert!(matches!(
            actor.try_tell(Pong),
            Err(RuntimeError::MailboxFull { .. })
        ));

        mailbox.drain();
        assert!(matches!(
            actor.tell(Ping).await,
            Err(RuntimeError::ActorStopped(_))
        ));
    }

    #[tokio::test]
    async fn handle_tracks_state() {
        let (tx, _mailbox) = Mailbox::new(1);
        let actor = ActorRef::new(ActorId::new(), Arc::from("sys"), tx, Duration::ZERO);
        let (state_tx, state_rx) = watch::channel(ActorState::Created);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = ActorHandle::new(
            actor,
            state_rx,
            Arc::new(stop_tx),
            Arc::new(ActorStats::default()),
        );
        assert_eq!(handle.state(), ActorState::Created);

        state_tx.send_replace(ActorState::Running);
        assert_eq!(handle.wait_for(ActorState::Starting).await, ActorState::Running);

        handle.stop();
        assert!(*stop_rx.borrow_and_update());

        state_tx.send_replace(ActorState::Stopped);
        drop(state_tx);
        assert_eq!(handle.wait_for(ActorState::Stopped).await, ActorState::Stopped);
        assert_eq!(handle.name(), "sys");
    }
}
