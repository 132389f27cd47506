//! The thread side of an actor: startup, the receive loop and draining.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::actor::{Actor, ActorHandle, ActorState, ActorStats, Handlers};
use crate::bridge::Bridge;
use crate::context::ActorContext;
use crate::envelope::Envelope;
use crate::event::Events;
use crate::mailbox::Mailbox;
use crate::property::SetProps;
use crate::runtime::Registry;
use crate::timer::{Owner, TimerFired, Timers};

/// Everything an actor thread owns besides the actor itself.
pub(crate) struct Cell {
    pub(crate) handle: ActorHandle,
    pub(crate) name: Arc<str>,
    pub(crate) mailbox: Mailbox,
    pub(crate) state: watch::Sender<ActorState>,
    pub(crate) stop: watch::Receiver<bool>,
    pub(crate) stats: Arc<ActorStats>,
    pub(crate) registry: Registry,
    pub(crate) bridge: Bridge,
    pub(crate) events: Events,
    pub(crate) device: Arc<str>,
    pub(crate) priority: u8,
}

impl Cell {
    /// Thread entry point. Builds the actor's executor, then the actor.
    pub(crate) fn run<A, F>(self, factory: F)
    where
        A: Actor,
        F: FnOnce() -> A,
    {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!(actor = %self.name, error = %e, "failed to build actor executor");
                self.abandon(format!("executor: {}", e));
                return;
            }
        };
        rt.block_on(self.live(factory));
    }

    fn set_state(&self, state: ActorState) {
        self.state.send_replace(state);
        debug!(actor = %self.name, %state, "state changed");
    }

    pub(crate) fn abandon(mut self, reason: String) {
        self.stats.record_startup_failed(reason);
        self.handle.stop();
        let discarded = self.mailbox.drain();
        self.stats.record_discarded(discarded);
        self.set_state(ActorState::Stopped);
    }

    pub(crate) async fn live<A, F>(mut self, factory: F)
    where
        A: Actor,
        F: FnOnce() -> A,
    {
        self.set_state(ActorState::Starting);
        info!(actor = %self.name, priority = self.priority, "starting");

        let mut actor = factory();
        let handlers = A::handlers();
        let timers = Timers::new();
        let owner = Owner {
            id: self.handle.id(),
            name: self.name.clone(),
            mailbox: self.handle.actor_ref().mailbox().clone(),
            stats: self.stats.clone(),
        };
        let driver = tokio::spawn(timers.clone().drive(owner, self.stop.clone()));
        let mut ctx = ActorContext::new(
            self.handle.clone(),
            timers.clone(),
            self.registry.clone(),
            self.bridge.clone(),
            self.events.clone(),
            self.device.clone(),
        );

        ctx.set_starting(true);
        let started = actor.on_start(&mut ctx).await;
        ctx.set_starting(false);

        if let Err(e) = started {
            warn!(actor = %self.name, error = %e, "startup failed; actor will not run");
            self.stats.record_startup_failed(e.to_string());
            self.handle.stop();
            timers.cancel_all();
            let discarded = self.mailbox.drain();
            self.stats.record_discarded(discarded);
            let _ = driver.await;
            self.set_state(ActorState::Stopped);
            return;
        }

        self.set_state(ActorState::Running);
        loop {
            let Some(env) = self.mailbox.dequeue(&mut self.stop).await else {
                break;
            };
            self.handle_one(&mut actor, &handlers, &mut ctx, &timers, env)
                .await;
        }

        self.set_state(ActorState::Draining);
        self.handle.stop();
        let discarded = self.mailbox.drain();
        self.stats.record_discarded(discarded);
        let cancelled = timers.cancel_all();
        debug!(actor = %self.name, discarded, cancelled, "drained");
        let _ = driver.await;

        actor.on_stop(&mut ctx).await;
        self.set_state(ActorState::Stopped);
        info!(actor = %self.name, "stopped");
    }

    async fn handle_one<A: Actor>(
        &self,
        actor: &mut A,
        handlers: &Handlers<A>,
        ctx: &mut ActorContext,
        timers: &Timers,
        env: Envelope,
    ) {
        if env.is::<TimerFired>() && env.sender() == Some(self.handle.id()) {
            if let Ok(TimerFired { timer }) = env.take::<TimerFired>() {
                if !timers.accept_fire(timer) {
                    debug!(actor = %self.name, %timer, "fire of cancelled timer ignored");
                    return;
                }
                self.stats.record_delivered();
                if let Err(e) = actor.on_timer(ctx, timer).await {
                    self.stats.record_failed();
                    warn!(actor = %self.name, %timer, error = %e, "timer hook failed");
                }
            }
            return;
        }

        if env.is::<SetProps>() {
            if let Ok(set) = env.take::<SetProps>() {
                self.stats.record_delivered();
                self.set_props(actor, ctx, set).await;
            }
            return;
        }

        let message = env.name();
        match handlers.dispatch(actor, ctx, env) {
            Ok(handler) => {
                self.stats.record_delivered();
                if let Err(e) = handler.await {
                    self.stats.record_failed();
                    warn!(actor = %self.name, message, error = %e, "handler failed");
                }
            }
            Err(env) => {
                self.stats.record_unmatched();
                debug!(actor = %self.name, message, id = %env.id(), "no handler; envelope discarded");
            }
        }
    }

    async fn set_props<A: Actor>(&self, actor: &mut A, ctx: &mut ActorContext, set: SetProps) {
        let previous = match ctx.apply_props(&set.payload) {
            Ok(previous) => previous,
            Err(e) => {
                self.stats.record_failed();
                warn!(actor = %self.name, topic = %set.topic, error = %e, "property write refused");
                return;
            }
        };
        let changed: Vec<String> = previous.iter().map(|(name, _)| name.clone()).collect();
        if let Err(e) = actor.on_props(ctx, &changed).await {
            self.stats.record_failed();
            warn!(actor = %self.name, ?changed, error = %e, "property write rolled back");
            if let Err(e) = ctx.restore_props(previous) {
                error!(actor = %self.name, error = %e, "property rollback failed");
            }
            return;
        }
        debug!(actor = %self.name, ?changed, "properties written");
        if let Err(e) = ctx.publish_props() {
            debug!(actor = %self.name, error = %e, "props not published after write");
        }
    }
}
