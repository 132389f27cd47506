//! Event listeners.
//!
//! An actor raises an event with [`ActorContext::raise`]; every listener
//! registered for that actor and event type runs synchronously on the
//! raising actor's thread, in registration order. Listeners are where a node
//! wires its actors together, typically by telling another actor something:
//!
//! ```rust
//! use limero_runtime::{message, NullTransport, Runtime, RuntimeConfig};
//! # use limero_runtime::{Actor, ActorConfig, Handlers};
//! # struct Wifi;
//! # impl Actor for Wifi { fn handlers() -> Handlers<Self> { Handlers::<Self>::new() } }
//! # struct Broker;
//! # impl Actor for Broker { fn handlers() -> Handlers<Self> { Handlers::<Self>::new() } }
//!
//! #[derive(Clone)]
//! struct Connected { up: bool }
//! struct Connect;
//! message!(Connected, Connect);
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let mut runtime = Runtime::new(RuntimeConfig::default(), NullTransport);
//! # runtime.spawn(ActorConfig::new("wifi"), || Wifi).unwrap();
//! # runtime.spawn(ActorConfig::new("broker"), || Broker).unwrap();
//! let broker = runtime.actor("broker").unwrap();
//! runtime
//!     .on_event("wifi", move |event: &Connected| match event.up {
//!         true => broker.try_tell(Connect),
//!         false => Ok(()),
//!     })
//!     .unwrap();
//! # runtime.shutdown().await;
//! # });
//! ```
//!
//! [`ActorContext::raise`]: crate::ActorContext::raise

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::actor::ActorId;
use crate::error::Result;
use crate::message::{Message, MsgId};

type Listener = Arc<dyn Fn(&dyn Any) -> Result<()> + Send + Sync>;

/// Listener table shared by the runtime and every actor context.
#[derive(Clone, Default)]
pub struct Events {
    listeners: Arc<RwLock<HashMap<(ActorId, MsgId), Vec<Listener>>>>,
}

impl Events {
    /// Run `f` whenever the actor `source` raises an `E`.
    pub fn listen<E, F>(&self, source: ActorId, f: F)
    where
        E: Message,
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(move |event: &dyn Any| match event.downcast_ref::<E>() {
            Some(event) => f(event),
            None => Ok(()),
        });
        self.listeners
            .write()
            .entry((source, E::ID))
            .or_default()
            .push(listener);
    }

    /// Call every listener for `E` raised by `source`.
    ///
    /// All listeners run even when one fails. Returns how many ran, or the
    /// first failure.
    pub fn raise<E: Message>(&self, source: ActorId, event: &E) -> Result<usize> {
        // cloned out so a listener may register further listeners
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .get(&(source, E::ID))
            .cloned()
            .unwrap_or_default();

        let mut first_error = None;
        for listener in &listeners {
            if let Err(e) = listener(event) {
                warn!(%source, event = E::NAME, error = %e, "event listener failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(listeners.len()),
        }
    }

    /// Number of listeners for `E` raised by `source`.
    pub fn count<E: Message>(&self, source: ActorId) -> usize {
        self.listeners
            .read()
            .get(&(source, E::ID))
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("sources", &self.listeners.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::RuntimeError;
    use crate::message;

    #[derive(Debug, Clone)]
    struct Rssi(i32);
    struct Other;
    message!(Rssi, Other);

    #[test]
    fn listeners_run_in_order_for_their_source_only() {
        let events = Events::default();
        let (wifi, led) = (ActorId::new(), ActorId::new());
        let seen = Arc::new(AtomicU32::new(0));

        let first = seen.clone();
        events.listen(wifi, move |e: &Rssi| {
            first.store(e.0.unsigned_abs(), Ordering::SeqCst);
            Ok(())
        });
        let second = seen.clone();
        events.listen(wifi, move |_: &Rssi| {
            second.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(events.raise(wifi, &Rssi(-60)).unwrap(), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 61);

        assert_eq!(events.raise(led, &Rssi(-1)).unwrap(), 0);
        assert_eq!(events.raise(wifi, &Other).unwrap(), 0);
        assert_eq!(events.count::<Rssi>(wifi), 2);
        assert_eq!(events.count::<Rssi>(led), 0);
    }

    #[test]
    fn failing_listener_does_not_starve_the_rest() {
        let events = Events::default();
        let wifi = ActorId::new();
        let ran = Arc::new(AtomicU32::new(0));

        events.listen(wifi, |_: &Rssi| Err(RuntimeError::handler("offline")));
        let counter = ran.clone();
        events.listen(wifi, move |_: &Rssi| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(matches!(
            events.raise(wifi, &Rssi(0)),
            Err(RuntimeError::Handler(_))
        ));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_register_another() {
        let events = Events::default();
        let wifi = ActorId::new();
        let inner = events.clone();
        events.listen(wifi, move |_: &Other| {
            inner.listen(wifi, |_: &Other| Ok(()));
            Ok(())
        });
        assert_eq!(events.raise(wifi, &Other).unwrap(), 1);
        assert_eq!(events.count::<Other>(wifi), 2);
    }
}
