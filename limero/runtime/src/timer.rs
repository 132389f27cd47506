//! Per-actor timers.
//!
//! Timers never call back into the actor directly. A driver task owned by
//! the actor scans for expired timers and posts a [`TimerFired`] envelope
//! into the actor's own mailbox, so timer work runs inside the receive loop
//! like any other message.
//!
//! The post never waits: if the mailbox is full the fire is dropped and
//! counted. Repeating timers re-arm at `now + period` either way.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::actor::{ActorId, ActorStats};
use crate::envelope::Envelope;
use crate::mailbox::{EnqueueError, MailboxSender};
use crate::message;

/// Identifies a timer within its owning actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Posted into the owner's mailbox when a timer expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub timer: TimerHandle,
}

message!(TimerFired);

#[derive(Debug)]
struct Armed {
    deadline: Instant,
    /// `None` for one-shots.
    period: Option<Duration>,
}

#[derive(Debug, Default)]
struct TimerTable {
    next: u64,
    armed: BTreeMap<TimerHandle, Armed>,
    /// One-shots whose fire is queued but not yet handled.
    fired: BTreeSet<TimerHandle>,
}

impl TimerTable {
    fn insert(&mut self, delay: Duration, period: Option<Duration>) -> TimerHandle {
        self.next += 1;
        let handle = TimerHandle(self.next);
        self.armed.insert(
            handle,
            Armed {
                deadline: Instant::now() + delay,
                period,
            },
        );
        handle
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.armed.values().map(|a| a.deadline).min()
    }
}

/// The timer table of one actor. Clones share the table.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    table: Arc<Mutex<TimerTable>>,
    wake: Arc<Notify>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire once after `delay`.
    pub fn one_shot(&self, delay: Duration) -> TimerHandle {
        self.register(delay, false)
    }

    /// Fire every `period`, first after one period. A zero period fires
    /// once, immediately.
    pub fn repeating(&self, period: Duration) -> TimerHandle {
        self.register(period, true)
    }

    /// Register a timer. `period` is the delay to the first fire and, for
    /// repeating timers, the interval between fires.
    pub fn register(&self, period: Duration, repeating: bool) -> TimerHandle {
        let repeat = (repeating && !period.is_zero()).then_some(period);
        let handle = self.table.lock().insert(period, repeat);
        self.wake.notify_one();
        handle
    }

    /// Deactivate a timer. Cancelling an unknown, fired or already cancelled
    /// timer is a no-op. Returns whether the timer was still live.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        let mut table = self.table.lock();
        let armed = table.armed.remove(&handle).is_some();
        let fired = table.fired.remove(&handle);
        armed || fired
    }

    /// Cancel every timer, returning how many were live.
    pub fn cancel_all(&self) -> usize {
        let mut table = self.table.lock();
        let live = table.armed.len() + table.fired.len();
        table.armed.clear();
        table.fired.clear();
        live
    }

    /// Time left until the next fire, if the timer is armed.
    pub fn remaining(&self, handle: TimerHandle) -> Option<Duration> {
        let table = self.table.lock();
        table
            .armed
            .get(&handle)
            .map(|a| a.deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.table.lock().armed.contains_key(&handle)
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.table.lock().armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a dequeued fire should still be handled. False once the timer
    /// was cancelled after the fire was queued.
    pub(crate) fn accept_fire(&self, handle: TimerHandle) -> bool {
        let mut table = self.table.lock();
        table.fired.remove(&handle) || table.armed.contains_key(&handle)
    }

    /// Post fires for everything due at `now` and re-arm repeating timers.
    /// Returns `false` once the mailbox is closed.
    fn fire_due(&self, now: Instant, owner: &Owner) -> bool {
        let mut table = self.table.lock();
        let due: Vec<TimerHandle> = table
            .armed
            .iter()
            .filter(|(_, a)| a.deadline <= now)
            .map(|(h, _)| *h)
            .collect();

        for handle in due {
            let period = match table.armed.get_mut(&handle) {
                Some(armed) => {
                    if let Some(period) = armed.period {
                        armed.deadline = now + period;
                    }
                    armed.period
                }
                None => continue,
            };
            if period.is_none() {
                table.armed.remove(&handle);
            }

            let env = Envelope::new(TimerFired { timer: handle }).with_sender(Some(owner.id));
            match owner.mailbox.try_enqueue(env) {
                Ok(()) => {
                    if period.is_none() {
                        table.fired.insert(handle);
                    }
                }
                Err(EnqueueError::Full(_)) => {
                    owner.stats.record_timer_fire_dropped();
                    warn!(actor = %owner.name, timer = %handle, "timer fire dropped: mailbox full");
                }
                Err(EnqueueError::Closed(_)) => return false,
            }
        }
        true
    }

    /// Run the timer loop until `stop` turns true or the mailbox closes.
    pub(crate) async fn drive(self, owner: Owner, mut stop: watch::Receiver<bool>) {
        loop {
            if *stop.borrow() {
                break;
            }
            if !self.fire_due(Instant::now(), &owner) {
                break;
            }
            let next = self.table.lock().next_deadline();
            let sleep = async {
                match next {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = stop.wait_for(|stopped| *stopped) => break,
                _ = self.wake.notified() => {}
                _ = sleep => {}
            }
        }
        debug!(actor = %owner.name, "timer driver exited");
    }
}

/// Where a timer driver posts its fires.
pub(crate) struct Owner {
    pub(crate) id: ActorId,
    pub(crate) name: Arc<str>,
    pub(crate) mailbox: MailboxSender,
    pub(crate) stats: Arc<ActorStats>,
}
