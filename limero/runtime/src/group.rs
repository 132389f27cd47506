//! Actors sharing one thread.
//!
//! Every actor normally gets its own thread. On a small target that costs a
//! stack per actor, so quiet actors can be put in a [`ThreadGroup`] and run
//! side by side on one executor. They keep their own mailboxes, timers and
//! lifecycles; only the thread is shared.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::task::LocalSet;
use tracing::error;

use crate::actor::{Actor, ActorConfig};
use crate::cell::Cell;

pub(crate) type Launch = Box<dyn FnOnce(Cell) -> Pin<Box<dyn Future<Output = ()>>> + Send>;

/// The shared thread of a [`ThreadGroup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    pub name: String,
    /// Stack of the shared thread, in bytes. The members' own stack sizes
    /// are ignored.
    pub stack_size: usize,
}

impl ThreadConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            name: "shared".to_string(),
            stack_size: 256 * 1024,
        }
    }
}

/// Actors to be spawned together by [`Runtime::spawn_group`].
///
/// ```rust
/// use limero_runtime::{Actor, ActorConfig, Handlers, NullTransport, Runtime, RuntimeConfig};
/// use limero_runtime::{ThreadConfig, ThreadGroup};
///
/// struct Quiet;
/// impl Actor for Quiet {
///     fn handlers() -> Handlers<Self> {
///         Handlers::<Self>::new()
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let mut runtime = Runtime::new(RuntimeConfig::default(), NullTransport);
/// let group = ThreadGroup::new(ThreadConfig::new("quiet"))
///     .add(ActorConfig::new("battery"), || Quiet)
///     .add(ActorConfig::new("button"), || Quiet);
/// let handles = runtime.spawn_group(group).unwrap();
/// assert_eq!(handles.len(), 2);
/// runtime.shutdown().await;
/// # });
/// ```
///
/// [`Runtime::spawn_group`]: crate::Runtime::spawn_group
pub struct ThreadGroup {
    config: ThreadConfig,
    members: Vec<(ActorConfig, Launch)>,
}

impl ThreadGroup {
    pub fn new(config: ThreadConfig) -> Self {
        Self {
            config,
            members: Vec::new(),
        }
    }

    /// Add an actor. `factory` runs on the shared thread.
    #[must_use]
    pub fn add<A, F>(mut self, config: ActorConfig, factory: F) -> Self
    where
        A: Actor,
        F: FnOnce() -> A + Send + 'static,
    {
        let launch: Launch = Box::new(move |cell: Cell| -> Pin<Box<dyn Future<Output = ()>>> {
            Box::pin(cell.live(factory))
        });
        self.members.push((config, launch));
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn into_parts(self) -> (ThreadConfig, Vec<(ActorConfig, Launch)>) {
        (self.config, self.members)
    }
}

impl std::fmt::Debug for ThreadGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadGroup")
            .field("config", &self.config)
            .field(
                "actors",
                &self.members.iter().map(|(c, _)| &c.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Thread entry point of a group. Returns once every member has stopped.
pub(crate) fn run(members: Vec<(Cell, Launch)>) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build group executor");
            for (cell, _) in members {
                cell.abandon(format!("executor: {}", e));
            }
            return;
        }
    };

    let local = LocalSet::new();
    for (cell, launch) in members {
        local.spawn_local(launch(cell));
    }
    rt.block_on(local);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Handlers;

    struct Idle;

    impl Actor for Idle {
        fn handlers() -> Handlers<Self> {
            Handlers::<Self>::new()
        }
    }

    #[test]
    fn builder_collects_members() {
        let group = ThreadGroup::new(ThreadConfig::new("io").stack_size(128 * 1024))
            .add(ActorConfig::new("a"), || Idle)
            .add(ActorConfig::new("b"), || Idle);
        assert_eq!(group.len(), 2);
        assert!(!group.is_empty());
        let debug = format!("{:?}", group);
        assert!(debug.contains("\"a\""));
        assert!(debug.contains("131072"));
    }

    #[test]
    fn thread_config_from_partial_json() {
        let config: ThreadConfig = serde_json::from_str(r#"{"name":"io"}"#).unwrap();
        assert_eq!(config.name, "io");
        assert_eq!(config.stack_size, ThreadConfig::default().stack_size);
    }
}
