//! Immutable, thread-safe copies of value trees.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::path::{Key, Path};
use crate::value::{Kind, Node, Value};

/// Contents of a snapshot node.
#[derive(Debug, Clone)]
pub enum Frozen {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Insertion-ordered entries with unique keys.
    Map(IndexMap<String, Snapshot>),
    Array(Vec<Snapshot>),
}

impl Frozen {
    pub fn kind(&self) -> Kind {
        match self {
            Frozen::Null => Kind::Null,
            Frozen::Bool(_) => Kind::Bool,
            Frozen::Integer(_) => Kind::Integer,
            Frozen::Float(_) => Kind::Float,
            Frozen::String(_) => Kind::String,
            Frozen::Bytes(_) => Kind::Bytes,
            Frozen::Map(_) => Kind::Map,
            Frozen::Array(_) => Kind::Array,
        }
    }
}

impl PartialEq for Frozen {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Frozen::Null, Frozen::Null) => true,
            (Frozen::Bool(a), Frozen::Bool(b)) => a == b,
            (Frozen::Integer(a), Frozen::Integer(b)) => a == b,
            (Frozen::Float(a), Frozen::Float(b)) => a == b,
            (Frozen::String(a), Frozen::String(b)) => a == b,
            (Frozen::Bytes(a), Frozen::Bytes(b)) => a == b,
            (Frozen::Array(a), Frozen::Array(b)) => a == b,
            // key sets, independent of order
            (Frozen::Map(a), Frozen::Map(b)) => a == b,
            _ => false,
        }
    }
}

/// A frozen value tree that can be shared across threads and actors.
///
/// Cloning a snapshot is cheap; the tree itself is never mutated.
/// [`thaw`](Snapshot::thaw) turns it back into an independent [`Value`].
#[derive(Clone, PartialEq)]
pub struct Snapshot(Arc<Frozen>);

impl Snapshot {
    pub fn new(frozen: Frozen) -> Self {
        Snapshot(Arc::new(frozen))
    }

    pub fn null() -> Self {
        Snapshot::new(Frozen::Null)
    }

    /// Read a direct child. `None` when the key is absent or the node is not
    /// a container of the matching shape.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Snapshot> {
        let key = key.into();
        match (&*self.0, key) {
            (Frozen::Map(entries), key) => entries.get(&*key.field_name()),
            (Frozen::Array(items), Key::Index(i)) => items.get(i),
            _ => None,
        }
    }

    pub fn get_path(&self, path: &Path) -> Option<&Snapshot> {
        path.keys()
            .try_fold(self, |current, key| current.get(key))
    }

    /// A fresh, unshared value tree with the same contents.
    pub fn thaw(&self) -> Value {
        let node = match &*self.0 {
            Frozen::Null => Node::Null,
            Frozen::Bool(b) => Node::Bool(*b),
            Frozen::Integer(i) => Node::Integer(*i),
            Frozen::Float(f) => Node::Float(*f),
            Frozen::String(s) => Node::String(s.clone()),
            Frozen::Bytes(b) => Node::Bytes(b.clone()),
            Frozen::Map(entries) => Node::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.thaw()))
                    .collect(),
            ),
            Frozen::Array(items) => Node::Array(items.iter().map(Snapshot::thaw).collect()),
        };
        Value::from_node(node)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::null()
    }
}

impl Deref for Snapshot {
    type Target = Frozen;

    fn deref(&self) -> &Frozen {
        &self.0
    }
}

impl From<Frozen> for Snapshot {
    fn from(frozen: Frozen) -> Self {
        Snapshot::new(frozen)
    }
}

impl From<&Value> for Snapshot {
    fn from(value: &Value) -> Self {
        value.freeze()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
