//! The Value type - a shared, mutable, path-addressable tree.
//!
//! A `Value` is a handle. Cloning the handle shares the node it points to, so
//! a write through one handle is visible through every other handle to the
//! same node. [`Value::deep_clone`] produces a fully independent tree.
//!
//! `Value` is deliberately `!Send`: a mutable shared tree never leaves the
//! actor that owns it. Freeze it into a [`Snapshot`] to hand it to anyone else.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::extract::FromValue;
use crate::path::{Key, Path};
use crate::snapshot::{Frozen, Snapshot};
use crate::ValueError;

/// How far past the end of an array a write may land. The gap is padded
/// with nulls; anything further is refused.
pub const MAX_ARRAY_GAP: usize = 1024;

/// The variant tag of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Bytes,
    Map,
    Array,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Map => "map",
            Kind::Array => "array",
        };
        f.write_str(name)
    }
}

/// Node contents. Cloning a node is shallow: child handles are shared.
#[derive(Debug, Clone, Default)]
pub(crate) enum Node {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Insertion-ordered entries with unique keys.
    Map(IndexMap<String, Value>),
    Array(Vec<Value>),
}

impl Node {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Node::Null => Kind::Null,
            Node::Bool(_) => Kind::Bool,
            Node::Integer(_) => Kind::Integer,
            Node::Float(_) => Kind::Float,
            Node::String(_) => Kind::String,
            Node::Bytes(_) => Kind::Bytes,
            Node::Map(_) => Kind::Map,
            Node::Array(_) => Kind::Array,
        }
    }
}

/// A handle to a dynamically typed value.
///
/// # Reading and writing
///
/// - [`get`](Value::get) reads a child; a missing key yields a detached null
///   and never mutates the tree.
/// - [`at`](Value::at) returns a writable child handle, creating the child
///   (and turning a null into a map or array) if needed.
/// - [`set`](Value::set) overwrites the node behind a handle in place.
///
/// ```rust
/// use limero_value::{path, Value};
///
/// let props = Value::map();
/// props.set_path(&path!("wifi/rssi"), -61).unwrap();
///
/// let rssi: i32 = props.get_path(&path!("wifi/rssi")).unwrap().to().unwrap();
/// assert_eq!(rssi, -61);
/// assert!(props.get("missing").unwrap().is_null());
/// ```
#[derive(Clone, Default)]
pub struct Value {
    node: Rc<RefCell<Node>>,
}

impl Value {
    pub(crate) fn from_node(node: Node) -> Self {
        Value {
            node: Rc::new(RefCell::new(node)),
        }
    }

    pub(crate) fn with_node<R>(&self, f: impl FnOnce(&Node) -> R) -> R {
        f(&self.node.borrow())
    }

    pub fn null() -> Self {
        Value::default()
    }

    /// Create an empty map.
    pub fn map() -> Self {
        Value::from_node(Node::Map(IndexMap::new()))
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::from_node(Node::Array(Vec::new()))
    }

    pub fn kind(&self) -> Kind {
        self.node.borrow().kind()
    }

    pub fn is_null(&self) -> bool {
        self.kind() == Kind::Null
    }

    pub fn is_map(&self) -> bool {
        self.kind() == Kind::Map
    }

    pub fn is_array(&self) -> bool {
        self.kind() == Kind::Array
    }

    /// True when both handles share the same node.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Number of entries, items or bytes. Zero for scalars.
    pub fn len(&self) -> usize {
        match &*self.node.borrow() {
            Node::Map(entries) => entries.len(),
            Node::Array(items) => items.len(),
            Node::String(s) => s.len(),
            Node::Bytes(b) => b.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a child without mutating anything.
    ///
    /// A missing key or out-of-range index yields a detached null, as does
    /// any key on a null value.
    ///
    /// # Errors
    ///
    /// `InvalidAccess` when indexing a scalar, or an array by field name.
    pub fn get(&self, key: impl Into<Key>) -> Result<Value, ValueError> {
        let key = key.into();
        match &*self.node.borrow() {
            Node::Null => Ok(Value::null()),
            Node::Map(entries) => Ok(entries
                .get(&*key.field_name())
                .cloned()
                .unwrap_or_default()),
            Node::Array(items) => match key {
                Key::Index(i) => Ok(items.get(i).cloned().unwrap_or_default()),
                Key::Field(name) => Err(ValueError::invalid_access(format!(
                    "cannot index array with field '{}'",
                    name
                ))),
            },
            other => Err(ValueError::invalid_access(format!(
                "cannot index into {} with '{}'",
                other.kind(),
                key
            ))),
        }
    }

    /// Get a writable handle to a child, creating it if absent.
    ///
    /// A null node becomes a map (field key) or an array (index key). Writing
    /// past the end of an array pads it with nulls, up to [`MAX_ARRAY_GAP`]
    /// slots beyond the current length.
    ///
    /// # Errors
    ///
    /// `InvalidAccess` when indexing a scalar, an array by field name, or an
    /// array further past its end than [`MAX_ARRAY_GAP`].
    pub fn at(&self, key: impl Into<Key>) -> Result<Value, ValueError> {
        let key = key.into();
        let mut node = self.node.borrow_mut();
        if matches!(*node, Node::Null) {
            *node = match key {
                Key::Field(_) => Node::Map(IndexMap::new()),
                Key::Index(i) => {
                    check_gap(0, i)?;
                    Node::Array(Vec::new())
                }
            };
        }

        match &mut *node {
            Node::Map(entries) => {
                let name = key.field_name();
                if let Some(child) = entries.get(&*name) {
                    return Ok(child.clone());
                }
                let child = Value::null();
                entries.insert(name.into_owned(), child.clone());
                Ok(child)
            }
            Node::Array(items) => match key {
                Key::Index(i) => {
                    if let Some(child) = items.get(i) {
                        return Ok(child.clone());
                    }
                    let len = check_gap(items.len(), i)?;
                    items.resize_with(len, Value::null);
                    Ok(items[i].clone())
                }
                Key::Field(name) => Err(ValueError::invalid_access(format!(
                    "cannot index array with field '{}'",
                    name
                ))),
            },
            other => Err(ValueError::invalid_access(format!(
                "cannot index into {} with '{}'",
                other.kind(),
                key
            ))),
        }
    }

    /// Read through a path. See [`get`](Value::get).
    pub fn get_path(&self, path: &Path) -> Result<Value, ValueError> {
        path.keys().try_fold(self.clone(), |current, key| current.get(key))
    }

    /// Writable handle at a path, creating every missing step.
    pub fn at_path(&self, path: &Path) -> Result<Value, ValueError> {
        path.keys().try_fold(self.clone(), |current, key| current.at(key))
    }

    /// Write a value at a path, creating intermediate containers.
    pub fn set_path(&self, path: &Path, value: impl Into<Value>) -> Result<(), ValueError> {
        self.at_path(path)?.set(value)
    }

    /// Overwrite this node in place; every co-owner observes the new value.
    ///
    /// Container children of `value` are shared, not copied.
    ///
    /// # Errors
    ///
    /// `InvalidAccess` if `value` contains this node, which would make the
    /// tree cyclic.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), ValueError> {
        let value = value.into();
        if value.ptr_eq(self) {
            return Ok(());
        }
        if value.contains(self) {
            return Err(ValueError::invalid_access(
                "cannot assign a value that contains its own target",
            ));
        }
        let node = match Rc::try_unwrap(value.node) {
            Ok(cell) => cell.into_inner(),
            Err(shared) => shared.borrow().clone(),
        };
        *self.node.borrow_mut() = node;
        Ok(())
    }

    /// Insert a child handle under `key`, sharing it. Replaces an existing
    /// entry in place and returns it. A null node becomes a map.
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ValueError> {
        let key = key.into();
        let value = value.into();
        self.check_adoptable(&value)?;

        let mut node = self.node.borrow_mut();
        if matches!(*node, Node::Null) {
            *node = Node::Map(IndexMap::new());
        }
        match &mut *node {
            Node::Map(entries) => {
                if let Some(slot) = entries.get_mut(&key) {
                    return Ok(Some(std::mem::replace(slot, value)));
                }
                entries.insert(key, value);
                Ok(None)
            }
            other => Err(ValueError::invalid_access(format!(
                "cannot insert field '{}' into {}",
                key,
                other.kind()
            ))),
        }
    }

    /// Append a child handle. A null node becomes an array.
    pub fn push(&self, value: impl Into<Value>) -> Result<(), ValueError> {
        let value = value.into();
        self.check_adoptable(&value)?;

        let mut node = self.node.borrow_mut();
        if matches!(*node, Node::Null) {
            *node = Node::Array(Vec::new());
        }
        match &mut *node {
            Node::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(ValueError::invalid_access(format!(
                "cannot push onto {}",
                other.kind()
            ))),
        }
    }

    /// Remove a child, returning it if it existed. Array items after the
    /// removed index shift down.
    pub fn remove(&self, key: impl Into<Key>) -> Result<Option<Value>, ValueError> {
        let key = key.into();
        match &mut *self.node.borrow_mut() {
            Node::Null => Ok(None),
            Node::Map(entries) => Ok(entries.shift_remove(&*key.field_name())),
            Node::Array(items) => match key {
                Key::Index(i) if i < items.len() => Ok(Some(items.remove(i))),
                Key::Index(_) => Ok(None),
                Key::Field(name) => Err(ValueError::invalid_access(format!(
                    "cannot remove field '{}' from array",
                    name
                ))),
            },
            other => Err(ValueError::invalid_access(format!(
                "cannot remove '{}' from {}",
                key,
                other.kind()
            ))),
        }
    }

    /// Map keys in insertion order. Empty for non-maps.
    pub fn keys(&self) -> Vec<String> {
        match &*self.node.borrow() {
            Node::Map(entries) => entries.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Map entries as shared handles, in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        match &*self.node.borrow() {
            Node::Map(entries) => entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Array items as shared handles.
    pub fn items(&self) -> Vec<Value> {
        match &*self.node.borrow() {
            Node::Array(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Checked, converting extraction.
    ///
    /// Numbers convert between integer and float representations; integer
    /// narrowing is range checked.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` when the stored variant cannot be converted to `T`.
    pub fn to<T: FromValue>(&self) -> Result<T, ValueError> {
        T::from_value(self)
    }

    /// Run `f` only when the stored variant is exactly `T`'s; otherwise do
    /// nothing. Returns `self` so inspections can be chained.
    ///
    /// ```rust
    /// use limero_value::Value;
    ///
    /// let mut seen = None;
    /// Value::from(3.5)
    ///     .inspect(|i: i64| seen = Some(i as f64))
    ///     .inspect(|f: f64| seen = Some(f));
    /// assert_eq!(seen, Some(3.5));
    /// ```
    pub fn inspect<T: FromValue>(&self, f: impl FnOnce(T)) -> &Self {
        if let Some(v) = T::from_exact(self) {
            f(v);
        }
        self
    }

    /// A fully independent copy of the whole tree.
    pub fn deep_clone(&self) -> Value {
        let node = match &*self.node.borrow() {
            Node::Map(entries) => Node::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect(),
            ),
            Node::Array(items) => Node::Array(items.iter().map(Value::deep_clone).collect()),
            scalar => scalar.clone(),
        };
        Value::from_node(node)
    }

    /// Deep-copy into an immutable, thread-safe snapshot.
    pub fn freeze(&self) -> Snapshot {
        let frozen = match &*self.node.borrow() {
            Node::Null => Frozen::Null,
            Node::Bool(b) => Frozen::Bool(*b),
            Node::Integer(i) => Frozen::Integer(*i),
            Node::Float(f) => Frozen::Float(*f),
            Node::String(s) => Frozen::String(s.clone()),
            Node::Bytes(b) => Frozen::Bytes(b.clone()),
            Node::Map(entries) => Frozen::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.freeze()))
                    .collect(),
            ),
            Node::Array(items) => Frozen::Array(items.iter().map(Value::freeze).collect()),
        };
        Snapshot::new(frozen)
    }

    /// True if `target`'s node is this node or any node below it.
    fn contains(&self, target: &Value) -> bool {
        if self.ptr_eq(target) {
            return true;
        }
        match &*self.node.borrow() {
            Node::Map(entries) => entries.values().any(|v| v.contains(target)),
            Node::Array(items) => items.iter().any(|v| v.contains(target)),
            _ => false,
        }
    }

    fn check_adoptable(&self, child: &Value) -> Result<(), ValueError> {
        if child.contains(self) {
            return Err(ValueError::invalid_access(
                "cannot place a value beneath itself",
            ));
        }
        Ok(())
    }
}

/// New array length for a write at `index`, or `InvalidAccess` when the
/// write would leave more than [`MAX_ARRAY_GAP`] nulls behind it.
fn check_gap(len: usize, index: usize) -> Result<usize, ValueError> {
    match index.checked_add(1) {
        Some(new_len) if index - len.min(index) <= MAX_ARRAY_GAP => Ok(new_len),
        _ => Err(ValueError::invalid_access(format!(
            "index {} is more than {} past the end of an array of {}",
            index, MAX_ARRAY_GAP, len
        ))),
    }
}

impl PartialEq for Value {
    /// Structural equality. Maps compare as key sets, independent of order.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (self.node.borrow(), other.node.borrow());
        match (&*a, &*b) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(x), Node::Bool(y)) => x == y,
            (Node::Integer(x), Node::Integer(y)) => x == y,
            (Node::Float(x), Node::Float(y)) => x == y,
            (Node::String(x), Node::String(y)) => x == y,
            (Node::Bytes(x), Node::Bytes(y)) => x == y,
            (Node::Array(x), Node::Array(y)) => x == y,
            (Node::Map(x), Node::Map(y)) => x == y,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.try_borrow() {
            Ok(node) => fmt::Debug::fmt(&*node, f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::from_node(Node::Bool(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::from_node(Node::Integer(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::from_node(Node::Integer(v as i64))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::from_node(Node::Integer(v as i64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::from_node(Node::Float(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::from_node(Node::Float(v as f64))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::from_node(Node::String(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::from_node(Node::String(v.to_string()))
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::from_node(Node::Bytes(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::from_node(Node::Array(v))
    }
}

impl From<&Snapshot> for Value {
    fn from(s: &Snapshot) -> Self {
        s.thaw()
    }
}

impl From<Snapshot> for Value {
    fn from(s: Snapshot) -> Self {
        s.thaw()
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::from_node(Node::Array(iter.into_iter().collect()))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    /// Later duplicates of a key replace the earlier entry in its position.
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::from_node(Node::Map(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn get_nested_value() {
        let value = Value::map();
        value.set_path(&path!("foo/bar"), "hello").unwrap();

        assert_eq!(value.get_path(&path!("foo/bar")).unwrap(), Value::from("hello"));
        assert!(value.get("foo").unwrap().is_map());
        assert!(value.get("nonexistent").unwrap().is_null());
    }

    #[test]
    fn read_of_missing_path_does_not_mutate() {
        let value = Value::map();
        assert!(value.get_path(&path!("a/b/c")).unwrap().is_null());
        assert!(value.is_empty());

        let null = Value::null();
        assert!(null.get("x").unwrap().is_null());
        assert!(null.is_null());
    }

    #[test]
    fn write_autovivifies_maps_and_arrays() {
        let value = Value::null();
        value.set_path(&path!("peers/2/name"), "gw").unwrap();

        assert!(value.is_map());
        let peers = value.get("peers").unwrap();
        assert!(peers.is_array());
        assert_eq!(peers.len(), 3);
        assert!(peers.get(0usize).unwrap().is_null());
        assert_eq!(
            value.get_path(&path!("peers/2/name")).unwrap(),
            Value::from("gw")
        );
    }

    #[test]
    fn far_out_of_range_writes_are_refused() {
        let root = Value::map();
        let huge = Path::parse("peers/18446744073709551615").unwrap();
        assert!(matches!(
            root.set_path(&huge, 1),
            Err(ValueError::InvalidAccess { .. })
        ));
        assert!(root.set_path(&path!("peers/268435456"), 1).is_err());

        let list = Value::array();
        assert!(list.at(MAX_ARRAY_GAP + 1).is_err());
        assert!(list.is_empty());
        list.at(MAX_ARRAY_GAP).unwrap().set("last").unwrap();
        assert_eq!(list.len(), MAX_ARRAY_GAP + 1);
        list.at(list.len()).unwrap().set("appended").unwrap();
        assert_eq!(list.len(), MAX_ARRAY_GAP + 2);
    }

    #[test]
    fn indexing_a_scalar_is_invalid_access() {
        let value = Value::from("text");
        assert!(matches!(
            value.get("x"),
            Err(ValueError::InvalidAccess { .. })
        ));
        assert!(matches!(
            value.at(0usize),
            Err(ValueError::InvalidAccess { .. })
        ));

        let root = Value::map();
        root.set_path(&path!("name"), "led").unwrap();
        assert!(root.set_path(&path!("name/first"), 1).is_err());
    }

    #[test]
    fn array_by_field_is_invalid_access() {
        let list = Value::array();
        assert!(list.get("x").is_err());
        assert!(list.at("x").is_err());
    }

    #[test]
    fn zero_padded_keys_are_reachable_by_path() {
        let root = Value::map();
        root.insert("007", "bond").unwrap();
        root.insert("7", "seven").unwrap();
        assert_eq!(root.get_path(&path!("007")).unwrap(), Value::from("bond"));
        assert_eq!(root.get_path(&path!("7")).unwrap(), Value::from("seven"));

        root.set_path(&path!("agents/007"), true).unwrap();
        assert!(root.get("agents").unwrap().is_map());
    }

    #[test]
    fn map_preserves_insertion_order() {
        let value = Value::map();
        for key in ["zeta", "alpha", "mid"] {
            value.insert(key, 1).unwrap();
        }
        value.insert("alpha", 2).unwrap();
        assert_eq!(value.keys(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(value.get("alpha").unwrap().to::<i64>().unwrap(), 2);
    }

    #[test]
    fn default_copy_shares_node() {
        let a = Value::map();
        let b = a.clone();
        b.set_path(&path!("x"), 1).unwrap();
        assert_eq!(a.get("x").unwrap(), Value::from(1));

        a.at("x").unwrap().set(2).unwrap();
        assert_eq!(b.get("x").unwrap(), Value::from(2));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn deep_clone_is_independent() {
        let a = Value::map();
        a.set_path(&path!("nested/list/0"), 1).unwrap();
        let b = a.deep_clone();

        b.set_path(&path!("nested/list/0"), 99).unwrap();
        a.set_path(&path!("nested/extra"), true).unwrap();

        assert_eq!(a.get_path(&path!("nested/list/0")).unwrap(), Value::from(1));
        assert!(b.get_path(&path!("nested/extra")).unwrap().is_null());
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn set_rejects_cycles() {
        let root = Value::map();
        let child = root.at("child").unwrap();
        assert!(child.set(root.clone()).is_err());
        assert!(child.insert("loop", root.clone()).is_err());
        assert!(root.push(Value::null()).is_err());
        // assigning a handle to itself is a no-op
        root.set(root.clone()).unwrap();
    }

    #[test]
    fn insert_shares_and_set_copies_top_level() {
        let shared = Value::map();
        let root = Value::map();
        root.insert("a", shared.clone()).unwrap();
        shared.insert("k", 1).unwrap();
        assert_eq!(root.get_path(&path!("a/k")).unwrap(), Value::from(1));

        let copy_target = root.at("b").unwrap();
        copy_target.set(shared.clone()).unwrap();
        shared.insert("later", 2).unwrap();
        assert!(root.get_path(&path!("b/later")).unwrap().is_null());
    }

    #[test]
    fn remove_works() {
        let value = Value::map();
        value.set_path(&path!("foo/bar"), "hello").unwrap();

        let removed = value.get("foo").unwrap().remove("bar").unwrap();
        assert_eq!(removed, Some(Value::from("hello")));
        assert!(value.get_path(&path!("foo/bar")).unwrap().is_null());
        assert!(value.get("foo").unwrap().is_map());

        let list: Value = vec![Value::from(1), Value::from(2)].into();
        assert_eq!(list.remove(0usize).unwrap(), Some(Value::from(1)));
        assert_eq!(list.remove(5usize).unwrap(), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn map_equality_ignores_order() {
        let a: Value = [("x", Value::from(1)), ("y", Value::from(2))]
            .into_iter()
            .collect();
        let b: Value = [("y", Value::from(2)), ("x", Value::from(1))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_ne!(a, Value::map());
    }

    #[test]
    fn kinds() {
        assert_eq!(Value::null().kind(), Kind::Null);
        assert_eq!(Value::from(vec![1u8, 2]).kind(), Kind::Bytes);
        assert_eq!(Value::from(1.5).kind(), Kind::Float);
        assert_eq!(Kind::Map.to_string(), "map");
    }
}
