//! Serialization and the canonical text form.
//!
//! Values serialize through serde. Bytes become base64 strings and
//! non-finite floats become null, the way JSON has to see them.

use std::fmt;

use base64::Engine;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::snapshot::{Frozen, Snapshot};
use crate::value::{Node, Value};

fn encode_bytes(b: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(b)
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Integer(i) => serializer.serialize_i64(*i),
            Node::Float(f) => serializer.serialize_f64(*f),
            Node::String(s) => serializer.serialize_str(s),
            Node::Bytes(b) => serializer.serialize_str(&encode_bytes(b)),
            Node::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Node::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_node(|node| node.serialize(serializer))
    }
}

impl Serialize for Frozen {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Frozen::Null => serializer.serialize_unit(),
            Frozen::Bool(b) => serializer.serialize_bool(*b),
            Frozen::Integer(i) => serializer.serialize_i64(*i),
            Frozen::Float(f) => serializer.serialize_f64(*f),
            Frozen::String(s) => serializer.serialize_str(s),
            Frozen::Bytes(b) => serializer.serialize_str(&encode_bytes(b)),
            Frozen::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Frozen::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (**self).serialize(serializer)
    }
}

fn write_json<T: Serialize>(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = if f.alternate() {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    f.write_str(&text.map_err(|_| fmt::Error)?)
}

/// Compact JSON; `{:#}` pretty-prints.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(self, f)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(self, f)
    }
}

impl Value {
    /// Compact JSON text with map keys in insertion order.
    pub fn to_canonical(&self) -> String {
        self.to_string()
    }

    /// Indented JSON text.
    pub fn to_pretty(&self) -> String {
        format!("{:#}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn canonical_text_keeps_insertion_order() {
        let v = Value::map();
        v.set_path(&path!("zeta"), 1).unwrap();
        v.set_path(&path!("alpha/on"), true).unwrap();
        v.set_path(&path!("name"), "led").unwrap();
        assert_eq!(
            v.to_canonical(),
            r#"{"zeta":1,"alpha":{"on":true},"name":"led"}"#
        );
    }

    #[test]
    fn scalars_render_as_json() {
        assert_eq!(Value::null().to_string(), "null");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(vec![1u8, 2, 3]).to_string(), r#""AQID""#);
        assert_eq!(Value::from(f64::NAN).to_string(), "null");
    }

    #[test]
    fn pretty_is_indented() {
        let v = Value::map();
        v.set_path(&path!("a"), 1).unwrap();
        assert_eq!(v.to_pretty(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn snapshot_renders_like_value() {
        let v = Value::map();
        v.set_path(&path!("list/1"), "x").unwrap();
        assert_eq!(v.freeze().to_string(), v.to_string());
        assert_eq!(v.to_string(), r#"{"list":[null,"x"]}"#);
    }
}
