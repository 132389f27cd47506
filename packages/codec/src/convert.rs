//! Conversions between snapshots and serde types.

use limero_value::{Frozen, Snapshot, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::format::Format;

/// Convert a Rust type to a snapshot via serde.
pub fn to_snapshot<T: Serialize>(data: &T) -> Result<Snapshot, CodecError> {
    let json = serde_json::to_value(data)
        .map_err(|e| CodecError::encode(Format::JSON, e.to_string()))?;
    Ok(json_to_snapshot(json))
}

/// Convert a snapshot to a Rust type via serde.
pub fn from_snapshot<T: DeserializeOwned>(snapshot: &Snapshot) -> Result<T, CodecError> {
    let json = serde_json::to_value(snapshot)
        .map_err(|e| CodecError::decode(Format::JSON, e.to_string()))?;
    serde_json::from_value(json).map_err(|e| CodecError::decode(Format::JSON, e.to_string()))
}

/// Convert a Rust type to a fresh value tree.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value, CodecError> {
    to_snapshot(data).map(|s| s.thaw())
}

/// Convert a value tree to a Rust type.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, CodecError> {
    from_snapshot(&value.freeze())
}

/// Convert serde_json::Value to a snapshot.
pub fn json_to_snapshot(json: serde_json::Value) -> Snapshot {
    let frozen = match json {
        serde_json::Value::Null => Frozen::Null,
        serde_json::Value::Bool(b) => Frozen::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Frozen::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Frozen::Float(f)
            } else {
                Frozen::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Frozen::String(s),
        serde_json::Value::Array(arr) => {
            Frozen::Array(arr.into_iter().map(json_to_snapshot).collect())
        }
        serde_json::Value::Object(map) => Frozen::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_to_snapshot(v)))
                .collect(),
        ),
    };
    Snapshot::new(frozen)
}
