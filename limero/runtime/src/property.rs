//! Property descriptors.
//!
//! An actor declares the properties it exports from `on_start`. Each one
//! gets an id, a description, a value type and an access mode. The table is
//! published under `device/actor/info`, so a dashboard can render and edit
//! the values published under `device/actor/props`. Writable properties
//! accept writes arriving on `device/actor/set`.

use std::fmt;

use limero_value::{Kind, Snapshot, Value};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Topic segment of an actor's property table.
pub const INFO_TOPIC: &str = "info";

/// Topic segment on which an actor's writable properties are set.
pub const SET_TOPIC: &str = "set";

/// Value type of a property. Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropType {
    Uint = 0,
    Sint = 1,
    Str = 2,
    Bytes = 3,
    Float = 4,
    /// A map or an array.
    Object = 5,
}

impl PropType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => PropType::Uint,
            1 => PropType::Sint,
            2 => PropType::Str,
            3 => PropType::Bytes,
            4 => PropType::Float,
            5 => PropType::Object,
            _ => return None,
        })
    }

    /// Whether `value` may be stored in a property of this type. Integers
    /// are admitted as floats; nothing else converts.
    pub fn admits(self, value: &Value) -> bool {
        match (self, value.kind()) {
            (PropType::Uint, Kind::Integer) => value.to::<u64>().is_ok(),
            (PropType::Sint, Kind::Integer) => true,
            (PropType::Float, Kind::Float | Kind::Integer) => true,
            (PropType::Str, Kind::String) => true,
            (PropType::Bytes, Kind::Bytes) => true,
            (PropType::Object, Kind::Map | Kind::Array) => true,
            _ => false,
        }
    }
}

/// Who may change a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropMode {
    Read = 0,
    Write = 1,
    ReadWrite = 2,
}

impl PropMode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => PropMode::Read,
            1 => PropMode::Write,
            2 => PropMode::ReadWrite,
            _ => return None,
        })
    }

    pub fn writable(self) -> bool {
        matches!(self, PropMode::Write | PropMode::ReadWrite)
    }
}

macro_rules! serde_as_code {
    ($ty:ident, $what:literal) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_u8(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let code = u8::deserialize(d)?;
                $ty::from_code(code)
                    .ok_or_else(|| D::Error::custom(format!("unknown {} {}", $what, code)))
            }
        }
    };
}

serde_as_code!(PropType, "property type");
serde_as_code!(PropMode, "property mode");

/// One entry of an actor's property table.
///
/// ```rust
/// use limero_runtime::{PropMode, PropType, PropertyInfo};
///
/// let info = PropertyInfo::new("interval_ms", PropType::Uint, PropMode::ReadWrite)
///     .description("Blink interval");
/// let json = serde_json::to_string(&info).unwrap();
/// assert_eq!(
///     json,
///     r#"{"id":0,"name":"interval_ms","desc":"Blink interval","type":0,"mode":2}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    /// Position in the declaring actor's table, assigned on declaration.
    pub id: u32,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PropType,
    pub mode: PropMode,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, kind: PropType, mode: PropMode) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            kind,
            mode,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl fmt::Display for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} ({:?}, {:?})", self.name, self.id, self.kind, self.mode)
    }
}

/// A write to an actor's properties, as delivered from `device/actor/set`.
/// The payload is a map of property names to new values.
#[derive(Debug, Clone, PartialEq)]
pub struct SetProps {
    pub topic: String,
    pub payload: Snapshot,
}

crate::message!(SetProps);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_wire_table() {
        assert_eq!(PropType::Float.code(), 4);
        assert_eq!(PropType::from_code(5), Some(PropType::Object));
        assert_eq!(PropType::from_code(6), None);
        assert_eq!(PropMode::from_code(1), Some(PropMode::Write));
        assert!(PropMode::ReadWrite.writable());
        assert!(!PropMode::Read.writable());
    }

    #[test]
    fn admits_matching_kinds() {
        assert!(PropType::Uint.admits(&Value::from(3)));
        assert!(!PropType::Uint.admits(&Value::from(-3)));
        assert!(PropType::Sint.admits(&Value::from(-3)));
        assert!(PropType::Float.admits(&Value::from(2)));
        assert!(PropType::Float.admits(&Value::from(0.5)));
        assert!(!PropType::Str.admits(&Value::from(1)));
        assert!(PropType::Bytes.admits(&Value::from(vec![1u8])));
        assert!(PropType::Object.admits(&Value::array()));
        assert!(!PropType::Object.admits(&Value::null()));
    }

    #[test]
    fn info_roundtrips_through_json() {
        let info = PropertyInfo::new("rpm", PropType::Float, PropMode::Read).description("RPM");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["desc"], "RPM");
        let back: PropertyInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);

        let bad = serde_json::json!({"id": 0, "name": "x", "desc": "", "type": 9, "mode": 0});
        assert!(serde_json::from_value::<PropertyInfo>(bad).is_err());
    }
}
