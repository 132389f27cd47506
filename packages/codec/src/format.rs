//! Format hints for wire encoding.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The wire format of an encoded payload.
///
/// MIME-type-like strings, so a format can travel in configuration or
/// alongside a payload. Any string a codec understands is valid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Format(pub Cow<'static, str>);

impl Format {
    /// CBOR (`application/cbor`), the compact default for the bus.
    pub const CBOR: Format = Format(Cow::Borrowed("application/cbor"));

    /// JSON (`application/json`)
    pub const JSON: Format = Format(Cow::Borrowed("application/json"));

    pub const fn from_static(s: &'static str) -> Self {
        Format(Cow::Borrowed(s))
    }

    pub fn new(s: impl Into<String>) -> Self {
        Format(Cow::Owned(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_json(&self) -> bool {
        self == &Self::JSON
    }

    pub fn is_cbor(&self) -> bool {
        self == &Self::CBOR
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::CBOR
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for Format {
    fn from(s: &'static str) -> Self {
        Format(Cow::Borrowed(s))
    }
}

impl From<String> for Format {
    fn from(s: String) -> Self {
        Format(Cow::Owned(s))
    }
}

impl Serialize for Format {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Accepts the full MIME string or the short names `cbor` and `json`.
impl<'de> Deserialize<'de> for Format {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "cbor" => Format::CBOR,
            "json" => Format::JSON,
            _ => Format::from(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_constants() {
        assert_eq!(Format::CBOR.as_str(), "application/cbor");
        assert!(Format::JSON.is_json());
        assert!(Format::default().is_cbor());
    }

    #[test]
    fn owned_equals_static() {
        assert_eq!(Format::new("application/json"), Format::JSON);
        assert_eq!(Format::from_static("application/cbor"), Format::CBOR);
    }

    #[test]
    fn deserialize_short_names() {
        let f: Format = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(f, Format::JSON);
        let f: Format = serde_json::from_str(r#""application/cbor""#).unwrap();
        assert_eq!(f, Format::CBOR);
        assert_eq!(serde_json::to_string(&Format::JSON).unwrap(), r#""application/json""#);
    }
}
