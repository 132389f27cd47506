//! The codec trait and the JSON codec.

use bytes::Bytes;
use limero_value::Snapshot;

use crate::cbor::CborCodec;
use crate::convert::json_to_snapshot;
use crate::error::CodecError;
use crate::format::Format;

/// Encodes snapshots to bytes and back for one or more formats.
pub trait Codec: Send + Sync {
    /// Decode raw bytes into a snapshot.
    fn decode(&self, bytes: &[u8], format: &Format) -> Result<Snapshot, CodecError>;

    /// Encode a snapshot into raw bytes.
    fn encode(&self, value: &Snapshot, format: &Format) -> Result<Bytes, CodecError>;

    /// Check if this codec supports a format.
    fn supports(&self, format: &Format) -> bool;
}

impl<C: Codec + ?Sized> Codec for Box<C> {
    fn decode(&self, bytes: &[u8], format: &Format) -> Result<Snapshot, CodecError> {
        (**self).decode(bytes, format)
    }

    fn encode(&self, value: &Snapshot, format: &Format) -> Result<Bytes, CodecError> {
        (**self).encode(value, format)
    }

    fn supports(&self, format: &Format) -> bool {
        (**self).supports(format)
    }
}

/// A codec that handles JSON encoding/decoding.
///
/// Bytes are written as base64 strings and come back as strings; every
/// other variant survives a round trip.
///
/// # Example
///
/// ```rust
/// use limero_codec::{Codec, Format, JsonCodec};
/// use limero_value::Value;
///
/// let value = Value::from("hello");
///
/// let bytes = JsonCodec.encode(&value.freeze(), &Format::JSON).unwrap();
/// assert_eq!(&bytes[..], br#""hello""#);
///
/// let decoded = JsonCodec.decode(&bytes, &Format::JSON).unwrap();
/// assert_eq!(decoded, value.freeze());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, bytes: &[u8], format: &Format) -> Result<Snapshot, CodecError> {
        if !self.supports(format) {
            return Err(CodecError::UnsupportedFormat(format.clone()));
        }

        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| CodecError::decode(format.clone(), e.to_string()))?;

        Ok(json_to_snapshot(json))
    }

    fn encode(&self, value: &Snapshot, format: &Format) -> Result<Bytes, CodecError> {
        if !self.supports(format) {
            return Err(CodecError::UnsupportedFormat(format.clone()));
        }

        let bytes = serde_json::to_vec(value)
            .map_err(|e| CodecError::encode(format.clone(), e.to_string()))?;

        Ok(Bytes::from(bytes))
    }

    fn supports(&self, format: &Format) -> bool {
        format == &Format::JSON
    }
}

/// A codec that combines multiple codecs.
///
/// Routes encode/decode to the first codec that supports the format.
pub struct MultiCodec {
    codecs: Vec<Box<dyn Codec>>,
}

impl MultiCodec {
    /// Create an empty multi-codec.
    pub fn new() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Add a codec.
    pub fn add(&mut self, codec: impl Codec + 'static) {
        self.codecs.push(Box::new(codec));
    }

    /// CBOR and JSON.
    pub fn standard() -> Self {
        let mut mc = Self::new();
        mc.add(CborCodec);
        mc.add(JsonCodec);
        mc
    }
}

impl Default for MultiCodec {
    fn default() -> Self {
        Self::standard()
    }
}

impl Codec for MultiCodec {
    fn decode(&self, bytes: &[u8], format: &Format) -> Result<Snapshot, CodecError> {
        for codec in &self.codecs {
            if codec.supports(format) {
                return codec.decode(bytes, format);
            }
        }
        Err(CodecError::UnsupportedFormat(format.clone()))
    }

    fn encode(&self, value: &Snapshot, format: &Format) -> Result<Bytes, CodecError> {
        for codec in &self.codecs {
            if codec.supports(format) {
                return codec.encode(value, format);
            }
        }
        Err(CodecError::UnsupportedFormat(format.clone()))
    }

    fn supports(&self, format: &Format) -> bool {
        self.codecs.iter().any(|c| c.supports(format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limero_value::{path, Value};

    #[test]
    fn json_codec_roundtrip() {
        let original = Value::map();
        original.set_path(&path!("name"), "Alice").unwrap();
        original.set_path(&path!("age"), 30).unwrap();
        original.set_path(&path!("ratio"), 0.5).unwrap();
        let original = original.freeze();

        let bytes = JsonCodec.encode(&original, &Format::JSON).unwrap();
        let decoded = JsonCodec.decode(&bytes, &Format::JSON).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn json_floats_survive_exactly() {
        for f in [-11512146037.324345, 0.1, 1e-300, f64::MAX, 5e-324] {
            let original = Value::from(f).freeze();
            let bytes = JsonCodec.encode(&original, &Format::JSON).unwrap();
            let decoded = JsonCodec.decode(&bytes, &Format::JSON).unwrap();
            assert_eq!(decoded, original, "{}", String::from_utf8_lossy(&bytes));
        }
    }

    #[test]
    fn json_bytes_come_back_as_text() {
        let original = Value::from(vec![1u8, 2, 3]).freeze();
        let bytes = JsonCodec.encode(&original, &Format::JSON).unwrap();
        let decoded = JsonCodec.decode(&bytes, &Format::JSON).unwrap();
        assert_eq!(decoded, Value::from("AQID").freeze());
    }

    #[test]
    fn json_codec_rejects_other_formats() {
        let result = JsonCodec.decode(b"hello", &Format::CBOR);
        assert!(matches!(result, Err(CodecError::UnsupportedFormat(_))));
    }

    #[test]
    fn json_codec_reports_bad_input() {
        let result = JsonCodec.decode(b"{not json", &Format::JSON);
        assert!(matches!(result, Err(CodecError::Decode { .. })));
    }

    #[test]
    fn multi_codec_routes_correctly() {
        let codec = MultiCodec::standard();

        assert!(codec.supports(&Format::JSON));
        assert!(codec.supports(&Format::CBOR));
        assert!(!codec.supports(&Format::new("application/protobuf")));

        let value = Value::from("hello").freeze();
        let json = codec.encode(&value, &Format::JSON).unwrap();
        let cbor = codec.encode(&value, &Format::CBOR).unwrap();
        assert_ne!(json, cbor);
        assert_eq!(codec.decode(&cbor, &Format::CBOR).unwrap(), value);
        assert_eq!(codec.decode(&json, &Format::JSON).unwrap(), value);
    }
}
