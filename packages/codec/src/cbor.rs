//! A CBOR codec covering the subset values need, built on `minicbor`.
//!
//! Encoding always uses the shortest integer form, definite lengths and
//! 64-bit floats. Decoding accepts half, single and double floats but
//! rejects indefinite lengths, tags, non-text map keys, duplicate keys and
//! anything left over after the top-level item.

use bytes::Bytes;
use indexmap::IndexMap;
use limero_value::{Frozen, Snapshot};
use minicbor::data::Type;
use minicbor::{Decoder, Encoder};

use crate::codec::Codec;
use crate::error::CodecError;
use crate::format::Format;

/// Containers nested deeper than this are rejected on decode.
pub const MAX_DEPTH: usize = 64;

/// Binary codec for [`Format::CBOR`].
///
/// ```rust
/// use limero_codec::{CborCodec, Codec, Format};
/// use limero_value::Value;
///
/// let value = Value::map();
/// value.insert("on", true).unwrap();
///
/// let bytes = CborCodec.encode(&value.freeze(), &Format::CBOR).unwrap();
/// assert_eq!(&bytes[..], &[0xa1, 0x62, b'o', b'n', 0xf5]);
///
/// let decoded = CborCodec.decode(&bytes, &Format::CBOR).unwrap();
/// assert_eq!(decoded, value.freeze());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn decode(&self, bytes: &[u8], format: &Format) -> Result<Snapshot, CodecError> {
        if !self.supports(format) {
            return Err(CodecError::UnsupportedFormat(format.clone()));
        }

        let mut decoder = Decoder::new(bytes);
        let value = item(&mut decoder, 0)?;
        if decoder.position() != bytes.len() {
            return Err(decode_error(format!(
                "{} trailing bytes after top-level item",
                bytes.len() - decoder.position()
            )));
        }
        Ok(value)
    }

    fn encode(&self, snapshot: &Snapshot, format: &Format) -> Result<Bytes, CodecError> {
        if !self.supports(format) {
            return Err(CodecError::UnsupportedFormat(format.clone()));
        }

        let mut encoder = Encoder::new(Vec::new());
        encode_item(&mut encoder, snapshot)
            .map_err(|e| CodecError::encode(Format::CBOR, e.to_string()))?;
        Ok(Bytes::from(encoder.into_writer()))
    }

    fn supports(&self, format: &Format) -> bool {
        *format == Format::CBOR
    }
}

type EncodeResult = Result<(), minicbor::encode::Error<std::convert::Infallible>>;

fn encode_item(e: &mut Encoder<Vec<u8>>, snapshot: &Snapshot) -> EncodeResult {
    match &**snapshot {
        Frozen::Null => {
            e.null()?;
        }
        Frozen::Bool(b) => {
            e.bool(*b)?;
        }
        Frozen::Integer(i) => {
            e.i64(*i)?;
        }
        Frozen::Float(f) => {
            e.f64(*f)?;
        }
        Frozen::String(s) => {
            e.str(s)?;
        }
        Frozen::Bytes(b) => {
            e.bytes(b)?;
        }
        Frozen::Array(items) => {
            e.array(items.len() as u64)?;
            for item in items {
                encode_item(e, item)?;
            }
        }
        Frozen::Map(entries) => {
            e.map(entries.len() as u64)?;
            for (key, value) in entries {
                e.str(key)?;
                encode_item(e, value)?;
            }
        }
    }
    Ok(())
}

fn decode_error(message: impl Into<String>) -> CodecError {
    CodecError::decode(Format::CBOR, message)
}

fn malformed(d: &Decoder<'_>, err: minicbor::decode::Error) -> CodecError {
    decode_error(format!("{} at offset {}", err, d.position()))
}

fn item(d: &mut Decoder<'_>, depth: usize) -> Result<Snapshot, CodecError> {
    let at = d.position();
    let kind = d.datatype().map_err(|e| malformed(d, e))?;
    let frozen = match kind {
        Type::Null => {
            d.null().map_err(|e| malformed(d, e))?;
            Frozen::Null
        }
        Type::Bool => Frozen::Bool(d.bool().map_err(|e| malformed(d, e))?),
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => {
            let int = d.int().map_err(|e| malformed(d, e))?;
            let value = i64::try_from(int)
                .map_err(|_| decode_error(format!("integer at offset {} exceeds i64", at)))?;
            Frozen::Integer(value)
        }
        Type::F16 => Frozen::Float(f64::from(d.f16().map_err(|e| malformed(d, e))?)),
        Type::F32 => Frozen::Float(f64::from(d.f32().map_err(|e| malformed(d, e))?)),
        Type::F64 => Frozen::Float(d.f64().map_err(|e| malformed(d, e))?),
        Type::String => Frozen::String(d.str().map_err(|e| malformed(d, e))?.to_string()),
        Type::Bytes => Frozen::Bytes(d.bytes().map_err(|e| malformed(d, e))?.to_vec()),
        Type::Array => {
            enter(depth)?;
            let len = d
                .array()
                .map_err(|e| malformed(d, e))?
                .ok_or_else(|| decode_error(format!("indefinite array at offset {}", at)))?;
            let len = bounded(d, len, 1)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(item(d, depth + 1)?);
            }
            Frozen::Array(items)
        }
        Type::Map => {
            enter(depth)?;
            let len = d
                .map()
                .map_err(|e| malformed(d, e))?
                .ok_or_else(|| decode_error(format!("indefinite map at offset {}", at)))?;
            let len = bounded(d, len, 2)?;
            let mut entries = IndexMap::with_capacity(len);
            for _ in 0..len {
                let key_at = d.position();
                if d.datatype().map_err(|e| malformed(d, e))? != Type::String {
                    return Err(decode_error(format!(
                        "map key at offset {} is not a definite text string",
                        key_at
                    )));
                }
                let key = d.str().map_err(|e| malformed(d, e))?.to_string();
                if entries.contains_key(&key) {
                    return Err(decode_error(format!(
                        "duplicate map key '{}' at offset {}",
                        key, key_at
                    )));
                }
                let value = item(d, depth + 1)?;
                entries.insert(key, value);
            }
            Frozen::Map(entries)
        }
        Type::Tag => return Err(decode_error(format!("tag at offset {} is not supported", at))),
        Type::Undefined => {
            return Err(decode_error(format!("undefined at offset {} is not supported", at)))
        }
        other => {
            return Err(decode_error(format!(
                "{} at offset {} is not supported",
                other, at
            )))
        }
    };
    Ok(Snapshot::new(frozen))
}

fn enter(depth: usize) -> Result<(), CodecError> {
    if depth >= MAX_DEPTH {
        return Err(decode_error(format!(
            "nesting exceeds {} levels",
            MAX_DEPTH
        )));
    }
    Ok(())
}

/// A declared element count, refused when the remaining input could not
/// possibly hold that many elements of `min_size` bytes each.
fn bounded(d: &Decoder<'_>, len: u64, min_size: u64) -> Result<usize, CodecError> {
    let remaining = (d.input().len() - d.position()) as u64;
    if len.saturating_mul(min_size) > remaining {
        return Err(decode_error(format!(
            "declared length {} exceeds the {} remaining bytes",
            len, remaining
        )));
    }
    usize::try_from(len).map_err(|_| decode_error(format!("length {} too large", len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use limero_value::Value;

    fn encode(value: &Value) -> Bytes {
        CborCodec.encode(&value.freeze(), &Format::CBOR).unwrap()
    }

    fn decode(bytes: &[u8]) -> Result<Snapshot, CodecError> {
        CborCodec.decode(bytes, &Format::CBOR)
    }

    #[test]
    fn encodes_integers_in_shortest_form() {
        assert_eq!(&encode(&Value::from(0))[..], &[0x00]);
        assert_eq!(&encode(&Value::from(23))[..], &[0x17]);
        assert_eq!(&encode(&Value::from(24))[..], &[0x18, 0x18]);
        assert_eq!(&encode(&Value::from(1000))[..], &[0x19, 0x03, 0xe8]);
        assert_eq!(&encode(&Value::from(-1))[..], &[0x20]);
        assert_eq!(&encode(&Value::from(-1000))[..], &[0x39, 0x03, 0xe7]);
        assert_eq!(
            &encode(&Value::from(i64::MIN))[..],
            &[0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn encodes_scalars() {
        assert_eq!(&encode(&Value::null())[..], &[0xf6]);
        assert_eq!(&encode(&Value::from(false))[..], &[0xf4]);
        assert_eq!(
            &encode(&Value::from(1.5))[..],
            &[0xfb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(&encode(&Value::from("a"))[..], &[0x61, b'a']);
        assert_eq!(&encode(&Value::from(vec![1u8, 2]))[..], &[0x42, 1, 2]);
        assert_eq!(&encode(&Value::array())[..], &[0x80]);
        assert_eq!(&encode(&Value::map())[..], &[0xa0]);
    }

    #[test]
    fn decodes_smaller_floats() {
        assert_eq!(*decode(&[0xf9, 0x3c, 0x00]).unwrap(), Frozen::Float(1.0));
        assert_eq!(*decode(&[0xf9, 0xc4, 0x00]).unwrap(), Frozen::Float(-4.0));
        assert_eq!(
            *decode(&[0xfa, 0x3f, 0xc0, 0x00, 0x00]).unwrap(),
            Frozen::Float(1.5)
        );
    }

    #[test]
    fn map_order_survives() {
        let value = Value::map();
        value.insert("z", 1).unwrap();
        value.insert("a", 2).unwrap();
        let decoded = decode(&encode(&value)).unwrap().thaw();
        assert_eq!(decoded.keys(), vec!["z", "a"]);
    }

    #[test]
    fn rejects_trailing_bytes() {
        assert!(matches!(
            decode(&[0x01, 0x02]),
            Err(CodecError::Decode { .. })
        ));
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[0x19, 0x03]).is_err());
        assert!(decode(&[0x63, b'a', b'b']).is_err());
        assert!(decode(&[0x82, 0x01]).is_err());
    }

    #[test]
    fn rejects_unsupported_forms() {
        // indefinite-length array
        assert!(decode(&[0x9f, 0x01, 0xff]).is_err());
        // tag 1 (epoch time)
        assert!(decode(&[0xc1, 0x01]).is_err());
        // undefined
        assert!(decode(&[0xf7]).is_err());
        // integer key
        assert!(decode(&[0xa1, 0x01, 0x02]).is_err());
        // duplicate key
        assert!(decode(&[0xa2, 0x61, b'k', 0x01, 0x61, b'k', 0x02]).is_err());
        // invalid utf-8
        assert!(decode(&[0x61, 0xff]).is_err());
        // indefinite-length text and an unassigned simple value
        assert!(decode(&[0x7f, 0x61, b'a', 0xff]).is_err());
        assert!(decode(&[0xf0]).is_err());
    }

    #[test]
    fn wide_maps_keep_every_key() {
        let value = Value::map();
        for i in 0..2048 {
            value.insert(format!("k{}", i), i).unwrap();
        }
        let decoded = decode(&encode(&value)).unwrap();
        assert_eq!(decoded, value.freeze());
        assert_eq!(decoded.get("k2047").map(|s| (**s).clone()), Some(Frozen::Integer(2047)));
    }

    #[test]
    fn rejects_integers_outside_i64() {
        let mut too_big = vec![0x1b];
        too_big.extend_from_slice(&u64::MAX.to_be_bytes());
        assert!(decode(&too_big).is_err());

        let mut too_small = vec![0x3b];
        too_small.extend_from_slice(&(1u64 << 63).to_be_bytes());
        assert!(decode(&too_small).is_err());
    }

    #[test]
    fn rejects_forged_lengths() {
        assert!(decode(&[0x5b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).is_err());
        assert!(decode(&[0x9b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn depth_limit() {
        let nested_ok: Vec<u8> = std::iter::repeat(0x81)
            .take(MAX_DEPTH)
            .chain([0x00])
            .collect();
        assert!(decode(&nested_ok).is_ok());

        let too_deep: Vec<u8> = std::iter::repeat(0x81)
            .take(MAX_DEPTH + 1)
            .chain([0x00])
            .collect();
        assert!(decode(&too_deep).is_err());
    }

    #[test]
    fn rejects_other_formats() {
        assert!(matches!(
            CborCodec.decode(&[0xf6], &Format::JSON),
            Err(CodecError::UnsupportedFormat(_))
        ));
    }
}
