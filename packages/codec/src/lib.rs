//! Wire encodings for limero values.
//!
//! - `Format`: a hint naming the wire format
//! - `Codec`: encodes [`Snapshot`]s to bytes and back
//! - `CborCodec`: compact binary, the bus default
//! - `JsonCodec`: text, for debugging and human-facing endpoints
//! - `to_snapshot` / `from_snapshot`: typed conversion through serde
//!
//! [`Snapshot`]: limero_value::Snapshot

pub use bytes::Bytes;

mod cbor;
mod codec;
mod convert;
mod error;
mod format;

pub use cbor::{CborCodec, MAX_DEPTH};
pub use codec::{Codec, JsonCodec, MultiCodec};
pub use convert::{from_snapshot, from_value, json_to_snapshot, to_snapshot, to_value};
pub use error::CodecError;
pub use format::Format;
