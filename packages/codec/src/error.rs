//! Codec errors.

use thiserror::Error;

use crate::format::Format;

/// Errors raised while encoding or decoding a payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Codec failed to decode bytes.
    #[error("decode error ({format}): {message}")]
    Decode { format: Format, message: String },

    /// Codec failed to encode a value.
    #[error("encode error ({format}): {message}")]
    Encode { format: Format, message: String },

    /// Format not supported by codec.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(Format),
}

impl CodecError {
    pub fn decode(format: Format, message: impl Into<String>) -> Self {
        CodecError::Decode {
            format,
            message: message.into(),
        }
    }

    pub fn encode(format: Format, message: impl Into<String>) -> Self {
        CodecError::Encode {
            format,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let e = CodecError::decode(Format::CBOR, "trailing bytes");
        assert_eq!(e.to_string(), "decode error (application/cbor): trailing bytes");

        let e = CodecError::UnsupportedFormat(Format::new("application/protobuf"));
        assert!(e.to_string().contains("protobuf"));
    }
}
