//! Error types for the protocol layer.
//!
//! Encoding and decoding failures are kept apart: an [`EncodeError`] means
//! the local application asked for something the wire format cannot carry,
//! a [`DecodeError`] means a peer sent bytes that are not a valid frame.
//! [`PacketError`] is what the [`Packet`](crate::Packet) API returns.

use crate::ValueType;

/// Errors raised while turning values into bytes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    /// A string or buffer longer than the single length byte can describe.
    #[error("{ty} payload is {len} bytes, at most 255 fit in a length byte")]
    TooLong { ty: ValueType, len: usize },

    /// The wire type exists in the tag table but has no runtime
    /// representation (`f16`), or cannot be built from the given input.
    #[error("cannot encode a value of type {0}")]
    UnsupportedType(ValueType),

    /// A number that does not fit the requested (or any) wire type.
    #[error("{value} does not fit in {ty}")]
    OutOfRange { value: f64, ty: ValueType },

    /// The serialized frame would overflow its `u16` length prefix.
    #[error("frame of {0} bytes exceeds the 65535 byte limit")]
    FrameTooLarge(usize),
}

/// Errors raised while parsing bytes received from a peer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The tag byte is not an index into the type table.
    #[error("unknown type tag {0}")]
    UnknownType(u8),

    /// The tag names a type this codec cannot represent (`f16`).
    #[error("unsupported type {0} on the wire")]
    UnsupportedType(ValueType),

    /// Fewer bytes remain than the current field declares.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// The frame's length prefix disagrees with the received buffer.
    #[error("length prefix says {declared} bytes, frame is {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// The frame does not split into whole values.
    #[error("corrupt frame at offset {offset}: {reason}")]
    FrameCorrupt { offset: usize, reason: &'static str },

    /// A string payload that is not valid UTF-8.
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
}

/// Errors returned by [`Packet`](crate::Packet) operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PacketError {
    /// Building the frame failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Loading a frame failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Positional access past the end of the value list.
    #[error("value index {index} out of range for packet with {len} values")]
    Index { index: usize, len: usize },

    /// The packet already has a frame (it was built or loaded), so its
    /// values can no longer change.
    #[error("packet {id} is sealed: values cannot change after build or load")]
    Sealed { id: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_error_converts_into_packet_error() {
        let err: PacketError = EncodeError::FrameTooLarge(70_000).into();
        assert!(matches!(err, PacketError::Encode(_)));
        assert!(err.to_string().contains("70000"));
    }

    #[test]
    fn test_decode_error_messages_name_the_problem() {
        let err = DecodeError::LengthMismatch {
            declared: 40,
            actual: 6,
        };
        assert_eq!(err.to_string(), "length prefix says 40 bytes, frame is 6 bytes");
        assert_eq!(DecodeError::UnknownType(42).to_string(), "unknown type tag 42");
    }
}
