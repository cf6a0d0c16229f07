//! Unified error type for the gamenet crate.

use std::time::Duration;

use gamenet_protocol::{DecodeError, EncodeError, PacketError};
use gamenet_transport::TransportError;

/// Top-level error that wraps the transport and protocol errors.
///
/// This is also what `on_error` handlers receive: a transport failure, a
/// malformed frame, or a read timeout, each scoped to one connection.
#[derive(Debug, thiserror::Error)]
pub enum GamenetError {
    /// A transport-level error (accept, send, recv, close).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, index, sealed packet).
    #[error(transparent)]
    Packet(#[from] PacketError),

    /// The peer sent nothing within the configured read timeout.
    #[error("no message received within {0:?}")]
    ReadTimeout(Duration),

    /// The operation is not valid in the server's current state.
    #[error("invalid server state: {0}")]
    InvalidState(String),
}

impl From<EncodeError> for GamenetError {
    fn from(err: EncodeError) -> Self {
        Self::Packet(err.into())
    }
}

impl From<DecodeError> for GamenetError {
    fn from(err: DecodeError) -> Self {
        Self::Packet(err.into())
    }
}

impl GamenetError {
    /// Returns the decode error if a peer sent a malformed frame.
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self {
            Self::Packet(PacketError::Decode(e)) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let gamenet_err: GamenetError = err.into();
        assert!(matches!(gamenet_err, GamenetError::Transport(_)));
        assert!(gamenet_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_decode_error() {
        let err: GamenetError = DecodeError::UnknownType(99).into();
        assert_eq!(err.as_decode(), Some(&DecodeError::UnknownType(99)));
        assert_eq!(err.to_string(), "unknown type tag 99");
    }

    #[test]
    fn test_from_encode_error() {
        let err: GamenetError = EncodeError::FrameTooLarge(70_000).into();
        assert!(matches!(
            err,
            GamenetError::Packet(PacketError::Encode(_))
        ));
        assert!(err.as_decode().is_none());
    }
}
