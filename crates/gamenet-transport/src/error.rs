/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A TCP connection was accepted but the WebSocket upgrade failed.
    ///
    /// This only affects the one peer; the listener keeps running.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// Dialing a remote endpoint failed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Returns `true` if the error only concerns a single incoming peer,
    /// so the listener should keep accepting.
    pub fn is_per_connection(&self) -> bool {
        matches!(self, Self::HandshakeFailed(_) | Self::AcceptFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_connection_classification() {
        assert!(TransportError::HandshakeFailed("bad upgrade".into()).is_per_connection());
        assert!(
            TransportError::AcceptFailed(std::io::Error::other("emfile")).is_per_connection()
        );
        assert!(!TransportError::Shutdown.is_per_connection());
        assert!(!TransportError::ConnectionClosed("gone".into()).is_per_connection());
    }

    #[test]
    fn test_display_includes_source_message() {
        let err = TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "peer went away",
        ));
        assert_eq!(err.to_string(), "send failed: peer went away");
    }
}
