//! In-process transport built on Tokio channels.
//!
//! [`channel`] returns a [`MemoryTransport`] to hand to a server and a
//! [`MemoryConnector`] that plays the role of remote clients. Each
//! [`MemoryConnector::connect`] call queues one server-side
//! [`MemoryConnection`] for `accept` and returns the client end as a
//! [`MemoryPeer`].
//!
//! Messages are delivered whole and in order, like WebSocket binary
//! messages. A peer can be told to reject everything the server writes to
//! it, which is how write failures are exercised in tests.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, mpsc};

use crate::{Connection, ConnectionId, Transport, TransportError};

type Outbound = StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>;

/// Creates a connected transport/connector pair.
pub fn channel() -> (MemoryTransport, MemoryConnector) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        MemoryTransport { incoming: rx },
        MemoryConnector { incoming: tx },
    )
}

/// Server side: yields one [`MemoryConnection`] per
/// [`MemoryConnector::connect`] call.
///
/// `accept` fails with [`TransportError::Shutdown`] once every connector
/// has been dropped.
pub struct MemoryTransport {
    incoming: mpsc::UnboundedReceiver<MemoryConnection>,
}

impl Transport for MemoryTransport {
    type Connection = MemoryConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        self.incoming.recv().await.ok_or(TransportError::Shutdown)
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Client side factory for in-memory connections.
#[derive(Clone)]
pub struct MemoryConnector {
    incoming: mpsc::UnboundedSender<MemoryConnection>,
}

impl MemoryConnector {
    /// Opens a new connection to the paired [`MemoryTransport`].
    pub fn connect(&self) -> Result<MemoryPeer, TransportError> {
        let (to_server, from_peer) = mpsc::unbounded_channel();
        let (to_peer, from_server) = mpsc::unbounded_channel();
        let reject_writes = Arc::new(AtomicBool::new(false));
        let id = ConnectionId::next();

        let server_side = MemoryConnection {
            id,
            outbound: StdMutex::new(Some(to_peer)),
            inbound: Mutex::new(from_peer),
            reject_writes: Arc::clone(&reject_writes),
        };
        self.incoming.send(server_side).map_err(|_| {
            TransportError::ConnectionClosed("memory transport dropped".into())
        })?;

        Ok(MemoryPeer {
            id,
            outbound: StdMutex::new(Some(to_server)),
            inbound: Mutex::new(from_server),
            reject_writes,
        })
    }
}

fn take_sender(outbound: &Outbound) -> Option<mpsc::UnboundedSender<Vec<u8>>> {
    outbound.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn clone_sender(outbound: &Outbound) -> Option<mpsc::UnboundedSender<Vec<u8>>> {
    outbound.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// The server's end of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    outbound: Outbound,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    reject_writes: Arc<AtomicBool>,
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.reject_writes.load(Ordering::Acquire) {
            return Err(TransportError::SendFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "peer rejects writes",
            )));
        }
        let tx = clone_sender(&self.outbound)
            .ok_or_else(|| TransportError::ConnectionClosed(format!("{} already closed", self.id)))?;
        tx.send(data.to_vec()).map_err(|_| {
            TransportError::SendFailed(io::Error::new(io::ErrorKind::BrokenPipe, "peer dropped"))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        take_sender(&self.outbound);
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// The client's end of an in-memory connection.
pub struct MemoryPeer {
    id: ConnectionId,
    outbound: Outbound,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    reject_writes: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// The id shared with the server-side [`MemoryConnection`].
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends one message to the server.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        let tx = clone_sender(&self.outbound)
            .ok_or_else(|| TransportError::ConnectionClosed(format!("{} already closed", self.id)))?;
        tx.send(data.into())
            .map_err(|_| TransportError::ConnectionClosed(format!("{} closed by server", self.id)))
    }

    /// Waits for the next message from the server; `None` once the server
    /// has closed its end.
    pub async fn recv(&self) -> Option<Vec<u8>> {
        self.inbound.lock().await.recv().await
    }

    /// Returns an already-delivered message without waiting.
    pub fn try_recv(&self) -> Option<Vec<u8>> {
        self.inbound.try_lock().ok()?.try_recv().ok()
    }

    /// Closes the client end; the server's next `recv` returns `Ok(None)`.
    pub fn close(&self) {
        take_sender(&self.outbound);
    }

    /// When set, every server write to this peer fails with
    /// [`TransportError::SendFailed`].
    pub fn fail_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_flow_both_ways() {
        let (mut transport, connector) = channel();
        let peer = connector.connect().expect("connect");
        let conn = transport.accept().await.expect("accept");
        assert_eq!(conn.id(), peer.id());

        peer.send(b"ping".to_vec()).unwrap();
        assert_eq!(conn.recv().await.unwrap(), Some(b"ping".to_vec()));

        conn.send(b"pong").await.unwrap();
        assert_eq!(peer.recv().await, Some(b"pong".to_vec()));
    }

    #[tokio::test]
    async fn test_peer_close_ends_server_recv() {
        let (mut transport, connector) = channel();
        let peer = connector.connect().unwrap();
        let conn = transport.accept().await.unwrap();

        peer.close();
        assert_eq!(conn.recv().await.unwrap(), None);
        assert!(peer.send(b"late".to_vec()).is_err());
    }

    #[tokio::test]
    async fn test_server_close_ends_peer_recv() {
        let (mut transport, connector) = channel();
        let peer = connector.connect().unwrap();
        let conn = transport.accept().await.unwrap();

        conn.close().await.unwrap();
        assert_eq!(peer.recv().await, None);
        assert!(matches!(
            conn.send(b"x").await,
            Err(TransportError::ConnectionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let (mut transport, connector) = channel();
        let peer = connector.connect().unwrap();
        let conn = transport.accept().await.unwrap();

        peer.fail_writes(true);
        assert!(matches!(
            conn.send(b"x").await,
            Err(TransportError::SendFailed(_))
        ));
        assert!(peer.try_recv().is_none());

        peer.fail_writes(false);
        conn.send(b"y").await.unwrap();
        assert_eq!(peer.try_recv(), Some(b"y".to_vec()));
    }

    #[tokio::test]
    async fn test_accept_fails_after_connectors_dropped() {
        let (mut transport, connector) = channel();
        drop(connector);
        assert!(matches!(
            transport.accept().await,
            Err(TransportError::Shutdown)
        ));
    }
}
