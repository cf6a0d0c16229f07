//! A live, registered peer connection.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use gamenet_protocol::Packet;
use gamenet_transport::{Connection as _, ConnectionId, Transport, WebSocketTransport};
use tokio::sync::watch;

use crate::server::Inner;
use crate::{GamenetError, Server};

/// One peer of a [`Server`].
///
/// Handed to callbacks as `Arc<Connection<T>>`. Writes go straight to the
/// transport and may run concurrently with this connection's read loop.
pub struct Connection<T: Transport = WebSocketTransport> {
    transport: T::Connection,
    server: Weak<Inner<T>>,
    closing: watch::Sender<bool>,
    announce: Mutex<Announce>,
}

/// Pairs `on_connect` with `on_disconnect` so the application never sees a
/// disconnect for a connection it was not told about, or one that arrives
/// before its connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Announce {
    /// Registered, `on_connect` not started.
    Pending,
    /// `on_connect` is running. A close in this window leaves the
    /// disconnect to the read loop.
    Connecting { disconnect_deferred: bool },
    Connected,
    /// Closed before `on_connect` started; neither callback fires.
    Skipped,
}

impl<T: Transport> Connection<T> {
    pub(crate) fn new(transport: T::Connection, server: Weak<Inner<T>>) -> Self {
        let (closing, _) = watch::channel(false);
        Self {
            transport,
            server,
            closing,
            announce: Mutex::new(Announce::Pending),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.transport.id()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.transport.peer_addr()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closing.borrow()
    }

    /// The owning server, unless it has been dropped.
    pub fn server(&self) -> Option<Server<T>> {
        self.server.upgrade().map(|inner| Server { inner })
    }

    /// Builds `packet` (reusing its cached frame) and sends it as one
    /// binary message. Transport errors are returned, never retried.
    pub async fn write(&self, packet: &Packet) -> Result<(), GamenetError> {
        let frame = packet.build()?;
        self.write_frame(frame).await
    }

    /// Sends an already-built frame.
    pub async fn write_frame(&self, frame: &[u8]) -> Result<(), GamenetError> {
        self.transport.send(frame).await?;
        tracing::trace!(conn_id = %self.id(), len = frame.len(), "frame sent");
        Ok(())
    }

    /// Closes the connection.
    ///
    /// The first call stops the read loop, removes the connection from the
    /// server's registry, fires `on_disconnect`, and then closes the
    /// transport, returning its result. Later calls are no-ops.
    ///
    /// `on_disconnect` only fires for connections whose `on_connect` fired.
    /// A close issued while `on_connect` is still running (including from
    /// inside it) fires `on_disconnect` right after that handler returns.
    pub async fn close(self: &Arc<Self>) -> Result<(), GamenetError> {
        if self.closing.send_replace(true) {
            return Ok(());
        }

        if let Some(server) = self.server() {
            let removed = server.inner.registry().remove(self.id()).is_some();
            tracing::info!(conn_id = %self.id(), removed, "connection closed");
            if self.take_disconnect() {
                server.emit_disconnect(Arc::clone(self)).await;
            }
        }

        self.transport.close().await?;
        Ok(())
    }

    /// Resolves once [`close`](Self::close) has begun.
    pub async fn closed(&self) {
        let mut rx = self.closing.subscribe();
        loop {
            let closing = *rx.borrow_and_update();
            if closing {
                return;
            }
            // The sender lives in `self`, so this only errors if we are gone.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Fires `on_connect`, unless a close got there first. A close that
    /// lands while the handler runs is reported once it returns.
    pub(crate) async fn announce(self: &Arc<Self>, server: &Server<T>) {
        if !self.begin_announce() {
            return;
        }
        server.emit_connect(Arc::clone(self)).await;
        if self.finish_announce() {
            server.emit_disconnect(Arc::clone(self)).await;
        }
    }

    fn announce_state(&self) -> MutexGuard<'_, Announce> {
        self.announce.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // `close` raises the closing flag before it looks at the announce
    // state, so checking the flag under this lock cannot miss a close.
    fn begin_announce(&self) -> bool {
        let mut state = self.announce_state();
        if self.is_closed() {
            *state = Announce::Skipped;
            return false;
        }
        *state = Announce::Connecting {
            disconnect_deferred: false,
        };
        true
    }

    /// Returns `true` if a close was deferred while `on_connect` ran.
    fn finish_announce(&self) -> bool {
        let mut state = self.announce_state();
        let deferred = matches!(
            *state,
            Announce::Connecting {
                disconnect_deferred: true
            }
        );
        *state = Announce::Connected;
        deferred
    }

    /// Returns `true` if `close` should fire `on_disconnect` itself.
    fn take_disconnect(&self) -> bool {
        let mut state = self.announce_state();
        match *state {
            Announce::Connected => true,
            Announce::Connecting { .. } => {
                *state = Announce::Connecting {
                    disconnect_deferred: true,
                };
                false
            }
            Announce::Pending | Announce::Skipped => {
                *state = Announce::Skipped;
                false
            }
        }
    }

    /// Skips the registry and callbacks, for connections that were never
    /// registered.
    pub(crate) async fn abandon(&self) {
        self.closing.send_replace(true);
        if let Err(e) = self.transport.close().await {
            tracing::debug!(conn_id = %self.id(), error = %e, "close failed");
        }
    }

    pub(crate) fn transport(&self) -> &T::Connection {
        &self.transport
    }
}

impl<T: Transport> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id())
            .field("peer_addr", &self.peer_addr())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamenet_transport::memory::{self, MemoryTransport};

    async fn detached() -> (Arc<Connection<MemoryTransport>>, memory::MemoryPeer) {
        let (mut transport, connector) = memory::channel();
        let peer = connector.connect().expect("connect");
        let raw = transport.accept().await.expect("accept");
        (Arc::new(Connection::new(raw, Weak::new())), peer)
    }

    #[tokio::test]
    async fn test_write_sends_built_frame() {
        let (conn, peer) = detached().await;
        let mut packet = Packet::new(7);
        packet.add(5u8).expect("add");

        conn.write(&packet).await.expect("write");

        assert_eq!(peer.recv().await, Some(vec![0x06, 0x00, 0x07, 0x00, 0x00, 0x05]));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (conn, peer) = detached().await;
        assert!(!conn.is_closed());

        conn.close().await.expect("first close");
        conn.close().await.expect("second close");

        assert!(conn.is_closed());
        assert_eq!(peer.recv().await, None);
    }

    #[tokio::test]
    async fn test_closed_resolves_after_close() {
        let (conn, _peer) = detached().await;
        let waiter = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.closed().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        conn.close().await.expect("close");
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("closed() resolved")
            .expect("task");
    }

    #[tokio::test]
    async fn test_write_failure_is_returned() {
        let (conn, peer) = detached().await;
        peer.fail_writes(true);

        let err = conn.write(&Packet::new(1)).await.expect_err("write should fail");
        assert!(matches!(err, GamenetError::Transport(_)));
        assert!(!conn.is_closed(), "a failed write does not close the connection");
    }
}
