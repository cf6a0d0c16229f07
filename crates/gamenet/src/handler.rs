//! Per-connection read loop.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!   1. Register the connection → fire `on_connect` (skipped if the
//!      connection was closed before it could be announced)
//!   2. Loop: read one message → decode → fire `on_data`
//!   3. Any read error, decode error, timeout, clean close, or external
//!      `close()` ends the loop; the connection is then closed, which
//!      fires `on_disconnect`
//!
//! Errors end only this connection and reach the application through
//! `on_error`. Nothing here can stop the listener.

use std::sync::Arc;
use std::time::Duration;

use gamenet_protocol::Packet;
use gamenet_transport::{Connection as RawConnection, Transport};

use crate::{Connection, GamenetError, Server};

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<T: Transport>(
    server: Server<T>,
    raw: T::Connection,
) {
    let conn = Arc::new(Connection::new(raw, Arc::downgrade(&server.inner)));
    let conn_id = conn.id();

    if !server.register(&conn) {
        tracing::debug!(%conn_id, "server closing, dropping new connection");
        conn.abandon().await;
        return;
    }

    tracing::info!(%conn_id, peer = ?conn.peer_addr(), "connection opened");
    conn.announce(&server).await;

    let read_timeout = server.config().read_timeout();
    loop {
        let next = tokio::select! {
            biased;
            _ = conn.closed() => break,
            next = next_message(conn.transport(), read_timeout) => next,
        };

        let data = match next {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "peer closed the connection");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "read failed");
                server.emit_error(e, Some(Arc::clone(&conn))).await;
                break;
            }
        };

        match Packet::load(data) {
            Ok(packet) => {
                tracing::trace!(
                    %conn_id,
                    packet_id = packet.id(),
                    values = packet.len(),
                    "packet received"
                );
                server.emit_data(Arc::clone(&conn), packet).await;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode packet");
                server.emit_error(e.into(), Some(Arc::clone(&conn))).await;
                break;
            }
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "transport close failed");
    }
}

/// Reads the next message, giving up after `limit` if one is set.
async fn next_message<C: RawConnection>(
    conn: &C,
    limit: Option<Duration>,
) -> Result<Option<Vec<u8>>, GamenetError> {
    let Some(limit) = limit else {
        return Ok(conn.recv().await?);
    };
    match tokio::time::timeout(limit, conn.recv()).await {
        Ok(received) => Ok(received?),
        Err(_) => Err(GamenetError::ReadTimeout(limit)),
    }
}
