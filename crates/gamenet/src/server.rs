//! The `Server` handle and its accept loop.
//!
//! A server owns the registry of live connections and the callback slots.
//! [`Server::serve`] (or [`listen`](Server::listen) / [`run`](Server::run)
//! for WebSocket) occupies the calling task until [`close`](Server::close)
//! is called or the transport fails; every accepted connection runs on its
//! own spawned task.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gamenet_protocol::Packet;
use gamenet_transport::{Transport, WebSocketTransport};
use tokio::sync::watch;

use crate::callbacks::Handlers;
use crate::handler::handle_connection;
use crate::registry::Registry;
use crate::{Connection, GamenetError, ServerConfig};

/// Lifecycle of a [`Server`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    /// Created, not yet serving.
    Idle,
    /// Accepting connections.
    Listening,
    /// Closed; cannot be restarted.
    Closed,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Shared server state. Connections hold it weakly.
///
/// The std locks here guard short, synchronous edits only and are never
/// held across an `.await`.
pub(crate) struct Inner<T: Transport> {
    config: ServerConfig,
    registry: Mutex<Registry<Arc<Connection<T>>>>,
    handlers: RwLock<Handlers<T>>,
    state: Mutex<ServerState>,
    local_addr: Mutex<Option<SocketAddr>>,
    shutdown: watch::Sender<bool>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Transport> Inner<T> {
    pub(crate) fn registry(&self) -> MutexGuard<'_, Registry<Arc<Connection<T>>>> {
        lock(&self.registry)
    }

    pub(crate) fn handlers(&self) -> RwLockReadGuard<'_, Handlers<T>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn handlers_mut(&self) -> RwLockWriteGuard<'_, Handlers<T>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A packet server.
///
/// `Server` is a cheap handle: clones share the same registry, callbacks,
/// and lifecycle. The default transport is WebSocket; any [`Transport`]
/// can be driven with [`with_config`](Self::with_config) and
/// [`serve`](Self::serve).
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use gamenet::prelude::*;
///
/// # async fn example() -> Result<(), GamenetError> {
/// let server = Server::new(ServerConfig::with_bind_addr("0.0.0.0:8080"));
/// server.on_data(|conn: Arc<Connection>, packet: Packet| async move {
///     let _ = conn.write(&packet).await;
/// });
/// server.run().await
/// # }
/// ```
pub struct Server<T: Transport = WebSocketTransport> {
    pub(crate) inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Server<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> fmt::Debug for Server<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .field("connections", &self.connection_count())
            .finish()
    }
}

impl Server<WebSocketTransport> {
    /// Creates a WebSocket server. Nothing is bound until
    /// [`listen`](Self::listen) or [`run`](Self::run).
    pub fn new(config: ServerConfig) -> Self {
        Self::with_config(config)
    }

    /// Binds a WebSocket listener on `addr` and serves until closed.
    ///
    /// Blocks for the lifetime of the listener; spawn it if the caller has
    /// other work to do.
    pub async fn listen(&self, addr: &str) -> Result<(), GamenetError> {
        // Fail before binding; `serve` still makes the authoritative
        // transition.
        self.ensure_idle()?;
        let transport = WebSocketTransport::bind_with_timeout(
            addr,
            self.inner.config.handshake_timeout(),
        )
        .await?;
        self.serve(transport).await
    }

    /// [`listen`](Self::listen) on the configured `bind_addr`.
    pub async fn run(&self) -> Result<(), GamenetError> {
        let addr = self.inner.config.bind_addr.clone();
        self.listen(&addr).await
    }
}

impl Default for Server<WebSocketTransport> {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl<T: Transport> Server<T> {
    /// Creates a server for any transport.
    pub fn with_config(config: ServerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                config,
                registry: Mutex::new(Registry::new()),
                handlers: RwLock::new(Handlers::default()),
                state: Mutex::new(ServerState::Idle),
                local_addr: Mutex::new(None),
                shutdown,
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ServerState {
        *lock(&self.inner.state)
    }

    /// The listening address, once serving on a transport that has one.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *lock(&self.inner.local_addr)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.registry().len()
    }

    /// A snapshot of the registered connections, in no particular order.
    pub fn connections(&self) -> Vec<Arc<Connection<T>>> {
        self.inner.registry().snapshot()
    }

    /// Accepts connections from `transport` until the server is closed.
    ///
    /// Fires `on_ready` once the server is listening. Failed upgrades are
    /// reported to `on_error` and do not stop the loop. Returns `Ok(())`
    /// after [`close`](Self::close); if the transport itself fails, the
    /// server closes and the error is returned.
    pub async fn serve(&self, mut transport: T) -> Result<(), GamenetError> {
        self.begin_listening()?;
        *lock(&self.inner.local_addr) = transport.local_addr();
        tracing::info!(addr = ?self.local_addr(), "server listening");
        self.emit_ready().await;

        let mut shutdown = self.inner.shutdown.subscribe();
        let outcome = loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break Ok(()),
                accepted = transport.accept() => match accepted {
                    Ok(raw) => {
                        tokio::spawn(handle_connection(self.clone(), raw));
                    }
                    Err(e) if e.is_per_connection() => {
                        tracing::warn!(error = %e, "failed to accept connection");
                        self.emit_error(e.into(), None).await;
                    }
                    Err(e) => break Err(e),
                },
            }
        };

        if let Err(e) = transport.shutdown().await {
            tracing::debug!(error = %e, "transport shutdown failed");
        }

        match outcome {
            Ok(()) => {
                tracing::info!("server stopped");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "listener failed");
                self.close().await;
                Err(e.into())
            }
        }
    }

    /// Sends `packet` to every registered connection.
    ///
    /// The packet is built once. Delivery is best-effort: a failed write is
    /// reported to `on_error` with that connection and delivery continues.
    /// The failing connection stays open. Returns how many connections the
    /// packet reached.
    pub async fn broadcast(&self, packet: &Packet) -> Result<usize, GamenetError> {
        let frame = packet.build()?;
        let targets = self.connections();
        let mut delivered = 0;

        for conn in targets {
            match conn.write_frame(frame).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        conn_id = %conn.id(),
                        error = %e,
                        "broadcast write failed"
                    );
                    self.emit_error(e, Some(conn)).await;
                }
            }
        }

        tracing::trace!(packet_id = packet.id(), delivered, "broadcast sent");
        Ok(delivered)
    }

    /// Stops the listener and closes every connection.
    ///
    /// Each connection fires `on_disconnect`, then `on_close` fires once.
    /// In-flight `on_data` handlers are not awaited. Calling `close` again
    /// does nothing.
    pub async fn close(&self) {
        let previous = std::mem::replace(&mut *lock(&self.inner.state), ServerState::Closed);
        if previous == ServerState::Closed {
            return;
        }

        self.inner.shutdown.send_replace(true);
        let connections = self.inner.registry().drain();
        tracing::info!(connections = connections.len(), "server closing");

        for conn in connections {
            if let Err(e) = conn.close().await {
                tracing::debug!(conn_id = %conn.id(), error = %e, "close failed");
            }
        }

        self.emit_close().await;
    }

    /// Inserts a freshly accepted connection. Returns `false` once the
    /// server has started closing; such connections are never registered.
    pub(crate) fn register(&self, conn: &Arc<Connection<T>>) -> bool {
        let mut registry = self.inner.registry();
        // Checked under the registry lock: `close` raises the flag before
        // draining, so nothing can slip in after the drain.
        if *self.inner.shutdown.borrow() {
            return false;
        }
        registry.insert(conn.id(), Arc::clone(conn));
        true
    }

    fn ensure_idle(&self) -> Result<(), GamenetError> {
        match self.state() {
            ServerState::Idle => Ok(()),
            current => Err(not_idle(current)),
        }
    }

    fn begin_listening(&self) -> Result<(), GamenetError> {
        let mut state = lock(&self.inner.state);
        if *state != ServerState::Idle {
            return Err(not_idle(*state));
        }
        *state = ServerState::Listening;
        Ok(())
    }
}

fn not_idle(current: ServerState) -> GamenetError {
    GamenetError::InvalidState(format!("cannot listen on a server that is {current}"))
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        let requested = *rx.borrow_and_update();
        if requested || rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamenet_transport::memory::{self, MemoryTransport};

    #[test]
    fn test_state_display() {
        assert_eq!(ServerState::Idle.to_string(), "idle");
        assert_eq!(ServerState::Listening.to_string(), "listening");
        assert_eq!(ServerState::Closed.to_string(), "closed");
    }

    #[tokio::test]
    async fn test_close_before_serve() {
        let server = Server::<MemoryTransport>::with_config(ServerConfig::default());
        assert_eq!(server.state(), ServerState::Idle);

        server.close().await;
        assert_eq!(server.state(), ServerState::Closed);

        let (transport, _connector) = memory::channel();
        let err = server.serve(transport).await.expect_err("closed server");
        assert!(matches!(err, GamenetError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_broadcast_with_no_connections() {
        let server = Server::<MemoryTransport>::with_config(ServerConfig::default());
        let delivered = server.broadcast(&Packet::new(3)).await.expect("broadcast");
        assert_eq!(delivered, 0);
    }
}
