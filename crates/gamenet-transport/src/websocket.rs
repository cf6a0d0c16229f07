//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// The byte stream underneath a client-side connection.
pub type ClientStream = MaybeTlsStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
///
/// A background task owns the TCP listener and runs each upgrade on its
/// own task, so a peer that stalls its handshake never holds up the next
/// one. Upgraded connections (and upgrade failures) queue up for
/// [`accept`](Transport::accept) in completion order.
pub struct WebSocketTransport {
    local_addr: Option<SocketAddr>,
    incoming: mpsc::UnboundedReceiver<Result<WebSocketConnection, TransportError>>,
    acceptor: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        Self::bind_with_timeout(addr, None).await
    }

    /// Binds a transport whose upgrade handshakes are abandoned after
    /// `handshake_timeout`.
    pub async fn bind_with_timeout(
        addr: &str,
        handshake_timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let local_addr = listener.local_addr().ok();
        tracing::info!(addr, ?local_addr, "WebSocket transport listening");

        let (tx, incoming) = mpsc::unbounded_channel();
        let acceptor = tokio::spawn(accept_loop(listener, handshake_timeout, tx));
        Ok(Self {
            local_addr,
            incoming,
            acceptor,
        })
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

type Upgraded = Result<WebSocketConnection, TransportError>;

/// Accepts TCP sockets until the transport goes away, spawning one upgrade
/// task per socket.
async fn accept_loop(
    listener: TcpListener,
    handshake_timeout: Option<Duration>,
    tx: mpsc::UnboundedSender<Upgraded>,
) {
    loop {
        let accepted = tokio::select! {
            _ = tx.closed() => return,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, addr)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    // The receiver may be gone by now; the socket just drops.
                    let _ = tx.send(upgrade(stream, addr, handshake_timeout).await);
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept failed");
                if tx.send(Err(TransportError::AcceptFailed(e))).is_err() {
                    return;
                }
                // Back off so a persistent error (e.g. EMFILE) does not spin.
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
}

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

async fn upgrade(
    stream: TcpStream,
    addr: SocketAddr,
    handshake_timeout: Option<Duration>,
) -> Upgraded {
    let handshake = tokio_tungstenite::accept_async(stream);
    let upgraded = match handshake_timeout {
        Some(limit) => tokio::time::timeout(limit, handshake).await.map_err(|_| {
            TransportError::HandshakeFailed(format!(
                "upgrade from {addr} timed out after {limit:?}"
            ))
        })?,
        None => handshake.await,
    };
    let ws = upgraded.map_err(|e| {
        TransportError::HandshakeFailed(format!("upgrade from {addr} failed: {e}"))
    })?;

    let conn = WebSocketConnection::from_stream(ws, Some(addr));
    tracing::debug!(id = %conn.id, %addr, "accepted WebSocket connection");
    Ok(conn)
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        self.incoming
            .recv()
            .await
            .unwrap_or(Err(TransportError::Shutdown))
    }

    /// Stops accepting new sockets. Upgrades already in flight still
    /// finish and can be collected with `accept`.
    async fn shutdown(&self) -> Result<(), TransportError> {
        self.acceptor.abort();
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

/// A single WebSocket connection.
///
/// The socket is split so that a write never queues behind a pending read.
pub struct WebSocketConnection<S = TcpStream> {
    id: ConnectionId,
    peer_addr: Option<SocketAddr>,
    sink: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    stream: Mutex<SplitStream<WebSocketStream<S>>>,
}

impl<S> WebSocketConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn from_stream(ws: WebSocketStream<S>, peer_addr: Option<SocketAddr>) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id: ConnectionId::next(),
            peer_addr,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

impl WebSocketConnection<ClientStream> {
    /// Dials a WebSocket server, e.g. `ws://127.0.0.1:8080`.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectFailed(format!("{url}: {e}")))?;
        let peer_addr = match ws.get_ref() {
            MaybeTlsStream::Plain(tcp) => tcp.peer_addr().ok(),
            _ => None,
        };
        let conn = Self::from_stream(ws, peer_addr);
        tracing::debug!(id = %conn.id, url, "connected WebSocket client");
        Ok(conn)
    }
}

fn send_error(e: tungstenite::Error) -> TransportError {
    TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
}

impl<S> Connection for WebSocketConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(send_error)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        match self.sink.lock().await.close().await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(send_error(e)),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}
