//! WebSocket client for talking to a gamenet server.

use gamenet_protocol::Packet;
use gamenet_transport::{ClientStream, Connection as _, ConnectionId, WebSocketConnection};

use crate::GamenetError;

/// The client end of a packet connection.
///
/// Sends and receives whole packets over one WebSocket. `send` and `recv`
/// take `&self` and may be used from different tasks at the same time.
///
/// ```rust,no_run
/// use gamenet::prelude::*;
///
/// # async fn example() -> Result<(), GamenetError> {
/// let client = Client::connect("ws://127.0.0.1:8080").await?;
/// let mut hello = Packet::new(1);
/// hello.add("hello")?;
/// client.send(&hello).await?;
/// if let Some(reply) = client.recv().await? {
///     println!("{:?}", reply.values());
/// }
/// client.disconnect().await
/// # }
/// ```
pub struct Client {
    conn: WebSocketConnection<ClientStream>,
}

impl Client {
    /// Performs the WebSocket handshake with `url` (`ws://host:port/...`).
    pub async fn connect(url: &str) -> Result<Self, GamenetError> {
        let conn = WebSocketConnection::<ClientStream>::connect(url).await?;
        tracing::debug!(conn_id = %conn.id(), url, "client connected");
        Ok(Self { conn })
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Builds `packet` (reusing its cached frame) and sends it.
    pub async fn send(&self, packet: &Packet) -> Result<(), GamenetError> {
        let frame = packet.build()?;
        self.conn.send(frame).await?;
        Ok(())
    }

    /// Waits for the next packet. Returns `Ok(None)` once the server
    /// closes the connection; a malformed frame is an error.
    pub async fn recv(&self) -> Result<Option<Packet>, GamenetError> {
        match self.conn.recv().await? {
            Some(data) => Ok(Some(Packet::load(data)?)),
            None => Ok(None),
        }
    }

    /// Sends a close frame to the server.
    pub async fn disconnect(&self) -> Result<(), GamenetError> {
        self.conn.close().await?;
        Ok(())
    }
}
