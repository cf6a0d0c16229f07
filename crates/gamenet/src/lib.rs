//! # gamenet
//!
//! Binary packet messaging for WebSocket-connected game peers.
//!
//! A [`Packet`] is a `u16` id followed by an ordered list of typed
//! [`Value`]s, framed into one binary WebSocket message. A [`Server`]
//! accepts peers, keeps the registry of live [`Connection`]s, runs one read
//! loop per connection, and reports lifecycle events to the callbacks you
//! register: ready, connect, disconnect, data, error and close.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gamenet::prelude::*;
//!
//! const CHAT: u16 = 1;
//!
//! # async fn example() -> Result<(), GamenetError> {
//! let server = Server::new(ServerConfig::default());
//!
//! server
//!     .on_connect(|conn: Arc<Connection>| async move {
//!         println!("{} joined", conn.id());
//!     })
//!     .on_data(|conn: Arc<Connection>, packet: Packet| async move {
//!         if packet.id() == CHAT {
//!             if let Some(server) = conn.server() {
//!                 let _ = server.broadcast(&packet).await;
//!             }
//!         }
//!     });
//!
//! server.run().await
//! # }
//! ```
//!
//! Any [`Transport`](gamenet_transport::Transport) can back a server; the
//! in-memory one in [`memory`] drives a server without sockets:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use gamenet::memory::{self, MemoryTransport};
//! use gamenet::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), GamenetError> {
//! let (transport, connector) = memory::channel();
//! let server = Server::<MemoryTransport>::with_config(ServerConfig::default());
//! server.on_data(|conn: Arc<Connection<MemoryTransport>>, packet: Packet| async move {
//!     let _ = conn.write(&packet).await;
//! });
//! let serving = tokio::spawn({
//!     let server = server.clone();
//!     async move { server.serve(transport).await }
//! });
//!
//! let peer = connector.connect()?;
//! let mut ping = Packet::new(9);
//! ping.add_int(300)?;
//! peer.send(ping.build()?.to_vec())?;
//!
//! let echoed = peer.recv().await.expect("echo");
//! assert_eq!(Packet::load(echoed)?.get(0)?, &Value::U16(300));
//!
//! server.close().await;
//! serving.await.expect("serve task")?;
//! # Ok(())
//! # }
//! ```

mod callbacks;
mod client;
mod config;
mod connection;
mod error;
mod handler;
mod registry;
mod server;

pub use client::Client;
pub use config::ServerConfig;
pub use connection::Connection;
pub use error::GamenetError;
pub use server::{Server, ServerState};

pub use gamenet_protocol::{
    DecodeError, EncodeError, HEADER_LEN, MAX_FRAME_LEN, Packet, PacketError, Reader, Value,
    ValueType,
};
pub use gamenet_transport::{ConnectionId, Transport, TransportError, WebSocketTransport, memory};

/// Everything an application usually needs.
pub mod prelude {
    pub use crate::{
        Client, Connection, ConnectionId, GamenetError, Packet, Server, ServerConfig,
        ServerState, Value, ValueType,
    };
}
