//! Echo/chat server.
//!
//! Chat packets (id 1) are broadcast to every connected peer, the sender
//! included. Any other packet is echoed back to whoever sent it.
//!
//! ```text
//! RUST_LOG=debug cargo run -p echo-chat -- config.json
//! ```
//!
//! The optional argument is a JSON [`ServerConfig`]; missing fields take
//! their defaults.

use std::error::Error;
use std::sync::Arc;

use gamenet::prelude::*;
use tracing_subscriber::EnvFilter;

/// Packet id that is relayed to everyone.
const CHAT: u16 = 1;

fn load_config(path: Option<&str>) -> Result<ServerConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(ServerConfig::default());
    };
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn build_server(config: ServerConfig) -> Server {
    let server = Server::new(config);

    server
        .on_ready(|server: Server| async move {
            tracing::info!(addr = ?server.local_addr(), "echo-chat ready");
        })
        .on_connect(|conn: Arc<Connection>| async move {
            tracing::info!(conn_id = %conn.id(), peer = ?conn.peer_addr(), "peer joined");
        })
        .on_disconnect(|conn: Arc<Connection>| async move {
            tracing::info!(conn_id = %conn.id(), "peer left");
        })
        .on_data(|conn: Arc<Connection>, packet: Packet| async move {
            if packet.id() == CHAT {
                let Some(server) = conn.server() else { return };
                match server.broadcast(&packet).await {
                    Ok(delivered) => {
                        tracing::debug!(conn_id = %conn.id(), delivered, "chat relayed");
                    }
                    Err(e) => tracing::warn!(error = %e, "chat broadcast failed"),
                }
            } else if let Err(e) = conn.write(&packet).await {
                tracing::debug!(conn_id = %conn.id(), error = %e, "echo failed");
            }
        })
        .on_error(
            |err: GamenetError, conn: Option<Arc<Connection>>, _server: Server| async move {
                match conn {
                    Some(conn) => tracing::warn!(conn_id = %conn.id(), error = %err, "peer error"),
                    None => tracing::warn!(error = %err, "server error"),
                }
            },
        )
        .on_close(|_server: Server| async move {
            tracing::info!("echo-chat closed");
        });

    server
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config(std::env::args().nth(1).as_deref())?;
    tracing::info!(addr = %config.bind_addr, "starting echo-chat");

    let server = build_server(config);
    let mut listener = tokio::spawn({
        let server = server.clone();
        async move { server.run().await }
    });

    tokio::select! {
        result = &mut listener => {
            result??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    tracing::info!("ctrl-c received, shutting down");
    server.close().await;
    listener.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn start() -> (Server, String) {
        let server = build_server(ServerConfig::default());
        tokio::spawn({
            let server = server.clone();
            async move { server.listen("127.0.0.1:0").await }
        });
        for _ in 0..200 {
            if let Some(addr) = server.local_addr() {
                return (server, format!("ws://{addr}"));
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("server never bound");
    }

    async fn wait_for_peers(server: &Server, n: usize) {
        for _ in 0..200 {
            if server.connection_count() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} peers, have {}", server.connection_count());
    }

    #[tokio::test]
    async fn test_non_chat_packets_are_echoed() {
        let (server, url) = start().await;
        let client = Client::connect(&url).await.unwrap();

        let mut ping = Packet::new(7);
        ping.add(5u8).unwrap().add("ping").unwrap();
        client.send(&ping).await.unwrap();

        let reply = client.recv().await.unwrap().expect("echo");
        assert_eq!(reply, ping);
        server.close().await;
    }

    #[tokio::test]
    async fn test_chat_reaches_everyone() {
        let (server, url) = start().await;
        let alice = Client::connect(&url).await.unwrap();
        let bob = Client::connect(&url).await.unwrap();
        wait_for_peers(&server, 2).await;

        let mut chat = Packet::new(CHAT);
        chat.add("hello room").unwrap();
        alice.send(&chat).await.unwrap();

        for client in [&alice, &bob] {
            let got = client.recv().await.unwrap().expect("chat");
            assert_eq!(got.get(0).unwrap().as_str(), Some("hello room"));
        }
        server.close().await;
    }

    #[test]
    fn test_config_defaults_without_path() {
        assert_eq!(load_config(None).unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_config_from_json_file() {
        let path = std::env::temp_dir().join(format!("echo-chat-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "bind_addr": "0.0.0.0:9100" }"#).unwrap();

        let config = load_config(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9100");
        assert_eq!(config.handshake_timeout_ms, 5_000);
    }
}
