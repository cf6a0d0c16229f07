//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`Server`](crate::Server).
///
/// Every field has a default, so a partial JSON/TOML document (or
/// `ServerConfig { read_timeout_ms: Some(30_000), ..Default::default() }`)
/// is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address used by [`Server::run`](crate::Server::run).
    pub bind_addr: String,

    /// How long a WebSocket upgrade may take before the peer is dropped.
    /// 0 disables the limit.
    pub handshake_timeout_ms: u64,

    /// Close connections that send nothing for this long. `None` (the
    /// default) means connections may idle forever.
    pub read_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            handshake_timeout_ms: 5_000,
            read_timeout_ms: None,
        }
    }
}

impl ServerConfig {
    /// Default settings bound to `addr`.
    pub fn with_bind_addr(addr: impl Into<String>) -> Self {
        Self {
            bind_addr: addr.into(),
            ..Self::default()
        }
    }

    pub fn handshake_timeout(&self) -> Option<Duration> {
        (self.handshake_timeout_ms > 0).then(|| Duration::from_millis(self.handshake_timeout_ms))
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}
