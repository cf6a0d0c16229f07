//! Lifecycle callback slots.
//!
//! Each event has exactly one slot. Registering a handler replaces whatever
//! was there; firing an event with an empty slot does nothing. Handlers are
//! async so they can write to connections, and they are always invoked with
//! no server lock held.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use gamenet_protocol::Packet;
use gamenet_transport::Transport;

use crate::{Connection, GamenetError, Server};

type Callback<A> = Arc<dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync>;

type DataArgs<T> = (Arc<Connection<T>>, Packet);
type ErrorArgs<T> = (GamenetError, Option<Arc<Connection<T>>>, Server<T>);

pub(crate) struct Handlers<T: Transport> {
    ready: Option<Callback<Server<T>>>,
    connect: Option<Callback<Arc<Connection<T>>>>,
    disconnect: Option<Callback<Arc<Connection<T>>>>,
    data: Option<Callback<DataArgs<T>>>,
    error: Option<Callback<ErrorArgs<T>>>,
    close: Option<Callback<Server<T>>>,
}

impl<T: Transport> Default for Handlers<T> {
    fn default() -> Self {
        Self {
            ready: None,
            connect: None,
            disconnect: None,
            data: None,
            error: None,
            close: None,
        }
    }
}

/// Handler registration.
impl<T: Transport> Server<T> {
    /// Called once the listener is up, before the first accept.
    pub fn on_ready<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Server<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Callback<Server<T>> =
            Arc::new(move |server: Server<T>| handler(server).boxed());
        self.inner.handlers_mut().ready = Some(handler);
        self
    }

    /// Called after a connection is registered, before its first read.
    pub fn on_connect<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Arc<Connection<T>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Callback<Arc<Connection<T>>> =
            Arc::new(move |conn: Arc<Connection<T>>| handler(conn).boxed());
        self.inner.handlers_mut().connect = Some(handler);
        self
    }

    /// Called once per connection, when it leaves the registry.
    pub fn on_disconnect<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Arc<Connection<T>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Callback<Arc<Connection<T>>> =
            Arc::new(move |conn: Arc<Connection<T>>| handler(conn).boxed());
        self.inner.handlers_mut().disconnect = Some(handler);
        self
    }

    /// Called for every packet, on the sending connection's own task.
    ///
    /// The next message from that connection is not read until the
    /// returned future completes, so packets from one peer are handled
    /// strictly in arrival order.
    pub fn on_data<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Arc<Connection<T>>, Packet) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Callback<DataArgs<T>> =
            Arc::new(move |(conn, packet): DataArgs<T>| {
                handler(conn, packet).boxed()
            });
        self.inner.handlers_mut().data = Some(handler);
        self
    }

    /// Called for recoverable errors.
    ///
    /// The connection is `None` when the error happened before one existed,
    /// such as a failed WebSocket upgrade.
    pub fn on_error<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(GamenetError, Option<Arc<Connection<T>>>, Server<T>) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Callback<ErrorArgs<T>> =
            Arc::new(move |(err, conn, server): ErrorArgs<T>| {
                handler(err, conn, server).boxed()
            });
        self.inner.handlers_mut().error = Some(handler);
        self
    }

    /// Called once, at the end of [`close`](Self::close).
    pub fn on_close<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Server<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Callback<Server<T>> =
            Arc::new(move |server: Server<T>| handler(server).boxed());
        self.inner.handlers_mut().close = Some(handler);
        self
    }
}

// Each emit clones the handler out of the slot so the read lock is released
// before the handler runs.
impl<T: Transport> Server<T> {
    pub(crate) async fn emit_ready(&self) {
        let handler = self.inner.handlers().ready.clone();
        if let Some(handler) = handler {
            handler(self.clone()).await;
        }
    }

    pub(crate) async fn emit_connect(&self, conn: Arc<Connection<T>>) {
        let handler = self.inner.handlers().connect.clone();
        if let Some(handler) = handler {
            handler(conn).await;
        }
    }

    pub(crate) async fn emit_disconnect(&self, conn: Arc<Connection<T>>) {
        let handler = self.inner.handlers().disconnect.clone();
        if let Some(handler) = handler {
            handler(conn).await;
        }
    }

    pub(crate) async fn emit_data(&self, conn: Arc<Connection<T>>, packet: Packet) {
        let handler = self.inner.handlers().data.clone();
        if let Some(handler) = handler {
            handler((conn, packet)).await;
        }
    }

    pub(crate) async fn emit_error(
        &self,
        err: GamenetError,
        conn: Option<Arc<Connection<T>>>,
    ) {
        let handler = self.inner.handlers().error.clone();
        match handler {
            Some(handler) => handler((err, conn, self.clone())).await,
            None => tracing::trace!(error = %err, "no error handler registered"),
        }
    }

    pub(crate) async fn emit_close(&self) {
        let handler = self.inner.handlers().close.clone();
        if let Some(handler) = handler {
            handler(self.clone()).await;
        }
    }
}
