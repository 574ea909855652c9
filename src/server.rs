//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()`: no new connections are made.
//! 2. Asking every live connection to finish its in-flight request and close.
//! 3. Waiting up to `SHUTDOWN_TIMEOUT` for them, then aborting the rest.
//!
//! Keep `SHUTDOWN_TIMEOUT` below `terminationGracePeriodSeconds`.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    address: String,
    read_timeout: Duration,
    write_timeout: Duration,
    shutdown_timeout: Duration,
}

/// Per-connection settings shared by every request on it.
#[derive(Clone)]
struct Dispatch {
    app: BoxedHandler,
    remote_addr: SocketAddr,
    shutdown: CancellationToken,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Server {
    pub fn new(config: &Config) -> Self {
        Self {
            address: config.address(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    /// Binds the configured address and serves `app` until `shutdown`
    /// resolves. See [`Server::serve_on`].
    pub async fn serve<F>(self, app: BoxedHandler, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.address.as_str()).await?;
        self.serve_on(listener, app, shutdown).await
    }

    /// Accepts connections on `listener` and dispatches them through `app`.
    ///
    /// Returns after a graceful shutdown: once `shutdown` resolves and every
    /// connection has closed, or with [`Error::ShutdownTimeout`] if some were
    /// still open when the shutdown timeout ran out.
    pub async fn serve_on<F>(
        self,
        listener: TcpListener,
        app: BoxedHandler,
        shutdown: F,
    ) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        info!(address = %addr, "starting server");

        // Cancelled on shutdown; every request context is a child of it.
        let stop = CancellationToken::new();

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = JoinSet::new();

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a signal immediately stops
                // accepting new connections, even if more are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatch = Dispatch {
                        app: app.clone(),
                        remote_addr,
                        shutdown: stop.clone(),
                        read_timeout: self.read_timeout,
                        write_timeout: self.write_timeout,
                    };
                    tasks.spawn(serve_connection(stream, dispatch));
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        stop.cancel();
        info!(timeout = ?self.shutdown_timeout, "shutting down server");

        let drain = async { while tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(self.shutdown_timeout, drain).await.is_err() {
            warn!(remaining = tasks.len(), "shutdown timed out, aborting connections");
            tasks.abort_all();
            return Err(Error::ShutdownTimeout(self.shutdown_timeout));
        }

        info!("server shutdown complete");
        Ok(())
    }
}

/// Serves one connection until it closes or shutdown asks it to wind down.
async fn serve_connection(stream: tokio::net::TcpStream, dispatch: Dispatch) {
    let remote_addr = dispatch.remote_addr;
    let stop = dispatch.shutdown.clone();
    let read_timeout = dispatch.read_timeout;

    // `service_fn` is called once per request on the connection, not once
    // per connection.
    let svc = service_fn(move |req| {
        let dispatch = dispatch.clone();
        async move { Ok::<_, Infallible>(handle(dispatch, req).await.into_inner()) }
    });

    // `auto::Builder` transparently handles both HTTP/1.1 and HTTP/2,
    // whatever the client negotiates.
    let mut builder = ConnBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout);

    let conn = builder.serve_connection(TokioIo::new(stream), svc);
    tokio::pin!(conn);

    let result = tokio::select! {
        res = conn.as_mut() => res,
        () = stop.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    if let Err(e) = result {
        debug!(peer = %remote_addr, "connection error: {e}");
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: reads one request and produces one response.
///
/// Every failure becomes a response here, so hyper never sees an error.
async fn handle(dispatch: Dispatch, req: hyper::Request<Incoming>) -> Response {
    let (parts, body) = req.into_parts();

    let body: Bytes = match tokio::time::timeout(dispatch.read_timeout, body.collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(e)) => {
            debug!(peer = %dispatch.remote_addr, "failed to read request body: {e}");
            return Response::status(Status::BadRequest);
        }
        Err(_) => {
            warn!(peer = %dispatch.remote_addr, "timed out reading request body");
            return Response::status(Status::RequestTimeout);
        }
    };

    let context = Context::new(dispatch.shutdown.child_token());
    let req = Request::from_parts(
        Method::from(&parts.method),
        &parts.uri,
        &parts.headers,
        body,
        dispatch.remote_addr,
        context,
    );

    match tokio::time::timeout(dispatch.write_timeout, dispatch.app.call(req)).await {
        Ok(res) => res,
        Err(_) => {
            warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                timeout = ?dispatch.write_timeout,
                "handler exceeded write timeout"
            );
            Response::status(Status::ServiceUnavailable)
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by `kubectl` and the
/// Kubernetes control plane) and **SIGINT** (Ctrl-C, for local dev).
/// On Windows only Ctrl-C is available. A handler that cannot be installed
/// is logged and its arm never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    // `pending()` is a future that never resolves, so on non-Unix platforms
    // the SIGTERM arm is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
