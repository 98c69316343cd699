//! TLS listener: accepts connections, authenticates them, serves HTTP.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router};
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tower::Service;
use tracing::{debug, info, warn};

use crate::bootstrap;
use crate::config::ServerConfig;
use crate::handlers::{self, AppState};
use crate::identity::ConnectionInfo;
use crate::tls;

/// A bound, ready-to-serve registry server.
///
/// Everything that can fail at startup (TLS material, trust roots, binding)
/// fails in [`Server::bind`]; once bound, connection level failures are
/// logged and only affect that connection.
pub struct Server {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    app: Router,
    handshake_timeout: Duration,
}

impl Server {
    /// Load TLS configuration and bind the listener.
    pub async fn bind(config: &ServerConfig, state: AppState) -> crate::Result<Self> {
        config.validate()?;
        let tls_config = tls::build_server_config(&config.tls)?;

        let listener = TcpListener::bind(config.listen)
            .await
            .map_err(|source| crate::SrvError::Bind {
                addr: config.listen,
                source,
            })?;
        info!(addr = %listener.local_addr()?, "TLS listener bound");

        Ok(Self {
            listener,
            acceptor: TlsAcceptor::from(tls_config),
            app: handlers::router(state),
            handshake_timeout: Duration::from_secs(config.handshake_timeout_secs),
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> crate::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process exits.
    pub async fn serve(self) -> crate::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves. Connections already accepted run to
    /// completion on their own tasks.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, remote) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            accept_backoff(&e).await;
                            continue;
                        }
                    };
                    let acceptor = self.acceptor.clone();
                    let app = self.app.clone();
                    let timeout = self.handshake_timeout;
                    tokio::spawn(async move {
                        handle_connection(acceptor, app, stream, remote, timeout).await;
                    });
                }
            }
        }
    }
}

/// Pause after a failed accept (EMFILE and friends) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

async fn accept_backoff(error: &std::io::Error) {
    warn!(%error, retry_in = ?ACCEPT_BACKOFF, "accept failed");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

/// Handshake, then serve HTTP on the authenticated stream.
///
/// A failed or slow handshake drops the socket without writing anything at
/// the HTTP layer.
async fn handle_connection(
    acceptor: TlsAcceptor,
    app: Router,
    stream: TcpStream,
    remote: SocketAddr,
    handshake_timeout: Duration,
) {
    let tls = match tokio::time::timeout(handshake_timeout, acceptor.accept(stream)).await {
        Ok(Ok(tls)) => tls,
        Ok(Err(e)) => {
            debug!(%remote, error = %e, "TLS handshake failed");
            return;
        }
        Err(_) => {
            debug!(%remote, "TLS handshake timed out");
            return;
        }
    };

    let info = Arc::new(ConnectionInfo::from_connection(tls.get_ref().1, remote));
    debug!(
        %remote,
        peer = %info.common_name(),
        cipher_suite = ?info.cipher_suite,
        version = ?info.protocol_version,
        "authenticated connection"
    );

    let app = app.layer(Extension(info));
    let service = hyper::service::service_fn(move |request: Request<Incoming>| {
        app.clone().call(request)
    });

    if let Err(e) = hyper::server::conn::http1::Builder::new()
        .serve_connection(TokioIo::new(tls), service)
        .await
    {
        debug!(%remote, error = %e, "connection closed with error");
    }
}

/// Load the registry, bind, and serve until `shutdown` resolves.
pub async fn run<F>(config: &ServerConfig, shutdown: F) -> crate::Result<()>
where
    F: Future<Output = ()>,
{
    let store = bootstrap::open_store(config);
    let registry = bootstrap::load_registry(config, store.as_deref())?;
    info!(nodes = registry.len(), "registry ready");

    let mut state = AppState::new(Arc::new(registry));
    if let Some(store) = store {
        state = state.with_store(store);
    }

    let server = Server::bind(config, state).await?;
    server.serve_with_shutdown(shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_accept_error_waits_before_retry() {
        let start = Instant::now();
        accept_backoff(&std::io::Error::from_raw_os_error(24)).await;
        assert!(start.elapsed() >= ACCEPT_BACKOFF);
    }
}
