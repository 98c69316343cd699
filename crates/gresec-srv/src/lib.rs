//! gresec-srv: mutually authenticated front end for the node registry.
//!
//! Serves the registry over HTTP/1.1 inside TLS. Every connection must
//! present a client certificate that chains to the configured trust root;
//! connections that cannot are dropped during the handshake and never reach
//! a handler.
//!
//! # Routes
//!
//! - `GET /name/{name}` - one node as a text line, or 404
//! - `POST /set` (or `PUT`) - store the node on the first body line, 400 on parse failure
//! - `GET /all` - every node, one text line each, sorted by name
//!
//! # Identity
//!
//! Handlers see the verified peer through [`ConnectionInfo`]. The identity is
//! logged with each request but grants nothing beyond what the handshake
//! already allowed: any authenticated client may read or write any node.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod server;
pub mod tls;

// Re-exports for convenience.
pub use config::{ServerConfig, TlsConfig};
pub use error::SrvError;
pub use handlers::AppState;
pub use identity::ConnectionInfo;
pub use server::Server;

/// Result type for gresec-srv operations.
pub type Result<T> = std::result::Result<T, SrvError>;
