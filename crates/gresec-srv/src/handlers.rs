//! HTTP handlers over the node registry.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use gresec_core::codec::text;
use gresec_core::{Node, NodeRegistry, NodeStore, MAX_NAME_LEN};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::identity::ConnectionInfo;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The registry
    pub registry: Arc<NodeRegistry>,
    /// Where accepted nodes are persisted, if anywhere
    pub store: Option<Arc<dyn NodeStore>>,
    /// Held across persist and publish so the store and the registry see
    /// writes in the same order
    writes: Arc<Mutex<()>>,
}

impl AppState {
    /// State over `registry` with no persistence.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            store: None,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Persist accepted nodes to `store` before they become visible.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn NodeStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// Build the registry router.
///
/// Every request must carry an `Extension<Arc<ConnectionInfo>>`; the server
/// attaches one per connection.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/name/", get(missing_name))
        .route("/name/:name", get(get_node))
        .route("/set", axum::routing::post(set_node).put(set_node))
        .route("/all", get(all_nodes))
        .with_state(state)
}

type Peer = Extension<Arc<ConnectionInfo>>;

fn text_response(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

async fn missing_name() -> Response {
    text_response(StatusCode::BAD_REQUEST, "missing node name\n")
}

async fn get_node(
    State(state): State<AppState>,
    Extension(peer): Peer,
    Path(name): Path<String>,
) -> Response {
    if name.len() > MAX_NAME_LEN {
        return text_response(StatusCode::BAD_REQUEST, "node name too long\n");
    }

    match state.registry.get(&name) {
        Some(node) => {
            debug!(peer = %peer.common_name(), node = %name, "node lookup");
            text_response(StatusCode::OK, format!("{node}\n"))
        }
        None => {
            debug!(peer = %peer.common_name(), node = %name, "node not found");
            text_response(StatusCode::NOT_FOUND, "404 page not found\n")
        }
    }
}

async fn set_node(
    State(state): State<AppState>,
    Extension(peer): Peer,
    body: String,
) -> Response {
    let line = body.lines().next().unwrap_or_default();
    let node = match text::decode_line(line) {
        Ok(node) => node,
        Err(e) => {
            warn!(peer = %peer.common_name(), error = %e, "rejected node submission");
            return text_response(
                StatusCode::BAD_REQUEST,
                format!("failed to parse node: {e}\n"),
            );
        }
    };

    let _write = state.writes.lock().await;
    if let Some(store) = &state.store {
        if let Err(reason) = persist(Arc::clone(store), node.clone()).await {
            error!(peer = %peer.common_name(), node = %node.name(), error = %reason, "failed to persist node");
            return text_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to persist node\n");
        }
    }

    info!(
        peer = %peer.common_name(),
        node = %node.name(),
        external = %node.external(),
        "stored node"
    );
    state.registry.set(node);
    text_response(StatusCode::OK, "")
}

async fn persist(store: Arc<dyn NodeStore>, node: Node) -> Result<(), String> {
    tokio::task::spawn_blocking(move || store.persist(&node))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

async fn all_nodes(State(state): State<AppState>, Extension(peer): Peer) -> Response {
    let mut nodes: Vec<Node> = state.registry.get_all().into_values().collect();
    nodes.sort_by(|a, b| a.name().cmp(b.name()));

    debug!(
        complete = peer.handshake_complete,
        cipher_suite = ?peer.cipher_suite,
        protocol = ?peer.alpn_protocol,
        mutual = peer.protocol_is_mutual,
        chain_len = peer.peer_certificates.len(),
        peer = %peer.common_name(),
        count = nodes.len(),
        "listing all nodes"
    );

    let body: String = nodes.iter().map(|node| format!("{node}\n")).collect();
    text_response(StatusCode::OK, body)
}
