//! Startup loading of the registry.
//!
//! Sources are applied in order, later ones winning per name:
//! 1. the text bootstrap file, if configured
//! 2. the binary node store, if configured

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use gresec_core::codec::text;
use gresec_core::{FileStore, NodeRegistry, NodeStore};
use tracing::info;

use crate::config::ServerConfig;

/// Open the configured node store, if any.
pub fn open_store(config: &ServerConfig) -> Option<Arc<dyn NodeStore>> {
    config
        .store
        .as_ref()
        .map(|path| Arc::new(FileStore::new(path)) as Arc<dyn NodeStore>)
}

/// Build the startup registry from the bootstrap file and `store`.
///
/// Any unreadable or invalid input is fatal; the server must not start with
/// a partially loaded registry.
pub fn load_registry(
    config: &ServerConfig,
    store: Option<&dyn NodeStore>,
) -> crate::Result<NodeRegistry> {
    let registry = NodeRegistry::new();

    if let Some(path) = &config.bootstrap {
        let file = File::open(path).map_err(|e| {
            crate::SrvError::Config(format!("bootstrap file {}: {e}", path.display()))
        })?;
        let nodes = text::read_lines(BufReader::new(file))?;
        info!(path = %path.display(), count = nodes.len(), "loaded bootstrap nodes");
        registry.extend(nodes);
    }

    if let Some(store) = store {
        let nodes = store.load_all()?;
        info!(count = nodes.len(), "loaded persisted nodes");
        registry.extend(nodes);
    }

    Ok(registry)
}
