//! Concurrent in-memory name -> node map.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::Node;

/// Process-wide node registry.
///
/// One reader/writer lock covers the whole map. Lookups and snapshots share
/// the lock; `set` takes it exclusively. A snapshot holds the read lock for
/// the whole copy, so writers wait behind it. The registry is expected to
/// stay small.
///
/// Entries are never removed and the map is unbounded.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: RwLock<HashMap<String, Node>>,
}

impl NodeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a sequence of nodes. Later nodes replace
    /// earlier ones with the same name.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let registry = Self::new();
        registry.extend(nodes);
        registry
    }

    /// Insert or replace the entry for `node.name()`.
    ///
    /// The node is stored as given; validation happens when it is decoded.
    pub fn set(&self, node: Node) {
        let mut nodes = self.nodes.write();
        nodes.insert(node.name().to_owned(), node);
    }

    /// Insert or replace several nodes under one write lock.
    pub fn extend(&self, nodes: impl IntoIterator<Item = Node>) {
        let mut map = self.nodes.write();
        for node in nodes {
            map.insert(node.name().to_owned(), node);
        }
    }

    /// Current node for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Node> {
        self.nodes.read().get(name).cloned()
    }

    /// Independent copy of the whole map as of this call.
    #[must_use]
    pub fn get_all(&self) -> HashMap<String, Node> {
        self.nodes.read().clone()
    }

    /// Number of stored nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// True when no node has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}
