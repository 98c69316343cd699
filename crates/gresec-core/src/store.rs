//! Persistence seam for the registry.
//!
//! The registry itself never performs I/O. A [`NodeStore`] is loaded once at
//! startup and written through by whoever accepts new nodes; when no store is
//! configured nothing is persisted.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::codec::binary;
use crate::{Node, NodeError, Result};

/// Durable backing for node records.
pub trait NodeStore: Send + Sync {
    /// Every persisted record, oldest first. Later records for the same name
    /// supersede earlier ones.
    fn load_all(&self) -> Result<Vec<Node>>;

    /// Durably record `node`.
    fn persist(&self, node: &Node) -> Result<()>;
}

/// Append-only file of binary records.
///
/// Each [`persist`](NodeStore::persist) appends one record, so the file is a
/// log; folding it into a registry keeps the newest entry per name.
///
/// A record cut short at the end of the file (an append interrupted by a
/// crash) is dropped and trimmed off on load. Damage anywhere else is an
/// error.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    append: Mutex<()>,
}

impl FileStore {
    /// Use the log at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: Mutex::new(()),
        }
    }

    /// Location of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NodeStore for FileStore {
    fn load_all(&self) -> Result<Vec<Node>> {
        let _guard = self.append.lock();
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "node store not found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut nodes = Vec::new();
        let mut rest = bytes.as_slice();
        loop {
            let offset = bytes.len() - rest.len();
            match binary::read_record(&mut rest) {
                Ok(Some(node)) => nodes.push(node),
                Ok(None) => break,
                // Only the last record can run into end of file.
                Err(NodeError::Truncated { .. }) => {
                    warn!(
                        path = %self.path.display(),
                        offset,
                        dropped = bytes.len() - offset,
                        "dropping torn record at end of node store"
                    );
                    self.truncate_to(offset as u64)?;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        debug!(path = %self.path.display(), records = nodes.len(), "loaded node store");
        Ok(nodes)
    }

    fn persist(&self, node: &Node) -> Result<()> {
        // Encode before touching the file so a rejected node leaves no bytes.
        let record = binary::encode(node)?;

        let _guard = self.append.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let start = file.metadata()?.len();

        if let Err(e) = append_record(&mut file, &record) {
            if let Err(undo) = file.set_len(start) {
                warn!(
                    path = %self.path.display(),
                    error = %undo,
                    "failed to roll back partial append"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl FileStore {
    fn truncate_to(&self, len: u64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_len(len)?;
        file.sync_data()?;
        Ok(())
    }
}

fn append_record(file: &mut File, record: &[u8]) -> std::io::Result<()> {
    file.write_all(record)?;
    file.sync_data()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeRegistry;

    fn node(line: &str) -> Node {
        line.parse().unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nodes.bin"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nodes.bin"));

        let a1 = node("a 1.1.1.1 10.0.0.1 fd00::1");
        let b = node("b 2001:db8::2 10.0.0.2 fd00::2");
        let a2 = node("a 1.1.1.9 10.0.0.9 fd00::9");
        for n in [&a1, &b, &a2] {
            store.persist(n).unwrap();
        }

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, vec![a1, b.clone(), a2.clone()]);

        let registry = NodeRegistry::from_nodes(loaded);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").unwrap(), a2);
        assert_eq!(registry.get("b").unwrap(), b);
    }

    #[test]
    fn test_torn_tail_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.bin");
        let store = FileStore::new(&path);
        let a = node("a 1.1.1.1 10.0.0.1 fd00::1");
        store.persist(&a).unwrap();
        let intact_len = std::fs::metadata(&path).unwrap().len();

        // Half of a second record, as left by a crash mid-append.
        let b = binary::encode(&node("b 2.2.2.2 10.0.0.2 fd00::2")).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&b[..b.len() / 2]).unwrap();
        drop(file);

        assert_eq!(store.load_all().unwrap(), vec![a.clone()]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), intact_len);

        let c = node("c 3.3.3.3 10.0.0.3 fd00::3");
        store.persist(&c).unwrap();
        assert_eq!(store.load_all().unwrap(), vec![a, c]);
    }

    #[test]
    fn test_damage_before_the_tail_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.bin");
        let store = FileStore::new(&path);
        store.persist(&node("a 1.1.1.1 10.0.0.1 fd00::1")).unwrap();
        store.persist(&node("b 2.2.2.2 10.0.0.2 fd00::2")).unwrap();

        // Zero the second record's length byte.
        let mut bytes = std::fs::read(&path).unwrap();
        let second = 1 + 1 + 36;
        bytes[second] = 0;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(store.load_all(), Err(NodeError::NameTooShort)));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
