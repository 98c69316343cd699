//! Command implementations.

pub mod certs;
pub mod check;
pub mod convert;
pub mod serve;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use gresec_core::codec::{binary, text};
use gresec_core::Node;
use tempfile::NamedTempFile;

use crate::cli::args::NodeFormat;

/// Read every node from `path` in the given encoding.
pub fn read_nodes(path: &Path, format: NodeFormat) -> Result<Vec<Node>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let nodes = match format {
        NodeFormat::Text => text::read_lines(reader),
        NodeFormat::Binary => binary::read_all(reader),
    }
    .with_context(|| format!("reading {}", path.display()))?;
    Ok(nodes)
}

/// Write `nodes` to `path` in the given encoding, replacing the file.
///
/// The output is staged next to `path` and renamed into place, so a failed
/// write leaves any existing file untouched.
pub fn write_nodes(path: &Path, format: NodeFormat, nodes: &[Node]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;

    let writer = BufWriter::new(staged.as_file());
    match format {
        NodeFormat::Text => text::write_lines(writer, nodes),
        NodeFormat::Binary => binary::write_all(writer, nodes),
    }
    .with_context(|| format!("writing {}", path.display()))?;

    staged
        .persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.txt");
        std::fs::write(&path, "stale contents that are longer than the new file\n").unwrap();

        let node: Node = "eq4 46.4.89.243 10.0.0.2 2001:470:9ce6:200::2".parse().unwrap();
        write_nodes(&path, NodeFormat::Text, &[node]).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "eq4 46.4.89.243 10.0.0.2 2001:470:9ce6:200::2\n"
        );
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "staging file left behind");
    }

    #[test]
    fn test_unwritable_destination_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("nodes.bin");

        assert!(write_nodes(&path, NodeFormat::Binary, &[]).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
