//! Text line encoding.
//!
//! ```text
//! eq4 46.4.89.243 10.0.0.2 2001:470:9ce6:200::2
//! ```
//!
//! Fields are separated by exactly one space. Surrounding whitespace is
//! ignored; anything else that does not split into four fields is rejected.

use std::io::{BufRead, Write};

use crate::{Node, NodeError, Result};

const FIELD_SEP: char = ' ';
const FIELD_COUNT: usize = 4;

/// Decode one text line into a validated node.
pub fn decode_line(line: &str) -> Result<Node> {
    let fields: Vec<&str> = line.trim().split(FIELD_SEP).collect();
    let [name, external, internal_v4, internal_v6] = fields.as_slice() else {
        return Err(NodeError::MalformedLine {
            fields: fields.len(),
        });
    };
    Node::from_fields(name, external, internal_v4, internal_v6)
}

/// Encode a node as a text line, without a line terminator.
#[must_use]
pub fn encode_line(node: &Node) -> String {
    node.to_string()
}

/// Read every node from a line-oriented source.
///
/// Blank lines and lines starting with `#` are skipped. The first line that
/// fails to decode aborts the read and is reported with its 1-based number.
pub fn read_lines<R: BufRead>(reader: R) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let node = decode_line(trimmed).map_err(|e| NodeError::Line {
            line: idx + 1,
            source: Box::new(e),
        })?;
        nodes.push(node);
    }

    Ok(nodes)
}

/// Write nodes as newline-terminated text lines.
pub fn write_lines<'a, W, I>(mut writer: W, nodes: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Node>,
{
    for node in nodes {
        writeln!(writer, "{node}")?;
    }
    writer.flush()?;
    Ok(())
}
