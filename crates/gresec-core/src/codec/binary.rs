//! Fixed-layout binary encoding.
//!
//! ```text
//! byte[1]  name length N (1..=255)
//! byte[N]  name (UTF-8)
//! byte[16] external address, IPv4 stored v4-mapped
//! byte[4]  internal IPv4
//! byte[16] internal IPv6
//! ```
//!
//! Decoding only checks lengths (and that the name is UTF-8). It is meant for
//! bytes this module produced itself, such as a [`FileStore`](crate::FileStore)
//! log; untrusted input belongs on the text path. Encoding re-checks every
//! field, so a node that slipped in through a trusted decode still cannot be
//! written back out in an invalid shape.
//!
//! A stream of records ends at end of input on a record boundary. A zero
//! length byte is never an end marker; it is a [`NodeError::NameTooShort`].

use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::node::{check_name_len, ADDRS_LEN, IPV4_LEN, IPV6_LEN};
use crate::{Node, NodeError, Result, MAX_ENCODED_LEN};

/// Encode a node into a freshly allocated record.
pub fn encode(node: &Node) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(1 + node.name().len() + ADDRS_LEN);
    write_record(&mut buf, node)?;
    Ok(buf)
}

/// Decode exactly one record from `bytes`.
///
/// Trailing bytes after the record are rejected.
pub fn decode(bytes: &[u8]) -> Result<Node> {
    let mut cursor = bytes;
    let node = read_record(&mut cursor)?.ok_or(NodeError::Truncated { expected: 1 })?;
    if !cursor.is_empty() {
        return Err(NodeError::MalformedRecord(format!(
            "{} trailing bytes after record",
            cursor.len()
        )));
    }
    Ok(node)
}

/// Encode a node and write it to `writer`.
pub fn write_record<W: Write + ?Sized>(writer: &mut W, node: &Node) -> Result<()> {
    let name = node.name().as_bytes();
    check_name_len(name.len())?;
    let name_len =
        u8::try_from(name.len()).map_err(|_| NodeError::NameTooLong { len: name.len() })?;

    let external = match node.external() {
        IpAddr::V4(addr) => addr.to_ipv6_mapped(),
        IpAddr::V6(addr) => addr,
    };
    let internal_v6 = node.internal_v6();
    if internal_v6.to_ipv4_mapped().is_some() {
        return Err(NodeError::InternalV6Invalid(internal_v6.to_string()));
    }

    writer.write_all(&[name_len])?;
    writer.write_all(name)?;
    writer.write_all(&external.octets())?;
    writer.write_all(&node.internal_v4().octets())?;
    writer.write_all(&internal_v6.octets())?;
    Ok(())
}

/// Write a sequence of records back to back.
pub fn write_all<'a, W, I>(mut writer: W, nodes: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Node>,
{
    for node in nodes {
        write_record(&mut writer, node)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the next record from a stream.
///
/// Returns `Ok(None)` when the stream ends before a length byte. A stream
/// that ends part way through a record is [`NodeError::Truncated`].
pub fn read_record<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Node>> {
    let mut len = [0u8; 1];
    loop {
        match reader.read(&mut len) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let name_len = usize::from(len[0]);
    check_name_len(name_len)?;

    let mut buf = [0u8; MAX_ENCODED_LEN - 1];
    let body = &mut buf[..name_len + ADDRS_LEN];
    reader.read_exact(body).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            NodeError::Truncated {
                expected: 1 + name_len + ADDRS_LEN,
            }
        } else {
            NodeError::Io(e)
        }
    })?;

    decode_body(body, name_len).map(Some)
}

/// Read records until the stream ends.
pub fn read_all<R: Read>(mut reader: R) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    while let Some(node) = read_record(&mut reader)? {
        nodes.push(node);
    }
    Ok(nodes)
}

fn decode_body(body: &[u8], name_len: usize) -> Result<Node> {
    let (name, rest) = body.split_at(name_len);
    let (external, rest) = rest.split_at(IPV6_LEN);
    let (internal_v4, internal_v6) = rest.split_at(IPV4_LEN);

    let name = std::str::from_utf8(name)
        .map_err(|e| NodeError::MalformedRecord(format!("name is not UTF-8: {e}")))?;

    Ok(Node::from_parts(
        name.to_owned(),
        IpAddr::V6(Ipv6Addr::from(octets::<IPV6_LEN>(external)?)),
        Ipv4Addr::from(octets::<IPV4_LEN>(internal_v4)?),
        Ipv6Addr::from(octets::<IPV6_LEN>(internal_v6)?),
    ))
}

fn octets<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        NodeError::MalformedRecord(format!("expected {N} address bytes, got {}", bytes.len()))
    })
}
