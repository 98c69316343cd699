//! The node record: a name plus the three addresses a node is reachable on.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::codec::text;
use crate::{NodeError, Result};

/// Longest name a node may carry, in bytes.
pub const MAX_NAME_LEN: usize = 255;

pub(crate) const IPV6_LEN: usize = 16;
pub(crate) const IPV4_LEN: usize = 4;

/// External (16) + internal v4 (4) + internal v6 (16).
pub(crate) const ADDRS_LEN: usize = 2 * IPV6_LEN + IPV4_LEN;

/// Largest binary encoding of a node: length byte, name, addresses.
pub const MAX_ENCODED_LEN: usize = 1 + MAX_NAME_LEN + ADDRS_LEN;

/// A validated registry entry.
///
/// Fields are private so every value built outside this crate went through
/// [`Node::new`], [`Node::from_fields`] or text decoding. The binary decoder
/// is the one trusted path that skips field checks; see
/// [`codec::binary`](crate::codec::binary).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    name: String,
    external: IpAddr,
    internal_v4: Ipv4Addr,
    internal_v6: Ipv6Addr,
}

impl Node {
    /// Build a node from already-typed addresses.
    ///
    /// The name must be 1..=255 bytes and `internal_v6` must not be a
    /// v4-mapped address. A v4-mapped `external` is stored as plain IPv4.
    pub fn new(
        name: impl Into<String>,
        external: IpAddr,
        internal_v4: Ipv4Addr,
        internal_v6: Ipv6Addr,
    ) -> Result<Self> {
        let name = name.into();
        check_name(&name)?;
        if internal_v6.to_ipv4_mapped().is_some() {
            return Err(NodeError::InternalV6Invalid(internal_v6.to_string()));
        }
        Ok(Self::from_parts(name, external, internal_v4, internal_v6))
    }

    /// Build a node from its four textual fields.
    ///
    /// Checks run in a fixed order: name length, external, internal v4,
    /// internal v6. The first failure is returned.
    pub fn from_fields(
        name: &str,
        external: &str,
        internal_v4: &str,
        internal_v6: &str,
    ) -> Result<Self> {
        check_name(name)?;

        let ext: IpAddr = external
            .parse()
            .map_err(|_| NodeError::ExternalAddressInvalid(external.to_owned()))?;

        let v4 = match internal_v4.parse::<IpAddr>().map(|ip| ip.to_canonical()) {
            Ok(IpAddr::V4(addr)) => addr,
            _ => return Err(NodeError::InternalV4Invalid(internal_v4.to_owned())),
        };

        let v6 = match internal_v6.parse::<IpAddr>().map(|ip| ip.to_canonical()) {
            Ok(IpAddr::V6(addr)) => addr,
            _ => return Err(NodeError::InternalV6Invalid(internal_v6.to_owned())),
        };

        Ok(Self::from_parts(name.to_owned(), ext, v4, v6))
    }

    /// Assemble without validation. Only for the binary decoder and the
    /// checked constructors above.
    pub(crate) fn from_parts(
        name: String,
        external: IpAddr,
        internal_v4: Ipv4Addr,
        internal_v6: Ipv6Addr,
    ) -> Self {
        Self {
            name,
            external: external.to_canonical(),
            internal_v4,
            internal_v6,
        }
    }

    /// Node name, the registry key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Externally reachable address, either family.
    #[must_use]
    pub const fn external(&self) -> IpAddr {
        self.external
    }

    /// Internal IPv4 address.
    #[must_use]
    pub const fn internal_v4(&self) -> Ipv4Addr {
        self.internal_v4
    }

    /// Internal IPv6 address.
    #[must_use]
    pub const fn internal_v6(&self) -> Ipv6Addr {
        self.internal_v6
    }
}

pub(crate) fn check_name_len(len: usize) -> Result<()> {
    if len < 1 {
        return Err(NodeError::NameTooShort);
    }
    if len > MAX_NAME_LEN {
        return Err(NodeError::NameTooLong { len });
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    check_name_len(name.len())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name, self.external, self.internal_v4, self.internal_v6
        )
    }
}

impl FromStr for Node {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self> {
        text::decode_line(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v6() -> Ipv6Addr {
        "2001:470:9ce6:200::2".parse().unwrap()
    }

    #[test]
    fn test_max_encoded_len() {
        assert_eq!(MAX_ENCODED_LEN, 292);
    }

    #[test]
    fn test_new_valid() {
        let node = Node::new(
            "eq4",
            "46.4.89.243".parse().unwrap(),
            Ipv4Addr::new(10, 0, 0, 2),
            v6(),
        )
        .unwrap();
        assert_eq!(node.name(), "eq4");
        assert_eq!(node.internal_v4(), Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(node.internal_v6(), v6());
    }

    #[test]
    fn test_new_name_bounds() {
        let ext: IpAddr = "1.2.3.4".parse().unwrap();
        let v4 = Ipv4Addr::new(10, 0, 0, 1);

        assert!(matches!(
            Node::new("", ext, v4, v6()),
            Err(NodeError::NameTooShort)
        ));
        assert!(Node::new("a".repeat(255), ext, v4, v6()).is_ok());
        assert!(matches!(
            Node::new("a".repeat(256), ext, v4, v6()),
            Err(NodeError::NameTooLong { len: 256 })
        ));
    }

    #[test]
    fn test_new_rejects_mapped_v6() {
        let mapped = Ipv4Addr::new(10, 0, 0, 9).to_ipv6_mapped();
        let result = Node::new(
            "n1",
            "1.2.3.4".parse().unwrap(),
            Ipv4Addr::new(10, 0, 0, 1),
            mapped,
        );
        assert!(matches!(result, Err(NodeError::InternalV6Invalid(_))));
    }

    #[test]
    fn test_external_mapped_is_canonicalised() {
        let node = Node::from_fields("n1", "::ffff:46.4.89.243", "10.0.0.2", "fd00::2").unwrap();
        assert_eq!(node.external(), "46.4.89.243".parse::<IpAddr>().unwrap());
        assert_eq!(node.to_string(), "n1 46.4.89.243 10.0.0.2 fd00::2");
    }

    #[test]
    fn test_from_fields_accepts_mapped_internal_v4() {
        let node = Node::from_fields("n1", "fd00::1", "::ffff:10.0.0.2", "fd00::2").unwrap();
        assert_eq!(node.internal_v4(), Ipv4Addr::new(10, 0, 0, 2));
    }

    #[test]
    fn test_from_fields_check_order() {
        // Every field is bad; the name is reported first.
        let err = Node::from_fields("", "x", "y", "z").unwrap_err();
        assert!(matches!(err, NodeError::NameTooShort));

        let err = Node::from_fields("n", "x", "y", "z").unwrap_err();
        assert!(matches!(err, NodeError::ExternalAddressInvalid(ref s) if s == "x"));

        let err = Node::from_fields("n", "1.1.1.1", "y", "z").unwrap_err();
        assert!(matches!(err, NodeError::InternalV4Invalid(ref s) if s == "y"));

        let err = Node::from_fields("n", "1.1.1.1", "10.0.0.1", "z").unwrap_err();
        assert!(matches!(err, NodeError::InternalV6Invalid(ref s) if s == "z"));
    }

    #[test]
    fn test_from_fields_family_rejection() {
        let err = Node::from_fields("n", "1.1.1.1", "fd00::1", "fd00::2").unwrap_err();
        assert!(matches!(err, NodeError::InternalV4Invalid(_)));

        let err = Node::from_fields("n", "1.1.1.1", "10.0.0.1", "10.0.0.2").unwrap_err();
        assert!(matches!(err, NodeError::InternalV6Invalid(_)));

        let err = Node::from_fields("n", "1.1.1.1", "10.0.0.1", "::ffff:10.0.0.2").unwrap_err();
        assert!(matches!(err, NodeError::InternalV6Invalid(_)));
    }
}
