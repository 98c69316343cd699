use thiserror::Error;

/// Result type alias for node operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Errors produced while building, decoding or encoding a [`Node`](crate::Node)
#[derive(Error, Debug)]
pub enum NodeError {
    /// Name is empty (also what a zero length byte decodes to)
    #[error("name too short")]
    NameTooShort,

    /// Name is longer than 255 bytes
    #[error("name too long: {len} bytes, at most 255 allowed")]
    NameTooLong {
        /// Length of the rejected name in bytes
        len: usize,
    },

    /// External address is not an IPv4 or IPv6 address
    #[error("external IP address is invalid: {0}")]
    ExternalAddressInvalid(String),

    /// Internal v4 address does not parse or is not an IPv4 address
    #[error("internal IPv4 address is invalid: {0}")]
    InternalV4Invalid(String),

    /// Internal v6 address does not parse or is an IPv4 address
    #[error("internal IPv6 address is invalid: {0}")]
    InternalV6Invalid(String),

    /// Text line did not split into exactly four fields
    #[error("expected four space separated fields, found {fields}")]
    MalformedLine {
        /// Number of fields actually found
        fields: usize,
    },

    /// Binary record is structurally unusable
    #[error("malformed binary record: {0}")]
    MalformedRecord(String),

    /// Byte stream ended inside a record
    #[error("truncated record: expected {expected} bytes")]
    Truncated {
        /// Bytes the record header promised
        expected: usize,
    },

    /// A line of a multi-line input failed to decode
    #[error("line {line}: {source}")]
    Line {
        /// 1-based line number
        line: usize,
        /// Underlying decode failure
        #[source]
        source: Box<NodeError>,
    },

    /// Underlying reader or writer failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// Returns true for field-level validation failures, as opposed to
    /// malformed or unreadable input
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::NameTooShort
            | Self::NameTooLong { .. }
            | Self::ExternalAddressInvalid(_)
            | Self::InternalV4Invalid(_)
            | Self::InternalV6Invalid(_) => true,
            Self::Line { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_validation() {
        assert!(NodeError::NameTooShort.is_validation());
        assert!(NodeError::InternalV6Invalid("10.0.0.1".into()).is_validation());
        assert!(!NodeError::MalformedLine { fields: 3 }.is_validation());
        assert!(!NodeError::Truncated { expected: 40 }.is_validation());
    }

    #[test]
    fn test_line_error_keeps_source_kind() {
        let err = NodeError::Line {
            line: 7,
            source: Box::new(NodeError::NameTooLong { len: 300 }),
        };
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "line 7: name too long: 300 bytes, at most 255 allowed"
        );
    }
}
