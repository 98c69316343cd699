//! Wire encodings for [`Node`](crate::Node).
//!
//! - **Text**: one `<name> <external> <internal_v4> <internal_v6>` line per node.
//!   This is the external, untrusted form and is fully validated on decode.
//! - **Binary**: a fixed-layout record with a one byte name length prefix.
//!   This is the internal form and is only checked for length on decode.

pub mod binary;
pub mod text;
