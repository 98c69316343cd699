//! Core types for the gresec node registry.
//!
//! This crate provides the pieces every other gresec crate builds on:
//!
//! - **Node**: the validated `(name, external, internal v4, internal v6)` record
//! - **Codec**: text line and fixed-layout binary encodings of a [`Node`]
//! - **Registry**: the concurrent in-memory name -> [`Node`] map
//! - **Store**: the persistence seam a registry can be loaded from
//! - **Errors**: typed validation and malformed-input errors via [`NodeError`]
//!
//! # Example
//!
//! ```rust
//! use gresec_core::{Node, NodeRegistry};
//!
//! let node: Node = "eq4 46.4.89.243 10.0.0.2 2001:470:9ce6:200::2".parse()?;
//! let registry = NodeRegistry::new();
//! registry.set(node);
//!
//! let found = registry.get("eq4").expect("stored above");
//! assert_eq!(found.to_string(), "eq4 46.4.89.243 10.0.0.2 2001:470:9ce6:200::2");
//! # Ok::<(), gresec_core::NodeError>(())
//! ```

pub mod codec;
mod error;
mod node;
mod registry;
pub mod store;

pub use error::{NodeError, Result};
pub use node::{Node, MAX_ENCODED_LEN, MAX_NAME_LEN};
pub use registry::NodeRegistry;
pub use store::{FileStore, NodeStore};
