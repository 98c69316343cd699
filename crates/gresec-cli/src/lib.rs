//! # gresec-cli
//!
//! The `gresecd` binary.
//!
//! - **serve**: run the mutually authenticated registry server
//! - **check**: validate a node file and print its canonical form
//! - **convert**: translate node files between text and binary encodings
//! - **certs**: provision a CA, server certificate and client certificates

pub mod cli;

pub use cli::run;
