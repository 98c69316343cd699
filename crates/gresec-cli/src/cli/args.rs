//! Command-line argument definitions using clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Authenticated node registry
///
/// Maps node names to their external and internal addresses, served over
/// mutually authenticated TLS.
#[derive(Parser, Debug)]
#[command(name = "gresecd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Server configuration file (TOML)
    #[arg(short, long, env = "GRESEC_CONFIG", global = true, default_value = "gresec.toml")]
    pub config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the registry server
    Serve(ServeArgs),

    /// Validate a node file and print it as text
    Check(CheckArgs),

    /// Convert a node file between encodings
    Convert(ConvertArgs),

    /// Generate a CA, a server certificate and client certificates
    Certs(CertsArgs),
}

/// On-disk node encodings.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFormat {
    /// One `name external v4 v6` line per node
    Text,
    /// Length-prefixed binary records
    Binary,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address, overriding the config file
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Node file to validate
    pub file: PathBuf,

    /// Encoding of the file
    #[arg(short, long, value_enum, default_value_t = NodeFormat::Text)]
    pub format: NodeFormat,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input node file
    pub input: PathBuf,

    /// Output node file
    pub output: PathBuf,

    /// Encoding of the input
    #[arg(long, value_enum, default_value_t = NodeFormat::Text)]
    pub from: NodeFormat,

    /// Encoding of the output
    #[arg(long, value_enum, default_value_t = NodeFormat::Binary)]
    pub to: NodeFormat,
}

#[derive(Args, Debug)]
pub struct CertsArgs {
    /// Directory to write the PEM files into
    pub dir: PathBuf,

    /// Common name of the generated CA
    #[arg(long, default_value = "gresec Root CA")]
    pub ca_name: String,

    /// DNS name or IP the server certificate is valid for (repeatable)
    #[arg(long = "server-name", default_value = "localhost")]
    pub server_names: Vec<String>,

    /// Client certificate to issue (repeatable)
    #[arg(long = "client")]
    pub clients: Vec<String>,

    /// Leaf certificate validity in days
    #[arg(long, default_value = "365")]
    pub days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_defaults() {
        let cli = Cli::parse_from(["gresecd", "convert", "in.txt", "out.bin"]);
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.from, NodeFormat::Text);
                assert_eq!(args.to, NodeFormat::Binary);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_certs_repeatable_names() {
        let cli = Cli::parse_from([
            "gresecd",
            "certs",
            "pki",
            "--server-name",
            "registry.internal",
            "--server-name",
            "10.0.0.1",
            "--client",
            "eq4",
            "--client",
            "eq5",
        ]);
        match cli.command {
            Commands::Certs(args) => {
                assert_eq!(args.server_names, ["registry.internal", "10.0.0.1"]);
                assert_eq!(args.clients, ["eq4", "eq5"]);
                assert_eq!(args.days, 365);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["gresecd", "serve", "-v", "--config", "x.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }
}
