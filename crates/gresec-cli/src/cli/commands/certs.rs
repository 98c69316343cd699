//! `gresecd certs` - provision a PKI for the server and its clients.

use anyhow::{Context, Result};

use crate::cli::args::CertsArgs;

pub fn execute(args: &CertsArgs) -> Result<()> {
    let paths = gresec_ca::write_bundle(
        &args.dir,
        &args.ca_name,
        &args.server_names,
        &args.clients,
        args.days,
    )
    .with_context(|| format!("writing certificates to {}", args.dir.display()))?;

    println!("CA certificate:     {}", paths.ca_cert.display());
    println!("Server certificate: {}", paths.server_cert.display());
    println!("Server key:         {}", paths.server_key.display());
    for (cert, key) in &paths.clients {
        println!("Client:             {} / {}", cert.display(), key.display());
    }
    Ok(())
}
