//! gresecd - authenticated node registry daemon and tooling.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gresec_cli::run().await
}
