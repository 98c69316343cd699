//! `gresecd serve` - run the registry server.

use std::path::Path;

use anyhow::{Context, Result};
use gresec_srv::ServerConfig;
use tracing::{info, warn};

use crate::cli::args::ServeArgs;

pub async fn execute(config_path: &Path, args: ServeArgs) -> Result<()> {
    let mut config = ServerConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    info!(
        config = %config_path.display(),
        listen = %config.listen,
        cert = %config.tls.cert.display(),
        client_ca = %config.tls.client_ca.display(),
        "starting gresecd"
    );

    gresec_srv::server::run(&config, shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
}
