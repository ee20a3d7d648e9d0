//! Installer Backend Service (ibd)
//!
//! HTTP backend for the graphical installer. It reports machine facts to the
//! frontend and runs a single install job at a time:
//!
//! - **Facts**: hostname, firmware, GPU, Wi-Fi, storage, TPM and memory
//! - **Block devices**: raw `lsblk` inventory for the disk picker
//! - **Install job**: submitted form fields become the environment of the
//!   configured install program, whose output is polled by the frontend

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{api::setup_api, backend::Backend, cli::Cli};

use crate::prelude::*;
mod api;
mod backend;
mod cli;
mod error;
mod models;
mod prelude;

/// Main entry point for the installer backend.
///
/// The service runs until a shutdown signal is received or the API server
/// fails. A running install process is killed on shutdown.
///
/// ```bash
/// ibd --listen 127.0.0.1:8080 --program /usr/sbin/install-system
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,ib_job=debug,ib_io=info,tower_http=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    tracing::info!(
        "Install command: {} {}",
        config.install.program,
        config.install.args.join(" ")
    );

    let backend = Backend::new(&config);
    let api_handle = setup_api(backend.clone(), &config.server).await?;

    tokio::select! {
        result = api_handle => {
            tracing::error!("API server stopped: {:?}", result);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    if let Err(err) = backend.installer.cancel().await {
        tracing::warn!("Failed to stop install process - {err}");
    }

    Ok(())
}
