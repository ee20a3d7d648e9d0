//! Command-line interface for the installer backend service.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use ib_config::{IbConfig, IbUserConfig};

use crate::prelude::*;

/// Command-line interface for the installer backend service.
#[derive(Parser, Debug)]
#[command(name = "ibd")]
#[command(about = "Installer backend - machine facts and install job control for the installer UI")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "IBD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (can also be set via IBD_LISTEN environment variable)
    #[arg(short, long, env = "IBD_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Install program (can also be set via IBD_INSTALL_PROGRAM environment variable)
    #[arg(short, long, env = "IBD_INSTALL_PROGRAM")]
    pub program: Option<String>,
}

impl Cli {
    /// Load the configuration file, if any, and apply command line overrides.
    pub fn load_config(&self) -> Result<IbConfig> {
        let mut config = match &self.config {
            Some(path) => IbUserConfig::from_file(path)?,
            None => IbUserConfig::default(),
        };
        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(program) = &self.program {
            config.install.program = Some(program.clone());
        }
        Ok(IbConfig::from_user_config(config)?)
    }
}
