//! Shared state handed to every request handler.

use std::sync::Arc;

use ib_config::{IbConfig, IbParameterPolicy};
use ib_hardware::{Probe, SystemProbe};
use ib_job::{InstallCommand, Installer};

/// Everything the handlers need: the install job, the parameter policy and
/// the probe used for system facts.
#[derive(Clone)]
pub struct Backend {
    pub installer: Installer,
    pub policy: Arc<IbParameterPolicy>,
    pub probe: Arc<dyn Probe + Send + Sync>,
}

impl Backend {
    pub fn new(config: &IbConfig) -> Self {
        Self::with_probe(config, Arc::new(SystemProbe))
    }

    pub fn with_probe(config: &IbConfig, probe: Arc<dyn Probe + Send + Sync>) -> Self {
        let command = InstallCommand::new(
            config.install.program.clone(),
            config.install.args.clone(),
        );
        Self {
            installer: Installer::new(command),
            policy: Arc::new(config.parameters.clone()),
            probe,
        }
    }
}
