//! Core configuration types for the installer backend.

use crate::{ib_parameters::IbParameterPolicy, prelude::*};
use std::{net::SocketAddr, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Default address of the HTTP server.
pub const DEFAULT_LISTEN: ([u8; 4], u16) = ([127, 0, 0, 1], 8080);

/// Default upper bound for `/install` request bodies.
pub const DEFAULT_MAX_FORM_BYTES: usize = 1024 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbServerConfig {
    /// Address the API listens on.
    pub listen: SocketAddr,
    /// Maximum accepted size of a submitted form.
    pub max_form_bytes: usize,
}

impl Default for IbServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(DEFAULT_LISTEN),
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
        }
    }
}

/// Install command as written by the user. The program may be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbUserInstallConfig {
    /// Install executable.
    pub program: Option<String>,
    /// Fixed arguments passed to the install executable.
    pub args: Vec<String>,
}

/// Resolved install command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbInstallConfig {
    /// Install executable.
    pub program: String,
    /// Fixed arguments passed to the install executable.
    pub args: Vec<String>,
}

/// User-provided configuration from TOML files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbUserConfig {
    /// Server settings.
    pub server: IbServerConfig,
    /// Install command.
    pub install: IbUserInstallConfig,
    /// Parameter policy.
    pub parameters: IbParameterPolicy,
}

/// Validated configuration used by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbConfig {
    /// Server settings.
    pub server: IbServerConfig,
    /// Install command.
    pub install: IbInstallConfig,
    /// Parameter policy.
    pub parameters: IbParameterPolicy,
}

impl IbConfig {
    /// Convert user configuration to the service configuration.
    ///
    /// Fails if no install program was given.
    pub fn from_user_config(config: IbUserConfig) -> Result<Self> {
        let program = config
            .install
            .program
            .filter(|program| !program.trim().is_empty())
            .ok_or(Error::InstallProgramMissing)?;

        Ok(Self {
            server: config.server,
            install: IbInstallConfig {
                program,
                args: config.install.args,
            },
            parameters: config.parameters,
        })
    }
}

impl IbUserConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", file_path.display());
        let contents = std::fs::read_to_string(file_path)?;
        Self::from_toml(&contents)
    }
    /// Parse configuration from TOML string.
    pub fn from_toml(value: &str) -> Result<Self> {
        Ok(toml::from_str(value)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    pub fn deserialize() -> Result<()> {
        let content = r#"
            # Installer backend configuration

            [server]
            listen = "0.0.0.0:9000"
            max_form_bytes = 4096

            [install]
            program = "/usr/bin/install-system"
            args = ["--non-interactive", "--log-level", "debug"]

            [parameters]
            allowed = ["DISK", "HOSTNAME", "SWAP_SIZE"]
        "#;
        let config = IbConfig::from_user_config(IbUserConfig::from_toml(content)?)?;
        assert_eq!(config.server.listen, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.server.max_form_bytes, 4096);
        assert_eq!(config.install.program, "/usr/bin/install-system");
        assert_eq!(
            config.install.args,
            vec!["--non-interactive", "--log-level", "debug"]
        );
        assert_eq!(
            config.parameters.allowed,
            Some(vec![
                "DISK".to_string(),
                "HOSTNAME".to_string(),
                "SWAP_SIZE".to_string()
            ])
        );
        Ok(())
    }

    #[test]
    pub fn defaults() -> Result<()> {
        let config = IbUserConfig::from_toml("")?;
        assert_eq!(config, IbUserConfig::default());
        assert_eq!(config.server.listen.to_string(), "127.0.0.1:8080");
        assert_eq!(config.server.max_form_bytes, DEFAULT_MAX_FORM_BYTES);
        assert!(config.install.args.is_empty());
        assert_eq!(config.parameters.allowed, None);
        Ok(())
    }

    #[test]
    pub fn missing_program() {
        let config = IbUserConfig::from_toml("[install]\nargs = [\"--yes\"]\n")
            .expect("Failed to parse configuration");
        assert!(matches!(
            IbConfig::from_user_config(config),
            Err(Error::InstallProgramMissing)
        ));

        let config = IbUserConfig::from_toml("[install]\nprogram = \"  \"\n")
            .expect("Failed to parse configuration");
        assert!(matches!(
            IbConfig::from_user_config(config),
            Err(Error::InstallProgramMissing)
        ));
    }

    #[test]
    pub fn invalid_toml() {
        assert!(matches!(
            IbUserConfig::from_toml("[server]\nlisten = 12"),
            Err(Error::Deserialization(_))
        ));
    }

    #[test]
    pub fn from_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[install]\nprogram = \"/sbin/install\"")?;
        let config = IbUserConfig::from_file(file.path())?;
        assert_eq!(config.install.program.as_deref(), Some("/sbin/install"));

        assert!(matches!(
            IbUserConfig::from_file(Path::new("/nonexistent/ibd.toml")),
            Err(Error::IO(_))
        ));
        Ok(())
    }
}
