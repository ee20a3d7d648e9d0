//! Configuration error types.

/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// TOML deserialization failed.
    #[error(transparent)]
    Deserialization(#[from] toml::de::Error),

    /// No install program in the file or on the command line.
    #[error(
        "Install program is missing. Set install.program in the configuration file, the IBD_INSTALL_PROGRAM environment variable or use --program cli argument"
    )]
    InstallProgramMissing,

    /// Parameter name cannot be used as an environment variable name.
    #[error("Invalid parameter name `{0}`")]
    InvalidParameterName(String),

    /// Parameter name is not in the configured allow-list.
    #[error("Parameter `{0}` is not allowed")]
    ParameterNotAllowed(String),

    /// Parameter name would change how the install process itself runs.
    #[error("Parameter `{0}` is reserved")]
    ParameterReserved(String),

    /// Parameter value cannot be passed through the environment.
    #[error("Invalid value for parameter `{0}`")]
    InvalidParameterValue(String),
}
