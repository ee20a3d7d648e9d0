//! Configuration management for the installer backend.
//!
//! Provides the TOML configuration of the `ibd` service and the policy that
//! decides which submitted parameters may reach the install environment.
//!
//! # Usage
//!
//! ```rust
//! use ib_config::{IbConfig, IbUserConfig};
//!
//! let user_config = IbUserConfig::from_toml(
//!     r#"
//!     [install]
//!     program = "/usr/bin/install-system"
//!     "#,
//! )
//! .unwrap();
//!
//! let config = IbConfig::from_user_config(user_config).unwrap();
//! assert_eq!(config.install.program, "/usr/bin/install-system");
//! ```

pub mod error;
pub mod ib_config;
pub mod ib_parameters;
pub mod prelude;

pub use ib_config::{IbConfig, IbInstallConfig, IbServerConfig, IbUserConfig};
pub use ib_parameters::IbParameterPolicy;
