//! Policy for installation parameters exported to the install environment.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::prelude::*;

/// Variables that alter how the shell or the dynamic loader runs the install
/// process. Any `LD_*` name is reserved as well.
const RESERVED_NAMES: &[&str] = &[
    "PATH",
    "IFS",
    "ENV",
    "BASH_ENV",
    "SHELLOPTS",
    "BASHOPTS",
    "PS4",
];

/// Which submitted parameters may become environment variables.
///
/// Names must be valid shell variable names (`[A-Za-z_][A-Za-z0-9_]*`) and
/// values must not contain NUL bytes. Names such as `PATH` or `LD_PRELOAD` are
/// always rejected. When `allowed` is set, only the listed names are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbParameterPolicy {
    /// Optional allow-list of parameter names.
    pub allowed: Option<Vec<String>>,
}

impl IbParameterPolicy {
    /// Check a single name/value pair.
    pub fn check(&self, name: &str, value: &str) -> Result<()> {
        if !is_valid_name(name) {
            warn!("Rejecting parameter with invalid name {name:?}");
            return Err(Error::InvalidParameterName(name.to_string()));
        }
        if is_reserved_name(name) {
            warn!("Rejecting reserved parameter {name}");
            return Err(Error::ParameterReserved(name.to_string()));
        }
        if let Some(allowed) = &self.allowed {
            if !allowed.iter().any(|allowed| allowed == name) {
                warn!("Rejecting parameter {name} outside of the allow-list");
                return Err(Error::ParameterNotAllowed(name.to_string()));
            }
        }
        if value.contains('\0') {
            warn!("Rejecting parameter {name} with a NUL byte in its value");
            return Err(Error::InvalidParameterValue(name.to_string()));
        }
        Ok(())
    }

    /// Check every pair, stopping at the first rejected one.
    pub fn check_all<'a, I>(&self, form: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        form.into_iter()
            .try_for_each(|(name, value)| self.check(name, value))
    }
}

fn is_reserved_name(name: &str) -> bool {
    name.starts_with("LD_") || RESERVED_NAMES.contains(&name)
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_environment_names() {
        let policy = IbParameterPolicy::default();
        for name in ["DISK", "_private", "swap_size_2", "a"] {
            assert!(policy.check(name, "value").is_ok(), "{name} was rejected");
        }
    }

    #[test]
    fn rejects_invalid_names() {
        let policy = IbParameterPolicy::default();
        for name in ["", "2DISK", "DISK-NAME", "PATH=x", "DISK NAME", "DİSK"] {
            assert!(
                matches!(
                    policy.check(name, "value"),
                    Err(Error::InvalidParameterName(_))
                ),
                "{name:?} was accepted"
            );
        }
    }

    #[test]
    fn rejects_reserved_names() {
        let open = IbParameterPolicy::default();
        let listed = IbParameterPolicy {
            allowed: Some(vec!["PATH".to_string(), "LD_PRELOAD".to_string()]),
        };
        for policy in [&open, &listed] {
            for name in ["PATH", "LD_PRELOAD", "LD_LIBRARY_PATH", "IFS", "BASH_ENV"] {
                assert!(
                    matches!(
                        policy.check(name, "/tmp"),
                        Err(Error::ParameterReserved(_))
                    ),
                    "{name} was accepted"
                );
            }
        }
        assert!(open.check("LDAP_SERVER", "ldap://example").is_ok());
        assert!(open.check("PATHS", "/a:/b").is_ok());
    }

    #[test]
    fn values_are_verbatim_except_nul() {
        let policy = IbParameterPolicy::default();
        assert!(policy.check("PASSWORD", "p@ss word;$(rm -rf /)\n").is_ok());
        assert!(matches!(
            policy.check("PASSWORD", "a\0b"),
            Err(Error::InvalidParameterValue(_))
        ));
    }

    #[test]
    fn allow_list() {
        let policy = IbParameterPolicy {
            allowed: Some(vec!["DISK".to_string(), "HOSTNAME".to_string()]),
        };
        assert!(
            policy
                .check_all([("DISK", "/dev/sda"), ("HOSTNAME", "box")])
                .is_ok()
        );
        assert!(matches!(
            policy.check_all([("DISK", "/dev/sda"), ("LD_PRELOAD", "/tmp/x.so")]),
            Err(Error::ParameterNotAllowed(name)) if name == "LD_PRELOAD"
        ));
    }
}
