//! Access to the machine state observed by the detectors.

use std::{path::Path, process::Command};

use tracing::debug;

use crate::prelude::*;

/// Narrow view of the machine used by every detector.
pub trait Probe {
    /// Host name of the machine.
    fn hostname(&self) -> Result<String>;

    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Whole content of a text file.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Stdout of a command that must exit successfully.
    fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>>;
}

/// [`Probe`] backed by the real file system and commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

const HOSTNAME_FILES: [&str; 2] = ["/proc/sys/kernel/hostname", "/etc/hostname"];

impl Probe for SystemProbe {
    fn hostname(&self) -> Result<String> {
        let mut last_error = None;
        for file in HOSTNAME_FILES {
            match self.read_to_string(Path::new(file)) {
                Ok(name) if !name.trim().is_empty() => return Ok(name.trim().to_string()),
                Ok(_) => continue,
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            Error::IO(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "hostname is not set",
            ))
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        debug!("Running {program} {}", args.join(" "));
        let output = Command::new(program).args(args).output()?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: program.to_string(),
                status: output.status,
            });
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_commands() {
        let probe = SystemProbe;
        assert_eq!(
            probe.run("sh", &["-c", "printf hello"]).expect("Failed to run sh"),
            b"hello"
        );
        assert!(matches!(
            probe.run("sh", &["-c", "exit 2"]),
            Err(Error::CommandFailed { .. })
        ));
        assert!(matches!(
            probe.run("/nonexistent/lspci", &[]),
            Err(Error::IO(_))
        ));
    }

    #[test]
    fn checks_files() {
        let probe = SystemProbe;
        assert!(probe.exists(Path::new("/")));
        assert!(!probe.exists(Path::new("/nonexistent/efi")));
        assert!(probe.read_to_string(Path::new("/nonexistent/meminfo")).is_err());
    }
}
