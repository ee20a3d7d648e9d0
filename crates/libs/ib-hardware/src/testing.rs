//! Test utilities for detectors.

use std::{
    collections::{HashMap, HashSet},
    io,
    path::{Path, PathBuf},
};

use crate::{prelude::*, probe::Probe};

/// In-memory machine: files, paths and canned command outputs.
#[derive(Debug, Default)]
pub struct FakeProbe {
    pub hostname: Option<String>,
    pub paths: HashSet<PathBuf>,
    pub files: HashMap<PathBuf, String>,
    pub commands: HashMap<String, String>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.to_string());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.paths.insert(PathBuf::from(path));
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(PathBuf::from(path), content.to_string());
        self
    }

    /// Canned stdout for `program` followed by `args` joined with spaces.
    pub fn with_command(mut self, command_line: &str, stdout: &str) -> Self {
        self.commands
            .insert(command_line.to_string(), stdout.to_string());
        self
    }
}

fn not_found(what: &str) -> Error {
    Error::IO(io::Error::new(io::ErrorKind::NotFound, what.to_string()))
}

impl Probe for FakeProbe {
    fn hostname(&self) -> Result<String> {
        self.hostname.clone().ok_or_else(|| not_found("hostname"))
    }

    fn exists(&self, path: &Path) -> bool {
        self.paths.contains(path) || self.files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(&path.display().to_string()))
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.commands
            .get(&command_line)
            .map(|stdout| stdout.as_bytes().to_vec())
            .ok_or_else(|| not_found(&command_line))
    }
}
