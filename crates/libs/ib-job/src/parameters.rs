//! Installation parameters accumulated from frontend submissions.

use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};

/// Name/value pairs later exported to the install process environment.
///
/// Values are stored verbatim; callers validate names and values before
/// merging them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallParameters(BTreeMap<String, String>);

impl InstallParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every pair, overwriting existing names.
    pub fn merge<I, K, V>(&mut self, form: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.0
            .extend(form.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InstallParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = Self::new();
        parameters.merge(iter);
        parameters
    }
}

impl<'a> IntoIterator for &'a InstallParameters {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_last_write_wins() {
        let mut parameters = InstallParameters::new();
        parameters.merge([("DISK", "/dev/sda"), ("HOSTNAME", "debian")]);
        parameters.merge([("DISK", "/dev/nvme0n1"), ("SWAP", "8")]);
        parameters.merge(Vec::<(String, String)>::new());

        let expected: InstallParameters = [
            ("DISK", "/dev/nvme0n1"),
            ("HOSTNAME", "debian"),
            ("SWAP", "8"),
        ]
        .into_iter()
        .collect();
        assert_eq!(parameters, expected);
        assert_eq!(parameters.get("DISK"), Some("/dev/nvme0n1"));
        assert_eq!(parameters.len(), 3);
    }

    #[test]
    fn serializes_as_plain_object() {
        let parameters: InstallParameters = [("DISK", "/dev/sda")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&parameters).expect("Failed to serialize"),
            r#"{"DISK":"/dev/sda"}"#
        );
    }
}
