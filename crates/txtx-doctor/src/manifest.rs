//! Manifest snapshot handed to the doctor
//!
//! Only the parts of a workspace manifest that influence static validation:
//! environments, the selected environment and CLI overrides. Loading the
//! manifest file itself happens elsewhere.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULTS_ENVIRONMENT: &str = "defaults";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    /// Environment name -> (variable -> value). Always contains `defaults`.
    #[serde(default)]
    pub environments: IndexMap<String, IndexMap<String, String>>,
    #[serde(default)]
    pub current_environment: Option<String>,
    #[serde(default)]
    pub cli_inputs: IndexMap<String, String>,
}

impl Default for ManifestSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestSnapshot {
    pub fn new() -> Self {
        let mut environments = IndexMap::new();
        environments.insert(DEFAULTS_ENVIRONMENT.to_string(), IndexMap::new());
        Self { environments, current_environment: None, cli_inputs: IndexMap::new() }
    }

    /// Deserialized snapshots may lack `defaults`
    pub fn normalized(mut self) -> Self {
        self.environments.entry(DEFAULTS_ENVIRONMENT.to_string()).or_default();
        self
    }

    pub fn with_defaults<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_environment(DEFAULTS_ENVIRONMENT, values)
    }

    /// Add values to `name`, creating the environment if needed
    pub fn with_environment<I, K, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environments
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_current_environment(mut self, name: impl Into<String>) -> Self {
        self.current_environment = Some(name.into());
        self
    }

    pub fn with_cli_input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cli_inputs.insert(name.into(), value.into());
        self
    }

    pub fn environment(&self, name: &str) -> Option<&IndexMap<String, String>> {
        self.environments.get(name)
    }

    pub fn defaults(&self) -> Option<&IndexMap<String, String>> {
        self.environment(DEFAULTS_ENVIRONMENT)
    }

    /// The selected environment's variables, if it is selected and defined
    pub fn selected(&self) -> Option<&IndexMap<String, String>> {
        self.current_environment.as_deref().and_then(|name| self.environment(name))
    }

    /// Defaults overlaid with the selected environment
    pub fn environment_inputs(&self) -> IndexMap<String, String> {
        let mut inputs = self.defaults().cloned().unwrap_or_default();
        if let Some(selected) = self.selected() {
            inputs.extend(selected.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        inputs
    }

    /// Defaults, then the selected environment, then CLI inputs
    pub fn effective_inputs(&self) -> IndexMap<String, String> {
        let mut inputs = self.environment_inputs();
        inputs.extend(self.cli_inputs.iter().map(|(k, v)| (k.clone(), v.clone())));
        inputs
    }

    pub fn declares_input(&self, name: &str) -> bool {
        self.cli_inputs.contains_key(name)
            || self.selected().is_some_and(|env| env.contains_key(name))
            || self.defaults().is_some_and(|env| env.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ManifestSnapshot {
        ManifestSnapshot::new()
            .with_defaults([("rpc_url", "http://localhost:8545"), ("gas", "1")])
            .with_environment("mainnet", [("gas", "30")])
            .with_current_environment("mainnet")
            .with_cli_input("gas", "99")
    }

    #[test]
    fn test_defaults_always_present() {
        assert!(ManifestSnapshot::new().defaults().is_some());
        let parsed: ManifestSnapshot = serde_json::from_str("{}").unwrap();
        assert!(parsed.normalized().defaults().is_some());
    }

    #[test]
    fn test_effective_inputs_precedence() {
        let manifest = manifest();
        let effective = manifest.effective_inputs();
        assert_eq!(effective.get("gas").map(String::as_str), Some("99"));
        assert_eq!(effective.get("rpc_url").map(String::as_str), Some("http://localhost:8545"));

        let environment = manifest.environment_inputs();
        assert_eq!(environment.get("gas").map(String::as_str), Some("30"));
    }

    #[test]
    fn test_declares_input() {
        let manifest = manifest();
        assert!(manifest.declares_input("rpc_url"));
        assert!(manifest.declares_input("gas"));
        assert!(!manifest.declares_input("api_key"));
    }

    #[test]
    fn test_unknown_selected_environment_falls_back_to_defaults() {
        let manifest = ManifestSnapshot::new()
            .with_defaults([("a", "1")])
            .with_current_environment("staging");
        assert!(manifest.selected().is_none());
        assert_eq!(manifest.environment_inputs().len(), 1);
    }
}
