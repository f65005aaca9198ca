use indexmap::IndexMap;
use txtx_doctor::{
    validate_source, AddonRegistry, DoctorConfig, ManifestSnapshot, ValidationResult,
};

use crate::addon_registry::test_addons;

/// File name attached to diagnostics of built runbooks
pub const TEST_RUNBOOK_FILE: &str = "main.tx";

/// Builder for creating and validating test runbooks
///
/// Blocks are appended in call order, so declaration order in the generated
/// source matches the order of the builder calls. `action` and `flow` open a
/// block that collects `input` attributes until the next block starts.
///
/// # Example
///
/// ```rust
/// use txtx_test_utils::RunbookBuilder;
///
/// let result = RunbookBuilder::new()
///     .addon("evm", vec![("chain_id", "1")])
///     .signer("deployer", "evm::web_wallet", vec![])
///     .action("deploy", "evm::deploy_contract")
///         .input("signer", "signer.deployer")
///         .input("contract", "MyContract")
///     .output("address", "action.deploy.contract_address")
///     .validate();
///
/// assert!(result.success);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunbookBuilder {
    /// Raw runbook content, used verbatim when set
    content: String,
    /// Environment variables by environment name
    environments: IndexMap<String, Vec<(String, String)>>,
    cli_inputs: Vec<(String, String)>,
    /// Current building state for fluent API
    building_content: Vec<String>,
    /// Whether an action or flow block is still open
    open_block: bool,
    current_environment: Option<String>,
}

impl RunbookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the runbook content, bypassing the fluent API
    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    /// Add variables to an environment
    pub fn with_environment(mut self, env_name: &str, vars: Vec<(&str, &str)>) -> Self {
        self.environments
            .entry(env_name.to_string())
            .or_default()
            .extend(vars.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    pub fn with_cli_input(mut self, key: &str, value: &str) -> Self {
        self.cli_inputs.push((key.to_string(), value.to_string()));
        self
    }

    /// Select the environment validated against
    pub fn set_current_environment(mut self, env: &str) -> Self {
        self.current_environment = Some(env.to_string());
        self
    }

    pub fn addon(mut self, name: &str, config: Vec<(&str, &str)>) -> Self {
        self.close_block();
        let config_str = config
            .into_iter()
            .map(|(k, v)| format!("{} = {}", k, hcl_value(v)))
            .collect::<Vec<_>>()
            .join("\n    ");
        self.building_content.push(format!("addon \"{name}\" {{\n    {config_str}\n}}"));
        self
    }

    pub fn signer(mut self, name: &str, signer_type: &str, config: Vec<(&str, &str)>) -> Self {
        self.close_block();
        let config_lines = config
            .into_iter()
            .map(|(k, v)| format!("    {} = {}\n", k, hcl_value(v)))
            .collect::<String>();
        self.building_content
            .push(format!("signer \"{name}\" \"{signer_type}\" {{\n{config_lines}}}"));
        self
    }

    pub fn variable(mut self, name: &str, value: &str) -> Self {
        self.close_block();
        self.building_content
            .push(format!("variable \"{name}\" {{\n    value = {}\n}}", hcl_value(value)));
        self
    }

    /// Declare a runbook input with a default value
    pub fn declare_input(mut self, name: &str, value: &str) -> Self {
        self.close_block();
        self.building_content
            .push(format!("input \"{name}\" {{\n    value = {}\n}}", hcl_value(value)));
        self
    }

    /// Open an action block; follow with `input` calls
    pub fn action(mut self, name: &str, action_type: &str) -> Self {
        self.close_block();
        self.building_content.push(format!("action \"{name}\" \"{action_type}\" {{"));
        self.open_block = true;
        self
    }

    /// Open a flow block; follow with `input` calls
    pub fn flow(mut self, name: &str) -> Self {
        self.close_block();
        self.building_content.push(format!("flow \"{name}\" {{"));
        self.open_block = true;
        self
    }

    /// Add an attribute to the open action or flow
    pub fn input(mut self, name: &str, value: &str) -> Self {
        if self.open_block {
            self.building_content.push(format!("    {} = {}", name, hcl_value(value)));
        }
        self
    }

    /// Add a raw nested block, such as `post_condition { ... }`, to the open action
    pub fn nested_block(mut self, ident: &str, attributes: Vec<(&str, &str)>) -> Self {
        if self.open_block {
            let lines = attributes
                .into_iter()
                .map(|(k, v)| format!("        {} = {}\n", k, hcl_value(v)))
                .collect::<String>();
            self.building_content.push(format!("    {ident} {{\n{lines}    }}"));
        }
        self
    }

    /// Add an output; the value is written verbatim
    pub fn output(mut self, name: &str, value: &str) -> Self {
        self.close_block();
        self.building_content.push(format!("output \"{name}\" {{\n    value = {value}\n}}"));
        self
    }

    fn close_block(&mut self) {
        if self.open_block {
            self.building_content.push("}".to_string());
            self.open_block = false;
        }
    }

    /// Build the final content
    pub fn build_content(&mut self) -> String {
        self.close_block();
        if !self.content.is_empty() {
            self.content.clone()
        } else {
            self.building_content.join("\n")
        }
    }

    /// Manifest built from the environments, CLI inputs and selected environment
    pub fn manifest(&self) -> ManifestSnapshot {
        let mut manifest = ManifestSnapshot::new();
        for (name, vars) in &self.environments {
            manifest = manifest.with_environment(name.as_str(), vars.iter().cloned());
        }
        for (key, value) in &self.cli_inputs {
            manifest = manifest.with_cli_input(key.as_str(), value.as_str());
        }
        if let Some(env) = &self.current_environment {
            manifest = manifest.with_current_environment(env.as_str());
        }
        manifest
    }

    fn has_manifest_state(&self) -> bool {
        !self.environments.is_empty()
            || !self.cli_inputs.is_empty()
            || self.current_environment.is_some()
    }

    /// Validate against the test addons. A manifest is only passed when an
    /// environment, CLI input or selected environment was configured.
    pub fn validate(&mut self) -> ValidationResult {
        let config = DoctorConfig::new().with_file_path(TEST_RUNBOOK_FILE);
        self.validate_with(&config)
    }

    /// Validate with a manifest even if no environment was configured
    pub fn validate_with_manifest(&mut self) -> ValidationResult {
        let content = self.build_content();
        let config = DoctorConfig::new().with_file_path(TEST_RUNBOOK_FILE);
        let manifest = self.manifest();
        validate_source(&content, TEST_RUNBOOK_FILE, &test_addons(), Some(&manifest), &config)
    }

    pub fn validate_with(&mut self, config: &DoctorConfig) -> ValidationResult {
        self.validate_with_addons(&test_addons(), config)
    }

    pub fn validate_with_addons(
        &mut self,
        addons: &dyn AddonRegistry,
        config: &DoctorConfig,
    ) -> ValidationResult {
        let content = self.build_content();
        let manifest = self.has_manifest_state().then(|| self.manifest());
        validate_source(&content, &config.file_path, addons, manifest.as_ref(), config)
    }
}

/// Render a test value as an HCL expression. References, quoted strings,
/// arrays and numbers pass through; anything else is quoted.
pub fn hcl_value(value: &str) -> String {
    let is_raw = ["env.", "input.", "action.", "variable.", "signer.", "flow.", "output."]
        .iter()
        .any(|prefix| value.starts_with(prefix))
        || value.starts_with('"')
        || value.starts_with('[')
        || value.starts_with('{')
        || value == "true"
        || value == "false"
        || value.parse::<f64>().is_ok();
    if is_raw {
        value.to_string()
    } else {
        format!("\"{value}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("env.rpc_url", "env.rpc_url")]
    #[test_case("42", "42")]
    #[test_case("hello", "\"hello\"")]
    #[test_case("[1, 2]", "[1, 2]")]
    fn test_hcl_value(input: &str, expected: &str) {
        assert_eq!(hcl_value(input), expected);
    }

    #[test]
    fn test_build_closes_open_action() {
        let content = RunbookBuilder::new()
            .action("send", "evm::send_eth")
            .input("amount", "1")
            .build_content();
        assert_eq!(content, "action \"send\" \"evm::send_eth\" {\n    amount = 1\n}");
    }

    #[test]
    fn test_raw_content_wins() {
        let content =
            RunbookBuilder::new().variable("x", "1").with_content("variable \"y\" {}").build_content();
        assert_eq!(content, "variable \"y\" {}");
    }

    #[test]
    fn test_manifest_from_builder_state() {
        let builder = RunbookBuilder::new()
            .with_environment("testnet", vec![("rpc_url", "http://localhost:8545")])
            .with_cli_input("rpc_url", "http://override")
            .set_current_environment("testnet");
        let manifest = builder.manifest();

        assert_eq!(manifest.current_environment.as_deref(), Some("testnet"));
        assert!(manifest.defaults().is_some());
        assert_eq!(
            manifest.effective_inputs().get("rpc_url").map(String::as_str),
            Some("http://override")
        );
    }

    #[test]
    fn test_validate_builds_valid_runbook() {
        let result = RunbookBuilder::new()
            .addon("evm", vec![("chain_id", "1")])
            .action("send", "evm::send_eth")
            .input("amount", "1")
            .output("hash", "action.send.tx_hash")
            .validate();
        assert!(result.success, "{:?}", result.errors);
    }
}
