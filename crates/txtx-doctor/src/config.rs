use std::fmt;

use crate::validation::rules::{default_rules, is_production, strict_rules, ManifestValidationRule};

/// Knobs for one doctor run
pub struct DoctorConfig {
    /// Label used for locations the AST provider left without a file
    pub file_path: String,
    /// Attach documentation links to diagnostics
    pub documentation_links: bool,
    /// Run the manifest lint rules
    pub lint: bool,
    /// Add production-only lint rules regardless of the selected environment
    pub strict_mode: bool,
    /// Extra rules run alongside the built-in ones when linting
    pub custom_rules: Vec<Box<dyn ManifestValidationRule>>,
}

impl Default for DoctorConfig {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            documentation_links: true,
            lint: false,
            strict_mode: false,
            custom_rules: Vec::new(),
        }
    }
}

impl fmt::Debug for DoctorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoctorConfig")
            .field("file_path", &self.file_path)
            .field("documentation_links", &self.documentation_links)
            .field("lint", &self.lint)
            .field("strict_mode", &self.strict_mode)
            .field("custom_rules", &self.custom_rules.iter().map(|r| r.id()).collect::<Vec<_>>())
            .finish()
    }
}

impl DoctorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    pub fn with_lint_rules(mut self) -> Self {
        self.lint = true;
        self
    }

    /// Lint with the strict rule set
    pub fn strict(mut self) -> Self {
        self.lint = true;
        self.strict_mode = true;
        self
    }

    pub fn with_rule(mut self, rule: Box<dyn ManifestValidationRule>) -> Self {
        self.custom_rules.push(rule);
        self
    }

    pub fn without_documentation_links(mut self) -> Self {
        self.documentation_links = false;
        self
    }

    /// Strict mode is implied by a production environment
    pub fn is_strict_for(&self, environment: Option<&str>) -> bool {
        self.strict_mode || is_production(environment)
    }

    pub fn builtin_rules(&self, environment: Option<&str>) -> Vec<Box<dyn ManifestValidationRule>> {
        if self.is_strict_for(environment) {
            strict_rules()
        } else {
            default_rules()
        }
    }
}
