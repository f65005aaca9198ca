//! Opt-in lint rules over resolved `env.*` and `input.*` references
//!
//! Rules only see references that resolved; unresolved ones were already
//! reported by the reference and environment checks.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::resolver::Reference;
use super::rule_id::{AddonScope, CoreRuleId, RuleIdentifier};
use super::types::{Diagnostic, DiagnosticCategory};
use crate::manifest::{ManifestSnapshot, DEFAULTS_ENVIRONMENT};

/// Trait for manifest lint rules
pub trait ManifestValidationRule: Send + Sync {
    /// Unique identifier for the rule
    fn id(&self) -> RuleIdentifier;

    /// Description of what the rule checks
    fn description(&self) -> &'static str;

    /// Which addons this rule applies to
    fn addon_scope(&self) -> AddonScope {
        match self.id() {
            RuleIdentifier::Core(id) => id.addon_scope(),
            RuleIdentifier::External(_) => AddonScope::Global,
        }
    }

    fn check(&self, context: &RuleContext) -> ValidationOutcome;
}

/// Context provided to lint rules
pub struct RuleContext<'a> {
    /// Variable name without its root (`api_key`)
    pub input_name: &'a str,
    /// Reference as written (`env.api_key`)
    pub full_name: &'a str,
    pub manifest: &'a ManifestSnapshot,
    pub environment: Option<&'a str>,
    /// Defaults, then the selected environment, then CLI inputs
    pub effective_inputs: &'a IndexMap<String, String>,
    /// Defaults then the selected environment, without CLI inputs
    pub environment_inputs: &'a IndexMap<String, String>,
    pub active_addons: &'a HashSet<String>,
}

impl<'a> RuleContext<'a> {
    pub fn cli_value(&self) -> Option<&'a str> {
        self.manifest.cli_inputs.get(self.input_name).map(String::as_str)
    }
}

/// Outcome of a lint rule check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Pass,
    Error {
        message: String,
        context: Option<String>,
        suggestion: Option<String>,
        documentation_link: Option<String>,
    },
    Warning { message: String, suggestion: Option<String> },
}

/// Rule: Check input naming conventions
pub struct InputNamingConventionRule;

impl ManifestValidationRule for InputNamingConventionRule {
    fn id(&self) -> RuleIdentifier {
        RuleIdentifier::Core(CoreRuleId::InputNamingConvention)
    }

    fn description(&self) -> &'static str {
        CoreRuleId::InputNamingConvention.description()
    }

    fn check(&self, ctx: &RuleContext) -> ValidationOutcome {
        if ctx.input_name.contains('-') {
            return ValidationOutcome::Warning {
                message: format!(
                    "Input '{}' contains hyphens. Consider using underscores for consistency",
                    ctx.full_name
                ),
                suggestion: Some(format!("Rename to '{}'", ctx.full_name.replace('-', "_"))),
            };
        }

        if ctx.input_name.chars().any(char::is_uppercase) {
            return ValidationOutcome::Warning {
                message: format!(
                    "Input '{}' contains uppercase letters. Consider using lowercase for consistency",
                    ctx.full_name
                ),
                suggestion: Some(format!("Rename to '{}'", ctx.full_name.to_lowercase())),
            };
        }

        ValidationOutcome::Pass
    }
}

/// Rule: CLI input override warnings
pub struct CliInputOverrideRule;

impl ManifestValidationRule for CliInputOverrideRule {
    fn id(&self) -> RuleIdentifier {
        RuleIdentifier::Core(CoreRuleId::CliInputOverride)
    }

    fn description(&self) -> &'static str {
        CoreRuleId::CliInputOverride.description()
    }

    fn check(&self, ctx: &RuleContext) -> ValidationOutcome {
        match (ctx.cli_value(), ctx.environment_inputs.get(ctx.input_name)) {
            (Some(cli_value), Some(env_value)) if cli_value != env_value => {
                ValidationOutcome::Warning {
                    message: format!("CLI input '{}' overrides environment value", ctx.input_name),
                    suggestion: Some(format!(
                        "CLI value '{cli_value}' will be used instead of environment value '{env_value}'"
                    )),
                }
            }
            _ => ValidationOutcome::Pass,
        }
    }
}

/// Rule: Sensitive data detection
pub struct SensitiveDataRule;

impl ManifestValidationRule for SensitiveDataRule {
    fn id(&self) -> RuleIdentifier {
        RuleIdentifier::Core(CoreRuleId::SensitiveData)
    }

    fn description(&self) -> &'static str {
        CoreRuleId::SensitiveData.description()
    }

    fn check(&self, ctx: &RuleContext) -> ValidationOutcome {
        const SENSITIVE_PATTERNS: &[&str] = &[
            "password",
            "passwd",
            "secret",
            "token",
            "key",
            "credential",
            "private",
            "auth",
            "apikey",
        ];

        let lower_name = ctx.input_name.to_lowercase();
        if !SENSITIVE_PATTERNS.iter().any(|&p| lower_name.contains(p)) {
            return ValidationOutcome::Pass;
        }

        let Some(value) = ctx.effective_inputs.get(ctx.input_name) else {
            return ValidationOutcome::Pass;
        };

        if value.starts_with('<') && value.ends_with('>') {
            return ValidationOutcome::Warning {
                message: format!(
                    "Input '{}' appears to contain sensitive data with placeholder value",
                    ctx.full_name
                ),
                suggestion: Some("Ensure this value is properly set before deployment".to_string()),
            };
        }

        if !value.starts_with("${") && !value.starts_with("input.") {
            return ValidationOutcome::Warning {
                message: format!("Input '{}' may contain hardcoded sensitive data", ctx.full_name),
                suggestion: Some(
                    "Consider using environment variables or secure secret management".to_string(),
                ),
            };
        }

        ValidationOutcome::Pass
    }
}

/// Rule: No default values (for strict environments)
pub struct NoDefaultValuesRule;

impl ManifestValidationRule for NoDefaultValuesRule {
    fn id(&self) -> RuleIdentifier {
        RuleIdentifier::Core(CoreRuleId::NoDefaultValues)
    }

    fn description(&self) -> &'static str {
        CoreRuleId::NoDefaultValues.description()
    }

    fn check(&self, ctx: &RuleContext) -> ValidationOutcome {
        if !is_production(ctx.environment) {
            return ValidationOutcome::Pass;
        }

        let selected = ctx.environment.and_then(|env| ctx.manifest.environment(env));
        let overridden = selected.is_some_and(|env| env.contains_key(ctx.input_name))
            || ctx.cli_value().is_some();
        let from_defaults = ctx
            .manifest
            .environment(DEFAULTS_ENVIRONMENT)
            .is_some_and(|defaults| defaults.contains_key(ctx.input_name));

        if from_defaults && !overridden {
            ValidationOutcome::Warning {
                message: format!(
                    "Production environment is using default value for '{}'",
                    ctx.full_name
                ),
                suggestion: Some("Define an explicit value for production environment".to_string()),
            }
        } else {
            ValidationOutcome::Pass
        }
    }
}

pub fn is_production(environment: Option<&str>) -> bool {
    matches!(environment, Some("production" | "prod"))
}

pub fn default_rules() -> Vec<Box<dyn ManifestValidationRule>> {
    vec![
        Box::new(InputNamingConventionRule),
        Box::new(CliInputOverrideRule),
        Box::new(SensitiveDataRule),
    ]
}

/// Default rules plus the production-only ones
pub fn strict_rules() -> Vec<Box<dyn ManifestValidationRule>> {
    let mut rules = default_rules();
    rules.push(Box::new(NoDefaultValuesRule));
    rules
}

/// Run `rules` once per distinct resolved reference, located at its first
/// occurrence.
pub fn apply_rules(
    rules: &[&dyn ManifestValidationRule],
    references: &[&Reference],
    manifest: &ManifestSnapshot,
    active_addons: &HashSet<String>,
) -> Vec<Diagnostic> {
    let effective_inputs = manifest.effective_inputs();
    let environment_inputs = manifest.environment_inputs();
    let rules: Vec<_> = rules
        .iter()
        .copied()
        .filter(|rule| rule.addon_scope().applies_to(active_addons))
        .collect();

    let mut seen = HashSet::new();
    let mut diagnostics = vec![];
    for reference in references {
        let full_name = format!("{}.{}", reference.root(), reference.name());
        if !effective_inputs.contains_key(reference.name()) || !seen.insert(full_name.clone()) {
            continue;
        }

        let context = RuleContext {
            input_name: reference.name(),
            full_name: &full_name,
            manifest,
            environment: manifest.current_environment.as_deref(),
            effective_inputs: &effective_inputs,
            environment_inputs: &environment_inputs,
            active_addons,
        };

        for rule in &rules {
            diagnostics.extend(outcome_diagnostics(rule.id(), rule.check(&context), reference));
        }
    }
    diagnostics
}

fn outcome_diagnostics(
    id: RuleIdentifier,
    outcome: ValidationOutcome,
    reference: &Reference,
) -> Vec<Diagnostic> {
    let (diagnostic, suggestion) = match outcome {
        ValidationOutcome::Pass => return vec![],
        ValidationOutcome::Error { message, context, suggestion, documentation_link } => {
            let mut diagnostic = Diagnostic::error(DiagnosticCategory::Lint, message)
                .with_documentation(documentation_link);
            if let Some(context) = context {
                diagnostic = diagnostic.with_context(context);
            }
            (diagnostic, suggestion)
        }
        ValidationOutcome::Warning { message, suggestion } => {
            (Diagnostic::warning(DiagnosticCategory::Lint, message), suggestion)
        }
    };

    let diagnostic = diagnostic.with_code(&id).with_location(reference.location.clone());
    let mut diagnostics = vec![diagnostic];
    if let Some(suggestion) = suggestion {
        diagnostics.push(
            Diagnostic::suggestion(suggestion)
                .with_code(&id)
                .with_location(reference.location.clone()),
        );
    }
    diagnostics
}
