//! `env.*` resolution against the manifest
//!
//! A variable resolves through CLI overrides, then the selected environment,
//! then `defaults`. Without a selected environment only CLI overrides and
//! `defaults` are consulted, and the result says so up front.

use std::collections::HashSet;
use std::fmt;

use super::errors::ValidationError;
use super::resolver::Reference;
use super::rule_id::CoreRuleId;
use super::types::{Diagnostic, DiagnosticCategory};
use crate::manifest::{ManifestSnapshot, DEFAULTS_ENVIRONMENT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    CliInput,
    Environment(String),
    Defaults,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::CliInput => write!(f, "CLI input"),
            ValueSource::Environment(name) => write!(f, "environment '{name}'"),
            ValueSource::Defaults => write!(f, "defaults"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue<'a> {
    pub value: &'a str,
    pub source: ValueSource,
}

pub struct EnvironmentResolver<'a> {
    manifest: &'a ManifestSnapshot,
}

impl<'a> EnvironmentResolver<'a> {
    pub fn new(manifest: &'a ManifestSnapshot) -> Self {
        Self { manifest }
    }

    /// The selected environment, when it exists in the manifest
    pub fn selected_environment(&self) -> Option<&'a str> {
        let name = self.manifest.current_environment.as_deref()?;
        self.manifest.environment(name).map(|_| name)
    }

    pub fn resolve(&self, var: &str) -> Option<ResolvedValue<'a>> {
        if let Some(value) = self.manifest.cli_inputs.get(var) {
            return Some(ResolvedValue { value, source: ValueSource::CliInput });
        }
        if let Some(name) = self.selected_environment() {
            let selected = self.manifest.environment(name).and_then(|env| env.get(var));
            if let Some(value) = selected {
                return Some(ResolvedValue {
                    value,
                    source: ValueSource::Environment(name.to_string()),
                });
            }
        }
        self.manifest
            .defaults()
            .and_then(|env| env.get(var))
            .map(|value| ResolvedValue { value, source: ValueSource::Defaults })
    }
}

#[derive(Debug, Default)]
pub struct EnvironmentOutcome {
    /// Up-front notices, reported before any other finding
    pub notices: Vec<Diagnostic>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn validate_environment(env_refs: &[Reference], manifest: &ManifestSnapshot) -> EnvironmentOutcome {
    let resolver = EnvironmentResolver::new(manifest);
    let mut outcome = EnvironmentOutcome::default();

    match manifest.current_environment.as_deref() {
        None => outcome.notices.push(
            Diagnostic::warning(
                DiagnosticCategory::Environment,
                "partial validation: no environment specified",
            )
            .with_code(CoreRuleId::PartialValidation)
            .with_context("Only CLI inputs and 'defaults' were used to resolve env references")
            .with_documentation(CoreRuleId::PartialValidation.documentation_link()),
        ),
        Some(name) if manifest.environment(name).is_none() => outcome
            .diagnostics
            .push(ValidationError::UnknownEnvironment(name.to_string()).into_diagnostic(None)),
        Some(_) => {}
    }

    if !manifest.cli_inputs.is_empty() {
        outcome.diagnostics.push(
            Diagnostic::suggestion(format!(
                "{} CLI inputs provided. CLI inputs take precedence over environment values.",
                manifest.cli_inputs.len()
            ))
            .with_code(CoreRuleId::CliInputPrecedence)
            .with_documentation(CoreRuleId::CliInputPrecedence.documentation_link()),
        );
    }

    let environment_label = resolver.selected_environment().unwrap_or(DEFAULTS_ENVIRONMENT);
    for reference in env_refs {
        if resolver.resolve(reference.name()).is_some() {
            continue;
        }
        let error = ValidationError::UndefinedEnvVar {
            name: reference.name().to_string(),
            environment: environment_label.to_string(),
        };
        outcome.diagnostics.push(
            error
                .into_diagnostic(reference.location.clone())
                .with_context(format!("Referenced in {}", reference.block)),
        );
    }

    if let Some(selected) = resolver.selected_environment() {
        let referenced: HashSet<&str> = env_refs.iter().map(Reference::name).collect();
        let variables = manifest.environment(selected).into_iter().flat_map(|env| env.keys());
        for var in variables.filter(|var| !referenced.contains(var.as_str())) {
            outcome.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCategory::Environment,
                    format!("Unused environment variable '{var}'"),
                )
                .with_code(CoreRuleId::UnusedEnvVar)
                .with_context(format!("Defined in environment '{selected}'"))
                .with_documentation(CoreRuleId::UnusedEnvVar.documentation_link()),
            );
        }
    }

    outcome
}
