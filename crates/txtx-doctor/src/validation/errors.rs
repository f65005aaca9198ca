use std::collections::BTreeSet;

use thiserror::Error;

use super::rule_id::CoreRuleId;
use super::types::{Diagnostic, DiagnosticCategory};
use crate::location::SourceLocation;

/// Findings produced by the validation passes. The `Display` text of each
/// variant is the diagnostic message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required label: {0}")]
    MissingLabel(String),

    #[error("Invalid format: {value}. Expected: {expected}")]
    InvalidFormat { value: String, expected: String },

    #[error("Duplicate {construct_type} '{name}'")]
    DuplicateDefinition { construct_type: String, name: String },

    #[error("Duplicate addon declaration for namespace '{0}'")]
    DuplicateAddon(String),

    #[error("Undefined {construct_type}: '{name}'")]
    UndefinedReference { construct_type: String, name: String },

    #[error("{construct_type} '{name}' is referenced before it is declared")]
    ForwardReference { construct_type: String, name: String },

    #[error("Unknown action: {namespace}::{action}")]
    UnknownAction { namespace: String, action: String },

    #[error(
        "Field '{field}' does not exist on action '{action_name}' ({action_type}). Available outputs: {}",
        format_fields(available)
    )]
    InvalidOutputField {
        action_name: String,
        action_type: String,
        field: String,
        available: BTreeSet<String>,
    },

    #[error("Flows are not addressable by name: use 'flow.{attribute}' instead of 'flow.{flow}.{attribute}'")]
    FlowAddressedByName { flow: String, attribute: String },

    #[error("Flow '{flow}' missing input '{attribute}'")]
    MissingFlowAttribute { flow: String, attribute: String },

    #[error("Undefined input: '{0}'")]
    UndefinedInput(String),

    #[error("env var '{name}' not defined in environment {environment}")]
    UndefinedEnvVar { name: String, environment: String },

    #[error("Environment '{0}' is not defined in the manifest")]
    UnknownEnvironment(String),
}

fn format_fields(fields: &BTreeSet<String>) -> String {
    if fields.is_empty() {
        "none".to_string()
    } else {
        fields.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl ValidationError {
    pub fn rule(&self) -> CoreRuleId {
        use ValidationError::*;
        match self {
            MissingLabel(_) | InvalidFormat { .. } => CoreRuleId::MalformedDefinition,
            DuplicateDefinition { .. } | DuplicateAddon(_) => CoreRuleId::DuplicateDefinition,
            UndefinedReference { .. } => CoreRuleId::UndefinedReference,
            ForwardReference { .. } => CoreRuleId::ForwardReference,
            UnknownAction { .. } => CoreRuleId::UnknownActionType,
            InvalidOutputField { .. } => CoreRuleId::InvalidOutputField,
            FlowAddressedByName { .. } => CoreRuleId::FlowAddressedByName,
            MissingFlowAttribute { .. } => CoreRuleId::MissingFlowAttribute,
            UndefinedInput(_) => CoreRuleId::UndefinedInput,
            UndefinedEnvVar { .. } => CoreRuleId::UndefinedEnvVar,
            UnknownEnvironment(_) => CoreRuleId::UnknownEnvironment,
        }
    }

    pub fn category(&self) -> DiagnosticCategory {
        use ValidationError::*;
        match self {
            MissingLabel(_) | InvalidFormat { .. } | DuplicateDefinition { .. }
            | DuplicateAddon(_) => DiagnosticCategory::Structural,
            UndefinedReference { .. }
            | ForwardReference { .. }
            | UnknownAction { .. }
            | InvalidOutputField { .. }
            | UndefinedInput(_) => DiagnosticCategory::Reference,
            FlowAddressedByName { .. } | MissingFlowAttribute { .. } => {
                DiagnosticCategory::FlowConsistency
            }
            UndefinedEnvVar { .. } | UnknownEnvironment(_) => DiagnosticCategory::Environment,
        }
    }

    fn documentation_link(&self) -> Option<String> {
        match self {
            ValidationError::InvalidOutputField { action_type, .. } => {
                self.rule().documentation_link_for_action(action_type)
            }
            ValidationError::UnknownAction { namespace, action } => self
                .rule()
                .documentation_link_for_action(&format!("{namespace}::{action}")),
            _ => self.rule().documentation_link(),
        }
    }

    /// Convert into an error diagnostic at `location`
    pub fn into_diagnostic(self, location: Option<SourceLocation>) -> Diagnostic {
        Diagnostic::error(self.category(), self.to_string())
            .with_code(self.rule())
            .with_location(location)
            .with_documentation(self.documentation_link())
    }
}
