use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::location::SourceLocation;

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Suggestion,
}

/// Broad family a diagnostic belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiagnosticCategory {
    /// Duplicate or malformed definitions, unparseable source
    Structural,
    /// Undefined, forward or mistyped references
    Reference,
    /// A referenced flow attribute missing from some flow
    FlowConsistency,
    /// Environment and manifest resolution
    Environment,
    /// Opt-in manifest lint rules
    Lint,
    /// Advice attached to another finding
    Hint,
}

/// A related location that provides additional context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedLocation {
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl RelatedLocation {
    pub fn new(location: Option<SourceLocation>, message: impl Into<String>) -> Self {
        Self { location, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: DiagnosticCategory,
    pub code: Option<String>,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub context: Option<String>,
    pub related_locations: Vec<RelatedLocation>,
    pub documentation_link: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            code: None,
            message: message.into(),
            location: None,
            context: None,
            related_locations: Vec::new(),
            documentation_link: None,
        }
    }

    // Builder methods
    pub fn error(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn warning(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn suggestion(message: impl Into<String>) -> Self {
        Self::new(Severity::Suggestion, DiagnosticCategory::Hint, message)
    }

    pub fn with_code(mut self, code: impl AsRef<str>) -> Self {
        self.code = Some(code.as_ref().to_string());
        self
    }

    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_related_location(mut self, related: RelatedLocation) -> Self {
        self.related_locations.push(related);
        self
    }

    pub fn with_documentation(mut self, link: Option<String>) -> Self {
        self.documentation_link = link;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn is_suggestion(&self) -> bool {
        self.severity == Severity::Suggestion
    }
}

/// Outcome of one validation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub suggestions: Vec<Diagnostic>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self { success: true, errors: vec![], warnings: vec![], suggestions: vec![] }
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result holding a single error and nothing else
    pub fn fatal(diagnostic: Diagnostic) -> Self {
        Self { success: false, errors: vec![diagnostic], warnings: vec![], suggestions: vec![] }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn suggestion_count(&self) -> usize {
        self.suggestions.len()
    }

    /// Every diagnostic, errors first
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter()).chain(self.suggestions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_result_is_success() {
        let result = ValidationResult::default();
        assert!(result.success);
        assert!(!result.has_errors());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_fatal_result() {
        let result = ValidationResult::fatal(Diagnostic::error(
            DiagnosticCategory::Structural,
            "unexpected token",
        ));
        assert!(!result.success);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.iter().count(), 1);
    }

    #[test]
    fn test_severity_strings() {
        assert_eq!(Severity::Suggestion.to_string(), "suggestion");
        assert_eq!(DiagnosticCategory::FlowConsistency.as_ref(), "flow_consistency");
    }
}
