use thiserror::Error;

use crate::location::SourceLocation;
use crate::validation::{CoreRuleId, Diagnostic, DiagnosticCategory};

/// Failures that stop the doctor from analyzing a runbook at all
#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Failed to parse runbook '{file}': {message}")]
    Parse { file: String, message: String, location: Option<SourceLocation> },

    #[error("Failed to serialize validation report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DoctorError {
    /// The single structural error reported in place of a full analysis
    pub fn into_diagnostic(self) -> Diagnostic {
        let location = match &self {
            DoctorError::Parse { location, .. } => location.clone(),
            DoctorError::Serialization(_) => None,
        };
        Diagnostic::error(DiagnosticCategory::Structural, self.to_string())
            .with_code(CoreRuleId::UnparseableRunbook)
            .with_location(location)
    }
}
