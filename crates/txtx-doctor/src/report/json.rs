use serde_json::{json, Value};

use crate::errors::DoctorError;
use crate::validation::{Diagnostic, ValidationResult};

/// Machine-readable report with a stable schema
pub fn to_json_value(result: &ValidationResult) -> Value {
    json!({
        "success": result.success,
        "errors": result.errors.iter().map(diagnostic_value).collect::<Vec<_>>(),
        "warnings": result.warnings.iter().map(diagnostic_value).collect::<Vec<_>>(),
        "suggestions": result.suggestions.iter().map(diagnostic_value).collect::<Vec<_>>(),
    })
}

pub fn to_json(result: &ValidationResult) -> Result<String, DoctorError> {
    Ok(serde_json::to_string_pretty(&to_json_value(result))?)
}

fn diagnostic_value(diagnostic: &Diagnostic) -> Value {
    let location = diagnostic.location.as_ref();
    json!({
        "level": diagnostic.severity,
        "category": diagnostic.category,
        "code": diagnostic.code,
        "message": diagnostic.message,
        "file": location.map(|l| l.file.as_str()).filter(|f| !f.is_empty()),
        "line": location.map(|l| l.line),
        "column": location.map(|l| l.column),
        "context": diagnostic.context,
        "related_locations": diagnostic.related_locations.iter().map(|related| {
            let location = related.location.as_ref();
            json!({
                "file": location.map(|l| l.file.as_str()).filter(|f| !f.is_empty()),
                "line": location.map(|l| l.line),
                "column": location.map(|l| l.column),
                "message": related.message,
            })
        }).collect::<Vec<_>>(),
        "documentation": diagnostic.documentation_link,
    })
}
