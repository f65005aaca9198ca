use std::fmt::Write;

use super::location_prefix;
use crate::validation::{Diagnostic, ValidationResult};

/// Human-readable report: one block per diagnostic, errors first
pub fn render_text(result: &ValidationResult) -> String {
    let mut out = String::new();
    let total_issues = result.error_count() + result.warning_count();

    if total_issues == 0 && result.suggestions.is_empty() {
        out.push_str("✓ No issues found!\n");
        return out;
    }

    if total_issues > 0 {
        let _ = writeln!(out, "Found {total_issues} issue(s):\n");
    }

    for (i, error) in result.errors.iter().enumerate() {
        write_diagnostic(&mut out, error, &format!("error[{}]", i + 1));
    }
    for warning in &result.warnings {
        write_diagnostic(&mut out, warning, "warning");
    }

    if !result.suggestions.is_empty() {
        out.push_str("Suggestions:\n");
        for suggestion in &result.suggestions {
            let _ = writeln!(
                out,
                "  • {}{}",
                location_prefix(suggestion.location.as_ref(), ""),
                suggestion.message
            );
            if let Some(link) = &suggestion.documentation_link {
                let _ = writeln!(out, "    Documentation: {link}");
            }
        }
    }
    out
}

fn write_diagnostic(out: &mut String, diagnostic: &Diagnostic, label: &str) {
    let code = diagnostic.code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default();
    let _ = writeln!(
        out,
        "{}{label}: {}{code}",
        location_prefix(diagnostic.location.as_ref(), ""),
        diagnostic.message
    );

    if let Some(context) = &diagnostic.context {
        let _ = writeln!(out, "   {context}");
    }
    for related in &diagnostic.related_locations {
        let _ = writeln!(
            out,
            "   {}{}",
            location_prefix(related.location.as_ref(), ""),
            related.message
        );
    }
    if let Some(link) = &diagnostic.documentation_link {
        let _ = writeln!(out, "   Documentation: {link}");
    }
    out.push('\n');
}
