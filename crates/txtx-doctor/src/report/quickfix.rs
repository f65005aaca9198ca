use std::fmt::Write;

use super::location_prefix;
use crate::validation::ValidationResult;

/// Editor quickfix lines: `file:line:col: level: message`
pub fn render_quickfix(result: &ValidationResult) -> String {
    let mut out = String::new();
    for diagnostic in result.iter() {
        let prefix = match &diagnostic.location {
            Some(_) => location_prefix(diagnostic.location.as_ref(), ""),
            // Editors need a position to jump to
            None => "1:1: ".to_string(),
        };
        let _ = write!(out, "{prefix}{}: {}", diagnostic.severity, diagnostic.message);
        if let Some(link) = &diagnostic.documentation_link {
            let _ = write!(out, " (see: {link})");
        }
        out.push('\n');
    }
    out
}
