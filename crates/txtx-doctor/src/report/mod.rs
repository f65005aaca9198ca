//! Rendering of validation results

mod json;
mod quickfix;
mod terminal;

pub use json::{to_json, to_json_value};
pub use quickfix::render_quickfix;
pub use terminal::render_text;

use strum::{Display, EnumString};

use crate::errors::DoctorError;
use crate::location::SourceLocation;
use crate::validation::ValidationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    /// Human-readable blocks
    #[default]
    Pretty,
    /// One `file:line:col: level: message` line per diagnostic
    Quickfix,
    Json,
}

pub fn render(result: &ValidationResult, format: Format) -> Result<String, DoctorError> {
    match format {
        Format::Pretty => Ok(render_text(result)),
        Format::Quickfix => Ok(render_quickfix(result)),
        Format::Json => to_json(result),
    }
}

/// Process exit code for a result: 0 only when there are no errors
pub fn exit_code(result: &ValidationResult) -> i32 {
    if result.success {
        0
    } else {
        1
    }
}

/// `file:line:column: `, or `file: ` when the position is unknown
fn location_prefix(location: Option<&SourceLocation>, fallback_file: &str) -> String {
    match location {
        Some(location) if location.file.is_empty() && fallback_file.is_empty() => {
            format!("{}:{}: ", location.line, location.column)
        }
        Some(location) => {
            let file = if location.file.is_empty() { fallback_file } else { &location.file };
            format!("{file}:{}:{}: ", location.line, location.column)
        }
        None if fallback_file.is_empty() => String::new(),
        None => format!("{fallback_file}: "),
    }
}
