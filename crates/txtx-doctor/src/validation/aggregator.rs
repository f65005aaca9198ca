//! Merges the findings of every phase into one deterministic result

use std::collections::HashSet;

use super::types::{Diagnostic, Severity, ValidationResult};
use crate::location::SourceLocation;

/// Validation phases in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Up-front notices such as partial validation
    Preamble,
    Symbols,
    References,
    Flows,
    Environment,
    Lint,
}

#[derive(Debug, Default)]
pub struct DiagnosticAggregator {
    entries: Vec<(Phase, Diagnostic)>,
}

impl DiagnosticAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, phase: Phase, diagnostic: Diagnostic) {
        self.entries.push((phase, diagnostic));
    }

    pub fn extend(&mut self, phase: Phase, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.entries.extend(diagnostics.into_iter().map(|d| (phase, d)));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Order by phase (stable within a phase), drop exact duplicates and split
    /// by severity. `file` fills locations that carry no file name.
    pub fn finish(mut self, file: &str, documentation_links: bool) -> ValidationResult {
        self.entries.sort_by_key(|(phase, _)| *phase);

        let mut seen: HashSet<(Severity, String, Option<SourceLocation>)> = HashSet::new();
        let mut result = ValidationResult::new();
        for (_, mut diagnostic) in self.entries {
            if !file.is_empty() {
                fill_file(&mut diagnostic, file);
            }
            if !documentation_links {
                diagnostic.documentation_link = None;
            }

            let key = (diagnostic.severity, diagnostic.message.clone(), diagnostic.location.clone());
            if !seen.insert(key) {
                continue;
            }

            match diagnostic.severity {
                Severity::Error => result.errors.push(diagnostic),
                Severity::Warning => result.warnings.push(diagnostic),
                Severity::Suggestion => result.suggestions.push(diagnostic),
            }
        }
        result.success = result.errors.is_empty();
        result
    }
}

fn fill_file(diagnostic: &mut Diagnostic, file: &str) {
    diagnostic.location = diagnostic.location.take().map(|l| l.or_file(file));
    for related in &mut diagnostic.related_locations {
        related.location = related.location.take().map(|l| l.or_file(file));
    }
}
