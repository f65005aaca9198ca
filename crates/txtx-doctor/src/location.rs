//! Source locations and span-to-position mapping
//!
//! Locations are optional everywhere in the doctor: the AST provider may or
//! may not populate them. When present they are 1-based.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::ast::BlockKind;

/// A specific location in a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// The file path, empty when unknown
    pub file: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self { file: file.into(), line, column }
    }

    /// Create a location at the start of a file (1, 1)
    pub fn at_start(file: impl Into<String>) -> Self {
        Self { file: file.into(), line: 1, column: 1 }
    }

    pub fn without_file(line: usize, column: usize) -> Self {
        Self { file: String::new(), line, column }
    }

    /// Fill in the file when the provider left it empty
    pub fn or_file(mut self, file: &str) -> Self {
        if self.file.is_empty() {
            self.file = file.to_string();
        }
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// Maps source spans (byte offsets) to line/column positions
pub struct SourceMapper<'a> {
    source: &'a str,
}

impl<'a> SourceMapper<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Convert a span to line and column (1-based)
    pub fn span_to_position(&self, span: &Range<usize>) -> (usize, usize) {
        let start = span.start;
        let mut line = 1;
        let mut col = 1;

        for (i, ch) in self.source.char_indices() {
            if i >= start {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }

        (line, col)
    }

    pub fn span_to_location(&self, span: &Range<usize>, file: &str) -> SourceLocation {
        let (line, column) = self.span_to_position(span);
        SourceLocation::new(file, line, column)
    }

    pub fn optional_span_to_location(
        &self,
        span: Option<&Range<usize>>,
        file: &str,
    ) -> Option<SourceLocation> {
        span.map(|s| self.span_to_location(s, file))
    }
}

/// The top-level block a reference or definition appears in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockContext {
    pub kind: BlockKind,
    pub name: String,
}

impl BlockContext {
    pub fn new(kind: BlockKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into() }
    }
}

impl fmt::Display for BlockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_to_position() {
        let source = "flow \"a\" {\n  x = 1\n}\n";
        let mapper = SourceMapper::new(source);

        assert_eq!(mapper.span_to_position(&(0..4)), (1, 1));
        assert_eq!(mapper.span_to_position(&(13..14)), (2, 3));
        assert_eq!(mapper.span_to_position(&(19..20)), (3, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceLocation::new("main.tx", 3, 7).to_string(), "main.tx:3:7");
        assert_eq!(SourceLocation::without_file(3, 7).to_string(), "3:7");
        assert_eq!(
            SourceLocation::without_file(1, 2).or_file("main.tx").to_string(),
            "main.tx:1:2"
        );
    }

    #[test]
    fn test_block_context_display() {
        let context = BlockContext::new(BlockKind::Action, "deploy");
        assert_eq!(context.to_string(), "action 'deploy'");
    }
}
