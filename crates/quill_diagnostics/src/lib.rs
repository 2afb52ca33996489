//! quill_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Diagnostics describe problems in user code. They are appended to a
//! [`DiagnosticCollection`] owned by whoever started the parse or binding
//! attempt; nothing in the front-end inspects a collection to make decisions.

use quill_core::text::{LineMap, Location};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Suggestion => write!(f, "suggestion"),
            DiagnosticCategory::Message => write!(f, "message"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    /// The diagnostic code (e.g., 103, 1061).
    pub code: u32,
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the diagnostic occurred, if anywhere.
    pub location: Option<Location>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// Create a new diagnostic without location info (global diagnostic).
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            location: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    pub fn with_location(location: Location, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            location: Some(location),
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Render as `file(line,col): error QL0103: ...` using the file's line map.
    pub fn render(&self, file_name: &str, line_map: &LineMap) -> String {
        match self.location {
            Some(location) => {
                let lc = line_map.line_and_column_of(location.start());
                format!("{}({},{}): {}", file_name, lc.line + 1, lc.character + 1, self)
            }
            None => self.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} QL{:04}: {}", self.category, self.code, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// An append-only collection of diagnostics.
///
/// A collection has a single writer: concurrent binding attempts each use
/// their own instance and merge afterwards with [`DiagnosticCollection::extend`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Shorthand for adding a located diagnostic built from a template.
    pub fn report(&mut self, location: Location, message: &DiagnosticMessage, args: &[&str]) {
        self.add(Diagnostic::with_location(location, message, args));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.category == DiagnosticCategory::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Error)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn extend_from_slice(&mut self, diagnostics: &[Diagnostic]) {
        self.diagnostics.extend_from_slice(diagnostics);
    }

    /// Sort diagnostics by file and position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by_key(|d| {
            d.location
                .map(|l| (l.file.0, l.span.start))
                .unwrap_or((0, 0))
        });
    }

    /// Keep at most `max` diagnostics.
    pub fn truncate(&mut self, max: usize) {
        self.diagnostics.truncate(max);
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
    }

    // ========================================================================
    // Binding errors
    // ========================================================================
    pub const THE_NAME_0_DOES_NOT_EXIST_IN_THE_CURRENT_CONTEXT: DiagnosticMessage = diag!(103, Error, "The name '{0}' does not exist in the current context.");
    pub const THE_NON_GENERIC_1_0_CANNOT_BE_USED_WITH_TYPE_ARGUMENTS: DiagnosticMessage = diag!(308, Error, "The non-generic {1} '{0}' cannot be used with type arguments.");
    pub const _0_IS_A_1_BUT_IS_USED_LIKE_A_2: DiagnosticMessage = diag!(118, Error, "'{0}' is a {1} but is used like a {2}.");
    pub const A_LOCAL_VARIABLE_NAMED_0_IS_ALREADY_DEFINED_IN_THIS_SCOPE: DiagnosticMessage = diag!(128, Error, "A local variable named '{0}' is already defined in this scope.");
    pub const NON_INVOCABLE_MEMBER_0_CANNOT_BE_USED_LIKE_A_METHOD: DiagnosticMessage = diag!(1955, Error, "Non-invocable member '{0}' cannot be used like a method.");
    pub const _0_DOES_NOT_CONTAIN_A_DEFINITION_FOR_1: DiagnosticMessage = diag!(1061, Error, "'{0}' does not contain a definition for '{1}'.");
    pub const COULD_NOT_FIND_AN_IMPLEMENTATION_OF_THE_QUERY_PATTERN_FOR_SOURCE_TYPE_0: DiagnosticMessage = diag!(1936, Error, "Could not find an implementation of the query pattern for source type '{0}'.");
    pub const OPERATOR_0_CANNOT_BE_APPLIED_TO_OPERANDS_OF_TYPE_1_AND_2: DiagnosticMessage = diag!(19, Error, "Operator '{0}' cannot be applied to operands of type '{1}' and '{2}'.");
    pub const THE_RANGE_VARIABLE_0_CONFLICTS_WITH_A_PREVIOUS_DECLARATION_OF_0: DiagnosticMessage = diag!(1930, Error, "The range variable '{0}' conflicts with a previous declaration of '{0}'.");
    pub const QUERY_CONCLUSION_VARIABLE_0_IS_NOT_IN_SCOPE: DiagnosticMessage = diag!(1938, Error, "The query conclusion variable '{0}' cannot be used outside its clause.");

    // ========================================================================
    // Syntax errors
    // ========================================================================
    pub const _0_EXPECTED: DiagnosticMessage = diag!(1003, Error, "'{0}' expected.");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(1001, Error, "Identifier expected.");
    pub const INVALID_EXPRESSION_TERM_0: DiagnosticMessage = diag!(1525, Error, "Invalid expression term '{0}'.");
    pub const UNEXPECTED_CHARACTER_0: DiagnosticMessage = diag!(1056, Error, "Unexpected character '{0}'.");
    pub const NEWLINE_IN_CONSTANT: DiagnosticMessage = diag!(1010, Error, "Newline in constant.");
    pub const A_QUERY_BODY_MUST_END_WITH_A_SELECT_CLAUSE_OR_A_GROUP_CLAUSE: DiagnosticMessage = diag!(742, Error, "A query body must end with a select clause or a group clause.");
    pub const EXPRESSION_IS_TOO_DEEPLY_NESTED: DiagnosticMessage = diag!(8078, Error, "An expression is too long or complex to compile.");
    pub const FEATURE_0_IS_NOT_AVAILABLE: DiagnosticMessage = diag!(8107, Error, "Feature '{0}' is not available. Enable it in the compiler options.");

    // ========================================================================
    // Warnings
    // ========================================================================
    pub const UNREACHABLE_CODE_DETECTED: DiagnosticMessage = diag!(162, Warning, "Unreachable code detected.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::text::{FileId, TextSpan};

    #[test]
    fn test_format_message() {
        assert_eq!(
            format_message("'{0}' does not contain a definition for '{1}'.", &["int", "Y"]),
            "'int' does not contain a definition for 'Y'."
        );
    }

    #[test]
    fn test_collection_sorts_by_position() {
        let mut diags = DiagnosticCollection::new();
        let at = |start| Location::new(FileId(0), TextSpan::new(start, 1));
        diags.report(at(9), &messages::THE_NAME_0_DOES_NOT_EXIST_IN_THE_CURRENT_CONTEXT, &["b"]);
        diags.report(at(2), &messages::THE_NAME_0_DOES_NOT_EXIST_IN_THE_CURRENT_CONTEXT, &["a"]);
        diags.sort();
        assert_eq!(diags.diagnostics()[0].message_text, "The name 'a' does not exist in the current context.");
        assert_eq!(diags.error_count(), 2);
    }

    #[test]
    fn test_render_uses_line_map() {
        let text = "var a = 1;\nvar b = c;";
        let map = LineMap::new(text);
        let diag = Diagnostic::with_location(
            Location::new(FileId(0), TextSpan::new(19, 1)),
            &messages::THE_NAME_0_DOES_NOT_EXIST_IN_THE_CURRENT_CONTEXT,
            &["c"],
        );
        assert_eq!(
            diag.render("main.ql", &map),
            "main.ql(2,9): error QL0103: The name 'c' does not exist in the current context."
        );
    }
}
