//! Error codes for the Maquette parser.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Tokenizer errors
//! - `E1xx` - Grammar errors
//! - `E2xx` - Resolution errors
//! - `E3xx` - Context errors
//! - `E4xx` - Feature-gated errors
//! - `E5xx` - Structural errors
//! - `E6xx` - I/O and remote errors

use std::fmt;

/// Error codes for categorizing parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Tokenizer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A quoted token was opened with `"` but never closed on the same
    /// logical line.
    E001,

    /// Unterminated block comment.
    ///
    /// A `/*` comment was still open when the input ended.
    E002,

    // =========================================================================
    // Grammar Errors (E1xx)
    // =========================================================================
    /// Too many tokens.
    ///
    /// A statement carried more tokens than its grammar allows. The message
    /// embeds the canonical grammar string.
    E100,

    /// Too few tokens.
    ///
    /// A statement was missing required tokens. The message embeds the
    /// canonical grammar string.
    E101,

    /// Invalid identifier name.
    ///
    /// Identifiers may only contain letters, digits, `-`, `_` and `.`.
    E102,

    /// Invalid value.
    ///
    /// A token could not be parsed as the value the statement requires,
    /// such as a number, color, boolean or URL.
    E103,

    /// Ambiguous expression.
    ///
    /// An expression mixed `&&` and `||`, which have no defined precedence.
    E104,

    // =========================================================================
    // Resolution Errors (E2xx)
    // =========================================================================
    /// Element not found.
    ///
    /// An identifier was expected to name an element but does not.
    E200,

    /// Relationship not found.
    ///
    /// An identifier was expected to name a relationship but does not, or a
    /// relationship removal matched nothing.
    E201,

    /// Identifier not found.
    ///
    /// An identifier names neither an element nor a relationship.
    E202,

    /// View not found.
    ///
    /// A view key was referenced that has not been defined.
    E203,

    /// Unknown extension.
    ///
    /// A named implied-relationship strategy, plugin, script engine,
    /// component matcher or archetype base is not registered.
    E204,

    // =========================================================================
    // Context Errors (E3xx)
    // =========================================================================
    /// Unexpected tokens.
    ///
    /// The first token of a line is not a keyword permitted in the current
    /// context. The help text lists the permitted tokens.
    E300,

    /// Assignment not permitted.
    ///
    /// An `identifier =` prefix was used on a statement that does not
    /// produce an element or relationship.
    E301,

    // =========================================================================
    // Feature-Gated Errors (E4xx)
    // =========================================================================
    /// Feature not enabled.
    ///
    /// The statement requires a capability that has been disabled for this
    /// parser instance.
    E400,

    /// Not permitted in restricted mode.
    ///
    /// The statement requires filesystem, script or plugin access, which
    /// restricted mode forbids.
    E401,

    // =========================================================================
    // Structural Errors (E5xx)
    // =========================================================================
    /// Missing closing brace.
    ///
    /// The input ended with more `{` than `}`.
    E500,

    /// Unexpected closing brace.
    ///
    /// A `}` was found with no block open.
    E501,

    /// Duplicate block.
    ///
    /// A top-level `workspace`, `model` or `views` block was defined twice.
    E502,

    /// Duplicate constant.
    ///
    /// A `!const` name was declared twice. Constants are write-once.
    E503,

    /// Missing group separator.
    ///
    /// Nested groups require the group separator workspace property.
    E504,

    /// Duplicate identifier.
    ///
    /// An identifier was registered a second time for a different element
    /// or relationship. Re-registering the same object is permitted.
    E505,

    /// Model rule violation.
    ///
    /// The model library rejected a mutation: a duplicate sibling name, an
    /// invalid parent kind, a relationship between kinds that may not
    /// connect, or a duplicate view key or style tag.
    E506,

    // =========================================================================
    // I/O and Remote Errors (E6xx)
    // =========================================================================
    /// File error.
    ///
    /// A file or directory could not be read. The message carries the path
    /// and the underlying cause.
    E600,

    /// Remote error.
    ///
    /// An HTTP fetch failed or returned a non-success status. The message
    /// carries the URL and the underlying cause.
    E601,

    /// Extension failed.
    ///
    /// A script engine, plugin or component finder reported a failure. The
    /// message carries the extension name and the underlying cause.
    E602,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E100").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Tokenizer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            // Grammar errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            // Resolution errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            // Context errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            // Feature-gated errors
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            // Structural errors
            ErrorCode::E500 => "E500",
            ErrorCode::E501 => "E501",
            ErrorCode::E502 => "E502",
            ErrorCode::E503 => "E503",
            ErrorCode::E504 => "E504",
            ErrorCode::E505 => "E505",
            ErrorCode::E506 => "E506",
            // I/O and remote errors
            ErrorCode::E600 => "E600",
            ErrorCode::E601 => "E601",
            ErrorCode::E602 => "E602",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Tokenizer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unterminated block comment",
            // Grammar errors
            ErrorCode::E100 => "too many tokens",
            ErrorCode::E101 => "too few tokens",
            ErrorCode::E102 => "invalid identifier name",
            ErrorCode::E103 => "invalid value",
            ErrorCode::E104 => "ambiguous expression",
            // Resolution errors
            ErrorCode::E200 => "element not found",
            ErrorCode::E201 => "relationship not found",
            ErrorCode::E202 => "identifier not found",
            ErrorCode::E203 => "view not found",
            ErrorCode::E204 => "unknown extension",
            // Context errors
            ErrorCode::E300 => "unexpected tokens",
            ErrorCode::E301 => "assignment not permitted",
            // Feature-gated errors
            ErrorCode::E400 => "feature not enabled",
            ErrorCode::E401 => "not permitted in restricted mode",
            // Structural errors
            ErrorCode::E500 => "missing closing brace",
            ErrorCode::E501 => "unexpected closing brace",
            ErrorCode::E502 => "duplicate block",
            ErrorCode::E503 => "duplicate constant",
            ErrorCode::E504 => "missing group separator",
            ErrorCode::E505 => "duplicate identifier",
            ErrorCode::E506 => "model rule violation",
            // I/O and remote errors
            ErrorCode::E600 => "file error",
            ErrorCode::E601 => "remote error",
            ErrorCode::E602 => "extension failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E300.to_string(), "E300");
        assert_eq!(ErrorCode::E600.to_string(), "E600");
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::E104.as_str(), "E104");
        assert_eq!(ErrorCode::E504.as_str(), "E504");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated string literal");
        assert_eq!(ErrorCode::E300.description(), "unexpected tokens");
        assert_eq!(
            ErrorCode::E401.description(),
            "not permitted in restricted mode"
        );
    }
}
