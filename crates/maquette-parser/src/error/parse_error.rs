//! The ParserError type carrying a code, message and source location.

use std::fmt;

use crate::error::ErrorCode;

/// A type alias for `Result<T, ParserError>`.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Where in the source a parse error occurred.
///
/// The file is a display name: a path for file-based parsing, a URL for
/// remote includes, or `<inline>` for string input. Line numbers are
/// 1-based and refer to the original physical line even after continuation
/// joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    file: String,
    line_number: usize,
    line_text: String,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line_number: usize, line_text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line_number,
            line_text: line_text.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// The raw text of the offending line.
    pub fn line_text(&self) -> &str {
        &self.line_text
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line_number)
    }
}

/// Error type for the parsing lifecycle.
///
/// Every error is fatal; the parse stops at the first one. Errors raised
/// below the per-line dispatch boundary have no location yet; the parser
/// attaches one exactly once, so the innermost location wins for errors
/// surfacing out of included files.
#[derive(Debug, Clone)]
pub struct ParserError {
    code: ErrorCode,
    message: String,
    help: Option<String>,
    location: Option<SourceLocation>,
}

impl ParserError {
    /// Create a parse error with a code and message.
    ///
    /// # Example
    ///
    /// ```
    /// # use maquette_parser::{ErrorCode, ParserError};
    ///
    /// let err = ParserError::new(ErrorCode::E200, "the element \"db\" does not exist")
    ///     .with_help("declare the element before referencing it");
    /// assert!(err.to_string().starts_with("error[E200]"));
    /// ```
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            help: None,
            location: None,
        }
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set the source location.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a location only if none is present yet.
    pub(crate) fn or_location(mut self, location: impl FnOnce() -> SourceLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location());
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E100]: message" plus " at file:line" when located
        write!(f, "error[{}]: {}", self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParserError {}

impl From<maquette_core::ModelError> for ParserError {
    fn from(err: maquette_core::ModelError) -> Self {
        ParserError::new(ErrorCode::E506, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_location() {
        let err = ParserError::new(ErrorCode::E300, "unexpected tokens");
        assert_eq!(err.to_string(), "error[E300]: unexpected tokens");
    }

    #[test]
    fn test_display_with_location() {
        let err = ParserError::new(ErrorCode::E100, "too many tokens")
            .with_location(SourceLocation::new("workspace.dsl", 12, "person a b c d e"));
        assert_eq!(
            err.to_string(),
            "error[E100]: too many tokens at workspace.dsl:12"
        );
    }

    #[test]
    fn test_or_location_keeps_innermost() {
        let inner = SourceLocation::new("included.dsl", 3, "bad line");
        let err = ParserError::new(ErrorCode::E300, "unexpected tokens")
            .with_location(inner.clone())
            .or_location(|| SourceLocation::new("outer.dsl", 10, "!include included.dsl"));
        assert_eq!(err.location(), Some(&inner));
    }

    #[test]
    fn test_help_round_trip() {
        let err = ParserError::new(ErrorCode::E300, "unexpected tokens")
            .with_help("permitted tokens: container, component, !docs");
        assert_eq!(
            err.help(),
            Some("permitted tokens: container, component, !docs")
        );
    }
}
