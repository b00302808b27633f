//! Error system for the Maquette DSL parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Source locations carrying the file, 1-based line number and raw line
//! - Help text listing the tokens permitted at the failure point
//!
//! # Overview
//!
//! The error system is built around the [`ParserError`] type. Every parse
//! failure is fatal: the first error stops the parse and is returned as a
//! single `ParserError`. Errors raised deep inside nested blocks or included
//! files are caught at the per-line dispatch boundary, where the source
//! location of the offending line is attached, so callers always get a
//! precise pointer regardless of how deep the failure occurred.
//!
//! # Example
//!
//! ```
//! # use maquette_parser::{ErrorCode, ParserError};
//!
//! let err = ParserError::new(
//!     ErrorCode::E100,
//!     "Too many tokens, expected: person <name> [description] [tags]",
//! );
//! assert_eq!(err.code(), ErrorCode::E100);
//! ```

mod error_code;
mod parse_error;

pub(crate) use parse_error::Result;

pub use error_code::ErrorCode;
pub use parse_error::{ParserError, SourceLocation};
