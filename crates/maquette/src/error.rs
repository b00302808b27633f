//! Error types for Maquette operations.
//!
//! This module provides the main error type [`MaquetteError`] which wraps
//! the error conditions that can occur while building a workspace.

use std::io;

use thiserror::Error;

use maquette_parser::ParserError;

/// The main error type for Maquette operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the structured parser error together with
/// the source it was raised against, so callers can produce rich reports
/// with the offending line and help text.
#[derive(Debug, Error)]
pub enum MaquetteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParserError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl MaquetteError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParserError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
