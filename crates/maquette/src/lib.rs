//! Maquette - a compiler for textual software architecture workspaces.
//!
//! Parsing and export for the Maquette architecture description language.
//! A workspace source is parsed into the model/views types of
//! [`maquette_core`], which hosts can then inspect, export or feed into
//! their own tooling.

pub mod config;

mod error;
mod export;

pub use maquette_core::{Workspace, color, documentation, identifier, model, views};
pub use maquette_parser::{Feature, Parser, ParserError};

pub use error::MaquetteError;
pub use export::text::TextDumper;

use std::fs;
use std::path::Path;

use log::{debug, info};

use config::AppConfig;

/// Builder for parsing Maquette workspaces.
///
/// Applies an [`AppConfig`] to a fresh [`Parser`] per parse, so one builder
/// can process any number of independent sources.
///
/// # Examples
///
/// ```
/// use maquette::{WorkspaceBuilder, config::AppConfig};
///
/// let source = r#"
/// workspace "Shop" {
///     model {
///         customer = person "Customer"
///     }
/// }
/// "#;
///
/// let builder = WorkspaceBuilder::new(AppConfig::default());
/// let workspace = builder.parse(source).expect("Failed to parse");
/// assert_eq!(workspace.name(), "Shop");
/// ```
#[derive(Default)]
pub struct WorkspaceBuilder {
    config: AppConfig,
}

impl WorkspaceBuilder {
    /// Create a new workspace builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Parse source text into a workspace.
    ///
    /// # Errors
    ///
    /// Returns `MaquetteError` for syntax errors, semantic errors raised
    /// by the statements, or a configuration that names unknown features.
    pub fn parse(&self, source: &str) -> Result<Workspace, MaquetteError> {
        info!("Parsing workspace");

        let mut parser = self.configured_parser()?;
        parser
            .parse_str(source)
            .map_err(|err| MaquetteError::new_parse_error(err, source))?;
        let workspace = self.finish(parser)?;

        debug!(name = workspace.name(); "Workspace parsed successfully");
        Ok(workspace)
    }

    /// Parse a workspace file, resolving relative `!include` targets
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns `MaquetteError` for I/O failures and everything
    /// [`WorkspaceBuilder::parse`] can raise.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Workspace, MaquetteError> {
        let path = path.as_ref();
        info!(path:? = path; "Parsing workspace file");

        let mut parser = self.configured_parser()?;
        if let Err(err) = parser.parse_file(path) {
            let src = fs::read_to_string(path).unwrap_or_default();
            return Err(MaquetteError::new_parse_error(err, src));
        }
        let workspace = self.finish(parser)?;

        debug!(name = workspace.name(); "Workspace parsed successfully");
        Ok(workspace)
    }

    /// Dump a workspace as plain text.
    pub fn dump_text(&self, workspace: &Workspace) -> String {
        TextDumper::new().dump(workspace)
    }

    fn configured_parser(&self) -> Result<Parser, MaquetteError> {
        let mut parser = Parser::new();
        parser.set_restricted(self.config.parser().restricted());
        let disabled = self
            .config
            .parser()
            .disabled_features()
            .map_err(MaquetteError::Config)?;
        for feature in disabled {
            parser.disable_feature(feature);
        }
        Ok(parser)
    }

    fn finish(&self, parser: Parser) -> Result<Workspace, MaquetteError> {
        parser
            .into_workspace()
            .ok_or_else(|| MaquetteError::Model("the source defines no workspace".to_owned()))
    }
}
