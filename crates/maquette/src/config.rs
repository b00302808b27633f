//! Configuration types for building Maquette workspaces.
//!
//! All types implement [`serde::Deserialize`] so hosts can load them from
//! external sources such as a TOML configuration file.
//!
//! # Example
//!
//! ```
//! # use maquette::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(!config.parser().restricted());
//! ```

use serde::Deserialize;

use maquette_parser::Feature;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified parser configuration.
    pub fn new(parser: ParserConfig) -> Self {
        Self { parser }
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Returns the parser configuration for modification.
    pub fn parser_mut(&mut self) -> &mut ParserConfig {
        &mut self.parser
    }
}

/// Parser behavior configuration.
///
/// Controls restricted mode and which optional language features are
/// switched off before parsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParserConfig {
    /// Parse untrusted input: no filesystem access, no extensions.
    #[serde(default)]
    restricted: bool,

    /// Feature names to disable, as spelled in [`Feature`]'s `FromStr`.
    #[serde(default)]
    disabled_features: Vec<String>,
}

impl ParserConfig {
    /// Whether restricted mode is configured.
    pub fn restricted(&self) -> bool {
        self.restricted
    }

    /// Switch restricted mode on or off.
    pub fn set_restricted(&mut self, restricted: bool) {
        self.restricted = restricted;
    }

    /// Returns the parsed set of disabled features.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first feature string that does not
    /// match a known [`Feature`].
    pub fn disabled_features(&self) -> Result<Vec<Feature>, String> {
        self.disabled_features
            .iter()
            .map(|name| name.parse())
            .collect()
    }
}
