//! Per-parser capability flags.
//!
//! Every capability starts enabled. Callers can switch individual features
//! off before parsing untrusted input; statement parsers check the gate
//! before acting and raise a distinguished error when it is closed, so
//! callers can tell "not allowed here" from "malformed".

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorCode, ParserError, Result};

/// A capability that can be switched off per parser instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// The `archetypes` block and archetype-based element creation.
    Archetypes,
    /// The `!components` block.
    ComponentFinder,
    /// The `!decisions` statement.
    Decisions,
    /// Reading files and directories, for includes, documentation and
    /// image content.
    FileSystem,
    /// Fetching `http://` URLs.
    Http,
    /// Fetching `https://` URLs.
    Https,
    /// The `!include` statement.
    Include,
    /// The `!plugin` statement.
    Plugins,
    /// The `!script` statement.
    Scripts,
}

impl Feature {
    fn name(self) -> &'static str {
        match self {
            Feature::Archetypes => "archetypes",
            Feature::ComponentFinder => "component finder",
            Feature::Decisions => "decisions",
            Feature::FileSystem => "file system",
            Feature::Http => "http",
            Feature::Https => "https",
            Feature::Include => "include",
            Feature::Plugins => "plugins",
            Feature::Scripts => "scripts",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = String;

    /// Parses the configuration-file spelling of a feature name,
    /// case-insensitively.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "archetypes" => Ok(Feature::Archetypes),
            "componentfinder" => Ok(Feature::ComponentFinder),
            "decisions" => Ok(Feature::Decisions),
            "filesystem" => Ok(Feature::FileSystem),
            "http" => Ok(Feature::Http),
            "https" => Ok(Feature::Https),
            "include" => Ok(Feature::Include),
            "plugins" => Ok(Feature::Plugins),
            "scripts" => Ok(Feature::Scripts),
            _ => Err(format!("unknown feature \"{s}\"")),
        }
    }
}

/// The capability flags for one parser instance.
#[derive(Debug, Clone, Default)]
pub(crate) struct Features {
    disabled: HashSet<Feature>,
}

impl Features {
    pub(crate) fn enable(&mut self, feature: Feature) {
        self.disabled.remove(&feature);
    }

    pub(crate) fn disable(&mut self, feature: Feature) {
        self.disabled.insert(feature);
    }

    pub(crate) fn is_enabled(&self, feature: Feature) -> bool {
        !self.disabled.contains(&feature)
    }

    /// Error with a feature-gated code if `feature` is disabled.
    pub(crate) fn check(&self, feature: Feature) -> Result<()> {
        if self.is_enabled(feature) {
            Ok(())
        } else {
            Err(ParserError::new(
                ErrorCode::E400,
                format!("the {feature} feature is not enabled"),
            ))
        }
    }

    /// Check the gate matching a URL's scheme.
    pub(crate) fn check_url(&self, url: &str) -> Result<()> {
        if url.starts_with("https://") {
            self.check(Feature::Https)
        } else if url.starts_with("http://") {
            self.check(Feature::Http)
        } else {
            Ok(())
        }
    }
}

/// Error raised by statements that restricted mode forbids.
pub(crate) fn restricted_mode_error(what: &str) -> ParserError {
    ParserError::new(
        ErrorCode::E401,
        format!("{what} is not permitted in restricted mode"),
    )
}
