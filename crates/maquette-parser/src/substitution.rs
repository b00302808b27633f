//! Constants, variables and `${name}` substitution.
//!
//! Tokens are substituted after tokenization, so a replacement never
//! changes how a line splits into tokens. Declared names win over OS
//! environment variables; the environment fallback is switched off
//! entirely in restricted mode.

use indexmap::IndexMap;

use crate::error::{ErrorCode, ParserError, Result};

/// How a name/value pair was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameValueKind {
    /// Declared with `!const`. Write-once.
    Constant,
    /// Declared with `!var`. Later declarations overwrite earlier ones.
    Variable,
}

#[derive(Debug, Clone)]
struct NameValue {
    value: String,
    kind: NameValueKind,
}

/// Declared constants and variables, in declaration order.
#[derive(Debug, Default)]
pub(crate) struct NameValues {
    entries: IndexMap<String, NameValue>,
}

impl NameValues {
    /// Declare a constant or variable.
    ///
    /// A constant may not reuse any existing name, and nothing may
    /// overwrite a constant. A variable may overwrite a variable.
    pub(crate) fn declare(&mut self, name: &str, value: &str, kind: NameValueKind) -> Result<()> {
        if !is_valid_name(name) {
            return Err(ParserError::new(
                ErrorCode::E102,
                format!("invalid name \"{name}\""),
            )
            .with_help("names may only contain letters, digits, `-`, `_` and `.`"));
        }

        let taken = match kind {
            NameValueKind::Constant => self.entries.contains_key(name),
            NameValueKind::Variable => self
                .entries
                .get(name)
                .is_some_and(|existing| existing.kind == NameValueKind::Constant),
        };
        if taken {
            return Err(ParserError::new(
                ErrorCode::E503,
                format!("a constant or variable named \"{name}\" already exists"),
            ));
        }

        self.entries.insert(
            name.to_owned(),
            NameValue {
                value: value.to_owned(),
                kind,
            },
        );
        Ok(())
    }

    /// The declared value for `name`, if any.
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.value.as_str())
    }

    /// Replace every `${name}` occurrence in `token`.
    ///
    /// Declared names are tried first, then the OS environment when
    /// `use_environment` is set. An unknown or malformed reference is left
    /// in place unchanged.
    pub(crate) fn substitute(&self, token: &str, use_environment: bool) -> String {
        let mut result = String::with_capacity(token.len());
        let mut rest = token;

        while let Some(start) = rest.find("${") {
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                break;
            };
            let name = &after[..end];
            result.push_str(&rest[..start]);
            match self.lookup(name, use_environment) {
                Some(value) => result.push_str(&value),
                None => {
                    result.push_str("${");
                    result.push_str(name);
                    result.push('}');
                }
            }
            rest = &after[end + 1..];
        }

        result.push_str(rest);
        result
    }

    fn lookup(&self, name: &str, use_environment: bool) -> Option<String> {
        if !is_valid_name(name) {
            return None;
        }
        if let Some(entry) = self.entries.get(name) {
            return Some(entry.value.clone());
        }
        if use_environment {
            std::env::var(name).ok()
        } else {
            None
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
