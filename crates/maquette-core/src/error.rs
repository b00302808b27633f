//! Error types for model operations.

use thiserror::Error;

/// Errors raised by mutations of the model, views and styles.
///
/// Every variant names the thing that clashed or was misused; callers attach
/// source locations where they have them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("a {kind} named \"{name}\" already exists")]
    DuplicateElement { kind: &'static str, name: String },

    #[error("{child} cannot be added to {parent}")]
    InvalidParent { child: String, parent: String },

    // The field cannot be called `source`: thiserror reserves that name for
    // the `Error::source()` cause, and `String` is not an error type.
    #[error("a relationship between {source_name} and {destination} is not permitted")]
    RelationshipNotPermitted {
        source_name: String,
        destination: String,
    },

    #[error("a view with the key \"{key}\" already exists")]
    DuplicateViewKey { key: String },

    #[error("an element style for the tag \"{tag}\" already exists")]
    DuplicateElementStyle { tag: String },

    #[error("a relationship style for the tag \"{tag}\" already exists")]
    DuplicateRelationshipStyle { tag: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_clash() {
        let err = ModelError::DuplicateElement {
            kind: "person",
            name: "User".to_owned(),
        };
        assert_eq!(err.to_string(), "a person named \"User\" already exists");

        let err = ModelError::DuplicateViewKey {
            key: "SystemContext-1".to_owned(),
        };
        assert!(err.to_string().contains("SystemContext-1"));
    }
}
