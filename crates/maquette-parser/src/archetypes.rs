//! Archetypes, reusable bundles of element defaults.
//!
//! An archetype names a set of default description, technology and tags
//! for one element kind. Element statements whose keyword matches an
//! archetype name apply those defaults; explicit tokens on the line win
//! field by field, while tags are unioned. Archetypes are applied by
//! value at element-creation time, so editing one later never touches
//! elements that were already created from it.

use indexmap::IndexMap;

use maquette_core::identifier::Id;

use crate::error::{ErrorCode, ParserError, Result};
use crate::identifiers::validate_identifier;

/// The element kinds an archetype can be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArchetypeKind {
    Person,
    SoftwareSystem,
    Container,
    Component,
    DeploymentNode,
    InfrastructureNode,
    Group,
}

impl ArchetypeKind {
    /// The kind for an element keyword, matched case-insensitively.
    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_lowercase().as_str() {
            "person" => Some(ArchetypeKind::Person),
            "softwaresystem" => Some(ArchetypeKind::SoftwareSystem),
            "container" => Some(ArchetypeKind::Container),
            "component" => Some(ArchetypeKind::Component),
            "deploymentnode" => Some(ArchetypeKind::DeploymentNode),
            "infrastructurenode" => Some(ArchetypeKind::InfrastructureNode),
            "group" => Some(ArchetypeKind::Group),
            _ => None,
        }
    }

    /// Whether this kind's statement grammar carries a technology token.
    ///
    /// Archetype technology is only applied to kinds that could also have
    /// set it on the line, so a person archetype with a technology leaves
    /// people untouched.
    pub(crate) fn has_technology(self) -> bool {
        matches!(
            self,
            ArchetypeKind::Container
                | ArchetypeKind::Component
                | ArchetypeKind::DeploymentNode
                | ArchetypeKind::InfrastructureNode
        )
    }
}

/// The default attributes one archetype contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Archetype {
    pub(crate) description: Option<String>,
    pub(crate) technology: Option<String>,
    pub(crate) tags: Vec<String>,
}

impl Archetype {
    /// Add comma-separated tags, trimming each and skipping blanks.
    pub(crate) fn add_tags(&mut self, tags: &str) {
        for tag in tags.split(',') {
            let tag = tag.trim();
            if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.to_owned());
            }
        }
    }
}

/// All archetypes declared so far, by lowercased name.
#[derive(Debug, Default)]
pub(crate) struct Archetypes {
    entries: IndexMap<Id, (ArchetypeKind, Archetype)>,
}

impl Archetypes {
    /// Declare an archetype from a base, which is either an element kind
    /// keyword or the name of an already declared archetype of which a
    /// copy is taken. Redeclaring a name replaces it.
    pub(crate) fn declare(&mut self, name: &str, base: &str) -> Result<Id> {
        validate_identifier(name)?;
        let entry = if let Some(kind) = ArchetypeKind::from_keyword(base) {
            (kind, Archetype::default())
        } else if let Some((kind, archetype)) = self.get(base) {
            (kind, archetype.clone())
        } else {
            return Err(ParserError::new(
                ErrorCode::E204,
                format!("\"{base}\" is not an element kind or a declared archetype"),
            ));
        };
        let id = Id::new(name);
        self.entries.insert(id, entry);
        Ok(id)
    }

    /// Look up an archetype by name, case-insensitively.
    pub(crate) fn get(&self, name: &str) -> Option<(ArchetypeKind, &Archetype)> {
        self.entries
            .get(&Id::new(name))
            .map(|(kind, archetype)| (*kind, archetype))
    }

    pub(crate) fn get_mut(&mut self, id: Id) -> Option<&mut Archetype> {
        self.entries.get_mut(&id).map(|(_, archetype)| archetype)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_from_an_element_kind() {
        let mut archetypes = Archetypes::default();
        archetypes.declare("queue", "container").unwrap();
        let (kind, archetype) = archetypes.get("queue").unwrap();
        assert_eq!(kind, ArchetypeKind::Container);
        assert_eq!(archetype, &Archetype::default());
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let mut archetypes = Archetypes::default();
        archetypes.declare("q", "softwareSystem").unwrap();
        assert_eq!(archetypes.get("q").unwrap().0, ArchetypeKind::SoftwareSystem);
        archetypes.declare("r", "SOFTWARESYSTEM").unwrap();
        assert_eq!(archetypes.get("r").unwrap().0, ArchetypeKind::SoftwareSystem);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut archetypes = Archetypes::default();
        archetypes.declare("Queue", "container").unwrap();
        assert!(archetypes.get("queue").is_some());
        assert!(archetypes.get("QUEUE").is_some());
    }

    #[test]
    fn extending_copies_the_base_forward() {
        let mut archetypes = Archetypes::default();
        let base = archetypes.declare("queue", "container").unwrap();
        {
            let archetype = archetypes.get_mut(base).unwrap();
            archetype.technology = Some("RabbitMQ".to_owned());
            archetype.add_tags("Queue");
        }

        let derived = archetypes.declare("orders-queue", "queue").unwrap();
        {
            let archetype = archetypes.get_mut(derived).unwrap();
            archetype.add_tags("Orders");
        }

        let (kind, derived) = archetypes.get("orders-queue").unwrap();
        assert_eq!(kind, ArchetypeKind::Container);
        assert_eq!(derived.technology.as_deref(), Some("RabbitMQ"));
        assert_eq!(derived.tags, ["Queue", "Orders"]);

        // The base is unchanged by edits to the copy.
        assert_eq!(archetypes.get("queue").unwrap().1.tags, ["Queue"]);
    }

    #[test]
    fn unknown_bases_are_rejected() {
        let mut archetypes = Archetypes::default();
        let err = archetypes.declare("q", "message-bus").unwrap_err();
        assert_eq!(err.code(), ErrorCode::E204);
    }

    #[test]
    fn redeclaring_replaces() {
        let mut archetypes = Archetypes::default();
        let first = archetypes.declare("q", "container").unwrap();
        archetypes.get_mut(first).unwrap().add_tags("Old");
        archetypes.declare("q", "person").unwrap();
        let (kind, archetype) = archetypes.get("q").unwrap();
        assert_eq!(kind, ArchetypeKind::Person);
        assert!(archetype.tags.is_empty());
    }

    #[test]
    fn tags_accumulate_without_duplicates() {
        let mut archetype = Archetype::default();
        archetype.add_tags("a, b");
        archetype.add_tags("b,c");
        archetype.add_tags(" , ");
        assert_eq!(archetype.tags, ["a", "b", "c"]);
    }

    #[test]
    fn technology_applies_per_kind() {
        assert!(ArchetypeKind::Container.has_technology());
        assert!(ArchetypeKind::InfrastructureNode.has_technology());
        assert!(!ArchetypeKind::Person.has_technology());
        assert!(!ArchetypeKind::Group.has_technology());
    }
}
