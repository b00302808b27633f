//! Relationship types for the architecture model.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::model::element::{ElementId, Perspective};

/// Stable handle to a relationship stored in a [`Model`](super::Model).
///
/// Removed relationships are tombstoned rather than dropped, so a handle
/// stays valid for the lifetime of the model that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipId(pub(crate) usize);

impl RelationshipId {
    /// Numeric position of this relationship in the model.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// A directed relationship between two model elements.
#[derive(Debug, Clone)]
pub struct Relationship {
    id: RelationshipId,
    source: ElementId,
    destination: ElementId,
    description: String,
    technology: String,
    url: String,
    tags: IndexSet<String>,
    properties: IndexMap<String, String>,
    perspectives: IndexMap<String, Perspective>,
    linked_to: Option<RelationshipId>,
    removed: bool,
}

impl Relationship {
    pub(crate) fn new(
        id: RelationshipId,
        source: ElementId,
        destination: ElementId,
        description: &str,
    ) -> Self {
        let mut tags = IndexSet::new();
        tags.insert("Relationship".to_owned());
        Self {
            id,
            source,
            destination,
            description: description.to_owned(),
            technology: String::new(),
            url: String::new(),
            tags,
            properties: IndexMap::new(),
            perspectives: IndexMap::new(),
            linked_to: None,
            removed: false,
        }
    }

    pub fn id(&self) -> RelationshipId {
        self.id
    }

    pub fn source(&self) -> ElementId {
        self.source
    }

    pub fn destination(&self) -> ElementId {
        self.destination
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn technology(&self) -> &str {
        &self.technology
    }

    pub fn set_technology(&mut self, technology: &str) {
        self.technology = technology.to_owned();
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_owned();
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() {
            self.tags.insert(tag.to_owned());
        }
    }

    /// Adds every tag in a comma-separated list.
    pub fn add_tags(&mut self, tags: &str) {
        for tag in tags.split(',') {
            self.add_tag(tag);
        }
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn add_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_owned(), value.to_owned());
    }

    pub fn perspectives(&self) -> &IndexMap<String, Perspective> {
        &self.perspectives
    }

    pub fn add_perspective(&mut self, name: &str, description: &str, value: &str) {
        self.perspectives.insert(
            name.to_owned(),
            Perspective {
                description: description.to_owned(),
                value: value.to_owned(),
            },
        );
    }

    /// The relationship this one was derived from, set on instance replicas
    /// and implied relationships.
    pub fn linked_to(&self) -> Option<RelationshipId> {
        self.linked_to
    }

    pub(crate) fn set_linked_to(&mut self, linked_to: RelationshipId) {
        self.linked_to = Some(linked_to);
    }

    /// Whether this relationship has been removed from the model.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} \"{}\"",
            self.source, self.destination, self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_relationship_tag() {
        let relationship =
            Relationship::new(RelationshipId(0), ElementId(0), ElementId(1), "Uses");
        assert!(relationship.has_tag("Relationship"));
        assert!(!relationship.is_removed());
        assert_eq!(relationship.linked_to(), None);
    }

    #[test]
    fn add_tags_accumulates() {
        let mut relationship =
            Relationship::new(RelationshipId(0), ElementId(0), ElementId(1), "Uses");
        relationship.add_tags("Async,HTTPS");
        relationship.add_tags("Async");
        let tags: Vec<&str> = relationship.tags().collect();
        assert_eq!(tags, vec!["Relationship", "Async", "HTTPS"]);
    }
}
