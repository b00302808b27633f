//! Element types for the architecture model.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

/// Stable handle to an element stored in a [`Model`](super::Model).
///
/// Handles are plain indices into the model's element arena. Elements are
/// never removed, so a handle stays valid for the lifetime of the model that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Numeric position of this element in the model.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// Instance bookkeeping shared by software system and container instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceData {
    /// The static-model element this instance wraps.
    pub base: ElementId,
    /// Ordinal among instances of the same base element within one
    /// deployment environment, starting at 1.
    pub instance_id: u32,
    /// Deployment groups this instance belongs to. Empty means the default
    /// group.
    pub deployment_groups: Vec<String>,
}

/// The kind of a model element.
///
/// Groups and deployment environments are pseudo-elements: they never take
/// part in relationships but live in the same arena so that identifiers,
/// styling and expression matching treat them uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Person,
    SoftwareSystem,
    Container,
    Component,
    /// Custom element with a free-form metadata string.
    CustomElement { metadata: String },
    Group,
    DeploymentEnvironment,
    /// Deployment node with an instance-count specification such as `"1"`
    /// or `"0..N"`.
    DeploymentNode { instances: String },
    InfrastructureNode,
    SoftwareSystemInstance(InstanceData),
    ContainerInstance(InstanceData),
}

impl ElementKind {
    /// Type name used by `element.type==` expression matching.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Person => "Person",
            ElementKind::SoftwareSystem => "SoftwareSystem",
            ElementKind::Container => "Container",
            ElementKind::Component => "Component",
            ElementKind::CustomElement { .. } => "CustomElement",
            ElementKind::Group => "Group",
            ElementKind::DeploymentEnvironment => "DeploymentEnvironment",
            ElementKind::DeploymentNode { .. } => "DeploymentNode",
            ElementKind::InfrastructureNode => "InfrastructureNode",
            ElementKind::SoftwareSystemInstance(_) => "SoftwareSystemInstance",
            ElementKind::ContainerInstance(_) => "ContainerInstance",
        }
    }

    /// Tags every element of this kind starts with.
    pub fn default_tags(&self) -> &'static [&'static str] {
        match self {
            ElementKind::Person => &["Element", "Person"],
            ElementKind::SoftwareSystem => &["Element", "Software System"],
            ElementKind::Container => &["Element", "Container"],
            ElementKind::Component => &["Element", "Component"],
            ElementKind::CustomElement { .. } => &["Element"],
            ElementKind::Group => &["Element", "Group"],
            ElementKind::DeploymentEnvironment => &[],
            ElementKind::DeploymentNode { .. } => &["Element", "Deployment Node"],
            ElementKind::InfrastructureNode => &["Element", "Infrastructure Node"],
            ElementKind::SoftwareSystemInstance(_) => &["Software System Instance"],
            ElementKind::ContainerInstance(_) => &["Container Instance"],
        }
    }

    /// Whether elements of this kind belong to the static structure model
    /// (as opposed to deployment elements and pseudo-elements).
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            ElementKind::Person
                | ElementKind::SoftwareSystem
                | ElementKind::Container
                | ElementKind::Component
                | ElementKind::CustomElement { .. }
        )
    }

    /// Whether this is a software system or container instance.
    pub fn is_instance(&self) -> bool {
        matches!(
            self,
            ElementKind::SoftwareSystemInstance(_) | ElementKind::ContainerInstance(_)
        )
    }
}

/// A named perspective on an element or relationship, such as "Security" or
/// "Performance".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Perspective {
    pub description: String,
    pub value: String,
}

/// A single element in the architecture model.
///
/// All kinds share the same attribute surface; kind-specific payloads live in
/// [`ElementKind`]. Attribute setters overwrite, matching the "later value
/// wins" rule used when a workspace is extended.
#[derive(Debug, Clone)]
pub struct Element {
    id: ElementId,
    kind: ElementKind,
    name: String,
    description: String,
    technology: String,
    url: String,
    tags: IndexSet<String>,
    properties: IndexMap<String, String>,
    perspectives: IndexMap<String, Perspective>,
    parent: Option<ElementId>,
    group: Option<ElementId>,
}

impl Element {
    pub(crate) fn new(id: ElementId, kind: ElementKind, name: &str) -> Self {
        let tags = kind
            .default_tags()
            .iter()
            .map(|tag| (*tag).to_owned())
            .collect();
        Self {
            id,
            kind,
            name: name.to_owned(),
            description: String::new(),
            technology: String::new(),
            url: String::new(),
            tags,
            properties: IndexMap::new(),
            perspectives: IndexMap::new(),
            parent: None,
            group: None,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
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

    /// Tags in insertion order, default tags first.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Adds a tag, ignoring duplicates and blank entries.
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

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.shift_remove(tag.trim());
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

    /// Structural parent. Groups are not structural parents; see
    /// [`Element::group`].
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ElementId>) {
        self.parent = parent;
    }

    /// Innermost group pseudo-element this element was declared in, if any.
    pub fn group(&self) -> Option<ElementId> {
        self.group
    }

    pub(crate) fn set_group(&mut self, group: Option<ElementId>) {
        self.group = group;
    }

    /// The static-model element this instance wraps, for software system and
    /// container instances.
    pub fn base(&self) -> Option<ElementId> {
        match &self.kind {
            ElementKind::SoftwareSystemInstance(data) | ElementKind::ContainerInstance(data) => {
                Some(data.base)
            }
            _ => None,
        }
    }

    /// Deployment groups for instances, the empty slice for everything else.
    pub fn deployment_groups(&self) -> &[String] {
        match &self.kind {
            ElementKind::SoftwareSystemInstance(data) | ElementKind::ContainerInstance(data) => {
                &data.deployment_groups
            }
            _ => &[],
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind.type_name(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tags_applied_on_creation() {
        let element = Element::new(ElementId(0), ElementKind::SoftwareSystem, "Bank");
        assert!(element.has_tag("Element"));
        assert!(element.has_tag("Software System"));
        assert!(!element.has_tag("Person"));
    }

    #[test]
    fn add_tags_splits_on_comma_and_deduplicates() {
        let mut element = Element::new(ElementId(0), ElementKind::Person, "User");
        element.add_tags("External, VIP ,External");
        let tags: Vec<&str> = element.tags().collect();
        assert_eq!(tags, vec!["Element", "Person", "External", "VIP"]);
    }

    #[test]
    fn add_tag_ignores_blank() {
        let mut element = Element::new(ElementId(0), ElementKind::Person, "User");
        element.add_tags(" , ,");
        assert_eq!(element.tags().count(), 2);
    }

    #[test]
    fn instance_accessors() {
        let data = InstanceData {
            base: ElementId(3),
            instance_id: 2,
            deployment_groups: vec!["Group A".to_owned()],
        };
        let element = Element::new(ElementId(9), ElementKind::ContainerInstance(data), "API");
        assert_eq!(element.base(), Some(ElementId(3)));
        assert_eq!(element.deployment_groups(), ["Group A".to_owned()]);
        assert!(element.kind().is_instance());
        assert!(!element.kind().is_static());
    }

    #[test]
    fn perspectives_keyed_by_name() {
        let mut element = Element::new(ElementId(0), ElementKind::Container, "API");
        element.add_perspective("Security", "TLS everywhere", "");
        element.add_perspective("Security", "mTLS everywhere", "high");
        assert_eq!(element.perspectives().len(), 1);
        assert_eq!(
            element.perspectives()["Security"].description,
            "mTLS everywhere"
        );
    }
}
