//! The [`Model`] container and its add/query operations.
//!
//! The model is an arena of elements plus an arena of relationships.
//! Elements are never removed; relationships are tombstoned so that every
//! handle handed out stays valid. All mutation goes through methods here,
//! which enforce sibling name uniqueness and the table of permitted
//! relationship kind pairs.

use log::debug;

use crate::{
    error::ModelError,
    model::{
        element::{Element, ElementId, ElementKind, InstanceData},
        implied::{ImpliedRelationshipsStrategy, NoImpliedRelationships},
        relationship::{Relationship, RelationshipId},
    },
};

/// Deployment group instances belong to when none is declared.
pub const DEFAULT_DEPLOYMENT_GROUP: &str = "Default";

/// The software architecture model: a growing graph of elements and
/// relationships.
///
/// # Examples
///
/// ```
/// use maquette_core::model::Model;
///
/// let mut model = Model::new();
/// let a = model.add_software_system("A", "").unwrap();
/// let b = model.add_software_system("B", "").unwrap();
/// let uses = model.uses(a, b, "Sends data to", "", "").unwrap();
/// assert!(uses.is_some());
///
/// // The same relationship again is reported as a duplicate, not re-created
/// assert!(model.uses(a, b, "Sends data to", "", "").unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct Model {
    elements: Vec<Element>,
    relationships: Vec<Relationship>,
    implied_strategy: Box<dyn ImpliedRelationshipsStrategy>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            relationships: Vec::new(),
            implied_strategy: Box::new(NoImpliedRelationships),
        }
    }

    /// Replaces the strategy used to synthesize implied relationships for
    /// subsequently added static relationships.
    pub fn set_implied_relationships_strategy(
        &mut self,
        strategy: Box<dyn ImpliedRelationshipsStrategy>,
    ) {
        self.implied_strategy = strategy;
    }

    // -------------------------------------------------------------------
    // Element creation
    // -------------------------------------------------------------------

    pub fn add_person(&mut self, name: &str, description: &str) -> Result<ElementId, ModelError> {
        self.check_unique_sibling(None, name, "person")?;
        let id = self.push_element(ElementKind::Person, name, None);
        self.elements[id.0].set_description(description);
        Ok(id)
    }

    pub fn add_software_system(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<ElementId, ModelError> {
        self.check_unique_sibling(None, name, "software system")?;
        let id = self.push_element(ElementKind::SoftwareSystem, name, None);
        self.elements[id.0].set_description(description);
        Ok(id)
    }

    pub fn add_custom_element(
        &mut self,
        name: &str,
        metadata: &str,
        description: &str,
    ) -> Result<ElementId, ModelError> {
        self.check_unique_sibling(None, name, "custom element")?;
        let kind = ElementKind::CustomElement {
            metadata: metadata.to_owned(),
        };
        let id = self.push_element(kind, name, None);
        self.elements[id.0].set_description(description);
        Ok(id)
    }

    pub fn add_container(
        &mut self,
        system: ElementId,
        name: &str,
        description: &str,
        technology: &str,
    ) -> Result<ElementId, ModelError> {
        self.check_parent_kind(system, ElementKind::SoftwareSystem.type_name(), |kind| {
            matches!(kind, ElementKind::SoftwareSystem)
        })?;
        self.check_unique_sibling(Some(system), name, "container")?;
        let id = self.push_element(ElementKind::Container, name, Some(system));
        self.elements[id.0].set_description(description);
        self.elements[id.0].set_technology(technology);
        Ok(id)
    }

    pub fn add_component(
        &mut self,
        container: ElementId,
        name: &str,
        description: &str,
        technology: &str,
    ) -> Result<ElementId, ModelError> {
        self.check_parent_kind(container, ElementKind::Container.type_name(), |kind| {
            matches!(kind, ElementKind::Container)
        })?;
        self.check_unique_sibling(Some(container), name, "component")?;
        let id = self.push_element(ElementKind::Component, name, Some(container));
        self.elements[id.0].set_description(description);
        self.elements[id.0].set_technology(technology);
        Ok(id)
    }

    pub fn add_deployment_environment(&mut self, name: &str) -> Result<ElementId, ModelError> {
        self.check_unique_sibling(None, name, "deployment environment")?;
        Ok(self.push_element(ElementKind::DeploymentEnvironment, name, None))
    }

    /// Adds a deployment node under a deployment environment or another
    /// deployment node.
    pub fn add_deployment_node(
        &mut self,
        parent: ElementId,
        name: &str,
        description: &str,
        technology: &str,
        instances: &str,
    ) -> Result<ElementId, ModelError> {
        self.check_parent_kind(parent, "DeploymentEnvironment or DeploymentNode", |kind| {
            matches!(
                kind,
                ElementKind::DeploymentEnvironment | ElementKind::DeploymentNode { .. }
            )
        })?;
        self.check_unique_sibling(Some(parent), name, "deployment node")?;
        let kind = ElementKind::DeploymentNode {
            instances: instances.to_owned(),
        };
        let id = self.push_element(kind, name, Some(parent));
        self.elements[id.0].set_description(description);
        self.elements[id.0].set_technology(technology);
        Ok(id)
    }

    pub fn add_infrastructure_node(
        &mut self,
        parent: ElementId,
        name: &str,
        description: &str,
        technology: &str,
    ) -> Result<ElementId, ModelError> {
        self.check_parent_kind(parent, "DeploymentNode", |kind| {
            matches!(kind, ElementKind::DeploymentNode { .. })
        })?;
        self.check_unique_sibling(Some(parent), name, "infrastructure node")?;
        let id = self.push_element(ElementKind::InfrastructureNode, name, Some(parent));
        self.elements[id.0].set_description(description);
        self.elements[id.0].set_technology(technology);
        Ok(id)
    }

    /// Adds an instance of a software system to a deployment node and
    /// replicates the system's static relationships onto instances living in
    /// an intersecting deployment group.
    pub fn add_software_system_instance(
        &mut self,
        node: ElementId,
        system: ElementId,
        deployment_groups: Vec<String>,
    ) -> Result<ElementId, ModelError> {
        self.check_parent_kind(node, "DeploymentNode", |kind| {
            matches!(kind, ElementKind::DeploymentNode { .. })
        })?;
        if !matches!(self.elements[system.0].kind(), ElementKind::SoftwareSystem) {
            return Err(ModelError::InvalidParent {
                child: self.elements[system.0].to_string(),
                parent: "a software system instance".to_owned(),
            });
        }
        self.add_instance(node, system, deployment_groups, true)
    }

    /// Adds an instance of a container to a deployment node. See
    /// [`Model::add_software_system_instance`] for replication semantics.
    pub fn add_container_instance(
        &mut self,
        node: ElementId,
        container: ElementId,
        deployment_groups: Vec<String>,
    ) -> Result<ElementId, ModelError> {
        self.check_parent_kind(node, "DeploymentNode", |kind| {
            matches!(kind, ElementKind::DeploymentNode { .. })
        })?;
        if !matches!(self.elements[container.0].kind(), ElementKind::Container) {
            return Err(ModelError::InvalidParent {
                child: self.elements[container.0].to_string(),
                parent: "a container instance".to_owned(),
            });
        }
        self.add_instance(node, container, deployment_groups, false)
    }

    /// Returns the group pseudo-element with the given full name under the
    /// given structural parent, creating it on first use.
    pub fn ensure_group(
        &mut self,
        parent: Option<ElementId>,
        enclosing: Option<ElementId>,
        name: &str,
    ) -> ElementId {
        let existing = self.elements.iter().find(|element| {
            matches!(element.kind(), ElementKind::Group)
                && element.parent() == parent
                && element.name() == name
        });
        if let Some(element) = existing {
            return element.id();
        }
        let id = self.push_element(ElementKind::Group, name, parent);
        self.elements[id.0].set_group(enclosing);
        id
    }

    /// Records the innermost group an element was declared in.
    pub fn set_group(&mut self, element: ElementId, group: Option<ElementId>) {
        self.elements[element.0].set_group(group);
    }

    // -------------------------------------------------------------------
    // Relationships
    // -------------------------------------------------------------------

    /// Adds a relationship between two elements.
    ///
    /// Returns `Ok(None)` when a live relationship with the same source,
    /// destination and description already exists; callers decide whether
    /// that duplicate is an error. On success any implied relationships
    /// proposed by the configured strategy are created alongside, linked to
    /// the new relationship.
    pub fn uses(
        &mut self,
        source: ElementId,
        destination: ElementId,
        description: &str,
        technology: &str,
        tags: &str,
    ) -> Result<Option<RelationshipId>, ModelError> {
        let source_kind = self.elements[source.0].kind();
        let destination_kind = self.elements[destination.0].kind();
        if !relationship_permitted(source_kind, destination_kind) {
            return Err(ModelError::RelationshipNotPermitted {
                source_name: self.elements[source.0].to_string(),
                destination: self.elements[destination.0].to_string(),
            });
        }
        if self.find_relationship(source, destination, description).is_some() {
            return Ok(None);
        }

        let id = self.push_relationship(source, destination, description);
        self.relationships[id.0].set_technology(technology);
        self.relationships[id.0].add_tags(tags);

        if self.elements[source.0].kind().is_static()
            && self.elements[destination.0].kind().is_static()
        {
            self.create_implied_relationships(id);
        }
        Ok(Some(id))
    }

    fn create_implied_relationships(&mut self, relationship: RelationshipId) {
        let proposals = self.implied_strategy.propose(self, relationship);
        if proposals.is_empty() {
            return;
        }
        let description = self.relationships[relationship.0].description().to_owned();
        let technology = self.relationships[relationship.0].technology().to_owned();
        let tags: Vec<String> = self.relationships[relationship.0]
            .tags()
            .map(str::to_owned)
            .collect();
        for (source, destination) in proposals {
            let id = self.push_relationship(source, destination, &description);
            self.relationships[id.0].set_technology(&technology);
            for tag in &tags {
                self.relationships[id.0].add_tag(tag);
            }
            self.relationships[id.0].set_linked_to(relationship);
            debug!(source = source.index(), destination = destination.index();
                "created implied relationship");
        }
    }

    /// Removes a relationship along with every relationship derived from it
    /// (instance replicas and implied relationships, transitively).
    pub fn remove_relationship(&mut self, id: RelationshipId) {
        let mut marked = vec![id];
        self.relationships[id.0].mark_removed();
        loop {
            let next: Vec<RelationshipId> = self
                .relationships
                .iter()
                .filter(|relationship| {
                    !relationship.is_removed()
                        && relationship
                            .linked_to()
                            .is_some_and(|linked| marked.contains(&linked))
                })
                .map(Relationship::id)
                .collect();
            if next.is_empty() {
                break;
            }
            for linked in &next {
                self.relationships[linked.0].mark_removed();
            }
            marked.extend(next);
        }
        debug!(count = marked.len(); "removed relationships");
    }

    // -------------------------------------------------------------------
    // Access and queries
    // -------------------------------------------------------------------

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }

    pub fn relationship(&self, id: RelationshipId) -> &Relationship {
        &self.relationships[id.0]
    }

    pub fn relationship_mut(&mut self, id: RelationshipId) -> &mut Relationship {
        &mut self.relationships[id.0]
    }

    /// All elements, pseudo-elements included, in creation order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Live relationships in creation order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .iter()
            .filter(|relationship| !relationship.is_removed())
    }

    /// Whether the model contains no elements at all. A freshly created
    /// workspace starts empty; one loaded for extension does not.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Direct structural children of an element.
    pub fn children(&self, parent: ElementId) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(move |element| element.parent() == Some(parent))
    }

    /// Walks the structural parent chain, innermost first, excluding the
    /// element itself.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut current = self.elements[id.0].parent();
        std::iter::from_fn(move || {
            let next = current?;
            current = self.elements[next.0].parent();
            Some(next)
        })
    }

    pub fn is_descendant_of(&self, id: ElementId, ancestor: ElementId) -> bool {
        self.ancestors(id).any(|candidate| candidate == ancestor)
    }

    /// Nearest enclosing deployment environment, if the element lives in one.
    pub fn environment_of(&self, id: ElementId) -> Option<ElementId> {
        if matches!(
            self.elements[id.0].kind(),
            ElementKind::DeploymentEnvironment
        ) {
            return Some(id);
        }
        self.ancestors(id).find(|candidate| {
            matches!(
                self.elements[candidate.0].kind(),
                ElementKind::DeploymentEnvironment
            )
        })
    }

    /// Whether an element was declared inside the given group, directly or
    /// through group nesting.
    pub fn in_group(&self, element: ElementId, group: ElementId) -> bool {
        let mut current = self.elements[element.0].group();
        while let Some(candidate) = current {
            if candidate == group {
                return true;
            }
            current = self.elements[candidate.0].group();
        }
        false
    }

    /// Elements declared inside a group, nested groups included.
    pub fn group_members(&self, group: ElementId) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|element| {
                !matches!(element.kind(), ElementKind::Group)
                    && self.in_group(element.id(), group)
            })
            .map(Element::id)
            .collect()
    }

    /// Finds a same-named child of `parent` (or a same-named top-level
    /// element when `parent` is `None`), skipping group pseudo-elements.
    pub fn find_element_by_name(&self, parent: Option<ElementId>, name: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|element| {
                element.parent() == parent
                    && element.name() == name
                    && !matches!(element.kind(), ElementKind::Group)
            })
            .map(Element::id)
    }

    /// Live relationships from `source` to `destination`.
    pub fn relationships_between(
        &self,
        source: ElementId,
        destination: ElementId,
    ) -> Vec<RelationshipId> {
        self.relationships()
            .filter(|relationship| {
                relationship.source() == source && relationship.destination() == destination
            })
            .map(Relationship::id)
            .collect()
    }

    fn find_relationship(
        &self,
        source: ElementId,
        destination: ElementId,
        description: &str,
    ) -> Option<RelationshipId> {
        self.relationships()
            .find(|relationship| {
                relationship.source() == source
                    && relationship.destination() == destination
                    && relationship.description() == description
            })
            .map(Relationship::id)
    }

    /// Instances of a static element within one deployment environment.
    pub fn instances_of(&self, base: ElementId, environment: ElementId) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|element| {
                element.base() == Some(base)
                    && self.environment_of(element.id()) == Some(environment)
            })
            .map(Element::id)
            .collect()
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn push_element(
        &mut self,
        kind: ElementKind,
        name: &str,
        parent: Option<ElementId>,
    ) -> ElementId {
        let id = ElementId(self.elements.len());
        let mut element = Element::new(id, kind, name);
        element.set_parent(parent);
        self.elements.push(element);
        id
    }

    fn push_relationship(
        &mut self,
        source: ElementId,
        destination: ElementId,
        description: &str,
    ) -> RelationshipId {
        let id = RelationshipId(self.relationships.len());
        self.relationships
            .push(Relationship::new(id, source, destination, description));
        id
    }

    fn check_unique_sibling(
        &self,
        parent: Option<ElementId>,
        name: &str,
        kind: &'static str,
    ) -> Result<(), ModelError> {
        if self.find_element_by_name(parent, name).is_some() {
            return Err(ModelError::DuplicateElement {
                kind,
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn check_parent_kind(
        &self,
        parent: ElementId,
        expected: &str,
        permitted: impl Fn(&ElementKind) -> bool,
    ) -> Result<(), ModelError> {
        if permitted(self.elements[parent.0].kind()) {
            Ok(())
        } else {
            Err(ModelError::InvalidParent {
                child: format!("an element expecting a {expected} parent"),
                parent: self.elements[parent.0].to_string(),
            })
        }
    }

    fn add_instance(
        &mut self,
        node: ElementId,
        base: ElementId,
        deployment_groups: Vec<String>,
        system: bool,
    ) -> Result<ElementId, ModelError> {
        let environment = self
            .environment_of(node)
            .ok_or_else(|| ModelError::InvalidParent {
                child: "an instance".to_owned(),
                parent: self.elements[node.0].to_string(),
            })?;
        let instance_id = self.instances_of(base, environment).len() as u32 + 1;
        let data = InstanceData {
            base,
            instance_id,
            deployment_groups,
        };
        let kind = if system {
            ElementKind::SoftwareSystemInstance(data)
        } else {
            ElementKind::ContainerInstance(data)
        };
        let name = self.elements[base.0].name().to_owned();
        let id = self.push_element(kind, &name, Some(node));
        self.replicate_relationships(id, base, environment);
        Ok(id)
    }

    /// Copies the base element's static relationships onto this instance,
    /// against every peer instance in the same environment that shares a
    /// deployment group.
    fn replicate_relationships(
        &mut self,
        instance: ElementId,
        base: ElementId,
        environment: ElementId,
    ) {
        let mut planned: Vec<(ElementId, ElementId, RelationshipId)> = Vec::new();
        for relationship in self.relationships() {
            if relationship.source() == base {
                for peer in self.instances_of(relationship.destination(), environment) {
                    if self.deployment_groups_intersect(instance, peer) {
                        planned.push((instance, peer, relationship.id()));
                    }
                }
            } else if relationship.destination() == base {
                for peer in self.instances_of(relationship.source(), environment) {
                    if self.deployment_groups_intersect(instance, peer) {
                        planned.push((peer, instance, relationship.id()));
                    }
                }
            }
        }
        for (source, destination, original) in planned {
            let description = self.relationships[original.0].description().to_owned();
            let technology = self.relationships[original.0].technology().to_owned();
            let tags: Vec<String> = self.relationships[original.0]
                .tags()
                .map(str::to_owned)
                .collect();
            let id = self.push_relationship(source, destination, &description);
            self.relationships[id.0].set_technology(&technology);
            for tag in &tags {
                self.relationships[id.0].add_tag(tag);
            }
            self.relationships[id.0].set_linked_to(original);
            debug!(source = source.index(), destination = destination.index();
                "replicated relationship onto instances");
        }
    }

    fn deployment_groups_intersect(&self, a: ElementId, b: ElementId) -> bool {
        let groups_a = effective_groups(self.elements[a.0].deployment_groups());
        let groups_b = effective_groups(self.elements[b.0].deployment_groups());
        groups_a.iter().any(|group| groups_b.contains(group))
    }
}

fn effective_groups(groups: &[String]) -> Vec<&str> {
    if groups.is_empty() {
        vec![DEFAULT_DEPLOYMENT_GROUP]
    } else {
        groups.iter().map(String::as_str).collect()
    }
}

/// The table of element kind pairs a relationship may connect.
///
/// Static-structure elements may relate to each other freely. Deployment
/// elements may relate within the deployment side. Pseudo-elements never
/// take part in relationships; instance-to-instance relationships only come
/// from replication.
fn relationship_permitted(source: &ElementKind, destination: &ElementKind) -> bool {
    use ElementKind as K;
    if source.is_static() && destination.is_static() {
        return true;
    }
    match source {
        K::DeploymentNode { .. } => matches!(destination, K::DeploymentNode { .. }),
        K::InfrastructureNode => matches!(
            destination,
            K::DeploymentNode { .. }
                | K::InfrastructureNode
                | K::SoftwareSystemInstance(_)
                | K::ContainerInstance(_)
        ),
        K::SoftwareSystemInstance(_) | K::ContainerInstance(_) => {
            matches!(destination, K::InfrastructureNode)
        }
        _ => false,
    }
}
