//! A single view over the model.

use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};

use crate::model::{ElementId, ElementKind, Model, RelationshipId};

/// Stable handle to a view stored in a [`Views`](super::Views) collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub(crate) usize);

impl ViewId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The kind of diagram a view describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    SystemLandscape,
    SystemContext,
    Container,
    Component,
    Deployment,
    Image,
}

impl ViewKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ViewKind::SystemLandscape => "SystemLandscape",
            ViewKind::SystemContext => "SystemContext",
            ViewKind::Container => "Container",
            ViewKind::Component => "Component",
            ViewKind::Deployment => "Deployment",
            ViewKind::Image => "Image",
        }
    }
}

/// Direction diagram ranks flow in when automatic layout is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDirection {
    #[default]
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl FromStr for RankDirection {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tb" => Ok(RankDirection::TopBottom),
            "bt" => Ok(RankDirection::BottomTop),
            "lr" => Ok(RankDirection::LeftRight),
            "rl" => Ok(RankDirection::RightLeft),
            _ => Err("Invalid rank direction"),
        }
    }
}

/// Automatic layout settings for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoLayout {
    pub rank_direction: RankDirection,
    pub rank_separation: u32,
    pub node_separation: u32,
}

impl Default for AutoLayout {
    fn default() -> Self {
        Self {
            rank_direction: RankDirection::TopBottom,
            rank_separation: 300,
            node_separation: 300,
        }
    }
}

/// Rendered content of an image view, produced by a diagram importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContent {
    pub content: String,
    pub content_type: String,
}

/// A view over the model: a selection of elements plus presentation
/// settings.
///
/// The element selection is explicit; the relationship selection is derived.
/// A relationship appears on a view when both of its endpoints do and it has
/// not been excluded.
#[derive(Debug)]
pub struct View {
    id: ViewId,
    kind: ViewKind,
    key: String,
    description: String,
    title: String,
    subject: Option<ElementId>,
    environment: Option<ElementId>,
    elements: IndexSet<ElementId>,
    excluded_relationships: IndexSet<RelationshipId>,
    animations: Vec<Vec<ElementId>>,
    auto_layout: Option<AutoLayout>,
    image: Option<ImageContent>,
    properties: IndexMap<String, String>,
}

impl View {
    pub(crate) fn new(
        id: ViewId,
        kind: ViewKind,
        key: &str,
        description: &str,
        subject: Option<ElementId>,
        environment: Option<ElementId>,
    ) -> Self {
        Self {
            id,
            kind,
            key: key.to_owned(),
            description: description.to_owned(),
            title: String::new(),
            subject,
            environment,
            elements: IndexSet::new(),
            excluded_relationships: IndexSet::new(),
            animations: Vec::new(),
            auto_layout: None,
            image: None,
            properties: IndexMap::new(),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_owned();
    }

    /// The element this view is scoped to: the software system of a context
    /// or container view, the container of a component view, the optional
    /// system scope of a deployment view, the subject of an image view.
    pub fn subject(&self) -> Option<ElementId> {
        self.subject
    }

    /// The deployment environment, for deployment views.
    pub fn environment(&self) -> Option<ElementId> {
        self.environment
    }

    pub fn add_element(&mut self, element: ElementId) {
        self.elements.insert(element);
    }

    pub fn remove_element(&mut self, element: ElementId) {
        self.elements.shift_remove(&element);
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.elements.contains(&element)
    }

    pub fn elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().copied()
    }

    pub fn exclude_relationship(&mut self, relationship: RelationshipId) {
        self.excluded_relationships.insert(relationship);
    }

    /// Undoes a previous exclusion.
    pub fn include_relationship(&mut self, relationship: RelationshipId) {
        self.excluded_relationships.shift_remove(&relationship);
    }

    /// Live relationships whose endpoints are both on this view, minus the
    /// excluded ones.
    pub fn relationships_in(&self, model: &Model) -> Vec<RelationshipId> {
        model
            .relationships()
            .filter(|relationship| {
                self.elements.contains(&relationship.source())
                    && self.elements.contains(&relationship.destination())
                    && !self.excluded_relationships.contains(&relationship.id())
            })
            .map(|relationship| relationship.id())
            .collect()
    }

    pub fn add_animation_step(&mut self, elements: Vec<ElementId>) {
        self.animations.push(elements);
    }

    pub fn animations(&self) -> &[Vec<ElementId>] {
        &self.animations
    }

    pub fn auto_layout(&self) -> Option<&AutoLayout> {
        self.auto_layout.as_ref()
    }

    pub fn set_auto_layout(&mut self, auto_layout: AutoLayout) {
        self.auto_layout = Some(auto_layout);
    }

    pub fn image(&self) -> Option<&ImageContent> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, content: &str, content_type: &str) {
        self.image = Some(ImageContent {
            content: content.to_owned(),
            content_type: content_type.to_owned(),
        });
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn add_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_owned(), value.to_owned());
    }

    /// Adds the elements a view of this kind shows by default: the scope
    /// plus its direct neighbourhood.
    pub fn add_default_elements(&mut self, model: &Model) {
        match self.kind {
            ViewKind::SystemLandscape => self.add_all_elements(model),
            ViewKind::SystemContext => {
                if let Some(subject) = self.subject {
                    self.add_element(subject);
                    self.add_connected(model, subject, |kind| {
                        matches!(kind, ElementKind::Person | ElementKind::SoftwareSystem)
                    });
                }
            }
            ViewKind::Container => {
                if let Some(subject) = self.subject {
                    let children: Vec<ElementId> =
                        model.children(subject).map(|child| child.id()).collect();
                    for child in children {
                        self.add_element(child);
                        self.add_connected(model, child, |kind| {
                            matches!(
                                kind,
                                ElementKind::Person
                                    | ElementKind::SoftwareSystem
                                    | ElementKind::Container
                            )
                        });
                    }
                    self.remove_element(subject);
                }
            }
            ViewKind::Component => {
                if let Some(subject) = self.subject {
                    let children: Vec<ElementId> =
                        model.children(subject).map(|child| child.id()).collect();
                    for child in children {
                        self.add_element(child);
                        self.add_connected(model, child, |kind| kind.is_static());
                    }
                    self.remove_element(subject);
                }
            }
            ViewKind::Deployment => self.add_all_elements(model),
            ViewKind::Image => {}
        }
    }

    /// Adds every element a view of this kind may legally show.
    pub fn add_all_elements(&mut self, model: &Model) {
        match self.kind {
            ViewKind::SystemLandscape => {
                for element in model.elements() {
                    if matches!(
                        element.kind(),
                        ElementKind::Person
                            | ElementKind::SoftwareSystem
                            | ElementKind::CustomElement { .. }
                    ) {
                        self.elements.insert(element.id());
                    }
                }
            }
            ViewKind::SystemContext => {
                for element in model.elements() {
                    if matches!(
                        element.kind(),
                        ElementKind::Person | ElementKind::SoftwareSystem
                    ) {
                        self.elements.insert(element.id());
                    }
                }
            }
            ViewKind::Container => {
                let Some(subject) = self.subject else { return };
                for element in model.elements() {
                    let included = match element.kind() {
                        ElementKind::Person => true,
                        ElementKind::SoftwareSystem => element.id() != subject,
                        ElementKind::Container => element.parent() == Some(subject),
                        _ => false,
                    };
                    if included {
                        self.elements.insert(element.id());
                    }
                }
            }
            ViewKind::Component => {
                let Some(subject) = self.subject else { return };
                let system = model.element(subject).parent();
                for element in model.elements() {
                    let included = match element.kind() {
                        ElementKind::Person | ElementKind::SoftwareSystem => true,
                        ElementKind::Container => {
                            element.parent() == system && element.id() != subject
                        }
                        ElementKind::Component => element.parent() == Some(subject),
                        _ => false,
                    };
                    if included {
                        self.elements.insert(element.id());
                    }
                }
            }
            ViewKind::Deployment => {
                let Some(environment) = self.environment else {
                    return;
                };
                for element in model.elements() {
                    if matches!(element.kind(), ElementKind::DeploymentEnvironment) {
                        continue;
                    }
                    if model.environment_of(element.id()) != Some(environment) {
                        continue;
                    }
                    if let Some(scope) = self.subject {
                        if let Some(base) = element.base() {
                            let in_scope = base == scope
                                || model.is_descendant_of(base, scope);
                            if !in_scope {
                                continue;
                            }
                        }
                    }
                    self.elements.insert(element.id());
                }
            }
            ViewKind::Image => {}
        }
    }

    fn add_connected(
        &mut self,
        model: &Model,
        target: ElementId,
        permitted: impl Fn(&ElementKind) -> bool,
    ) {
        let connected: Vec<ElementId> = model
            .relationships()
            .filter_map(|relationship| {
                if relationship.source() == target {
                    Some(relationship.destination())
                } else if relationship.destination() == target {
                    Some(relationship.source())
                } else {
                    None
                }
            })
            .filter(|other| permitted(model.element(*other).kind()))
            .collect();
        for other in connected {
            self.elements.insert(other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::Views;

    fn bank_model() -> (Model, ElementId, ElementId, ElementId, ElementId) {
        let mut model = Model::new();
        let user = model.add_person("User", "").unwrap();
        let bank = model.add_software_system("Bank", "").unwrap();
        let mainframe = model.add_software_system("Mainframe", "").unwrap();
        let web = model.add_container(bank, "Web Application", "", "").unwrap();
        model.uses(user, web, "Uses", "", "").unwrap();
        model.uses(web, mainframe, "Gets data from", "", "").unwrap();
        (model, user, bank, mainframe, web)
    }

    #[test]
    fn context_view_default_elements_are_subject_plus_neighbours() {
        let (mut model, user, bank, mainframe, web) = bank_model();
        model.uses(user, bank, "Uses", "", "").unwrap();
        model.uses(bank, mainframe, "Gets data from", "", "").unwrap();

        let mut views = Views::new();
        let id = views.create_system_context_view(bank, "context", "").unwrap();
        views.view_mut(id).add_default_elements(&model);

        let view = views.view(id);
        assert!(view.contains(bank));
        assert!(view.contains(user));
        assert!(view.contains(mainframe));
        assert!(!view.contains(web));
    }

    #[test]
    fn container_view_default_elements_pull_in_container_neighbours() {
        let (model, user, bank, mainframe, web) = bank_model();
        let mut views = Views::new();
        let id = views.create_container_view(bank, "containers", "").unwrap();
        views.view_mut(id).add_default_elements(&model);

        let view = views.view(id);
        assert!(view.contains(web));
        assert!(view.contains(user));
        assert!(view.contains(mainframe));
        assert!(!view.contains(bank));
    }

    #[test]
    fn derived_relationships_need_both_endpoints() {
        let (model, user, _, mainframe, web) = bank_model();
        let mut views = Views::new();
        let id = views.create_system_landscape_view("overview", "").unwrap();
        let view = views.view_mut(id);
        view.add_element(user);
        view.add_element(web);
        assert_eq!(view.relationships_in(&model).len(), 1);

        view.add_element(mainframe);
        assert_eq!(view.relationships_in(&model).len(), 2);
    }

    #[test]
    fn excluded_relationships_stay_off_the_view() {
        let (model, user, _, _, web) = bank_model();
        let mut views = Views::new();
        let id = views.create_system_landscape_view("overview", "").unwrap();
        let view = views.view_mut(id);
        view.add_element(user);
        view.add_element(web);

        let relationship = view.relationships_in(&model)[0];
        view.exclude_relationship(relationship);
        assert!(view.relationships_in(&model).is_empty());

        view.include_relationship(relationship);
        assert_eq!(view.relationships_in(&model).len(), 1);
    }

    #[test]
    fn deployment_view_scope_filters_instances() {
        let (mut model, _, bank, mainframe, _) = bank_model();
        let env = model.add_deployment_environment("Live").unwrap();
        let node = model.add_deployment_node(env, "Server", "", "", "1").unwrap();
        model
            .add_software_system_instance(node, bank, Vec::new())
            .unwrap();
        let other = model
            .add_software_system_instance(node, mainframe, Vec::new())
            .unwrap();

        let mut views = Views::new();
        let id = views
            .create_deployment_view(Some(bank), env, "deployment", "")
            .unwrap();
        views.view_mut(id).add_all_elements(&model);

        let view = views.view(id);
        assert!(view.contains(node));
        assert!(!view.contains(other));
        assert_eq!(view.elements().count(), 2);
    }

    #[test]
    fn rank_direction_parses_short_names() {
        assert_eq!("lr".parse::<RankDirection>(), Ok(RankDirection::LeftRight));
        assert!("diagonal".parse::<RankDirection>().is_err());
    }
}
