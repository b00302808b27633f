//! The workspace: the top-level container for a model, its views and its
//! documentation.

use std::str::FromStr;

use indexmap::IndexMap;

use crate::{documentation::Documentation, model::Model, views::Views};

/// What a workspace describes: a whole landscape or a single software
/// system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceScope {
    Landscape,
    SoftwareSystem,
}

impl FromStr for WorkspaceScope {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landscape" => Ok(WorkspaceScope::Landscape),
            "softwaresystem" => Ok(WorkspaceScope::SoftwareSystem),
            _ => Err("Invalid workspace scope"),
        }
    }
}

/// Who may see a shared workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl FromStr for Visibility {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err("Invalid visibility"),
        }
    }
}

/// Workspace-level configuration, distinct from free-form properties.
#[derive(Debug, Default)]
pub struct Configuration {
    scope: Option<WorkspaceScope>,
    visibility: Option<Visibility>,
    properties: IndexMap<String, String>,
}

impl Configuration {
    pub fn scope(&self) -> Option<WorkspaceScope> {
        self.scope
    }

    pub fn set_scope(&mut self, scope: WorkspaceScope) {
        self.scope = Some(scope);
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = Some(visibility);
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn add_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_owned(), value.to_owned());
    }
}

/// A complete architecture description: one model, any number of views,
/// documentation and workspace-scoped properties.
///
/// # Examples
///
/// ```
/// use maquette_core::Workspace;
///
/// let mut workspace = Workspace::new("Big Bank", "Architecture of the bank");
/// let system = workspace.model_mut().add_software_system("Mainframe", "").unwrap();
/// let key = workspace.views().generate_key("SystemContext");
/// workspace
///     .views_mut()
///     .create_system_context_view(system, &key, "")
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct Workspace {
    name: String,
    description: String,
    model: Model,
    views: Views,
    documentation: Documentation,
    configuration: Configuration,
    properties: IndexMap<String, String>,
}

impl Workspace {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            model: Model::new(),
            views: Views::new(),
            documentation: Documentation::default(),
            configuration: Configuration::default(),
            properties: IndexMap::new(),
        }
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

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut Views {
        &mut self.views
    }

    /// Borrows the model and the views at the same time, for operations that
    /// read one while mutating the other.
    pub fn model_and_views_mut(&mut self) -> (&Model, &mut Views) {
        (&self.model, &mut self.views)
    }

    pub fn documentation(&self) -> &Documentation {
        &self.documentation
    }

    pub fn documentation_mut(&mut self) -> &mut Documentation {
        &mut self.documentation
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_borrow_lets_views_read_the_model() {
        let mut workspace = Workspace::new("w", "");
        let a = workspace.model_mut().add_software_system("A", "").unwrap();
        let b = workspace.model_mut().add_software_system("B", "").unwrap();
        workspace.model_mut().uses(a, b, "Uses", "", "").unwrap();

        let view_id = {
            let views = workspace.views_mut();
            views.create_system_landscape_view("overview", "").unwrap()
        };
        let (model, views) = workspace.model_and_views_mut();
        views.view_mut(view_id).add_all_elements(model);
        assert_eq!(views.view(view_id).elements().count(), 2);
        assert_eq!(views.view(view_id).relationships_in(model).len(), 1);
    }

    #[test]
    fn properties_overwrite_by_name() {
        let mut workspace = Workspace::new("w", "");
        workspace.add_property("maquette.groupSeparator", "/");
        workspace.add_property("maquette.groupSeparator", ".");
        assert_eq!(workspace.property("maquette.groupSeparator"), Some("."));
        assert_eq!(workspace.properties().len(), 1);
    }

    #[test]
    fn configuration_keywords_parse_case_insensitively() {
        assert_eq!(
            "SoftwareSystem".parse::<WorkspaceScope>(),
            Ok(WorkspaceScope::SoftwareSystem)
        );
        assert_eq!("PRIVATE".parse::<Visibility>(), Ok(Visibility::Private));
        assert!("team".parse::<Visibility>().is_err());

        let mut workspace = Workspace::new("w", "");
        workspace
            .configuration_mut()
            .set_scope(WorkspaceScope::Landscape);
        assert_eq!(
            workspace.configuration().scope(),
            Some(WorkspaceScope::Landscape)
        );
    }
}
