//! Views, styles and branding for a workspace.
//!
//! A [`Views`] collection owns every view defined on a workspace together
//! with the style and branding settings shared by all of them. Views refer
//! to model content through handles; they never copy elements.
//!
//! # Organization
//!
//! - [`view`] - [`View`], [`ViewKind`], automatic layout settings
//! - [`styles`] - element and relationship styles keyed by tag
//! - [`branding`] - logo and font branding

pub mod branding;
pub mod styles;
pub mod view;

use indexmap::IndexMap;

use crate::{
    error::ModelError,
    model::ElementId,
    views::{
        branding::Branding,
        styles::Styles,
        view::{View, ViewId, ViewKind},
    },
};

/// The set of views defined on a workspace.
#[derive(Debug, Default)]
pub struct Views {
    views: Vec<View>,
    default_view: Option<ViewId>,
    styles: Styles,
    branding: Branding,
    properties: IndexMap<String, String>,
}

impl Views {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_system_landscape_view(
        &mut self,
        key: &str,
        description: &str,
    ) -> Result<ViewId, ModelError> {
        self.push_view(ViewKind::SystemLandscape, key, description, None, None)
    }

    pub fn create_system_context_view(
        &mut self,
        subject: ElementId,
        key: &str,
        description: &str,
    ) -> Result<ViewId, ModelError> {
        self.push_view(ViewKind::SystemContext, key, description, Some(subject), None)
    }

    pub fn create_container_view(
        &mut self,
        subject: ElementId,
        key: &str,
        description: &str,
    ) -> Result<ViewId, ModelError> {
        self.push_view(ViewKind::Container, key, description, Some(subject), None)
    }

    pub fn create_component_view(
        &mut self,
        subject: ElementId,
        key: &str,
        description: &str,
    ) -> Result<ViewId, ModelError> {
        self.push_view(ViewKind::Component, key, description, Some(subject), None)
    }

    /// Creates a deployment view. `subject` is the software system in scope,
    /// or `None` for the whole model.
    pub fn create_deployment_view(
        &mut self,
        subject: Option<ElementId>,
        environment: ElementId,
        key: &str,
        description: &str,
    ) -> Result<ViewId, ModelError> {
        self.push_view(
            ViewKind::Deployment,
            key,
            description,
            subject,
            Some(environment),
        )
    }

    /// Creates an image view over an element, or over the whole workspace
    /// when `subject` is `None`.
    pub fn create_image_view(
        &mut self,
        subject: Option<ElementId>,
        key: &str,
    ) -> Result<ViewId, ModelError> {
        self.push_view(ViewKind::Image, key, "", subject, None)
    }

    fn push_view(
        &mut self,
        kind: ViewKind,
        key: &str,
        description: &str,
        subject: Option<ElementId>,
        environment: Option<ElementId>,
    ) -> Result<ViewId, ModelError> {
        if self.find_view_by_key(key).is_some() {
            return Err(ModelError::DuplicateViewKey {
                key: key.to_owned(),
            });
        }
        let id = ViewId(self.views.len());
        self.views
            .push(View::new(id, kind, key, description, subject, environment));
        Ok(id)
    }

    /// Produces a key that is not yet taken, `<prefix>-<n>` with the lowest
    /// free `n`.
    pub fn generate_key(&self, prefix: &str) -> String {
        let mut n = self.views.len() + 1;
        loop {
            let key = format!("{prefix}-{n}");
            if self.find_view_by_key(&key).is_none() {
                return key;
            }
            n += 1;
        }
    }

    pub fn view(&self, id: ViewId) -> &View {
        &self.views[id.index()]
    }

    pub fn view_mut(&mut self, id: ViewId) -> &mut View {
        &mut self.views[id.index()]
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    pub fn find_view_by_key(&self, key: &str) -> Option<ViewId> {
        self.views
            .iter()
            .find(|view| view.key() == key)
            .map(View::id)
    }

    /// Marks the view a renderer should open first.
    pub fn set_default_view(&mut self, id: ViewId) {
        self.default_view = Some(id);
    }

    pub fn default_view(&self) -> Option<ViewId> {
        self.default_view
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut Styles {
        &mut self.styles
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    pub fn branding_mut(&mut self) -> &mut Branding {
        &mut self.branding
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn add_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_owned(), value.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_view_keys_rejected() {
        let mut views = Views::new();
        views.create_system_landscape_view("overview", "").unwrap();
        let err = views
            .create_system_landscape_view("overview", "")
            .unwrap_err();
        assert!(err.to_string().contains("overview"));
    }

    #[test]
    fn generated_keys_skip_taken_ones() {
        let mut views = Views::new();
        views.create_system_landscape_view("Landscape-1", "").unwrap();
        let key = views.generate_key("Landscape");
        assert_eq!(key, "Landscape-2");
        views.create_system_landscape_view(&key, "").unwrap();
    }

    #[test]
    fn find_view_by_key_is_exact() {
        let mut views = Views::new();
        let id = views.create_system_landscape_view("overview", "").unwrap();
        assert_eq!(views.find_view_by_key("overview"), Some(id));
        assert_eq!(views.find_view_by_key("Overview"), None);
    }
}
