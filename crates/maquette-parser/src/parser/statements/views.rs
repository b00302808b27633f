//! View statements: view declarations, the include/exclude selection
//! statements, animations, automatic layout and image view content.

use log::debug;
use maquette_core::model::{ElementId, ElementKind};
use maquette_core::views::view::{AutoLayout, ViewId};

use crate::context::{Context, PropertyOwner};
use crate::error::{ErrorCode, ParserError, Result};
use crate::expression::{
    ExpressionContext, element_not_found, evaluate_elements, evaluate_relationships, is_expression,
};
use crate::includes::read_target;
use crate::parser::Parser;
use crate::tokenizer::Tokens;

impl Parser {
    pub(crate) fn in_views(
        &mut self,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "systemlandscape" => {
                const GRAMMAR: &str = "systemLandscape [key] [description] {";
                Self::require_block(opens_block, GRAMMAR)?;
                tokens.ensure_at_most(3, GRAMMAR)?;
                let key = self.view_key(tokens.get(1), "SystemLandscape")?;
                let description = tokens.get(2).unwrap_or("").to_owned();
                let view = self
                    .workspace_mut()?
                    .views_mut()
                    .create_system_landscape_view(&key, &description)?;
                Ok(Some(Context::SystemLandscapeView(view)))
            }
            "systemcontext" => {
                const GRAMMAR: &str = "systemContext <software system identifier> [key] [description] {";
                Self::require_block(opens_block, GRAMMAR)?;
                let subject = self.view_subject(tokens, GRAMMAR)?;
                tokens.ensure_at_most(4, GRAMMAR)?;
                let key = self.view_key(tokens.get(2), "SystemContext")?;
                let description = tokens.get(3).unwrap_or("").to_owned();
                let view = self
                    .workspace_mut()?
                    .views_mut()
                    .create_system_context_view(subject, &key, &description)?;
                Ok(Some(Context::SystemContextView(view)))
            }
            "container" => {
                const GRAMMAR: &str = "container <software system identifier> [key] [description] {";
                Self::require_block(opens_block, GRAMMAR)?;
                let subject = self.view_subject(tokens, GRAMMAR)?;
                tokens.ensure_at_most(4, GRAMMAR)?;
                let key = self.view_key(tokens.get(2), "Container")?;
                let description = tokens.get(3).unwrap_or("").to_owned();
                let view = self
                    .workspace_mut()?
                    .views_mut()
                    .create_container_view(subject, &key, &description)?;
                Ok(Some(Context::ContainerView(view)))
            }
            "component" => {
                const GRAMMAR: &str = "component <container identifier> [key] [description] {";
                Self::require_block(opens_block, GRAMMAR)?;
                let subject = self.view_subject(tokens, GRAMMAR)?;
                tokens.ensure_at_most(4, GRAMMAR)?;
                let key = self.view_key(tokens.get(2), "Component")?;
                let description = tokens.get(3).unwrap_or("").to_owned();
                let view = self
                    .workspace_mut()?
                    .views_mut()
                    .create_component_view(subject, &key, &description)?;
                Ok(Some(Context::ComponentView(view)))
            }
            "deployment" => {
                const GRAMMAR: &str =
                    "deployment <*|software system identifier> <environment> [key] [description] {";
                Self::require_block(opens_block, GRAMMAR)?;
                let scope = tokens.required(1, GRAMMAR)?.to_owned();
                let subject = if scope == "*" {
                    None
                } else {
                    Some(self.resolve_endpoint(&scope, None, None)?)
                };
                let environment_name = tokens.required(2, GRAMMAR)?.to_owned();
                let environment = self.resolve_environment(&environment_name)?;
                tokens.ensure_at_most(5, GRAMMAR)?;
                let key = self.view_key(tokens.get(3), "Deployment")?;
                let description = tokens.get(4).unwrap_or("").to_owned();
                let view = self
                    .workspace_mut()?
                    .views_mut()
                    .create_deployment_view(subject, environment, &key, &description)?;
                Ok(Some(Context::DeploymentView(view)))
            }
            "image" => {
                const GRAMMAR: &str = "image <*|element identifier> [key] {";
                Self::require_block(opens_block, GRAMMAR)?;
                let scope = tokens.required(1, GRAMMAR)?.to_owned();
                let subject = if scope == "*" {
                    None
                } else {
                    Some(self.resolve_endpoint(&scope, None, None)?)
                };
                tokens.ensure_at_most(3, GRAMMAR)?;
                let key = self.view_key(tokens.get(2), "Image")?;
                let view = self
                    .workspace_mut()?
                    .views_mut()
                    .create_image_view(subject, &key)?;
                Ok(Some(Context::ImageView(view)))
            }
            "styles" => {
                Self::require_block(opens_block, "styles {")?;
                tokens.ensure_at_most(1, "styles {")?;
                Ok(Some(Context::Styles))
            }
            "theme" => {
                const GRAMMAR: &str = "theme <url>";
                let url = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?.views_mut().styles_mut().add_theme(url);
                Ok(None)
            }
            "themes" => {
                const GRAMMAR: &str = "themes <url> [url...]";
                tokens.required(1, GRAMMAR)?;
                let workspace = self.workspace_mut()?;
                for index in 1..tokens.len() {
                    let url = tokens.get(index).unwrap_or_default();
                    workspace.views_mut().styles_mut().add_theme(url);
                }
                Ok(None)
            }
            "branding" => {
                Self::require_block(opens_block, "branding {")?;
                tokens.ensure_at_most(1, "branding {")?;
                Ok(Some(Context::Branding))
            }
            "properties" => {
                Self::require_block(opens_block, "properties {")?;
                tokens.ensure_at_most(1, "properties {")?;
                Ok(Some(Context::Properties(PropertyOwner::Views)))
            }
            _ => Err(Self::unexpected(&Context::Views)),
        }
    }

    /// The subject identifier of a scoped view declaration.
    fn view_subject(&self, tokens: &Tokens, grammar: &str) -> Result<ElementId> {
        let name = tokens.required(1, grammar)?;
        self.resolve_endpoint(name, None, None)
    }

    /// An explicit view key, or a generated `<prefix>-<n>` one.
    fn view_key(&self, key: Option<&str>, prefix: &str) -> Result<String> {
        let views = self.workspace_ref()?.views();
        Ok(match key {
            Some(key) => key.to_owned(),
            None => views.generate_key(prefix),
        })
    }

    /// A deployment environment, by identifier or by name.
    fn resolve_environment(&self, name: &str) -> Result<ElementId> {
        let workspace = self.workspace_ref()?;
        let model = workspace.model();
        if let Some(element) = self.identifiers.find_element(name, None, model) {
            if matches!(model.element(element).kind(), ElementKind::DeploymentEnvironment) {
                return Ok(element);
            }
        }
        model
            .elements()
            .find(|element| {
                matches!(element.kind(), ElementKind::DeploymentEnvironment)
                    && element.name() == name
            })
            .map(|element| element.id())
            .ok_or_else(|| {
                ParserError::new(
                    ErrorCode::E200,
                    format!("the deployment environment \"{name}\" does not exist"),
                )
            })
    }

    /// Body of a model view block.
    pub(crate) fn in_view(
        &mut self,
        context: Context,
        view: ViewId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "include" => {
                Self::no_block(opens_block, "include <*|identifier|expression>")?;
                self.include_in_view(view, tokens).map(|()| None)
            }
            "exclude" => {
                Self::no_block(opens_block, "exclude <identifier|expression>")?;
                self.exclude_from_view(view, tokens).map(|()| None)
            }
            "animation" => {
                Self::require_block(opens_block, "animation {")?;
                tokens.ensure_at_most(1, "animation {")?;
                Ok(Some(Context::Animation(view)))
            }
            "autolayout" => {
                const GRAMMAR: &str = "autoLayout [tb|bt|lr|rl] [rankSeparation] [nodeSeparation]";
                Self::no_block(opens_block, GRAMMAR)?;
                tokens.ensure_at_most(4, GRAMMAR)?;
                let mut layout = AutoLayout::default();
                if let Some(direction) = tokens.get(1) {
                    layout.rank_direction = direction
                        .to_lowercase()
                        .parse()
                        .map_err(|cause| Self::invalid_value(direction, cause))?;
                }
                if let Some(separation) = tokens.get(2) {
                    layout.rank_separation = Self::parse_number(separation)?;
                }
                if let Some(separation) = tokens.get(3) {
                    layout.node_separation = Self::parse_number(separation)?;
                }
                self.workspace_mut()?
                    .views_mut()
                    .view_mut(view)
                    .set_auto_layout(layout);
                Ok(None)
            }
            "default" => {
                const GRAMMAR: &str = "default";
                Self::no_block(opens_block, GRAMMAR)?;
                tokens.ensure_at_most(1, GRAMMAR)?;
                self.workspace_mut()?.views_mut().set_default_view(view);
                Ok(None)
            }
            "title" => {
                const GRAMMAR: &str = "title <title>";
                let title = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?
                    .views_mut()
                    .view_mut(view)
                    .set_title(title);
                Ok(None)
            }
            "description" => {
                const GRAMMAR: &str = "description <description>";
                let description = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?
                    .views_mut()
                    .view_mut(view)
                    .set_description(description);
                Ok(None)
            }
            "properties" => {
                Self::require_block(opens_block, "properties {")?;
                tokens.ensure_at_most(1, "properties {")?;
                Ok(Some(Context::Properties(PropertyOwner::View(view))))
            }
            "!script" => self.script_statement(tokens, opens_block, context.bindings()),
            "!plugin" => self.plugin_statement(tokens, opens_block, context.bindings()),
            _ => Err(Self::unexpected(&context)),
        }
    }

    /// `include <*|identifier|expression> [identifier...]`. A `*` adds the
    /// view's default neighbourhood; an expression adds every element it
    /// matches; identifiers add elements or un-exclude relationships.
    fn include_in_view(&mut self, view: ViewId, tokens: &Tokens) -> Result<()> {
        const GRAMMAR: &str = "include <*|identifier|expression> [identifier...]";
        tokens.required(1, GRAMMAR)?;
        let operand = tokens.join_from(1);
        let workspace = self.workspace.as_mut().ok_or_else(Self::no_workspace)?;
        let (model, views) = workspace.model_and_views_mut();
        let target = views.view_mut(view);

        if operand == "*" {
            target.add_default_elements(model);
            return Ok(());
        }
        if operand.to_lowercase().starts_with("relationship") {
            let ctx = ExpressionContext {
                model,
                identifiers: &self.identifiers,
                enclosing: None,
            };
            for relationship in evaluate_relationships(&operand, &ctx)? {
                target.include_relationship(relationship);
            }
            return Ok(());
        }
        if is_expression(&operand) {
            let ctx = ExpressionContext {
                model,
                identifiers: &self.identifiers,
                enclosing: None,
            };
            for element in evaluate_elements(&operand, &ctx)? {
                target.add_element(element);
            }
            return Ok(());
        }
        for index in 1..tokens.len() {
            let name = tokens.get(index).unwrap_or_default();
            if let Some(element) = self.identifiers.find_element(name, None, model) {
                target.add_element(element);
            } else if let Some(relationship) = self.identifiers.find_relationship(name) {
                target.include_relationship(relationship);
            } else {
                return Err(element_not_found(name));
            }
        }
        Ok(())
    }

    /// `exclude <identifier|expression> [identifier...]`. Arrow expressions
    /// select relationships here; everything else mirrors `include`.
    fn exclude_from_view(&mut self, view: ViewId, tokens: &Tokens) -> Result<()> {
        const GRAMMAR: &str = "exclude <identifier|expression> [identifier...]";
        tokens.required(1, GRAMMAR)?;
        let operand = tokens.join_from(1);
        let workspace = self.workspace.as_mut().ok_or_else(Self::no_workspace)?;
        let (model, views) = workspace.model_and_views_mut();
        let target = views.view_mut(view);
        let lowered = operand.to_lowercase();

        if operand == "*" {
            let elements: Vec<ElementId> = target.elements().collect();
            for element in elements {
                target.remove_element(element);
            }
            return Ok(());
        }
        if lowered.starts_with("relationship")
            || (operand.contains("->") && !lowered.starts_with("element"))
        {
            let ctx = ExpressionContext {
                model,
                identifiers: &self.identifiers,
                enclosing: None,
            };
            for relationship in evaluate_relationships(&operand, &ctx)? {
                target.exclude_relationship(relationship);
            }
            return Ok(());
        }
        if is_expression(&operand) {
            let ctx = ExpressionContext {
                model,
                identifiers: &self.identifiers,
                enclosing: None,
            };
            for element in evaluate_elements(&operand, &ctx)? {
                target.remove_element(element);
            }
            return Ok(());
        }
        for index in 1..tokens.len() {
            let name = tokens.get(index).unwrap_or_default();
            if let Some(element) = self.identifiers.find_element(name, None, model) {
                target.remove_element(element);
            } else if let Some(relationship) = self.identifiers.find_relationship(name) {
                target.exclude_relationship(relationship);
            } else {
                return Err(element_not_found(name));
            }
        }
        Ok(())
    }

    /// An `<identifier> [identifier...]` line inside an `animation` block.
    /// Every named element must already be part of the view.
    pub(crate) fn animation_step(&mut self, view: ViewId, tokens: &mut Tokens) -> Result<()> {
        const GRAMMAR: &str = "<identifier> [identifier...]";
        tokens.required(0, GRAMMAR)?;
        let workspace = self.workspace.as_ref().ok_or_else(Self::no_workspace)?;
        let model = workspace.model();
        let mut step = Vec::new();
        for index in 0..tokens.len() {
            let name = tokens.get(index).unwrap_or_default();
            let element = self
                .identifiers
                .find_element(name, None, model)
                .ok_or_else(|| element_not_found(name))?;
            if !workspace.views().view(view).contains(element) {
                return Err(ParserError::new(
                    ErrorCode::E200,
                    format!("the element \"{name}\" has not been included in this view"),
                ));
            }
            step.push(element);
        }
        self.workspace_mut()?
            .views_mut()
            .view_mut(view)
            .add_animation_step(step);
        Ok(())
    }

    /// Body of an `image` view block.
    pub(crate) fn in_image_view(
        &mut self,
        view: ViewId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "plantuml" => {
                const GRAMMAR: &str = "plantuml <file|url>";
                Self::no_block(opens_block, GRAMMAR)?;
                self.image_view_source(view, "text/x-plantuml", tokens, GRAMMAR)
                    .map(|()| None)
            }
            "mermaid" => {
                const GRAMMAR: &str = "mermaid <file|url>";
                Self::no_block(opens_block, GRAMMAR)?;
                self.image_view_source(view, "text/x-mermaid", tokens, GRAMMAR)
                    .map(|()| None)
            }
            "kroki" => {
                const GRAMMAR: &str = "kroki <file|url>";
                Self::no_block(opens_block, GRAMMAR)?;
                self.image_view_source(view, "text/x-kroki", tokens, GRAMMAR)
                    .map(|()| None)
            }
            "image" => {
                const GRAMMAR: &str = "image <file|url>";
                Self::no_block(opens_block, GRAMMAR)?;
                let target = tokens.required(1, GRAMMAR)?.to_owned();
                self.image_view_source(view, image_content_type(&target), tokens, GRAMMAR)
                    .map(|()| None)
            }
            "default" => {
                const GRAMMAR: &str = "default";
                Self::no_block(opens_block, GRAMMAR)?;
                tokens.ensure_at_most(1, GRAMMAR)?;
                self.workspace_mut()?.views_mut().set_default_view(view);
                Ok(None)
            }
            "title" => {
                const GRAMMAR: &str = "title <title>";
                let title = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?
                    .views_mut()
                    .view_mut(view)
                    .set_title(title);
                Ok(None)
            }
            "description" => {
                const GRAMMAR: &str = "description <description>";
                let description = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?
                    .views_mut()
                    .view_mut(view)
                    .set_description(description);
                Ok(None)
            }
            "properties" => {
                Self::require_block(opens_block, "properties {")?;
                tokens.ensure_at_most(1, "properties {")?;
                Ok(Some(Context::Properties(PropertyOwner::View(view))))
            }
            _ => Err(Self::unexpected(&Context::ImageView(view))),
        }
    }

    fn image_view_source(
        &mut self,
        view: ViewId,
        content_type: &str,
        tokens: &Tokens,
        grammar: &str,
    ) -> Result<()> {
        let target = tokens.required(1, grammar)?.to_owned();
        tokens.ensure_at_most(2, grammar)?;
        let (content, _, _, used_fs) = read_target(
            &target,
            self.line_dir.as_deref(),
            self.fetcher.as_deref(),
            &self.features,
            self.restricted,
        )?;
        if used_fs {
            self.portable = false;
        }
        debug!(target = target.as_str(), content_type = content_type; "loaded image view content");
        self.workspace_mut()?
            .views_mut()
            .view_mut(view)
            .set_image(&content, content_type);
        Ok(())
    }

    /// Run when the closing brace pops an image view: content is the one
    /// statement an image view cannot do without.
    pub(crate) fn finish_image_view(&mut self, view: ViewId) -> Result<()> {
        let views = self.workspace_ref()?.views();
        if views.view(view).image().is_none() {
            let key = views.view(view).key().to_owned();
            return Err(ParserError::new(
                ErrorCode::E101,
                format!("the image view \"{key}\" defines no content"),
            )
            .with_help("expected one of: plantuml, mermaid, kroki, image"));
        }
        Ok(())
    }
}

fn image_content_type(target: &str) -> &'static str {
    let lowered = target.to_lowercase();
    if lowered.ends_with(".svg") {
        "image/svg+xml"
    } else if lowered.ends_with(".jpg") || lowered.ends_with(".jpeg") {
        "image/jpeg"
    } else if lowered.ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    }
}
