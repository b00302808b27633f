//! Statements inside `model`, `group` and element blocks: element
//! creation, archetype declarations and element body attributes.
//!
//! Element-creating keywords go through [`Parser::element_statement`],
//! which resolves the keyword to an archetype (declared archetypes shadow
//! the built-in kinds), merges the archetype's defaults with the tokens on
//! the line and attaches the new element to the enclosing parent and
//! group. In extend mode a statement naming an existing sibling re-asserts
//! it instead of raising a duplicate.

use log::debug;
use maquette_core::identifier::Id;
use maquette_core::model::ElementId;

use crate::archetypes::{Archetype, ArchetypeKind};
use crate::context::{Context, PerspectiveOwner, PropertyOwner};
use crate::error::{ErrorCode, ParserError, Result};
use crate::features::Feature;
use crate::parser::Parser;
use crate::tokenizer::Tokens;

/// Workspace property naming the separator nested group names are joined
/// with. Nested groups are refused until it is set.
const GROUP_SEPARATOR_PROPERTY: &str = "maquette.groupSeparator";

impl Parser {
    pub(crate) fn in_model(
        &mut self,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "archetypes" => {
                const GRAMMAR: &str = "archetypes {";
                self.features.check(Feature::Archetypes)?;
                Self::require_block(opens_block, GRAMMAR)?;
                tokens.ensure_at_most(1, GRAMMAR)?;
                Ok(Some(Context::Archetypes))
            }
            "group" => self.group_statement(None, None, tokens, opens_block),
            "deploymentenvironment" => self.deployment_environment_statement(tokens, opens_block),
            "!elements" => self.elements_block_statement(None, tokens, opens_block),
            "!relationships" => self.relationships_block_statement(None, tokens, opens_block),
            "!identifiers" => self.identifiers_statement(tokens).map(|()| None),
            "!impliedrelationships" => self.implied_relationships_statement(tokens).map(|()| None),
            "!script" => self.script_statement(tokens, opens_block, Context::Model.bindings()),
            "!plugin" => self.plugin_statement(tokens, opens_block, Context::Model.bindings()),
            _ => {
                if Self::is_relationship_line(tokens) {
                    return self.relationship_statement(None, None, tokens, opens_block);
                }
                match self.element_statement(keyword, None, None, tokens, opens_block)? {
                    Some(outcome) => Ok(outcome),
                    None => Err(Self::unexpected(&Context::Model)),
                }
            }
        }
    }

    pub(crate) fn in_group(
        &mut self,
        group: ElementId,
        parent: Option<ElementId>,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        if keyword == "group" {
            return self.group_statement(Some(group), parent, tokens, opens_block);
        }
        if Self::is_relationship_line(tokens) {
            return self.relationship_statement(None, parent, tokens, opens_block);
        }
        match self.element_statement(keyword, parent, Some(group), tokens, opens_block)? {
            Some(outcome) => Ok(outcome),
            None => Err(Self::unexpected(&Context::Group { group, parent })),
        }
    }

    /// Body of a `person` or custom `element` block.
    pub(crate) fn in_basic_element(
        &mut self,
        context: Context,
        element: ElementId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        self.element_body_statement(&context, element, keyword, tokens, opens_block)
    }

    pub(crate) fn in_software_system(
        &mut self,
        element: ElementId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        if keyword == "group" {
            return self.group_statement(None, Some(element), tokens, opens_block);
        }
        if let Some(outcome) =
            self.element_statement(keyword, Some(element), None, tokens, opens_block)?
        {
            return Ok(outcome);
        }
        self.element_body_statement(
            &Context::SoftwareSystem(element),
            element,
            keyword,
            tokens,
            opens_block,
        )
    }

    pub(crate) fn in_container(
        &mut self,
        element: ElementId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "group" => self.group_statement(None, Some(element), tokens, opens_block),
            "technology" => self.technology_statement(element, tokens).map(|()| None),
            "!components" => self.components_statement(element, tokens, opens_block),
            _ => {
                if let Some(outcome) =
                    self.element_statement(keyword, Some(element), None, tokens, opens_block)?
                {
                    return Ok(outcome);
                }
                self.element_body_statement(
                    &Context::Container(element),
                    element,
                    keyword,
                    tokens,
                    opens_block,
                )
            }
        }
    }

    /// Body of a `component` or `infrastructureNode` block: an element
    /// block with a technology attribute and no children.
    pub(crate) fn in_technical_element(
        &mut self,
        context: Context,
        element: ElementId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        if keyword == "technology" {
            return self.technology_statement(element, tokens).map(|()| None);
        }
        self.element_body_statement(&context, element, keyword, tokens, opens_block)
    }

    /// The attribute statements shared by every element block body.
    fn element_body_statement(
        &mut self,
        context: &Context,
        element: ElementId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "description" => self.description_statement(element, tokens).map(|()| None),
            "tags" => self.tags_statement(element, tokens).map(|()| None),
            "url" => self.url_statement(element, tokens).map(|()| None),
            "properties" => {
                Self::require_block(opens_block, "properties {")?;
                tokens.ensure_at_most(1, "properties {")?;
                Ok(Some(Context::Properties(PropertyOwner::Element(element))))
            }
            "perspectives" => {
                Self::require_block(opens_block, "perspectives {")?;
                tokens.ensure_at_most(1, "perspectives {")?;
                Ok(Some(Context::Perspectives(PerspectiveOwner::Element(
                    element,
                ))))
            }
            "->" | "-/>" => {
                self.relationship_statement(Some(element), Some(element), tokens, opens_block)
            }
            "!script" => self.script_statement(tokens, opens_block, context.bindings()),
            "!plugin" => self.plugin_statement(tokens, opens_block, context.bindings()),
            _ => Err(Self::unexpected(context)),
        }
    }

    // -------------------------------------------------------------------
    // Attribute statements
    // -------------------------------------------------------------------

    pub(in crate::parser) fn description_statement(
        &mut self,
        element: ElementId,
        tokens: &Tokens,
    ) -> Result<()> {
        const GRAMMAR: &str = "description <description>";
        let description = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;
        self.workspace_mut()?
            .model_mut()
            .element_mut(element)
            .set_description(description);
        Ok(())
    }

    pub(in crate::parser) fn technology_statement(
        &mut self,
        element: ElementId,
        tokens: &Tokens,
    ) -> Result<()> {
        const GRAMMAR: &str = "technology <technology>";
        let technology = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;
        self.workspace_mut()?
            .model_mut()
            .element_mut(element)
            .set_technology(technology);
        Ok(())
    }

    pub(in crate::parser) fn tags_statement(
        &mut self,
        element: ElementId,
        tokens: &Tokens,
    ) -> Result<()> {
        const GRAMMAR: &str = "tags <tags> [tags...]";
        tokens.required(1, GRAMMAR)?;
        let workspace = self.workspace_mut()?;
        for index in 1..tokens.len() {
            let tags = tokens.get(index).unwrap_or_default();
            workspace.model_mut().element_mut(element).add_tags(tags);
        }
        Ok(())
    }

    pub(in crate::parser) fn url_statement(
        &mut self,
        element: ElementId,
        tokens: &Tokens,
    ) -> Result<()> {
        const GRAMMAR: &str = "url <url>";
        let url = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;
        self.workspace_mut()?
            .model_mut()
            .element_mut(element)
            .set_url(url);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Element creation
    // -------------------------------------------------------------------

    /// Whether a line in a model-like context is a relationship statement.
    pub(in crate::parser) fn is_relationship_line(tokens: &Tokens) -> bool {
        matches!(tokens.get(1), Some("->") | Some("-/>"))
    }

    /// Try the keyword as an element-creating statement. Returns `None`
    /// when it names neither a built-in kind nor a declared archetype, so
    /// the caller can raise its own context error.
    pub(in crate::parser) fn element_statement(
        &mut self,
        keyword: &str,
        parent: Option<ElementId>,
        group: Option<ElementId>,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Option<Context>>> {
        if keyword == "element" {
            return self
                .custom_element_statement(parent, group, tokens, opens_block)
                .map(Some);
        }
        let Some((kind, archetype)) = self.element_template(keyword) else {
            return Ok(None);
        };
        if kind == ArchetypeKind::Group {
            return self
                .group_from_archetype(archetype, group, parent, tokens, opens_block)
                .map(Some);
        }
        self.create_element(kind, archetype, parent, group, tokens, opens_block)
            .map(Some)
    }

    fn create_element(
        &mut self,
        kind: ArchetypeKind,
        archetype: Archetype,
        parent: Option<ElementId>,
        group: Option<ElementId>,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        let (grammar, tags_index, max_tokens) = match kind {
            ArchetypeKind::Person => ("person <name> [description] [tags] {", 3, 4),
            ArchetypeKind::SoftwareSystem => ("softwareSystem <name> [description] [tags] {", 3, 4),
            ArchetypeKind::Container => {
                ("container <name> [description] [technology] [tags] {", 4, 5)
            }
            ArchetypeKind::Component => {
                ("component <name> [description] [technology] [tags] {", 4, 5)
            }
            ArchetypeKind::DeploymentNode => (
                "deploymentNode <name> [description] [technology] [tags] [instances] {",
                4,
                6,
            ),
            ArchetypeKind::InfrastructureNode => (
                "infrastructureNode <name> [description] [technology] [tags] {",
                4,
                5,
            ),
            // Handled by the caller.
            ArchetypeKind::Group => unreachable!("group archetypes create groups"),
        };
        let name = tokens.required(1, grammar)?.to_owned();
        tokens.ensure_at_most(max_tokens, grammar)?;
        let description = tokens
            .get(2)
            .map(str::to_owned)
            .or(archetype.description)
            .unwrap_or_default();
        let technology = if kind.has_technology() {
            tokens
                .get(3)
                .map(str::to_owned)
                .or(archetype.technology)
                .unwrap_or_default()
        } else {
            String::new()
        };

        let existing = self.existing_element(parent, &name);
        let element = match existing {
            Some(element) => {
                let model = self.workspace_mut()?.model_mut();
                if tokens.includes(2) {
                    model.element_mut(element).set_description(&description);
                }
                if kind.has_technology() && tokens.includes(3) {
                    model.element_mut(element).set_technology(&technology);
                }
                element
            }
            None => {
                let model = self.workspace_mut()?.model_mut();
                match kind {
                    ArchetypeKind::Person => {
                        Self::top_level_only(parent, "person")?;
                        model.add_person(&name, &description)?
                    }
                    ArchetypeKind::SoftwareSystem => {
                        Self::top_level_only(parent, "softwareSystem")?;
                        model.add_software_system(&name, &description)?
                    }
                    ArchetypeKind::Container => {
                        let system = Self::required_parent(parent, "container", "softwareSystem")?;
                        model.add_container(system, &name, &description, &technology)?
                    }
                    ArchetypeKind::Component => {
                        let container = Self::required_parent(parent, "component", "container")?;
                        model.add_component(container, &name, &description, &technology)?
                    }
                    ArchetypeKind::DeploymentNode => {
                        let node_parent = Self::required_parent(
                            parent,
                            "deploymentNode",
                            "deploymentEnvironment or deploymentNode",
                        )?;
                        let instances = tokens.get(5).unwrap_or("1").to_owned();
                        model.add_deployment_node(
                            node_parent,
                            &name,
                            &description,
                            &technology,
                            &instances,
                        )?
                    }
                    ArchetypeKind::InfrastructureNode => {
                        let node = Self::required_parent(
                            parent,
                            "infrastructureNode",
                            "deploymentNode",
                        )?;
                        model.add_infrastructure_node(node, &name, &description, &technology)?
                    }
                    ArchetypeKind::Group => unreachable!("group archetypes create groups"),
                }
            }
        };

        let model = self.workspace_mut()?.model_mut();
        for tag in &archetype.tags {
            model.element_mut(element).add_tag(tag);
        }
        if let Some(tags) = tokens.get(tags_index) {
            model.element_mut(element).add_tags(tags);
        }
        if existing.is_none() && group.is_some() {
            model.set_group(element, group);
        }
        debug!(name = name.as_str(); "declared element");
        self.register_pending_element(element)?;
        Ok(opens_block.then(|| Self::element_context(kind, element)))
    }

    /// `element <name> [metadata] [description] [tags] {`.
    fn custom_element_statement(
        &mut self,
        parent: Option<ElementId>,
        group: Option<ElementId>,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "element <name> [metadata] [description] [tags] {";
        Self::top_level_only(parent, "element")?;
        let name = tokens.required(1, GRAMMAR)?.to_owned();
        let metadata = tokens.get(2).unwrap_or("").to_owned();
        let description = tokens.get(3).unwrap_or("").to_owned();
        tokens.ensure_at_most(5, GRAMMAR)?;

        let existing = self.existing_element(None, &name);
        let element = match existing {
            Some(element) => {
                let model = self.workspace_mut()?.model_mut();
                if tokens.includes(3) {
                    model.element_mut(element).set_description(&description);
                }
                element
            }
            None => self
                .workspace_mut()?
                .model_mut()
                .add_custom_element(&name, &metadata, &description)?,
        };
        let model = self.workspace_mut()?.model_mut();
        if let Some(tags) = tokens.get(4) {
            model.element_mut(element).add_tags(tags);
        }
        if existing.is_none() && group.is_some() {
            model.set_group(element, group);
        }
        self.register_pending_element(element)?;
        Ok(opens_block.then_some(Context::CustomElement(element)))
    }

    /// `group <name> {`. Nested group names are joined with the separator
    /// from the `maquette.groupSeparator` workspace property; nesting is
    /// refused until it is set.
    pub(in crate::parser) fn group_statement(
        &mut self,
        enclosing: Option<ElementId>,
        parent: Option<ElementId>,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "group <name> {";
        Self::require_block(opens_block, GRAMMAR)?;
        let name = tokens.required(1, GRAMMAR)?.to_owned();
        tokens.ensure_at_most(2, GRAMMAR)?;

        let full_name = match enclosing {
            None => name,
            Some(outer) => {
                let workspace = self.workspace_ref()?;
                let Some(separator) = workspace.property(GROUP_SEPARATOR_PROPERTY) else {
                    return Err(ParserError::new(
                        ErrorCode::E504,
                        "nested groups need a group separator",
                    )
                    .with_help(format!(
                        "set the \"{GROUP_SEPARATOR_PROPERTY}\" workspace property"
                    )));
                };
                let outer_name = workspace.model().element(outer).name();
                format!("{outer_name}{separator}{name}")
            }
        };
        let group = self
            .workspace_mut()?
            .model_mut()
            .ensure_group(parent, enclosing, &full_name);
        self.register_pending_element(group)?;
        Ok(Some(Context::Group { group, parent }))
    }

    fn group_from_archetype(
        &mut self,
        archetype: Archetype,
        enclosing: Option<ElementId>,
        parent: Option<ElementId>,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        let outcome = self.group_statement(enclosing, parent, tokens, opens_block)?;
        if let Some(Context::Group { group, .. }) = outcome {
            let model = self.workspace_mut()?.model_mut();
            for tag in &archetype.tags {
                model.element_mut(group).add_tag(tag);
            }
        }
        Ok(outcome)
    }

    fn element_context(kind: ArchetypeKind, element: ElementId) -> Context {
        match kind {
            ArchetypeKind::Person => Context::Person(element),
            ArchetypeKind::SoftwareSystem => Context::SoftwareSystem(element),
            ArchetypeKind::Container => Context::Container(element),
            ArchetypeKind::Component => Context::Component(element),
            ArchetypeKind::DeploymentNode => Context::DeploymentNode(element),
            ArchetypeKind::InfrastructureNode => Context::InfrastructureNode(element),
            ArchetypeKind::Group => unreachable!("group archetypes create groups"),
        }
    }

    fn top_level_only(parent: Option<ElementId>, keyword: &str) -> Result<()> {
        if parent.is_some() {
            return Err(ParserError::new(
                ErrorCode::E300,
                format!("a {keyword} cannot be declared inside another element"),
            ));
        }
        Ok(())
    }

    fn required_parent(
        parent: Option<ElementId>,
        keyword: &str,
        expected: &str,
    ) -> Result<ElementId> {
        parent.ok_or_else(|| {
            ParserError::new(
                ErrorCode::E300,
                format!("a {keyword} must be declared inside a {expected} block"),
            )
        })
    }

    // -------------------------------------------------------------------
    // Archetypes
    // -------------------------------------------------------------------

    /// A `<name> = <kind|archetype> [{]` line inside an `archetypes` block.
    /// The assignment prefix was already claimed by the dispatcher.
    pub(crate) fn archetype_declaration(
        &mut self,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "<name> = <kind|archetype> {";
        let Some(name) = self.pending_identifier.take() else {
            return Err(ParserError::new(
                ErrorCode::E101,
                format!("expected: {GRAMMAR}"),
            ));
        };
        let base = tokens.required(0, GRAMMAR)?;
        tokens.ensure_at_most(1, GRAMMAR)?;
        let id = self.archetypes.declare(&name, base)?;
        debug!(name = name.as_str(), base = base; "declared archetype");
        Ok(opens_block.then_some(Context::Archetype(id)))
    }

    pub(crate) fn in_archetype(&mut self, id: Id, keyword: &str, tokens: &mut Tokens) -> Result<()> {
        let Some(archetype) = self.archetypes.get_mut(id) else {
            return Err(ParserError::new(
                ErrorCode::E204,
                "the archetype is no longer declared",
            ));
        };
        match keyword {
            "description" => {
                const GRAMMAR: &str = "description <description>";
                let description = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                archetype.description = Some(description.to_owned());
                Ok(())
            }
            "technology" => {
                const GRAMMAR: &str = "technology <technology>";
                let technology = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                archetype.technology = Some(technology.to_owned());
                Ok(())
            }
            "tag" | "tags" => {
                const GRAMMAR: &str = "tags <tags> [tags...]";
                tokens.required(1, GRAMMAR)?;
                for index in 1..tokens.len() {
                    archetype.add_tags(tokens.get(index).unwrap_or_default());
                }
                Ok(())
            }
            _ => Err(Self::unexpected(&Context::Archetype(id))),
        }
    }
}
