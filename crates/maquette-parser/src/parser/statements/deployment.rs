//! Deployment statements: environments, nodes, infrastructure and the
//! instance statements that place static elements onto nodes.

use maquette_core::model::ElementId;

use crate::context::{Context, PerspectiveOwner, PropertyOwner};
use crate::error::Result;
use crate::parser::Parser;
use crate::tokenizer::Tokens;

impl Parser {
    /// `deploymentEnvironment <name> {`.
    pub(in crate::parser) fn deployment_environment_statement(
        &mut self,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "deploymentEnvironment <name> {";
        Self::require_block(opens_block, GRAMMAR)?;
        let name = tokens.required(1, GRAMMAR)?.to_owned();
        tokens.ensure_at_most(2, GRAMMAR)?;

        let element = match self.existing_element(None, &name) {
            Some(element) => element,
            None => self
                .workspace_mut()?
                .model_mut()
                .add_deployment_environment(&name)?,
        };
        self.register_pending_element(element)?;
        Ok(Some(Context::DeploymentEnvironment(element)))
    }

    pub(crate) fn in_deployment_environment(
        &mut self,
        element: ElementId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        if keyword == "group" {
            return self.group_statement(None, Some(element), tokens, opens_block);
        }
        if Self::is_relationship_line(tokens) || keyword == "->" || keyword == "-/>" {
            return self.relationship_statement(None, Some(element), tokens, opens_block);
        }
        match self.element_statement(keyword, Some(element), None, tokens, opens_block)? {
            Some(outcome) => Ok(outcome),
            None => Err(Self::unexpected(&Context::DeploymentEnvironment(element))),
        }
    }

    pub(crate) fn in_deployment_node(
        &mut self,
        element: ElementId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "softwaresysteminstance" => self.instance_statement(element, true, tokens, opens_block),
            "containerinstance" => self.instance_statement(element, false, tokens, opens_block),
            "description" => self.description_statement(element, tokens).map(|()| None),
            "technology" => self.technology_statement(element, tokens).map(|()| None),
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
            _ => {
                if Self::is_relationship_line(tokens) {
                    return self.relationship_statement(None, Some(element), tokens, opens_block);
                }
                match self.element_statement(keyword, Some(element), None, tokens, opens_block)? {
                    Some(outcome) => Ok(outcome),
                    None => Err(Self::unexpected(&Context::DeploymentNode(element))),
                }
            }
        }
    }

    /// `softwareSystemInstance <identifier> [deploymentGroups] [tags] {`
    /// and its container counterpart. The deployment groups token is a
    /// comma-separated list; instances in intersecting groups have the
    /// static relationships of their bases replicated between them.
    fn instance_statement(
        &mut self,
        node: ElementId,
        system: bool,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        let grammar = if system {
            "softwareSystemInstance <identifier> [deploymentGroups] [tags] {"
        } else {
            "containerInstance <identifier> [deploymentGroups] [tags] {"
        };
        let name = tokens.required(1, grammar)?.to_owned();
        tokens.ensure_at_most(4, grammar)?;
        let base = self.resolve_endpoint(&name, None, Some(node))?;
        let deployment_groups: Vec<String> = tokens
            .get(2)
            .map(|groups| {
                groups
                    .split(',')
                    .map(str::trim)
                    .filter(|group| !group.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let workspace = self.workspace_mut()?;
        let instance = if system {
            workspace
                .model_mut()
                .add_software_system_instance(node, base, deployment_groups)?
        } else {
            workspace
                .model_mut()
                .add_container_instance(node, base, deployment_groups)?
        };
        if let Some(tags) = tokens.get(3) {
            workspace.model_mut().element_mut(instance).add_tags(tags);
        }
        self.register_pending_element(instance)?;
        Ok(opens_block.then(|| {
            if system {
                Context::SoftwareSystemInstance(instance)
            } else {
                Context::ContainerInstance(instance)
            }
        }))
    }

    /// Body of a `softwareSystemInstance` or `containerInstance` block.
    pub(crate) fn in_instance(
        &mut self,
        context: Context,
        element: ElementId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
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
            _ => Err(Self::unexpected(&context)),
        }
    }
}
