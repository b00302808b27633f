//! Relationship statements: the `->` arrow, the `-/>` removal form and
//! the relationship block body.

use log::debug;
use maquette_core::model::{ElementId, Model, RelationshipId};

use crate::context::{Context, PerspectiveOwner, PropertyOwner};
use crate::error::{ErrorCode, ParserError, Result};
use crate::parser::Parser;
use crate::tokenizer::Tokens;

impl Parser {
    /// `<identifier> -> <identifier> [description] [technology] [tags] {`,
    /// or the contextual `-> <identifier> ...` form whose source is the
    /// enclosing element. The `-/>` arrow removes relationships instead.
    pub(in crate::parser) fn relationship_statement(
        &mut self,
        this: Option<ElementId>,
        enclosing: Option<ElementId>,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "<identifier> -> <identifier> [description] [technology] [tags] {";
        let first = tokens.required(0, GRAMMAR)?;
        let offset = if first == "->" || first == "-/>" { 0 } else { 1 };
        let arrow = tokens.required(offset, GRAMMAR)?.to_owned();

        let source = if offset == 0 {
            self.resolve_endpoint("this", this, enclosing)?
        } else {
            let name = tokens.required(0, GRAMMAR)?;
            self.resolve_endpoint(name, this, enclosing)?
        };
        let destination_name = tokens.required(offset + 1, GRAMMAR)?;
        let destination = self.resolve_endpoint(destination_name, this, enclosing)?;
        let description = tokens.get(offset + 2).unwrap_or("").to_owned();

        if arrow == "-/>" {
            const REMOVE_GRAMMAR: &str = "<identifier> -/> <identifier> [description]";
            Self::no_block(opens_block, REMOVE_GRAMMAR)?;
            tokens.ensure_at_most(offset + 3, REMOVE_GRAMMAR)?;
            let described = tokens.includes(offset + 2).then_some(description.as_str());
            self.remove_relationships(source, destination, described, enclosing)?;
            return Ok(None);
        }

        let technology = tokens.get(offset + 3).unwrap_or("").to_owned();
        let tags = tokens.get(offset + 4).unwrap_or("").to_owned();
        tokens.ensure_at_most(offset + 5, GRAMMAR)?;

        if self.extending {
            let model = self.workspace_ref()?.model();
            let existing = model
                .relationships_between(source, destination)
                .into_iter()
                .find(|id| model.relationship(*id).description() == description);
            if let Some(relationship) = existing {
                return self.finish_relationship(relationship, opens_block);
            }
        }

        let relationship = self
            .workspace_mut()?
            .model_mut()
            .uses(source, destination, &description, &technology, &tags)?;
        let Some(relationship) = relationship else {
            let model = self.workspace_ref()?.model();
            return Err(ParserError::new(
                ErrorCode::E506,
                format!(
                    "the relationship \"{} -> {}\" with description \"{description}\" already exists",
                    model.element(source).name(),
                    model.element(destination).name()
                ),
            ));
        };
        debug!(
            source = source.index(),
            destination = destination.index();
            "declared relationship"
        );
        self.finish_relationship(relationship, opens_block)
    }

    fn finish_relationship(
        &mut self,
        relationship: RelationshipId,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        if let Some(name) = self.pending_identifier.take() {
            self.identifiers.register_relationship(&name, relationship)?;
        }
        Ok(opens_block.then_some(Context::Relationship(relationship)))
    }

    /// Remove every live relationship between the resolved endpoint sets,
    /// optionally narrowed to one description. Inside a deployment
    /// environment, static endpoints are expanded to their deployed
    /// instances first. Matching nothing is an error.
    fn remove_relationships(
        &mut self,
        source: ElementId,
        destination: ElementId,
        description: Option<&str>,
        enclosing: Option<ElementId>,
    ) -> Result<()> {
        let workspace = self.workspace_mut()?;
        let model = workspace.model_mut();
        let environment = enclosing.and_then(|element| model.environment_of(element));
        let sources = expand_to_instances(model, source, environment);
        let destinations = expand_to_instances(model, destination, environment);

        let mut matched = Vec::new();
        for from in &sources {
            for to in &destinations {
                for id in model.relationships_between(*from, *to) {
                    if description.is_none_or(|d| model.relationship(id).description() == d) {
                        matched.push(id);
                    }
                }
            }
        }
        if matched.is_empty() {
            return Err(ParserError::new(
                ErrorCode::E201,
                format!(
                    "no relationship from \"{}\" to \"{}\" matched",
                    model.element(source).name(),
                    model.element(destination).name()
                ),
            ));
        }
        let count = matched.len();
        for id in matched {
            model.remove_relationship(id);
        }
        debug!(count = count; "removed relationships");
        Ok(())
    }

    pub(crate) fn in_relationship(
        &mut self,
        relationship: RelationshipId,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "tags" => {
                const GRAMMAR: &str = "tags <tags> [tags...]";
                tokens.required(1, GRAMMAR)?;
                let workspace = self.workspace_mut()?;
                for index in 1..tokens.len() {
                    workspace
                        .model_mut()
                        .relationship_mut(relationship)
                        .add_tags(tokens.get(index).unwrap_or_default());
                }
                Ok(None)
            }
            "url" => {
                const GRAMMAR: &str = "url <url>";
                let url = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?
                    .model_mut()
                    .relationship_mut(relationship)
                    .set_url(url);
                Ok(None)
            }
            "properties" => {
                Self::require_block(opens_block, "properties {")?;
                tokens.ensure_at_most(1, "properties {")?;
                Ok(Some(Context::Properties(PropertyOwner::Relationship(
                    relationship,
                ))))
            }
            "perspectives" => {
                Self::require_block(opens_block, "perspectives {")?;
                tokens.ensure_at_most(1, "perspectives {")?;
                Ok(Some(Context::Perspectives(PerspectiveOwner::Relationship(
                    relationship,
                ))))
            }
            _ => Err(Self::unexpected(&Context::Relationship(relationship))),
        }
    }
}

/// The deployed instances of a static element within `environment`, or the
/// element itself when there is no environment or no instances.
fn expand_to_instances(
    model: &Model,
    element: ElementId,
    environment: Option<ElementId>,
) -> Vec<ElementId> {
    let Some(environment) = environment else {
        return vec![element];
    };
    if !model.element(element).kind().is_static() {
        return vec![element];
    }
    let instances = model.instances_of(element, environment);
    if instances.is_empty() {
        vec![element]
    } else {
        instances
    }
}
