//! Bulk and extension directives: `!elements`, `!relationships`,
//! `!script`, `!plugin` and `!components`.
//!
//! The extension statements only collect their block content here; the
//! parser runs them when the closing brace pops the block, so a script
//! sees the parameters declared anywhere in its block.

use indexmap::IndexMap;
use log::debug;
use maquette_core::model::{ElementId, RelationshipId};

use crate::context::{BlockBindings, Context, FinderBlock, PluginBlock, ScriptBlock};
use crate::error::{ErrorCode, ParserError, Result};
use crate::expression::{ExpressionContext, evaluate_elements, evaluate_relationships};
use crate::features::{Feature, restricted_mode_error};
use crate::includes::{is_url, read_target};
use crate::parser::Parser;
use crate::plugins::{ExtensionBindings, extension_error};
use crate::tokenizer::Tokens;

impl Parser {
    /// `!elements <expression> {`. The body applies to every matched
    /// element; matching nothing is an error.
    pub(in crate::parser) fn elements_block_statement(
        &mut self,
        enclosing: Option<ElementId>,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "!elements <expression> {";
        Self::require_block(opens_block, GRAMMAR)?;
        tokens.required(1, GRAMMAR)?;
        let expression = tokens.join_from(1);
        let workspace = self.workspace.as_ref().ok_or_else(Self::no_workspace)?;
        let ctx = ExpressionContext {
            model: workspace.model(),
            identifiers: &self.identifiers,
            enclosing,
        };
        let matched = evaluate_elements(&expression, &ctx)?;
        if matched.is_empty() {
            return Err(ParserError::new(
                ErrorCode::E200,
                format!("the expression \"{expression}\" matched no elements"),
            ));
        }
        Ok(Some(Context::ElementsBlock(matched.into_iter().collect())))
    }

    /// `!relationships <expression> {`.
    pub(in crate::parser) fn relationships_block_statement(
        &mut self,
        enclosing: Option<ElementId>,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "!relationships <expression> {";
        Self::require_block(opens_block, GRAMMAR)?;
        tokens.required(1, GRAMMAR)?;
        let expression = tokens.join_from(1);
        let workspace = self.workspace.as_ref().ok_or_else(Self::no_workspace)?;
        let ctx = ExpressionContext {
            model: workspace.model(),
            identifiers: &self.identifiers,
            enclosing,
        };
        let matched = evaluate_relationships(&expression, &ctx)?;
        if matched.is_empty() {
            return Err(ParserError::new(
                ErrorCode::E201,
                format!("the expression \"{expression}\" matched no relationships"),
            ));
        }
        Ok(Some(Context::RelationshipsBlock(
            matched.into_iter().collect(),
        )))
    }

    pub(crate) fn in_elements_block(
        &mut self,
        elements: &[ElementId],
        keyword: &str,
        tokens: &mut Tokens,
    ) -> Result<()> {
        match keyword {
            "description" => {
                const GRAMMAR: &str = "description <description>";
                let description = tokens.required(1, GRAMMAR)?.to_owned();
                tokens.ensure_at_most(2, GRAMMAR)?;
                let model = self.workspace_mut()?.model_mut();
                for element in elements {
                    model.element_mut(*element).set_description(&description);
                }
                Ok(())
            }
            "technology" => {
                const GRAMMAR: &str = "technology <technology>";
                let technology = tokens.required(1, GRAMMAR)?.to_owned();
                tokens.ensure_at_most(2, GRAMMAR)?;
                let model = self.workspace_mut()?.model_mut();
                for element in elements {
                    model.element_mut(*element).set_technology(&technology);
                }
                Ok(())
            }
            "tags" => {
                const GRAMMAR: &str = "tags <tags> [tags...]";
                tokens.required(1, GRAMMAR)?;
                let model = self.workspace_mut()?.model_mut();
                for element in elements {
                    for index in 1..tokens.len() {
                        model
                            .element_mut(*element)
                            .add_tags(tokens.get(index).unwrap_or_default());
                    }
                }
                Ok(())
            }
            "url" => {
                const GRAMMAR: &str = "url <url>";
                let url = tokens.required(1, GRAMMAR)?.to_owned();
                tokens.ensure_at_most(2, GRAMMAR)?;
                let model = self.workspace_mut()?.model_mut();
                for element in elements {
                    model.element_mut(*element).set_url(&url);
                }
                Ok(())
            }
            _ => Err(Self::unexpected(&Context::ElementsBlock(
                elements.to_vec(),
            ))),
        }
    }

    pub(crate) fn in_relationships_block(
        &mut self,
        relationships: &[RelationshipId],
        keyword: &str,
        tokens: &mut Tokens,
    ) -> Result<()> {
        match keyword {
            "technology" => {
                const GRAMMAR: &str = "technology <technology>";
                let technology = tokens.required(1, GRAMMAR)?.to_owned();
                tokens.ensure_at_most(2, GRAMMAR)?;
                let model = self.workspace_mut()?.model_mut();
                for relationship in relationships {
                    model
                        .relationship_mut(*relationship)
                        .set_technology(&technology);
                }
                Ok(())
            }
            "tags" => {
                const GRAMMAR: &str = "tags <tags> [tags...]";
                tokens.required(1, GRAMMAR)?;
                let model = self.workspace_mut()?.model_mut();
                for relationship in relationships {
                    for index in 1..tokens.len() {
                        model
                            .relationship_mut(*relationship)
                            .add_tags(tokens.get(index).unwrap_or_default());
                    }
                }
                Ok(())
            }
            "url" => {
                const GRAMMAR: &str = "url <url>";
                let url = tokens.required(1, GRAMMAR)?.to_owned();
                tokens.ensure_at_most(2, GRAMMAR)?;
                let model = self.workspace_mut()?.model_mut();
                for relationship in relationships {
                    model.relationship_mut(*relationship).set_url(&url);
                }
                Ok(())
            }
            _ => Err(Self::unexpected(&Context::RelationshipsBlock(
                relationships.to_vec(),
            ))),
        }
    }

    // -------------------------------------------------------------------
    // Extension statements
    // -------------------------------------------------------------------

    /// `!script <engine> {` for an inline script, `!script <file|url>` for
    /// an external one. An external script without a block runs right
    /// away; with a block it collects parameters and runs on pop.
    pub(in crate::parser) fn script_statement(
        &mut self,
        tokens: &mut Tokens,
        opens_block: bool,
        bindings: BlockBindings,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "!script <engine|file|url> {";
        if self.restricted {
            return Err(restricted_mode_error("!script"));
        }
        self.features.check(Feature::Scripts)?;
        let target = tokens.required(1, GRAMMAR)?.to_owned();
        tokens.ensure_at_most(2, GRAMMAR)?;

        let external = is_url(&target) || target.contains('.') || target.contains('/');
        let block = if external {
            ScriptBlock {
                engine: None,
                file: Some(target),
                dir: self.line_dir.clone(),
                parameters: IndexMap::new(),
                lines: Vec::new(),
                bindings,
            }
        } else {
            Self::require_block(opens_block, GRAMMAR)?;
            ScriptBlock {
                engine: Some(target),
                file: None,
                dir: self.line_dir.clone(),
                parameters: IndexMap::new(),
                lines: Vec::new(),
                bindings,
            }
        };
        if opens_block {
            Ok(Some(Context::Script(block)))
        } else {
            self.run_script(block).map(|()| None)
        }
    }

    /// Execute a popped (or block-less) script.
    pub(in crate::parser) fn run_script(&mut self, block: ScriptBlock) -> Result<()> {
        let (name, source) = match &block.file {
            Some(file) => {
                let (content, _, _, used_fs) = read_target(
                    file,
                    block.dir.as_deref(),
                    self.fetcher.as_deref(),
                    &self.features,
                    self.restricted,
                )?;
                if used_fs {
                    self.portable = false;
                }
                let extension = file.rsplit('.').next().unwrap_or_default().to_owned();
                (extension, content)
            }
            None => (
                block.engine.clone().unwrap_or_default(),
                block.lines.join("\n"),
            ),
        };
        let engine = self.extensions.script_engine(&name)?;
        let workspace = self.workspace.as_mut().ok_or_else(Self::no_workspace)?;
        let mut bindings = ExtensionBindings {
            workspace,
            element: block.bindings.element,
            relationship: block.bindings.relationship,
            view: block.bindings.view,
        };
        debug!(engine = name.as_str(); "running script");
        engine
            .run(&source, &block.parameters, &mut bindings)
            .map_err(|cause| extension_error(&name, &cause))
    }

    /// `!plugin <name> {`. Without a block the plugin runs right away with
    /// no parameters.
    pub(in crate::parser) fn plugin_statement(
        &mut self,
        tokens: &mut Tokens,
        opens_block: bool,
        bindings: BlockBindings,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "!plugin <name> {";
        if self.restricted {
            return Err(restricted_mode_error("!plugin"));
        }
        self.features.check(Feature::Plugins)?;
        let name = tokens.required(1, GRAMMAR)?.to_owned();
        tokens.ensure_at_most(2, GRAMMAR)?;
        let block = PluginBlock {
            name,
            parameters: IndexMap::new(),
            bindings,
        };
        if opens_block {
            Ok(Some(Context::Plugin(block)))
        } else {
            self.run_plugin(block).map(|()| None)
        }
    }

    pub(in crate::parser) fn run_plugin(&mut self, block: PluginBlock) -> Result<()> {
        let plugin = self.extensions.plugin(&block.name)?;
        let workspace = self.workspace.as_mut().ok_or_else(Self::no_workspace)?;
        let mut bindings = ExtensionBindings {
            workspace,
            element: block.bindings.element,
            relationship: block.bindings.relationship,
            view: block.bindings.view,
        };
        debug!(plugin = block.name.as_str(); "running plugin");
        plugin
            .run(&block.parameters, &mut bindings)
            .map_err(|cause| extension_error(&block.name, &cause))
    }

    /// `!components <finder> {` inside a container block.
    pub(in crate::parser) fn components_statement(
        &mut self,
        container: ElementId,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "!components <finder> {";
        if self.restricted {
            return Err(restricted_mode_error("!components"));
        }
        self.features.check(Feature::ComponentFinder)?;
        Self::require_block(opens_block, GRAMMAR)?;
        let name = tokens.required(1, GRAMMAR)?.to_owned();
        tokens.ensure_at_most(2, GRAMMAR)?;
        Ok(Some(Context::Components(FinderBlock {
            name,
            container,
            directives: Vec::new(),
        })))
    }

    /// Execute a popped `!components` block and register the components
    /// the finder created so expressions can reach them.
    pub(in crate::parser) fn run_component_finder(&mut self, block: FinderBlock) -> Result<()> {
        let finder = self.extensions.component_finder(&block.name)?;
        let workspace = self.workspace.as_mut().ok_or_else(Self::no_workspace)?;
        let created = finder
            .run(workspace, block.container, &block.directives)
            .map_err(|cause| extension_error(&block.name, &cause))?;
        debug!(finder = block.name.as_str(), components = created.len(); "ran component finder");
        for element in created {
            self.identifiers.register_generated(element);
        }
        Ok(())
    }

    /// A `<name> <value>` parameter line inside a `!script` or `!plugin`
    /// block.
    pub(in crate::parser) fn extension_parameter_line(
        parameters: &mut IndexMap<String, String>,
        tokens: &Tokens,
    ) -> Result<()> {
        const GRAMMAR: &str = "<name> <value>";
        let name = tokens.required(0, GRAMMAR)?;
        let value = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;
        parameters.insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    /// A directive line inside a `!components` block, kept verbatim for
    /// the finder.
    pub(in crate::parser) fn finder_directive_line(block: &mut FinderBlock, tokens: &Tokens) {
        let Some(keyword) = tokens.first() else {
            return;
        };
        let keyword = keyword.to_owned();
        let arguments = (1..tokens.len())
            .map(|index| tokens.get(index).unwrap_or_default().to_owned())
            .collect();
        block.directives.push((keyword, arguments));
    }
}
