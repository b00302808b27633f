//! The `workspace` statement, its direct children and the directives
//! that attach documentation and decisions.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::debug;
use maquette_core::Workspace;
use maquette_core::documentation::{Decision, Format};
use maquette_core::model::CreateImpliedRelationshipsUnlessAnyExist;
use maquette_core::workspace::{Visibility, WorkspaceScope};

use crate::context::{BlockBindings, Context, PerspectiveOwner, PropertyOwner};
use crate::error::{ErrorCode, ParserError, Result};
use crate::features::{Feature, restricted_mode_error};
use crate::identifiers::IdentifierScope;
use crate::includes::{collect_files, read_file, read_target, resolve_path, source_lines};
use crate::parser::Parser;
use crate::tokenizer::Tokens;

impl Parser {
    /// `workspace [name] [description] {` or `workspace extends <source> {`.
    ///
    /// A second workspace statement on an already populated parser switches
    /// to extend mode instead of starting over.
    pub(crate) fn workspace_statement(
        &mut self,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        const GRAMMAR: &str = "workspace [name] [description] {";
        Self::require_block(opens_block, GRAMMAR)?;
        if tokens
            .get(1)
            .is_some_and(|token| token.eq_ignore_ascii_case("extends"))
        {
            return self.extends_statement(tokens);
        }

        let name = tokens.get(1).unwrap_or("");
        let description = tokens.get(2).unwrap_or("");
        tokens.ensure_at_most(3, GRAMMAR)?;
        match self.workspace.as_mut() {
            Some(workspace) => {
                if tokens.includes(1) {
                    workspace.set_name(name);
                }
                if tokens.includes(2) {
                    workspace.set_description(description);
                }
                self.extending = true;
            }
            None => {
                let mut workspace = Workspace::new(name, description);
                workspace
                    .model_mut()
                    .set_implied_relationships_strategy(Box::new(
                        CreateImpliedRelationshipsUnlessAnyExist,
                    ));
                debug!(name = name; "created workspace");
                self.workspace = Some(workspace);
            }
        }
        Ok(Some(Context::Workspace))
    }

    /// Parse the extended source to completion, then continue in extend
    /// mode: statements re-asserting existing content modify it in place.
    fn extends_statement(&mut self, tokens: &Tokens) -> Result<Option<Context>> {
        const GRAMMAR: &str = "workspace extends <file|url> {";
        let target = tokens.required(2, GRAMMAR)?;
        tokens.ensure_at_most(3, GRAMMAR)?;
        let (content, display, dir, used_fs) = read_target(
            target,
            self.line_dir.as_deref(),
            self.fetcher.as_deref(),
            &self.features,
            self.restricted,
        )?;
        if used_fs {
            self.portable = false;
        }
        debug!(target = target; "extending workspace");
        let lines = source_lines(&content, &display, dir, "");
        self.process(lines)?;
        self.check_balanced()?;
        if self.workspace.is_none() {
            return Err(ParserError::new(
                ErrorCode::E103,
                format!("\"{target}\" does not define a workspace"),
            ));
        }
        self.extending = true;
        self.seen_model = false;
        self.seen_views = false;
        Ok(Some(Context::Workspace))
    }

    pub(crate) fn in_workspace(
        &mut self,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "name" => {
                const GRAMMAR: &str = "name <name>";
                let name = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?.set_name(name);
                Ok(None)
            }
            "description" => {
                const GRAMMAR: &str = "description <description>";
                let description = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?.set_description(description);
                Ok(None)
            }
            "model" => {
                Self::require_block(opens_block, "model {")?;
                tokens.ensure_at_most(1, "model {")?;
                if self.seen_model {
                    return Err(ParserError::new(
                        ErrorCode::E502,
                        "a model block is already defined",
                    ));
                }
                self.seen_model = true;
                Ok(Some(Context::Model))
            }
            "views" => {
                Self::require_block(opens_block, "views {")?;
                tokens.ensure_at_most(1, "views {")?;
                if self.seen_views {
                    return Err(ParserError::new(
                        ErrorCode::E502,
                        "a views block is already defined",
                    ));
                }
                self.seen_views = true;
                Ok(Some(Context::Views))
            }
            "configuration" => {
                Self::require_block(opens_block, "configuration {")?;
                tokens.ensure_at_most(1, "configuration {")?;
                Ok(Some(Context::Configuration))
            }
            "properties" => {
                Self::require_block(opens_block, "properties {")?;
                tokens.ensure_at_most(1, "properties {")?;
                Ok(Some(Context::Properties(PropertyOwner::Workspace)))
            }
            "!identifiers" => self.identifiers_statement(tokens).map(|()| None),
            "!impliedrelationships" => self.implied_relationships_statement(tokens).map(|()| None),
            "!docs" => self.docs_statement(tokens).map(|()| None),
            "!decisions" | "!adrs" => self.decisions_statement(tokens).map(|()| None),
            "!script" => self.script_statement(tokens, opens_block, BlockBindings::default()),
            "!plugin" => self.plugin_statement(tokens, opens_block, BlockBindings::default()),
            _ => Err(Self::unexpected(&Context::Workspace)),
        }
    }

    pub(crate) fn in_configuration(
        &mut self,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "scope" => {
                const GRAMMAR: &str = "scope <landscape|softwareSystem>";
                let value = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                let scope = value
                    .parse::<WorkspaceScope>()
                    .map_err(|cause| Self::invalid_value(value, cause))?;
                self.workspace_mut()?.configuration_mut().set_scope(scope);
                Ok(None)
            }
            "visibility" => {
                const GRAMMAR: &str = "visibility <public|private>";
                let value = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                let visibility = value
                    .parse::<Visibility>()
                    .map_err(|cause| Self::invalid_value(value, cause))?;
                self.workspace_mut()?
                    .configuration_mut()
                    .set_visibility(visibility);
                Ok(None)
            }
            "properties" => {
                Self::require_block(opens_block, "properties {")?;
                tokens.ensure_at_most(1, "properties {")?;
                Ok(Some(Context::Properties(PropertyOwner::Configuration)))
            }
            _ => Err(Self::unexpected(&Context::Configuration)),
        }
    }

    /// A `<name> <value>` line inside a `properties` block.
    pub(crate) fn property_line(&mut self, owner: PropertyOwner, tokens: &Tokens) -> Result<()> {
        const GRAMMAR: &str = "<name> <value>";
        let name = tokens.required(0, GRAMMAR)?;
        let value = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;
        let workspace = self.workspace_mut()?;
        match owner {
            PropertyOwner::Workspace => workspace.add_property(name, value),
            PropertyOwner::Configuration => workspace.configuration_mut().add_property(name, value),
            PropertyOwner::Views => workspace.views_mut().add_property(name, value),
            PropertyOwner::Element(element) => {
                workspace.model_mut().element_mut(element).add_property(name, value);
            }
            PropertyOwner::Relationship(relationship) => {
                workspace
                    .model_mut()
                    .relationship_mut(relationship)
                    .add_property(name, value);
            }
            PropertyOwner::View(view) => {
                workspace.views_mut().view_mut(view).add_property(name, value);
            }
        }
        Ok(())
    }

    /// A `<name> <description> [value]` line inside a `perspectives` block.
    pub(crate) fn perspective_line(
        &mut self,
        owner: PerspectiveOwner,
        tokens: &Tokens,
    ) -> Result<()> {
        const GRAMMAR: &str = "<name> <description> [value]";
        let name = tokens.required(0, GRAMMAR)?;
        let description = tokens.required(1, GRAMMAR)?;
        let value = tokens.get(2).unwrap_or("");
        tokens.ensure_at_most(3, GRAMMAR)?;
        let workspace = self.workspace_mut()?;
        match owner {
            PerspectiveOwner::Element(element) => {
                workspace
                    .model_mut()
                    .element_mut(element)
                    .add_perspective(name, description, value);
            }
            PerspectiveOwner::Relationship(relationship) => {
                workspace
                    .model_mut()
                    .relationship_mut(relationship)
                    .add_perspective(name, description, value);
            }
        }
        Ok(())
    }

    /// `!identifiers <flat|hierarchical>`.
    pub(crate) fn identifiers_statement(&mut self, tokens: &Tokens) -> Result<()> {
        const GRAMMAR: &str = "!identifiers <flat|hierarchical>";
        let value = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;
        let scope = value
            .parse::<IdentifierScope>()
            .map_err(|cause| Self::invalid_value(value, cause))?;
        self.identifiers.set_scope(scope);
        Ok(())
    }

    /// `!impliedRelationships <true|false|strategy>`. `true` and `false`
    /// map onto the built-in strategies.
    pub(crate) fn implied_relationships_statement(&mut self, tokens: &Tokens) -> Result<()> {
        const GRAMMAR: &str = "!impliedRelationships <true|false|strategy>";
        let value = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;
        let name = match value.to_lowercase().as_str() {
            "true" => "createUnlessAnyExist",
            "false" => "none",
            _ => value,
        };
        let strategy = self.extensions.implied_relationships_strategy(name)?;
        self.workspace_mut()?
            .model_mut()
            .set_implied_relationships_strategy(strategy);
        Ok(())
    }

    /// `!docs <path>`: attach a file or a directory tree of markup files
    /// as documentation sections, in sorted-filename order.
    pub(crate) fn docs_statement(&mut self, tokens: &Tokens) -> Result<()> {
        const GRAMMAR: &str = "!docs <file|directory>";
        if self.restricted {
            return Err(restricted_mode_error("!docs"));
        }
        self.features.check(Feature::FileSystem)?;
        let target = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;

        for file in self.documentation_files(target)? {
            let content = read_file(&file)?;
            let format = format_of(&file);
            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.workspace_mut()?
                .documentation_mut()
                .add_section(&filename, &content, format);
        }
        self.portable = false;
        Ok(())
    }

    /// `!decisions <path>` (alias `!adrs`): attach architecture decision
    /// records, one per file.
    pub(crate) fn decisions_statement(&mut self, tokens: &Tokens) -> Result<()> {
        const GRAMMAR: &str = "!decisions <file|directory>";
        if self.restricted {
            return Err(restricted_mode_error("!decisions"));
        }
        self.features.check(Feature::Decisions)?;
        self.features.check(Feature::FileSystem)?;
        let target = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;

        for file in self.documentation_files(target)? {
            let content = read_file(&file)?;
            let decision = parse_decision(&file, &content, format_of(&file));
            self.workspace_mut()?
                .documentation_mut()
                .add_decision(decision);
        }
        self.portable = false;
        Ok(())
    }

    fn documentation_files(&self, target: &str) -> Result<Vec<PathBuf>> {
        let path = resolve_path(target, self.line_dir.as_deref())?;
        if path.is_dir() {
            let mut files = Vec::new();
            collect_files(&path, &mut files)?;
            Ok(files)
        } else {
            Ok(vec![path])
        }
    }
}

fn format_of(path: &Path) -> Format {
    Format::from_extension(path.extension().and_then(OsStr::to_str).unwrap_or(""))
}

/// Extract a decision's title and status from its markup: the first
/// top-level heading and the first non-empty line after a `Status`
/// heading, with the filename stem and `Proposed` as fallbacks.
fn parse_decision(path: &Path, content: &str, format: Format) -> Decision {
    let id = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("decision")
        .to_owned();

    let mut title = String::new();
    for line in content.lines() {
        let trimmed = line.trim();
        let heading = trimmed
            .strip_prefix("# ")
            .or_else(|| trimmed.strip_prefix("= "));
        if let Some(heading) = heading {
            title = heading.trim().to_owned();
            break;
        }
    }

    let mut status = String::new();
    let mut in_status = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if in_status && !trimmed.is_empty() {
            status = trimmed.to_owned();
            break;
        }
        if trimmed.eq_ignore_ascii_case("## Status") || trimmed.eq_ignore_ascii_case("== Status") {
            in_status = true;
        }
    }

    Decision {
        title: if title.is_empty() { id.clone() } else { title },
        status: if status.is_empty() {
            "Proposed".to_owned()
        } else {
            status
        },
        id,
        content: content.to_owned(),
        format,
    }
}
