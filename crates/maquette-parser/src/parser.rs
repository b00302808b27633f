//! The line dispatcher driving DSL parsing.
//!
//! The parser works through a queue of [`SourceLine`]s. Each line is
//! tokenized, run through `${name}` substitution, and dispatched on the
//! pair of (innermost open block, first token). Statements that open a
//! block push a [`Context`] onto the stack; a closing brace pops one and
//! runs any side effect the block deferred (scripts, plugins, component
//! finders, image view validation). `!include` splices the included lines
//! at the front of the queue, so included content is parsed exactly as if
//! it had been written in place.
//!
//! The public entry points are [`Parser::parse_str`] and
//! [`Parser::parse_file`]; both may be called repeatedly to accumulate
//! into the same workspace.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::debug;
use maquette_core::Workspace;
use maquette_core::model::ElementId;

use crate::archetypes::{Archetype, ArchetypeKind, Archetypes};
use crate::context::Context;
use crate::error::{ErrorCode, ParserError, Result, SourceLocation};
use crate::expression::element_not_found;
use crate::features::{Feature, Features};
use crate::identifiers::{IdentifiersRegister, validate_identifier};
use crate::includes::{SourceLine, read_file, resolve_include, source_lines};
use crate::plugins::Extensions;
#[cfg(feature = "http")]
use crate::remote::HttpFetcher;
use crate::remote::UrlFetcher;
use crate::preprocess::is_single_line_comment;
use crate::substitution::{NameValueKind, NameValues};
use crate::tokenizer::{Tokens, tokenize};

mod statements;

/// Workspace property the parsed DSL source is embedded under.
const DSL_PROPERTY: &str = "maquette.dsl";
/// Setting this property to `false` opts out of source embedding.
const DSL_SOURCE_PROPERTY: &str = "maquette.dsl.source";

/// A parser for the Maquette DSL.
///
/// One parser accumulates one workspace. Configuration (features,
/// restricted mode, extensions, the URL fetcher) applies to every
/// subsequent parse call.
#[derive(Debug)]
pub struct Parser {
    features: Features,
    extensions: Extensions,
    fetcher: Option<Box<dyn UrlFetcher>>,
    restricted: bool,
    workspace: Option<Workspace>,
    /// Whether parsed statements extend an already populated workspace,
    /// re-asserting existing elements instead of raising duplicates.
    extending: bool,
    stack: Vec<Context>,
    identifiers: IdentifiersRegister,
    values: NameValues,
    archetypes: Archetypes,
    /// Identifier from an `x = ...` assignment, waiting for the statement
    /// on the same line to claim it.
    pending_identifier: Option<String>,
    /// Directory of the line currently dispatched, for relative targets.
    line_dir: Option<PathBuf>,
    /// False once any filesystem content was composed in, at which point
    /// the source can no longer be reconstructed from the workspace.
    portable: bool,
    parsed_source: String,
    seen_model: bool,
    seen_views: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            features: Features::default(),
            extensions: Extensions::new(),
            fetcher: default_fetcher(),
            restricted: false,
            workspace: None,
            extending: false,
            stack: Vec::new(),
            identifiers: IdentifiersRegister::default(),
            values: NameValues::default(),
            archetypes: Archetypes::default(),
            pending_identifier: None,
            line_dir: None,
            portable: true,
            parsed_source: String::new(),
            seen_model: false,
            seen_views: false,
        }
    }

    /// Put the parser in restricted mode: no scripts, plugins or component
    /// finders, no DSL-initiated file reads and no environment variable
    /// substitution.
    pub fn set_restricted(&mut self, restricted: bool) {
        self.restricted = restricted;
    }

    pub fn enable_feature(&mut self, feature: Feature) {
        self.features.enable(feature);
    }

    pub fn disable_feature(&mut self, feature: Feature) {
        self.features.disable(feature);
    }

    /// Replace the fetcher used for URL includes, remote extends targets
    /// and remote scripts.
    pub fn set_fetcher(&mut self, fetcher: Box<dyn UrlFetcher>) {
        self.fetcher = Some(fetcher);
    }

    /// The extension registries scripts, plugins, component finders and
    /// implied relationship strategies are looked up in.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn set_extensions(&mut self, extensions: Extensions) {
        self.extensions = extensions;
    }

    /// The workspace built so far.
    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub fn into_workspace(self) -> Option<Workspace> {
        self.workspace
    }

    /// Whether the parsed source can be reproduced from the workspace
    /// alone. False once filesystem content was composed in.
    pub fn portable(&self) -> bool {
        self.portable
    }

    /// Parse DSL source from a string.
    ///
    /// Relative `!include` and `workspace extends` targets cannot be
    /// resolved in this mode and raise a file error.
    pub fn parse_str(&mut self, source: &str) -> Result<()> {
        self.begin_document();
        let lines = source_lines(source, "<inline>", None, "");
        self.process(lines)?;
        self.finish_document(source)
    }

    /// Parse DSL source from a file.
    ///
    /// The file is read by the host, so this works in restricted mode too;
    /// only reads initiated by DSL statements are refused there.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = read_file(path)?;
        let display = path.display().to_string();
        let dir = path.parent().map(Path::to_path_buf);
        debug!(file = display.as_str(); "parsing source file");
        self.begin_document();
        let lines = source_lines(&content, &display, dir, "");
        self.process(lines)?;
        self.finish_document(&content)
    }

    fn begin_document(&mut self) {
        self.stack.clear();
        self.pending_identifier = None;
        self.seen_model = false;
        self.seen_views = false;
    }

    fn finish_document(&mut self, source: &str) -> Result<()> {
        self.check_balanced()?;
        self.parsed_source.push_str(source);
        if !source.ends_with('\n') {
            self.parsed_source.push('\n');
        }
        self.embed_source();
        Ok(())
    }

    /// Drive a queue of lines to completion. `workspace extends` targets
    /// re-enter here with the base document's lines.
    fn process(&mut self, lines: Vec<SourceLine>) -> Result<()> {
        let mut queue: VecDeque<SourceLine> = lines.into();
        while let Some(line) = queue.pop_front() {
            self.dispatch_line(&line, &mut queue).map_err(|err| {
                err.or_location(|| SourceLocation::new(&line.file, line.number, &line.text))
            })?;
        }
        Ok(())
    }

    fn dispatch_line(&mut self, line: &SourceLine, queue: &mut VecDeque<SourceLine>) -> Result<()> {
        if matches!(self.stack.last(), Some(Context::Comment)) {
            if line.text.contains("*/") {
                self.stack.pop();
            }
            return Ok(());
        }
        if let Some(Context::Script(block)) = self.stack.last_mut() {
            if block.is_inline() && line.text.trim() != "}" {
                block.lines.push(line.text.clone());
                return Ok(());
            }
        }

        let trimmed = line.text.trim();
        if trimmed.is_empty() || is_single_line_comment(trimmed) {
            return Ok(());
        }
        if let Some(rest) = trimmed.strip_prefix("/*") {
            if !rest.contains("*/") {
                self.stack.push(Context::Comment);
            }
            return Ok(());
        }

        let mut tokens = tokenize(trimmed)?;
        if tokens.is_empty() {
            return Ok(());
        }
        let use_environment = !self.restricted;
        tokens.map_tokens(|token| Ok(self.values.substitute(token, use_environment)))?;

        if tokens.len() == 1 && tokens.first() == Some("}") {
            return self.close_block();
        }

        self.line_dir.clone_from(&line.dir);

        if let Some(name) = tokens.take_assignment() {
            validate_identifier(&name)?;
            self.pending_identifier = Some(name);
        }
        let Some(first) = tokens.first() else {
            return Err(ParserError::new(
                ErrorCode::E101,
                "expected: <identifier> = <statement>",
            ));
        };
        let keyword = first.to_lowercase();
        let opens_block = tokens.split_trailing_brace();

        let outcome = match keyword.as_str() {
            "!include" => {
                Self::no_block(opens_block, "!include <file|directory|url>")?;
                self.include_statement(&tokens, line, queue)?;
                None
            }
            "!const" => {
                Self::no_block(opens_block, "!const <name> <value>")?;
                self.name_value_statement(&tokens, NameValueKind::Constant)?;
                None
            }
            "!var" => {
                Self::no_block(opens_block, "!var <name> <value>")?;
                self.name_value_statement(&tokens, NameValueKind::Variable)?;
                None
            }
            _ => {
                let mut context = self.stack.pop();
                let result =
                    self.statement_in_context(context.as_mut(), &keyword, &mut tokens, opens_block);
                if let Some(context) = context {
                    self.stack.push(context);
                }
                result?
            }
        };

        if let Some(name) = self.pending_identifier.take() {
            return Err(ParserError::new(
                ErrorCode::E301,
                format!("\"{name}\" cannot be assigned here"),
            )
            .with_help("identifiers can name elements, relationships, groups and archetypes"));
        }
        if opens_block && outcome.is_none() {
            return Err(ParserError::new(
                ErrorCode::E300,
                "this statement does not open a block",
            ));
        }
        if let Some(context) = outcome {
            self.stack.push(context);
        }
        Ok(())
    }

    /// Dispatch a statement against the innermost open block. Handlers
    /// return the context to push when the statement opened one.
    fn statement_in_context(
        &mut self,
        context: Option<&mut Context>,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        let Some(context) = context else {
            if keyword == "workspace" {
                return self.workspace_statement(tokens, opens_block);
            }
            return Err(Self::unexpected_top_level());
        };
        match context {
            Context::Workspace => self.in_workspace(keyword, tokens, opens_block),
            Context::Model => self.in_model(keyword, tokens, opens_block),
            Context::Group { group, parent } => {
                let (group, parent) = (*group, *parent);
                self.in_group(group, parent, keyword, tokens, opens_block)
            }
            Context::Person(element) => {
                let element = *element;
                self.in_basic_element(Context::Person(element), element, keyword, tokens, opens_block)
            }
            Context::CustomElement(element) => {
                let element = *element;
                self.in_basic_element(
                    Context::CustomElement(element),
                    element,
                    keyword,
                    tokens,
                    opens_block,
                )
            }
            Context::SoftwareSystem(element) => {
                let element = *element;
                self.in_software_system(element, keyword, tokens, opens_block)
            }
            Context::Container(element) => {
                let element = *element;
                self.in_container(element, keyword, tokens, opens_block)
            }
            Context::Component(element) => {
                let element = *element;
                self.in_technical_element(
                    Context::Component(element),
                    element,
                    keyword,
                    tokens,
                    opens_block,
                )
            }
            Context::InfrastructureNode(element) => {
                let element = *element;
                self.in_technical_element(
                    Context::InfrastructureNode(element),
                    element,
                    keyword,
                    tokens,
                    opens_block,
                )
            }
            Context::DeploymentEnvironment(element) => {
                let element = *element;
                self.in_deployment_environment(element, keyword, tokens, opens_block)
            }
            Context::DeploymentNode(element) => {
                let element = *element;
                self.in_deployment_node(element, keyword, tokens, opens_block)
            }
            Context::SoftwareSystemInstance(element) => {
                let element = *element;
                self.in_instance(
                    Context::SoftwareSystemInstance(element),
                    element,
                    keyword,
                    tokens,
                    opens_block,
                )
            }
            Context::ContainerInstance(element) => {
                let element = *element;
                self.in_instance(
                    Context::ContainerInstance(element),
                    element,
                    keyword,
                    tokens,
                    opens_block,
                )
            }
            Context::Relationship(relationship) => {
                let relationship = *relationship;
                self.in_relationship(relationship, keyword, tokens, opens_block)
            }
            Context::Archetypes => self.archetype_declaration(tokens, opens_block),
            Context::Archetype(id) => {
                let id = *id;
                self.in_archetype(id, keyword, tokens).map(|()| None)
            }
            Context::ElementsBlock(elements) => {
                let elements = elements.clone();
                self.in_elements_block(&elements, keyword, tokens).map(|()| None)
            }
            Context::RelationshipsBlock(relationships) => {
                let relationships = relationships.clone();
                self.in_relationships_block(&relationships, keyword, tokens)
                    .map(|()| None)
            }
            Context::Views => self.in_views(keyword, tokens, opens_block),
            Context::SystemLandscapeView(view) => {
                let view = *view;
                self.in_view(Context::SystemLandscapeView(view), view, keyword, tokens, opens_block)
            }
            Context::SystemContextView(view) => {
                let view = *view;
                self.in_view(Context::SystemContextView(view), view, keyword, tokens, opens_block)
            }
            Context::ContainerView(view) => {
                let view = *view;
                self.in_view(Context::ContainerView(view), view, keyword, tokens, opens_block)
            }
            Context::ComponentView(view) => {
                let view = *view;
                self.in_view(Context::ComponentView(view), view, keyword, tokens, opens_block)
            }
            Context::DeploymentView(view) => {
                let view = *view;
                self.in_view(Context::DeploymentView(view), view, keyword, tokens, opens_block)
            }
            Context::ImageView(view) => {
                let view = *view;
                self.in_image_view(view, keyword, tokens, opens_block)
            }
            Context::Animation(view) => {
                let view = *view;
                self.animation_step(view, tokens).map(|()| None)
            }
            Context::Styles => self.in_styles(keyword, tokens, opens_block),
            Context::ElementStyle(index) => {
                let index = *index;
                self.in_element_style(index, keyword, tokens).map(|()| None)
            }
            Context::RelationshipStyle(index) => {
                let index = *index;
                self.in_relationship_style(index, keyword, tokens).map(|()| None)
            }
            Context::Branding => self.in_branding(keyword, tokens).map(|()| None),
            Context::Configuration => self.in_configuration(keyword, tokens, opens_block),
            Context::Properties(owner) => {
                let owner = *owner;
                self.property_line(owner, tokens).map(|()| None)
            }
            Context::Perspectives(owner) => {
                let owner = *owner;
                self.perspective_line(owner, tokens).map(|()| None)
            }
            Context::Script(block) => {
                Self::extension_parameter_line(&mut block.parameters, tokens).map(|()| None)
            }
            Context::Plugin(block) => {
                Self::extension_parameter_line(&mut block.parameters, tokens).map(|()| None)
            }
            Context::Components(block) => {
                Self::finder_directive_line(block, tokens);
                Ok(None)
            }
            Context::Comment => Ok(None),
        }
    }

    fn close_block(&mut self) -> Result<()> {
        let Some(context) = self.stack.pop() else {
            return Err(ParserError::new(ErrorCode::E501, "unexpected closing brace"));
        };
        match context {
            Context::Script(block) => self.run_script(block),
            Context::Plugin(block) => self.run_plugin(block),
            Context::Components(block) => self.run_component_finder(block),
            Context::ImageView(view) => self.finish_image_view(view),
            _ => Ok(()),
        }
    }

    /// End-of-document structural check: every opened block must have been
    /// closed and every block comment terminated.
    fn check_balanced(&mut self) -> Result<()> {
        let Some(context) = self.stack.pop() else {
            return Ok(());
        };
        self.stack.clear();
        if matches!(context, Context::Comment) {
            return Err(ParserError::new(ErrorCode::E002, "unterminated block comment"));
        }
        Err(ParserError::new(
            ErrorCode::E500,
            format!("missing closing brace: the {} block is still open", context.name()),
        ))
    }

    /// Embed the accumulated DSL source into the workspace, base64
    /// encoded, so the workspace alone can reproduce it. Skipped once any
    /// filesystem content was composed in, or when opted out via the
    /// `maquette.dsl.source false` property.
    fn embed_source(&mut self) {
        if !self.portable {
            return;
        }
        let Some(workspace) = self.workspace.as_mut() else {
            return;
        };
        if workspace.property(DSL_SOURCE_PROPERTY) == Some("false") {
            return;
        }
        workspace.add_property(DSL_PROPERTY, &STANDARD.encode(&self.parsed_source));
    }

    // -------------------------------------------------------------------
    // Context-free directives
    // -------------------------------------------------------------------

    fn include_statement(
        &mut self,
        tokens: &Tokens,
        line: &SourceLine,
        queue: &mut VecDeque<SourceLine>,
    ) -> Result<()> {
        const GRAMMAR: &str = "!include <file|directory|url>";
        self.features.check(Feature::Include)?;
        let target = tokens.required(1, GRAMMAR)?;
        tokens.ensure_at_most(2, GRAMMAR)?;
        let indent: String = line
            .text
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect();
        let (lines, used_fs) = resolve_include(
            target,
            &indent,
            line.dir.as_deref(),
            self.fetcher.as_deref(),
            &self.features,
            self.restricted,
        )?;
        if used_fs {
            self.portable = false;
        }
        debug!(target = target, lines = lines.len(); "included source");
        for spliced in lines.into_iter().rev() {
            queue.push_front(spliced);
        }
        Ok(())
    }

    fn name_value_statement(&mut self, tokens: &Tokens, kind: NameValueKind) -> Result<()> {
        let grammar = match kind {
            NameValueKind::Constant => "!const <name> <value>",
            NameValueKind::Variable => "!var <name> <value>",
        };
        let name = tokens.required(1, grammar)?;
        let value = tokens.required(2, grammar)?;
        tokens.ensure_at_most(3, grammar)?;
        self.values.declare(name, value, kind)
    }

    // -------------------------------------------------------------------
    // Shared helpers
    // -------------------------------------------------------------------

    fn unexpected(context: &Context) -> ParserError {
        let err = ParserError::new(
            ErrorCode::E300,
            format!("unexpected tokens in {}", context.name()),
        );
        let permitted = context.permitted_tokens();
        if permitted.is_empty() {
            err
        } else {
            err.with_help(format!("permitted tokens: {}", permitted.join(", ")))
        }
    }

    fn unexpected_top_level() -> ParserError {
        ParserError::new(ErrorCode::E300, "unexpected tokens outside any block")
            .with_help("expected: workspace")
    }

    fn no_workspace() -> ParserError {
        ParserError::new(ErrorCode::E300, "no workspace block is open")
    }

    fn require_block(opens_block: bool, grammar: &str) -> Result<()> {
        if opens_block {
            Ok(())
        } else {
            Err(ParserError::new(
                ErrorCode::E101,
                format!("expected: {grammar}"),
            ))
        }
    }

    fn no_block(opens_block: bool, grammar: &str) -> Result<()> {
        if opens_block {
            return Err(ParserError::new(
                ErrorCode::E100,
                format!("too many tokens, expected: {grammar}"),
            ));
        }
        Ok(())
    }

    fn invalid_value(value: &str, cause: &str) -> ParserError {
        ParserError::new(
            ErrorCode::E103,
            format!("invalid value \"{value}\": {cause}"),
        )
    }

    fn parse_number(value: &str) -> Result<u32> {
        value
            .parse()
            .map_err(|_| Self::invalid_value(value, "expected a number"))
    }

    /// The archetype, declared or built in, an element-creating keyword
    /// stands for. Declared archetypes shadow the built-in keywords.
    fn element_template(&self, keyword: &str) -> Option<(ArchetypeKind, Archetype)> {
        if let Some((kind, archetype)) = self.archetypes.get(keyword) {
            return Some((kind, archetype.clone()));
        }
        ArchetypeKind::from_keyword(keyword).map(|kind| (kind, Archetype::default()))
    }

    /// In extend mode, the element a re-asserting statement refers to.
    fn existing_element(&self, parent: Option<ElementId>, name: &str) -> Option<ElementId> {
        if !self.extending {
            return None;
        }
        let workspace = self.workspace.as_ref()?;
        workspace.model().find_element_by_name(parent, name)
    }

    /// Bind the pending `x = ...` identifier to a freshly created element,
    /// or register a generated one so expressions can still reach it.
    fn register_pending_element(&mut self, element: ElementId) -> Result<()> {
        let Some(workspace) = self.workspace.as_ref() else {
            return Err(Self::no_workspace());
        };
        match self.pending_identifier.take() {
            Some(name) => self
                .identifiers
                .register_element(&name, element, workspace.model()),
            None => {
                self.identifiers.register_generated(element);
                Ok(())
            }
        }
    }

    fn workspace_ref(&self) -> Result<&Workspace> {
        self.workspace.as_ref().ok_or_else(Self::no_workspace)
    }

    fn workspace_mut(&mut self) -> Result<&mut Workspace> {
        self.workspace.as_mut().ok_or_else(Self::no_workspace)
    }

    /// Resolve a relationship endpoint. `this` names the enclosing element
    /// when a relationship is declared inside an element block.
    fn resolve_endpoint(
        &self,
        name: &str,
        this: Option<ElementId>,
        enclosing: Option<ElementId>,
    ) -> Result<ElementId> {
        if name.eq_ignore_ascii_case("this") {
            return this.ok_or_else(|| element_not_found("this"));
        }
        let Some(workspace) = self.workspace.as_ref() else {
            return Err(Self::no_workspace());
        };
        self.identifiers
            .find_element(name, enclosing, workspace.model())
            .ok_or_else(|| element_not_found(name))
    }
}

fn default_fetcher() -> Option<Box<dyn UrlFetcher>> {
    #[cfg(feature = "http")]
    {
        Some(Box::new(HttpFetcher))
    }
    #[cfg(not(feature = "http"))]
    {
        None
    }
}
