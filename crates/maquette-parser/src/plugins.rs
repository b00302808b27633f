//! Extension registries for scripts, plugins and component finders.
//!
//! `!script`, `!plugin`, `!components` and `!impliedRelationships`
//! statements delegate to implementations registered by name before the
//! parse starts. Nothing is loaded from the platform at runtime; an
//! unregistered name does not resolve, which is what keeps the set of
//! reachable code fixed for a given parser configuration.

use std::fmt;

use indexmap::IndexMap;
use maquette_core::model::implied::{
    CreateImpliedRelationshipsUnlessAnyExist, CreateImpliedRelationshipsUnlessSameExists,
    ImpliedRelationshipsStrategy, NoImpliedRelationships,
};
use maquette_core::model::{ElementId, RelationshipId};
use maquette_core::views::view::ViewId;
use maquette_core::Workspace;

use crate::error::{ErrorCode, ParserError, Result};

/// Failure raised by user-supplied extension code.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// The model objects in scope where an extension statement appeared.
///
/// The workspace is always bound; the rest depends on the enclosing block.
/// A script inside a `container` block sees that container as `element`, a
/// script at workspace level sees only the workspace.
#[derive(Debug)]
pub struct ExtensionBindings<'a> {
    pub workspace: &'a mut Workspace,
    pub element: Option<ElementId>,
    pub relationship: Option<RelationshipId>,
    pub view: Option<ViewId>,
}

/// Runs DSL-embedded scripts.
///
/// Inline scripts pass the captured block body as `source` with no
/// parameters; external scripts pass the file content and the `name value`
/// parameter lines collected in the block.
pub trait ScriptEngine: fmt::Debug {
    fn run(
        &self,
        source: &str,
        parameters: &IndexMap<String, String>,
        bindings: &mut ExtensionBindings<'_>,
    ) -> std::result::Result<(), ExtensionError>;
}

/// A named workspace transformation invoked by `!plugin`.
pub trait DslPlugin: fmt::Debug {
    fn run(
        &self,
        parameters: &IndexMap<String, String>,
        bindings: &mut ExtensionBindings<'_>,
    ) -> std::result::Result<(), ExtensionError>;
}

/// Discovers components of a container from an external source of truth.
///
/// `directives` holds the statements collected in the `!components` block,
/// one `(keyword, arguments)` entry per line, in order. Returns the
/// components it created.
pub trait ComponentFinder: fmt::Debug {
    fn run(
        &self,
        workspace: &mut Workspace,
        container: ElementId,
        directives: &[(String, Vec<String>)],
    ) -> std::result::Result<Vec<ElementId>, ExtensionError>;
}

type StrategyConstructor = Box<dyn Fn() -> Box<dyn ImpliedRelationshipsStrategy>>;

/// Everything a host can plug into a parser, keyed by name.
///
/// Names match case-insensitively. External scripts look up their file
/// extension, so an engine serving both `!script ruby` and `!script x.rb`
/// is registered twice. The implied-relationship strategies from the core
/// model are pre-registered under `none`, `createUnlessAnyExist` and
/// `createUnlessSameExists`.
pub struct Extensions {
    script_engines: IndexMap<String, Box<dyn ScriptEngine>>,
    plugins: IndexMap<String, Box<dyn DslPlugin>>,
    component_finders: IndexMap<String, Box<dyn ComponentFinder>>,
    strategies: IndexMap<String, StrategyConstructor>,
}

impl Default for Extensions {
    fn default() -> Self {
        Self::new()
    }
}

impl Extensions {
    pub fn new() -> Self {
        let mut extensions = Self {
            script_engines: IndexMap::new(),
            plugins: IndexMap::new(),
            component_finders: IndexMap::new(),
            strategies: IndexMap::new(),
        };
        extensions
            .register_implied_relationships_strategy("none", || Box::new(NoImpliedRelationships));
        extensions.register_implied_relationships_strategy("createUnlessAnyExist", || {
            Box::new(CreateImpliedRelationshipsUnlessAnyExist)
        });
        extensions.register_implied_relationships_strategy("createUnlessSameExists", || {
            Box::new(CreateImpliedRelationshipsUnlessSameExists)
        });
        extensions
    }

    pub fn register_script_engine(&mut self, name: &str, engine: Box<dyn ScriptEngine>) {
        self.script_engines.insert(name.to_lowercase(), engine);
    }

    pub fn register_plugin(&mut self, name: &str, plugin: Box<dyn DslPlugin>) {
        self.plugins.insert(name.to_lowercase(), plugin);
    }

    pub fn register_component_finder(&mut self, name: &str, finder: Box<dyn ComponentFinder>) {
        self.component_finders.insert(name.to_lowercase(), finder);
    }

    pub fn register_implied_relationships_strategy(
        &mut self,
        name: &str,
        constructor: impl Fn() -> Box<dyn ImpliedRelationshipsStrategy> + 'static,
    ) {
        self.strategies
            .insert(name.to_lowercase(), Box::new(constructor));
    }

    pub(crate) fn script_engine(&self, name: &str) -> Result<&dyn ScriptEngine> {
        self.script_engines
            .get(&name.to_lowercase())
            .map(Box::as_ref)
            .ok_or_else(|| unknown_extension("script engine", name))
    }

    pub(crate) fn plugin(&self, name: &str) -> Result<&dyn DslPlugin> {
        self.plugins
            .get(&name.to_lowercase())
            .map(Box::as_ref)
            .ok_or_else(|| unknown_extension("plugin", name))
    }

    pub(crate) fn component_finder(&self, name: &str) -> Result<&dyn ComponentFinder> {
        self.component_finders
            .get(&name.to_lowercase())
            .map(Box::as_ref)
            .ok_or_else(|| unknown_extension("component finder", name))
    }

    pub(crate) fn implied_relationships_strategy(
        &self,
        name: &str,
    ) -> Result<Box<dyn ImpliedRelationshipsStrategy>> {
        self.strategies
            .get(&name.to_lowercase())
            .map(|constructor| constructor())
            .ok_or_else(|| unknown_extension("implied relationships strategy", name))
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field(
                "script_engines",
                &self.script_engines.keys().collect::<Vec<_>>(),
            )
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field(
                "component_finders",
                &self.component_finders.keys().collect::<Vec<_>>(),
            )
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn unknown_extension(kind: &str, name: &str) -> ParserError {
    ParserError::new(
        ErrorCode::E204,
        format!("no {kind} named \"{name}\" is registered"),
    )
}

pub(crate) fn extension_error(name: &str, cause: &dyn fmt::Display) -> ParserError {
    ParserError::new(ErrorCode::E602, format!("\"{name}\" failed: {cause}"))
}
