//! Parsing contexts: the states of the line dispatcher.
//!
//! Every open block corresponds to one [`Context`] on the parser's stack.
//! A context knows which first tokens are legal while it is active, purely
//! for error messages, and carries the handle of the model object its block
//! closes over. Contexts with deferred side effects (scripts, plugins,
//! component finders) accumulate their block content here and are executed
//! by the parser when the closing brace pops them.

use std::path::PathBuf;

use indexmap::IndexMap;
use maquette_core::identifier::Id;
use maquette_core::model::{ElementId, RelationshipId};
use maquette_core::views::view::ViewId;

/// The model objects a script or plugin declared in some block can see.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BlockBindings {
    pub(crate) element: Option<ElementId>,
    pub(crate) relationship: Option<RelationshipId>,
    pub(crate) view: Option<ViewId>,
}

/// Collected state of a `!script` block, executed on pop.
#[derive(Debug)]
pub(crate) struct ScriptBlock {
    /// Engine name for an inline script, `None` for an external one.
    pub(crate) engine: Option<String>,
    /// Script file target for an external script.
    pub(crate) file: Option<String>,
    /// Directory the file target resolves against.
    pub(crate) dir: Option<PathBuf>,
    pub(crate) parameters: IndexMap<String, String>,
    pub(crate) lines: Vec<String>,
    pub(crate) bindings: BlockBindings,
}

impl ScriptBlock {
    /// Inline scripts capture their block body verbatim; external ones
    /// collect `name value` parameter lines instead.
    pub(crate) fn is_inline(&self) -> bool {
        self.engine.is_some()
    }
}

/// Collected state of a `!plugin` block, executed on pop.
#[derive(Debug)]
pub(crate) struct PluginBlock {
    pub(crate) name: String,
    pub(crate) parameters: IndexMap<String, String>,
    pub(crate) bindings: BlockBindings,
}

/// Collected state of a `!components` block, executed on pop.
#[derive(Debug)]
pub(crate) struct FinderBlock {
    pub(crate) name: String,
    pub(crate) container: ElementId,
    pub(crate) directives: Vec<(String, Vec<String>)>,
}

/// Where a `properties` block writes its entries.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PropertyOwner {
    Workspace,
    Configuration,
    Views,
    Element(ElementId),
    Relationship(RelationshipId),
    View(ViewId),
}

/// Where a `perspectives` block writes its entries.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PerspectiveOwner {
    Element(ElementId),
    Relationship(RelationshipId),
}

/// One open block.
#[derive(Debug)]
pub(crate) enum Context {
    Workspace,
    Model,
    /// A `group` block. `parent` is the structural parent new elements in
    /// the group attach to, not the group itself.
    Group {
        group: ElementId,
        parent: Option<ElementId>,
    },
    Person(ElementId),
    SoftwareSystem(ElementId),
    Container(ElementId),
    Component(ElementId),
    CustomElement(ElementId),
    DeploymentEnvironment(ElementId),
    DeploymentNode(ElementId),
    InfrastructureNode(ElementId),
    SoftwareSystemInstance(ElementId),
    ContainerInstance(ElementId),
    Relationship(RelationshipId),
    Archetypes,
    Archetype(Id),
    /// A `!elements <expression>` block; body statements apply to every
    /// matched element.
    ElementsBlock(Vec<ElementId>),
    /// A `!relationships <expression>` block.
    RelationshipsBlock(Vec<RelationshipId>),
    Views,
    SystemLandscapeView(ViewId),
    SystemContextView(ViewId),
    ContainerView(ViewId),
    ComponentView(ViewId),
    DeploymentView(ViewId),
    ImageView(ViewId),
    Animation(ViewId),
    Styles,
    /// Index into the element style list of the workspace styles.
    ElementStyle(usize),
    RelationshipStyle(usize),
    Branding,
    Configuration,
    Properties(PropertyOwner),
    Perspectives(PerspectiveOwner),
    Script(ScriptBlock),
    Plugin(PluginBlock),
    Components(FinderBlock),
    /// Inside a `/* */` block comment.
    Comment,
}

impl Context {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Context::Workspace => "workspace",
            Context::Model => "model",
            Context::Group { .. } => "group",
            Context::Person(_) => "person",
            Context::SoftwareSystem(_) => "softwareSystem",
            Context::Container(_) => "container",
            Context::Component(_) => "component",
            Context::CustomElement(_) => "element",
            Context::DeploymentEnvironment(_) => "deploymentEnvironment",
            Context::DeploymentNode(_) => "deploymentNode",
            Context::InfrastructureNode(_) => "infrastructureNode",
            Context::SoftwareSystemInstance(_) => "softwareSystemInstance",
            Context::ContainerInstance(_) => "containerInstance",
            Context::Relationship(_) => "relationship",
            Context::Archetypes => "archetypes",
            Context::Archetype(_) => "archetype",
            Context::ElementsBlock(_) => "!elements",
            Context::RelationshipsBlock(_) => "!relationships",
            Context::Views => "views",
            Context::SystemLandscapeView(_) => "systemLandscape view",
            Context::SystemContextView(_) => "systemContext view",
            Context::ContainerView(_) => "container view",
            Context::ComponentView(_) => "component view",
            Context::DeploymentView(_) => "deployment view",
            Context::ImageView(_) => "image view",
            Context::Animation(_) => "animation",
            Context::Styles => "styles",
            Context::ElementStyle(_) => "element style",
            Context::RelationshipStyle(_) => "relationship style",
            Context::Branding => "branding",
            Context::Configuration => "configuration",
            Context::Properties(_) => "properties",
            Context::Perspectives(_) => "perspectives",
            Context::Script(_) => "!script",
            Context::Plugin(_) => "!plugin",
            Context::Components(_) => "!components",
            Context::Comment => "comment",
        }
    }

    /// First tokens legal in this context. Used for error messages only;
    /// dispatch never consults this list.
    pub(crate) fn permitted_tokens(&self) -> &'static [&'static str] {
        match self {
            Context::Workspace => &[
                "name",
                "description",
                "properties",
                "model",
                "views",
                "configuration",
                "!identifiers",
                "!impliedRelationships",
                "!docs",
                "!decisions",
                "!script",
                "!plugin",
            ],
            Context::Model => &[
                "archetypes",
                "group",
                "person",
                "softwareSystem",
                "element",
                "deploymentEnvironment",
                "!elements",
                "!relationships",
                "!identifiers",
                "!impliedRelationships",
                "!script",
                "!plugin",
                "<identifier> -> <identifier>",
            ],
            Context::Group { .. } => &[
                "group",
                "person",
                "softwareSystem",
                "container",
                "component",
                "element",
                "deploymentNode",
                "<identifier> -> <identifier>",
            ],
            Context::Person(_) | Context::CustomElement(_) => &[
                "description",
                "tags",
                "url",
                "properties",
                "perspectives",
                "-> <identifier>",
                "!script",
                "!plugin",
            ],
            Context::SoftwareSystem(_) => &[
                "container",
                "group",
                "description",
                "tags",
                "url",
                "properties",
                "perspectives",
                "-> <identifier>",
                "!script",
                "!plugin",
            ],
            Context::Container(_) => &[
                "component",
                "group",
                "description",
                "technology",
                "tags",
                "url",
                "properties",
                "perspectives",
                "-> <identifier>",
                "!components",
                "!script",
                "!plugin",
            ],
            Context::Component(_) => &[
                "description",
                "technology",
                "tags",
                "url",
                "properties",
                "perspectives",
                "-> <identifier>",
                "!script",
                "!plugin",
            ],
            Context::DeploymentEnvironment(_) => {
                &["deploymentNode", "group", "<identifier> -> <identifier>"]
            }
            Context::DeploymentNode(_) => &[
                "deploymentNode",
                "infrastructureNode",
                "softwareSystemInstance",
                "containerInstance",
                "description",
                "technology",
                "tags",
                "url",
                "properties",
                "perspectives",
                "-> <identifier>",
            ],
            Context::InfrastructureNode(_) => &[
                "description",
                "technology",
                "tags",
                "url",
                "properties",
                "perspectives",
                "-> <identifier>",
            ],
            Context::SoftwareSystemInstance(_) | Context::ContainerInstance(_) => {
                &["tags", "url", "properties", "perspectives", "-> <identifier>"]
            }
            Context::Relationship(_) => &["tags", "url", "properties", "perspectives"],
            Context::Archetypes => &["<name> = <kind|archetype>"],
            Context::Archetype(_) => &["description", "technology", "tag", "tags"],
            Context::ElementsBlock(_) => &["description", "technology", "tags", "url"],
            Context::RelationshipsBlock(_) => &["technology", "tags", "url"],
            Context::Views => &[
                "systemLandscape",
                "systemContext",
                "container",
                "component",
                "deployment",
                "image",
                "styles",
                "theme",
                "themes",
                "branding",
                "properties",
            ],
            Context::SystemLandscapeView(_)
            | Context::SystemContextView(_)
            | Context::ContainerView(_)
            | Context::ComponentView(_)
            | Context::DeploymentView(_) => &[
                "include",
                "exclude",
                "animation",
                "autoLayout",
                "default",
                "title",
                "description",
                "properties",
                "!script",
                "!plugin",
            ],
            Context::ImageView(_) => &[
                "plantuml",
                "mermaid",
                "kroki",
                "image",
                "default",
                "title",
                "description",
                "properties",
            ],
            Context::Animation(_) => &["<identifier> [identifier...]"],
            Context::Styles => &["element", "relationship"],
            Context::ElementStyle(_) => &[
                "shape",
                "icon",
                "width",
                "height",
                "background",
                "colour",
                "color",
                "stroke",
                "strokeWidth",
                "fontSize",
                "border",
                "opacity",
                "metadata",
                "description",
            ],
            Context::RelationshipStyle(_) => &[
                "thickness",
                "colour",
                "color",
                "style",
                "routing",
                "fontSize",
                "width",
                "position",
                "opacity",
            ],
            Context::Branding => &["logo", "font"],
            Context::Configuration => &["scope", "visibility", "properties"],
            Context::Properties(_) => &["<name> <value>"],
            Context::Perspectives(_) => &["<name> <description> [value]"],
            Context::Script(_) | Context::Plugin(_) => &["<name> <value>"],
            Context::Components(_) => &["<keyword> [arguments]"],
            Context::Comment => &[],
        }
    }

    /// The element this context closes over, if it is an element block.
    pub(crate) fn element(&self) -> Option<ElementId> {
        match self {
            Context::Person(id)
            | Context::SoftwareSystem(id)
            | Context::Container(id)
            | Context::Component(id)
            | Context::CustomElement(id)
            | Context::DeploymentEnvironment(id)
            | Context::DeploymentNode(id)
            | Context::InfrastructureNode(id)
            | Context::SoftwareSystemInstance(id)
            | Context::ContainerInstance(id) => Some(*id),
            _ => None,
        }
    }

    /// The bindings a script or plugin opened in this context receives.
    pub(crate) fn bindings(&self) -> BlockBindings {
        let mut bindings = BlockBindings {
            element: self.element(),
            ..BlockBindings::default()
        };
        match self {
            Context::Relationship(id) => bindings.relationship = Some(*id),
            Context::SystemLandscapeView(id)
            | Context::SystemContextView(id)
            | Context::ContainerView(id)
            | Context::ComponentView(id)
            | Context::DeploymentView(id)
            | Context::ImageView(id) => bindings.view = Some(*id),
            _ => {}
        }
        bindings
    }
}
