//! Plain-text workspace dump.
//!
//! A deterministic, line-oriented summary of a parsed workspace: the
//! element tree, the live relationships, the declared views and the style
//! surface. Intended for inspection and golden testing rather than
//! rendering.

use std::fmt::Write as _;

use maquette_core::Workspace;
use maquette_core::model::{Element, Model};

/// Dumps a workspace as indented plain text.
#[derive(Debug, Default)]
pub struct TextDumper;

impl TextDumper {
    pub fn new() -> Self {
        Self
    }

    pub fn dump(&self, workspace: &Workspace) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "workspace \"{}\"", workspace.name());
        if !workspace.description().is_empty() {
            let _ = writeln!(out, "  {}", workspace.description());
        }

        let model = workspace.model();
        let _ = writeln!(out, "\nelements:");
        for root in model.elements().filter(|element| element.parent().is_none()) {
            self.dump_element(&mut out, model, root, 1);
        }

        let _ = writeln!(out, "\nrelationships:");
        for relationship in model.relationships() {
            let source = model.element(relationship.source()).name();
            let destination = model.element(relationship.destination()).name();
            let mut line = format!("  {source} -> {destination}");
            if !relationship.description().is_empty() {
                let _ = write!(line, ": {}", relationship.description());
            }
            if !relationship.technology().is_empty() {
                let _ = write!(line, " [{}]", relationship.technology());
            }
            let _ = writeln!(out, "{line}");
        }

        let views = workspace.views();
        let _ = writeln!(out, "\nviews:");
        for view in views.views() {
            let _ = writeln!(
                out,
                "  {} \"{}\" ({} elements)",
                view.kind().type_name(),
                view.key(),
                view.elements().count(),
            );
        }

        let styles = views.styles();
        let _ = writeln!(
            out,
            "\nstyles: {} element, {} relationship, {} themes",
            styles.element_styles().len(),
            styles.relationship_styles().len(),
            styles.themes().len(),
        );
        out
    }

    fn dump_element(&self, out: &mut String, model: &Model, element: &Element, depth: usize) {
        let indent = "  ".repeat(depth);
        let mut line = format!("{indent}{} \"{}\"", element.kind().type_name(), element.name());
        if !element.technology().is_empty() {
            let _ = write!(line, " [{}]", element.technology());
        }
        let _ = writeln!(out, "{line}");
        for child in model.children(element.id()) {
            self.dump_element(out, model, child, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        let mut workspace = Workspace::new("Shop", "");
        let model = workspace.model_mut();
        let customer = model.add_person("Customer", "").unwrap();
        let shop = model.add_software_system("Shop", "").unwrap();
        let web = model.add_container(shop, "Web", "", "Rust").unwrap();
        model.uses(customer, web, "Uses", "", "").unwrap();
        workspace
    }

    #[test]
    fn dump_lists_the_tree_and_relationships() {
        let text = TextDumper::new().dump(&workspace());
        assert!(text.starts_with("workspace \"Shop\""));
        assert!(text.contains("Person \"Customer\""));
        assert!(text.contains("    Container \"Web\" [Rust]"));
        assert!(text.contains("Customer -> Web: Uses"));
    }

    #[test]
    fn dump_is_deterministic() {
        let workspace = workspace();
        let dumper = TextDumper::new();
        assert_eq!(dumper.dump(&workspace), dumper.dump(&workspace));
    }
}
