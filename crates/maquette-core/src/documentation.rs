//! Documentation and architecture decision records attached to a workspace
//! or to an element.

/// Markup format of a documentation section or decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Markdown,
    AsciiDoc,
}

impl Format {
    /// Picks the format from a file extension, defaulting to Markdown.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "adoc" | "asciidoc" | "asc" => Format::AsciiDoc,
            _ => Format::Markdown,
        }
    }
}

/// One documentation section, usually sourced from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub filename: String,
    pub content: String,
    pub format: Format,
}

/// One architecture decision record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub id: String,
    pub title: String,
    pub status: String,
    pub content: String,
    pub format: Format,
}

/// Documentation attached to a workspace or an element.
#[derive(Debug, Default)]
pub struct Documentation {
    sections: Vec<Section>,
    decisions: Vec<Decision>,
}

impl Documentation {
    pub fn add_section(&mut self, filename: &str, content: &str, format: Format) {
        self.sections.push(Section {
            filename: filename.to_owned(),
            content: content.to_owned(),
            format,
        });
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn add_decision(&mut self, decision: Decision) {
        self.decisions.push(decision);
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.decisions.is_empty()
    }
}
