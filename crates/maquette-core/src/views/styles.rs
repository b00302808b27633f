//! Element and relationship styles, keyed by tag.

use std::str::FromStr;

use crate::{color::Color, error::ModelError};

/// Shape drawn for elements carrying a styled tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Box,
    RoundedBox,
    Circle,
    Ellipse,
    Hexagon,
    Diamond,
    Cylinder,
    Pipe,
    Person,
    Robot,
    Folder,
    WebBrowser,
    MobileDevicePortrait,
    MobileDeviceLandscape,
    Component,
}

impl FromStr for Shape {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "box" => Ok(Shape::Box),
            "roundedbox" => Ok(Shape::RoundedBox),
            "circle" => Ok(Shape::Circle),
            "ellipse" => Ok(Shape::Ellipse),
            "hexagon" => Ok(Shape::Hexagon),
            "diamond" => Ok(Shape::Diamond),
            "cylinder" => Ok(Shape::Cylinder),
            "pipe" => Ok(Shape::Pipe),
            "person" => Ok(Shape::Person),
            "robot" => Ok(Shape::Robot),
            "folder" => Ok(Shape::Folder),
            "webbrowser" => Ok(Shape::WebBrowser),
            "mobiledeviceportrait" => Ok(Shape::MobileDevicePortrait),
            "mobiledevicelandscape" => Ok(Shape::MobileDeviceLandscape),
            "component" => Ok(Shape::Component),
            _ => Err("Invalid shape"),
        }
    }
}

/// Border drawn around a styled element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    Solid,
    Dashed,
    Dotted,
}

impl FromStr for Border {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solid" => Ok(Border::Solid),
            "dashed" => Ok(Border::Dashed),
            "dotted" => Ok(Border::Dotted),
            _ => Err("Invalid border"),
        }
    }
}

/// Line style for styled relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

impl FromStr for LineStyle {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            "dotted" => Ok(LineStyle::Dotted),
            _ => Err("Invalid line style"),
        }
    }
}

/// Routing algorithm for styled relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    Direct,
    Orthogonal,
    Curved,
}

impl FromStr for Routing {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(Routing::Direct),
            "orthogonal" => Ok(Routing::Orthogonal),
            "curved" => Ok(Routing::Curved),
            _ => Err("Invalid routing"),
        }
    }
}

/// Style applied to elements carrying a tag. Unset fields fall back to the
/// renderer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementStyle {
    pub tag: String,
    pub shape: Option<Shape>,
    pub icon: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background: Option<Color>,
    pub color: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<u32>,
    pub font_size: Option<u32>,
    pub border: Option<Border>,
    pub opacity: Option<u32>,
    pub metadata: Option<bool>,
    pub description: Option<bool>,
}

/// Style applied to relationships carrying a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipStyle {
    pub tag: String,
    pub thickness: Option<u32>,
    pub color: Option<Color>,
    pub style: Option<LineStyle>,
    pub routing: Option<Routing>,
    pub font_size: Option<u32>,
    pub width: Option<u32>,
    pub position: Option<u32>,
    pub opacity: Option<u32>,
}

/// All styles and themes defined on a workspace.
#[derive(Debug, Default)]
pub struct Styles {
    element_styles: Vec<ElementStyle>,
    relationship_styles: Vec<RelationshipStyle>,
    themes: Vec<String>,
}

impl Styles {
    /// Starts a new element style for a tag. At most one style per tag.
    pub fn add_element_style(&mut self, tag: &str) -> Result<usize, ModelError> {
        if self.element_styles.iter().any(|style| style.tag == tag) {
            return Err(ModelError::DuplicateElementStyle {
                tag: tag.to_owned(),
            });
        }
        self.element_styles.push(ElementStyle {
            tag: tag.to_owned(),
            ..ElementStyle::default()
        });
        Ok(self.element_styles.len() - 1)
    }

    pub fn element_style_mut(&mut self, index: usize) -> &mut ElementStyle {
        &mut self.element_styles[index]
    }

    pub fn element_styles(&self) -> &[ElementStyle] {
        &self.element_styles
    }

    /// Starts a new relationship style for a tag. At most one style per tag.
    pub fn add_relationship_style(&mut self, tag: &str) -> Result<usize, ModelError> {
        if self
            .relationship_styles
            .iter()
            .any(|style| style.tag == tag)
        {
            return Err(ModelError::DuplicateRelationshipStyle {
                tag: tag.to_owned(),
            });
        }
        self.relationship_styles.push(RelationshipStyle {
            tag: tag.to_owned(),
            ..RelationshipStyle::default()
        });
        Ok(self.relationship_styles.len() - 1)
    }

    pub fn relationship_style_mut(&mut self, index: usize) -> &mut RelationshipStyle {
        &mut self.relationship_styles[index]
    }

    pub fn relationship_styles(&self) -> &[RelationshipStyle] {
        &self.relationship_styles
    }

    /// Registers an external theme URL.
    pub fn add_theme(&mut self, url: &str) {
        self.themes.push(url.to_owned());
    }

    pub fn themes(&self) -> &[String] {
        &self.themes
    }
}
