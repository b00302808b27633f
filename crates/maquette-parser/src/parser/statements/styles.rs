//! Style and branding statements inside the `views` block.

use maquette_core::color::Color;
use maquette_core::views::styles::{Border, LineStyle, Routing, Shape};

use crate::context::Context;
use crate::error::Result;
use crate::parser::Parser;
use crate::tokenizer::Tokens;

impl Parser {
    pub(crate) fn in_styles(
        &mut self,
        keyword: &str,
        tokens: &mut Tokens,
        opens_block: bool,
    ) -> Result<Option<Context>> {
        match keyword {
            "element" => {
                const GRAMMAR: &str = "element <tag> {";
                Self::require_block(opens_block, GRAMMAR)?;
                let tag = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                let index = self
                    .workspace_mut()?
                    .views_mut()
                    .styles_mut()
                    .add_element_style(tag)?;
                Ok(Some(Context::ElementStyle(index)))
            }
            "relationship" => {
                const GRAMMAR: &str = "relationship <tag> {";
                Self::require_block(opens_block, GRAMMAR)?;
                let tag = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                let index = self
                    .workspace_mut()?
                    .views_mut()
                    .styles_mut()
                    .add_relationship_style(tag)?;
                Ok(Some(Context::RelationshipStyle(index)))
            }
            _ => Err(Self::unexpected(&Context::Styles)),
        }
    }

    pub(crate) fn in_element_style(
        &mut self,
        index: usize,
        keyword: &str,
        tokens: &mut Tokens,
    ) -> Result<()> {
        let value = match keyword {
            "metadata" | "description" => tokens.required(1, "<keyword> <true|false>")?,
            _ => tokens.required(1, "<keyword> <value>")?,
        }
        .to_owned();
        tokens.ensure_at_most(2, "<keyword> <value>")?;

        let style = self
            .workspace_mut()?
            .views_mut()
            .styles_mut()
            .element_style_mut(index);
        match keyword {
            "shape" => {
                style.shape = Some(
                    value
                        .to_lowercase()
                        .parse::<Shape>()
                        .map_err(|cause| Self::invalid_value(&value, cause))?,
                );
            }
            "icon" => style.icon = Some(value),
            "width" => style.width = Some(Self::parse_number(&value)?),
            "height" => style.height = Some(Self::parse_number(&value)?),
            "background" => style.background = Some(parse_color(&value)?),
            "colour" | "color" => style.color = Some(parse_color(&value)?),
            "stroke" => style.stroke = Some(parse_color(&value)?),
            "strokewidth" => style.stroke_width = Some(Self::parse_number(&value)?),
            "fontsize" => style.font_size = Some(Self::parse_number(&value)?),
            "border" => {
                style.border = Some(
                    value
                        .to_lowercase()
                        .parse::<Border>()
                        .map_err(|cause| Self::invalid_value(&value, cause))?,
                );
            }
            "opacity" => style.opacity = Some(parse_opacity(&value)?),
            "metadata" => style.metadata = Some(parse_bool(&value)?),
            "description" => style.description = Some(parse_bool(&value)?),
            _ => return Err(Self::unexpected(&Context::ElementStyle(index))),
        }
        Ok(())
    }

    pub(crate) fn in_relationship_style(
        &mut self,
        index: usize,
        keyword: &str,
        tokens: &mut Tokens,
    ) -> Result<()> {
        let value = tokens.required(1, "<keyword> <value>")?.to_owned();
        tokens.ensure_at_most(2, "<keyword> <value>")?;

        let style = self
            .workspace_mut()?
            .views_mut()
            .styles_mut()
            .relationship_style_mut(index);
        match keyword {
            "thickness" => style.thickness = Some(Self::parse_number(&value)?),
            "colour" | "color" => style.color = Some(parse_color(&value)?),
            "style" => {
                style.style = Some(
                    value
                        .to_lowercase()
                        .parse::<LineStyle>()
                        .map_err(|cause| Self::invalid_value(&value, cause))?,
                );
            }
            "routing" => {
                style.routing = Some(
                    value
                        .to_lowercase()
                        .parse::<Routing>()
                        .map_err(|cause| Self::invalid_value(&value, cause))?,
                );
            }
            "fontsize" => style.font_size = Some(Self::parse_number(&value)?),
            "width" => style.width = Some(Self::parse_number(&value)?),
            "position" => style.position = Some(parse_opacity(&value)?),
            "opacity" => style.opacity = Some(parse_opacity(&value)?),
            _ => return Err(Self::unexpected(&Context::RelationshipStyle(index))),
        }
        Ok(())
    }

    pub(crate) fn in_branding(&mut self, keyword: &str, tokens: &mut Tokens) -> Result<()> {
        match keyword {
            "logo" => {
                const GRAMMAR: &str = "logo <file|url>";
                let logo = tokens.required(1, GRAMMAR)?;
                tokens.ensure_at_most(2, GRAMMAR)?;
                self.workspace_mut()?
                    .views_mut()
                    .branding_mut()
                    .set_logo(logo);
                Ok(())
            }
            "font" => {
                const GRAMMAR: &str = "font <name> [url]";
                let name = tokens.required(1, GRAMMAR)?;
                let url = tokens.get(2);
                tokens.ensure_at_most(3, GRAMMAR)?;
                self.workspace_mut()?
                    .views_mut()
                    .branding_mut()
                    .set_font(name, url);
                Ok(())
            }
            _ => Err(Self::unexpected(&Context::Branding)),
        }
    }
}

fn parse_color(value: &str) -> Result<Color> {
    Color::new(value).map_err(|cause| Parser::invalid_value(value, &cause))
}

/// A percentage value, 0 to 100.
fn parse_opacity(value: &str) -> Result<u32> {
    let number = Parser::parse_number(value)?;
    if number > 100 {
        return Err(Parser::invalid_value(value, "expected a value from 0 to 100"));
    }
    Ok(number)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Parser::invalid_value(value, "expected true or false")),
    }
}
