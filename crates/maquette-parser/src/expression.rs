//! The expression evaluator.
//!
//! Expressions select sets of elements or relationships for `!elements`,
//! `!relationships` and view `include`/`exclude` statements. Operator text
//! is matched case-insensitively; values keep their case. `" && "`
//! intersects terms and `" || "` unions them, with no precedence: an
//! expression using both is rejected rather than guessed at.
//!
//! Tag and property matching on an instance falls through to its base
//! element, and on a relationship falls through along its linked chain, so
//! deployment wrappers inherit what was declared on the static model.

use indexmap::IndexSet;

use maquette_core::model::{Element, ElementId, ElementKind, Model, Relationship, RelationshipId};

use crate::error::{ErrorCode, ParserError, Result};
use crate::identifiers::IdentifiersRegister;

const AND: &str = " && ";
const OR: &str = " || ";
const ARROW: &str = "->";

/// Everything a term needs to resolve identifiers and walk the model.
pub(crate) struct ExpressionContext<'a> {
    pub(crate) model: &'a Model,
    pub(crate) identifiers: &'a IdentifiersRegister,
    /// Innermost enclosing element, for hierarchical identifier lookups.
    pub(crate) enclosing: Option<ElementId>,
}

impl ExpressionContext<'_> {
    fn resolve_element(&self, name: &str) -> Result<ElementId> {
        self.identifiers
            .find_element(name, self.enclosing, self.model)
            .ok_or_else(|| element_not_found(name))
    }
}

pub(crate) fn element_not_found(name: &str) -> ParserError {
    ParserError::new(
        ErrorCode::E200,
        format!("the element \"{name}\" does not exist"),
    )
}

pub(crate) fn relationship_not_found(name: &str) -> ParserError {
    ParserError::new(
        ErrorCode::E201,
        format!("the relationship \"{name}\" does not exist"),
    )
}

/// Whether an include/exclude operand is an expression rather than a list
/// of identifiers.
pub(crate) fn is_expression(operand: &str) -> bool {
    operand.contains("==") || operand.contains("!=") || operand.contains(ARROW)
}

/// Evaluate an expression to a set of elements.
pub(crate) fn evaluate_elements(
    expr: &str,
    ctx: &ExpressionContext<'_>,
) -> Result<IndexSet<ElementId>> {
    let (terms, combinator) = split_terms(expr)?;
    combine(terms, combinator, |term| evaluate_element_term(term, ctx))
}

/// Evaluate an expression to a set of relationships.
pub(crate) fn evaluate_relationships(
    expr: &str,
    ctx: &ExpressionContext<'_>,
) -> Result<IndexSet<RelationshipId>> {
    let (terms, combinator) = split_terms(expr)?;
    combine(terms, combinator, |term| {
        evaluate_relationship_term(term, ctx)
    })
}

#[derive(Debug, Clone, Copy)]
enum Combinator {
    And,
    Or,
}

fn split_terms(expr: &str) -> Result<(Vec<&str>, Combinator)> {
    match (expr.contains(AND), expr.contains(OR)) {
        (true, true) => Err(ParserError::new(
            ErrorCode::E104,
            format!("the expression \"{expr}\" mixes \"&&\" and \"||\""),
        )
        .with_help("no precedence is defined; split it into separate statements")),
        (true, false) => Ok((expr.split(AND).collect(), Combinator::And)),
        (false, _) => Ok((expr.split(OR).collect(), Combinator::Or)),
    }
}

fn combine<T, F>(terms: Vec<&str>, combinator: Combinator, mut evaluate: F) -> Result<IndexSet<T>>
where
    T: std::hash::Hash + Eq + Copy,
    F: FnMut(&str) -> Result<IndexSet<T>>,
{
    let mut iter = terms.into_iter();
    let mut result = evaluate(iter.next().unwrap_or_default())?;
    for term in iter {
        let other = evaluate(term)?;
        match combinator {
            Combinator::And => result.retain(|item| other.contains(item)),
            Combinator::Or => result.extend(other),
        }
    }
    Ok(result)
}

/// Case-insensitive prefix strip. Operators are ASCII, so byte offsets
/// are safe.
fn strip_prefix_ci<'a>(term: &'a str, prefix: &str) -> Option<&'a str> {
    term.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &term[prefix.len()..])
}

/// Pseudo-elements stand in for groups and deployment environments; they
/// are never part of an expression's universe.
fn is_pseudo(kind: &ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Group | ElementKind::DeploymentEnvironment
    )
}

fn all_elements(ctx: &ExpressionContext<'_>) -> IndexSet<ElementId> {
    ctx.model
        .elements()
        .filter(|e| !is_pseudo(e.kind()))
        .map(Element::id)
        .collect()
}

fn all_relationships(ctx: &ExpressionContext<'_>) -> IndexSet<RelationshipId> {
    ctx.model.relationships().map(Relationship::id).collect()
}

fn evaluate_element_term(term: &str, ctx: &ExpressionContext<'_>) -> Result<IndexSet<ElementId>> {
    let term = term.trim();

    if term == "*" {
        return Ok(all_elements(ctx));
    }
    if let Some(value) = strip_prefix_ci(term, "element.type==") {
        let value = value.trim();
        return Ok(filter_elements(ctx, |e| {
            e.kind().type_name().eq_ignore_ascii_case(value)
        }));
    }
    if let Some(value) = strip_prefix_ci(term, "element.tag==") {
        let tags = split_tags(value);
        return Ok(filter_elements(ctx, |e| {
            tags.iter().all(|t| element_has_tag(ctx.model, e, t))
        }));
    }
    if let Some(value) = strip_prefix_ci(term, "element.tag!=") {
        let tags = split_tags(value);
        return Ok(filter_elements(ctx, |e| {
            !tags.iter().all(|t| element_has_tag(ctx.model, e, t))
        }));
    }
    if let Some(value) = strip_prefix_ci(term, "element.technology==") {
        let value = value.trim();
        return Ok(filter_elements(ctx, |e| e.technology() == value));
    }
    if let Some(value) = strip_prefix_ci(term, "element.technology!=") {
        let value = value.trim();
        return Ok(filter_elements(ctx, |e| e.technology() != value));
    }
    if let Some(rest) = strip_prefix_ci(term, "element.properties[") {
        let (key, value) = split_property(term, rest)?;
        return Ok(filter_elements(ctx, |e| {
            element_property(ctx.model, e, key) == Some(value)
        }));
    }
    if let Some(value) = strip_prefix_ci(term, "element.parent==") {
        let target = ctx.resolve_element(value.trim())?;
        let target_is_group = matches!(ctx.model.element(target).kind(), ElementKind::Group);
        return Ok(filter_elements(ctx, |e| {
            if target_is_group {
                ctx.model.in_group(e.id(), target)
            } else {
                e.parent() == Some(target)
            }
        }));
    }
    if let Some(value) = strip_prefix_ci(term, "element==") {
        return element_selector(value, ctx);
    }
    element_selector(term, ctx)
}

/// Resolve `*`, an arrow form or a plain identifier to elements.
fn element_selector(value: &str, ctx: &ExpressionContext<'_>) -> Result<IndexSet<ElementId>> {
    let value = value.trim();
    if value == "*" {
        return Ok(all_elements(ctx));
    }
    if value.contains(ARROW) {
        return arrow_selector(value, ctx);
    }
    let element = ctx.resolve_element(value)?;
    Ok(IndexSet::from([element]))
}

/// The arrow-relative element forms.
///
/// `->x` selects x and its afferent couplings, `x->` x and its efferent
/// couplings, `->x->` both. A two-sided `a->b` selects the concrete sides
/// plus the endpoints of every matching relationship, which makes `*->x`
/// equivalent to `->x`.
fn arrow_selector(value: &str, ctx: &ExpressionContext<'_>) -> Result<IndexSet<ElementId>> {
    let parts: Vec<&str> = value.split(ARROW).map(str::trim).collect();
    match parts.as_slice() {
        ["", id, ""] => {
            let mut result = endpoint_pair("*", id, ctx)?;
            result.extend(endpoint_pair(id, "*", ctx)?);
            Ok(result)
        }
        ["", id] => endpoint_pair("*", id, ctx),
        [id, ""] => endpoint_pair(id, "*", ctx),
        [source, destination] => endpoint_pair(source, destination, ctx),
        _ => Err(ParserError::new(
            ErrorCode::E103,
            format!("\"{value}\" is not a valid expression"),
        )),
    }
}

fn endpoint_pair(
    source: &str,
    destination: &str,
    ctx: &ExpressionContext<'_>,
) -> Result<IndexSet<ElementId>> {
    let source = side(source, ctx)?;
    let destination = side(destination, ctx)?;

    let mut result = IndexSet::new();
    result.extend(source);
    result.extend(destination);
    for r in ctx.model.relationships() {
        if side_matches(r.source(), source) && side_matches(r.destination(), destination) {
            result.insert(r.source());
            result.insert(r.destination());
        }
    }
    Ok(result)
}

/// One side of an arrow form: `None` is the wildcard.
fn side(value: &str, ctx: &ExpressionContext<'_>) -> Result<Option<ElementId>> {
    if value == "*" {
        Ok(None)
    } else {
        ctx.resolve_element(value).map(Some)
    }
}

fn side_matches(endpoint: ElementId, side: Option<ElementId>) -> bool {
    side.is_none_or(|element| element == endpoint)
}

fn evaluate_relationship_term(
    term: &str,
    ctx: &ExpressionContext<'_>,
) -> Result<IndexSet<RelationshipId>> {
    let term = term.trim();

    if term == "*" {
        return Ok(all_relationships(ctx));
    }
    if let Some(value) = strip_prefix_ci(term, "relationship.tag==") {
        let tags = split_tags(value);
        return Ok(filter_relationships(ctx, |r| {
            tags.iter().all(|t| relationship_has_tag(ctx.model, r, t))
        }));
    }
    if let Some(value) = strip_prefix_ci(term, "relationship.tag!=") {
        let tags = split_tags(value);
        return Ok(filter_relationships(ctx, |r| {
            !tags.iter().all(|t| relationship_has_tag(ctx.model, r, t))
        }));
    }
    if let Some(value) = strip_prefix_ci(term, "relationship.technology==") {
        let value = value.trim();
        return Ok(filter_relationships(ctx, |r| r.technology() == value));
    }
    if let Some(value) = strip_prefix_ci(term, "relationship.technology!=") {
        let value = value.trim();
        return Ok(filter_relationships(ctx, |r| r.technology() != value));
    }
    if let Some(rest) = strip_prefix_ci(term, "relationship.properties[") {
        let (key, value) = split_property(term, rest)?;
        return Ok(filter_relationships(ctx, |r| {
            relationship_property(ctx.model, r, key) == Some(value)
        }));
    }
    if let Some(value) = strip_prefix_ci(term, "relationship.source==") {
        let source = ctx.resolve_element(value.trim())?;
        return Ok(filter_relationships(ctx, |r| r.source() == source));
    }
    if let Some(value) = strip_prefix_ci(term, "relationship.destination==") {
        let destination = ctx.resolve_element(value.trim())?;
        return Ok(filter_relationships(ctx, |r| r.destination() == destination));
    }
    if let Some(value) = strip_prefix_ci(term, "relationship==") {
        return relationship_selector(value, ctx);
    }
    relationship_selector(term, ctx)
}

/// Resolve `*`, `a->b` or a plain identifier to relationships.
fn relationship_selector(
    value: &str,
    ctx: &ExpressionContext<'_>,
) -> Result<IndexSet<RelationshipId>> {
    let value = value.trim();
    if value == "*" {
        return Ok(all_relationships(ctx));
    }
    if value.contains(ARROW) {
        let parts: Vec<&str> = value.split(ARROW).map(str::trim).collect();
        let [source, destination] = parts.as_slice() else {
            return Err(ParserError::new(
                ErrorCode::E103,
                format!("\"{value}\" is not a valid expression"),
            ));
        };
        let source = side(source, ctx)?;
        let destination = side(destination, ctx)?;
        return Ok(filter_relationships(ctx, |r| {
            side_matches(r.source(), source) && side_matches(r.destination(), destination)
        }));
    }
    match ctx.identifiers.find_relationship(value) {
        Some(relationship) => Ok(IndexSet::from([relationship])),
        None => Err(relationship_not_found(value)),
    }
}

fn filter_elements<F>(ctx: &ExpressionContext<'_>, mut predicate: F) -> IndexSet<ElementId>
where
    F: FnMut(&Element) -> bool,
{
    ctx.model
        .elements()
        .filter(|e| !is_pseudo(e.kind()) && predicate(e))
        .map(Element::id)
        .collect()
}

fn filter_relationships<F>(ctx: &ExpressionContext<'_>, mut predicate: F) -> IndexSet<RelationshipId>
where
    F: FnMut(&Relationship) -> bool,
{
    ctx.model
        .relationships()
        .filter(|r| predicate(r))
        .map(Relationship::id)
        .collect()
}

fn split_tags(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse the `K]==V` remainder of a properties term. `term` is the whole
/// term, for the error message.
fn split_property<'a>(term: &str, rest: &'a str) -> Result<(&'a str, &'a str)> {
    rest.split_once("]==")
        .map(|(key, value)| (key.trim(), value.trim()))
        .ok_or_else(|| {
            ParserError::new(
                ErrorCode::E103,
                format!("\"{term}\" is not a valid properties expression"),
            )
            .with_help("the form is properties[name]==value")
        })
}

/// Tag lookup with fall-through to an instance's base element.
fn element_has_tag(model: &Model, element: &Element, tag: &str) -> bool {
    if element.has_tag(tag) {
        return true;
    }
    element
        .base()
        .is_some_and(|base| model.element(base).has_tag(tag))
}

/// Property lookup with fall-through to an instance's base element.
fn element_property<'a>(model: &'a Model, element: &'a Element, key: &str) -> Option<&'a str> {
    element
        .property(key)
        .or_else(|| element.base().and_then(|base| model.element(base).property(key)))
}

/// Tag lookup with fall-through along the linked chain.
fn relationship_has_tag(model: &Model, relationship: &Relationship, tag: &str) -> bool {
    if relationship.has_tag(tag) {
        return true;
    }
    let mut linked = relationship.linked_to();
    while let Some(id) = linked {
        let r = model.relationship(id);
        if r.has_tag(tag) {
            return true;
        }
        linked = r.linked_to();
    }
    false
}

/// Property lookup with fall-through along the linked chain.
fn relationship_property<'a>(
    model: &'a Model,
    relationship: &'a Relationship,
    key: &str,
) -> Option<&'a str> {
    if let Some(value) = relationship.property(key) {
        return Some(value);
    }
    let mut linked = relationship.linked_to();
    while let Some(id) = linked {
        let r = model.relationship(id);
        if let Some(value) = r.property(key) {
            return Some(value);
        }
        linked = r.linked_to();
    }
    None
}
