//! The identifiers register.
//!
//! Maps user-chosen DSL identifiers to the elements and relationships they
//! name. Lookups are case-insensitive. In hierarchical scope an identifier
//! is qualified by its lexical parents at registration time and resolved
//! innermost-enclosing-first at lookup time, falling back to a bare lookup.
//!
//! Elements declared without an identifier still get an internal one, so
//! their children can be qualified. Internal identifiers contain a `:`,
//! which the declaration charset forbids, so they can never collide with a
//! user identifier.

use std::collections::HashMap;
use std::str::FromStr;

use maquette_core::identifier::Id;
use maquette_core::model::{ElementId, ElementKind, Model, RelationshipId};

use crate::error::{ErrorCode, ParserError, Result};

/// How identifiers are namespaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum IdentifierScope {
    /// One global namespace.
    #[default]
    Flat,
    /// Identifiers are qualified by their lexical parents.
    Hierarchical,
}

impl FromStr for IdentifierScope {
    type Err = &'static str;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" => Ok(IdentifierScope::Flat),
            "hierarchical" => Ok(IdentifierScope::Hierarchical),
            _ => Err("expected flat or hierarchical"),
        }
    }
}

/// Check an identifier against the declaration charset.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(
            ParserError::new(ErrorCode::E102, format!("invalid identifier \"{name}\""))
                .with_help("identifiers may only contain letters, digits, `-`, `_` and `.`"),
        )
    }
}

/// The bidirectional identifier mapping for one parse.
#[derive(Debug, Default)]
pub(crate) struct IdentifiersRegister {
    scope: IdentifierScope,
    elements: HashMap<Id, ElementId>,
    relationships: HashMap<Id, RelationshipId>,
    element_identifiers: HashMap<ElementId, Id>,
    generated: usize,
}

impl IdentifiersRegister {
    pub(crate) fn scope(&self) -> IdentifierScope {
        self.scope
    }

    pub(crate) fn set_scope(&mut self, scope: IdentifierScope) {
        self.scope = scope;
    }

    /// Register a user-declared identifier for an element.
    ///
    /// Reusing an identifier for a different object is an error; repeating
    /// the registration for the same object is not.
    pub(crate) fn register_element(
        &mut self,
        name: &str,
        element: ElementId,
        model: &Model,
    ) -> Result<()> {
        validate_identifier(name)?;
        let id = self.qualify(Id::new(name), element, model);
        match self.elements.get(&id) {
            Some(existing) if *existing == element => {}
            Some(_) => return Err(duplicate_identifier(id)),
            None => {
                if self.relationships.contains_key(&id) {
                    return Err(duplicate_identifier(id));
                }
                self.elements.insert(id, element);
            }
        }
        self.element_identifiers.insert(element, id);
        Ok(())
    }

    /// Register an internal identifier for an element declared without
    /// one. Does nothing when the element already has an identifier.
    pub(crate) fn register_generated(&mut self, element: ElementId) {
        if self.element_identifiers.contains_key(&element) {
            return;
        }
        self.generated += 1;
        let id = Id::new(&format!("anonymous:{}", self.generated));
        self.elements.insert(id, element);
        self.element_identifiers.insert(element, id);
    }

    /// Register a user-declared identifier for a relationship.
    pub(crate) fn register_relationship(
        &mut self,
        name: &str,
        relationship: RelationshipId,
    ) -> Result<()> {
        validate_identifier(name)?;
        let id = Id::new(name);
        match self.relationships.get(&id) {
            Some(existing) if *existing == relationship => Ok(()),
            Some(_) => Err(duplicate_identifier(id)),
            None => {
                if self.elements.contains_key(&id) {
                    return Err(duplicate_identifier(id));
                }
                self.relationships.insert(id, relationship);
                Ok(())
            }
        }
    }

    /// Resolve an identifier to an element.
    ///
    /// In hierarchical scope the identifier is first tried qualified by
    /// each enclosing element from `enclosing` outward, then bare.
    pub(crate) fn find_element(
        &self,
        name: &str,
        enclosing: Option<ElementId>,
        model: &Model,
    ) -> Option<ElementId> {
        let id = Id::new(name);
        if self.scope == IdentifierScope::Hierarchical {
            let mut parent = enclosing;
            while let Some(p) = parent {
                if let Some(parent_id) = self.element_identifiers.get(&p) {
                    let qualified = parent_id.create_nested(id);
                    if let Some(element) = self.elements.get(&qualified) {
                        return Some(*element);
                    }
                }
                parent = model.element(p).parent();
            }
        }
        self.elements.get(&id).copied()
    }

    pub(crate) fn find_relationship(&self, name: &str) -> Option<RelationshipId> {
        self.relationships.get(&Id::new(name)).copied()
    }

    /// The registered identifier for an element, if any. In hierarchical
    /// scope this is the fully qualified form.
    pub(crate) fn identifier_of(&self, element: ElementId) -> Option<Id> {
        self.element_identifiers.get(&element).copied()
    }

    /// The identifier an element's children are qualified under.
    fn qualify(&self, name: Id, element: ElementId, model: &Model) -> Id {
        if self.scope == IdentifierScope::Flat {
            return name;
        }
        let mut parent = model.element(element).parent();
        while let Some(p) = parent {
            if matches!(model.element(p).kind(), ElementKind::DeploymentEnvironment) {
                break;
            }
            if let Some(parent_id) = self.element_identifiers.get(&p) {
                return parent_id.create_nested(name);
            }
            parent = model.element(p).parent();
        }
        name
    }
}

fn duplicate_identifier(id: Id) -> ParserError {
    ParserError::new(
        ErrorCode::E505,
        format!("the identifier \"{id}\" is already registered"),
    )
}
