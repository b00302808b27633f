//! Implied relationship strategies.
//!
//! When a relationship is declared between two nested elements, a strategy
//! may propose additional relationships between their ancestors. Strategies
//! are pure: they inspect the model and return the (source, destination)
//! pairs to create, and the model performs the creation so that every
//! implied relationship is linked back to the one that caused it.

use std::fmt;

use crate::model::{
    element::ElementId,
    graph::Model,
    relationship::RelationshipId,
};

/// Proposes relationships implied by a newly added static relationship.
pub trait ImpliedRelationshipsStrategy: fmt::Debug {
    /// Returns the ancestor pairs that should receive a copy of the given
    /// relationship. The relationship is already part of the model.
    fn propose(&self, model: &Model, relationship: RelationshipId) -> Vec<(ElementId, ElementId)>;
}

/// Never proposes anything. The default.
#[derive(Debug, Clone, Copy)]
pub struct NoImpliedRelationships;

impl ImpliedRelationshipsStrategy for NoImpliedRelationships {
    fn propose(&self, _model: &Model, _relationship: RelationshipId) -> Vec<(ElementId, ElementId)> {
        Vec::new()
    }
}

/// Proposes an ancestor pair unless any relationship already exists between
/// the two elements.
#[derive(Debug, Clone, Copy)]
pub struct CreateImpliedRelationshipsUnlessAnyExist;

impl ImpliedRelationshipsStrategy for CreateImpliedRelationshipsUnlessAnyExist {
    fn propose(&self, model: &Model, relationship: RelationshipId) -> Vec<(ElementId, ElementId)> {
        candidate_pairs(model, relationship, |model, source, destination, _| {
            !model
                .relationships()
                .any(|existing| existing.source() == source && existing.destination() == destination)
        })
    }
}

/// Proposes an ancestor pair unless a relationship with the same description
/// already exists between the two elements.
#[derive(Debug, Clone, Copy)]
pub struct CreateImpliedRelationshipsUnlessSameExists;

impl ImpliedRelationshipsStrategy for CreateImpliedRelationshipsUnlessSameExists {
    fn propose(&self, model: &Model, relationship: RelationshipId) -> Vec<(ElementId, ElementId)> {
        candidate_pairs(model, relationship, |model, source, destination, description| {
            !model.relationships().any(|existing| {
                existing.source() == source
                    && existing.destination() == destination
                    && existing.description() == description
            })
        })
    }
}

/// Walks every (source ancestor, destination ancestor) combination,
/// including the endpoints themselves, and keeps the pairs that pass the
/// filter. Pairs where one side contains the other are skipped.
fn candidate_pairs(
    model: &Model,
    relationship: RelationshipId,
    keep: impl Fn(&Model, ElementId, ElementId, &str) -> bool,
) -> Vec<(ElementId, ElementId)> {
    let relationship = model.relationship(relationship);
    let source = relationship.source();
    let destination = relationship.destination();
    let description = relationship.description();

    let sources: Vec<ElementId> = std::iter::once(source)
        .chain(model.ancestors(source))
        .collect();
    let destinations: Vec<ElementId> = std::iter::once(destination)
        .chain(model.ancestors(destination))
        .collect();

    let mut pairs = Vec::new();
    for &candidate_source in &sources {
        for &candidate_destination in &destinations {
            if candidate_source == source && candidate_destination == destination {
                continue;
            }
            if candidate_source == candidate_destination
                || model.is_descendant_of(candidate_source, candidate_destination)
                || model.is_descendant_of(candidate_destination, candidate_source)
            {
                continue;
            }
            if keep(model, candidate_source, candidate_destination, description) {
                pairs.push((candidate_source, candidate_destination));
            }
        }
    }
    pairs
}
