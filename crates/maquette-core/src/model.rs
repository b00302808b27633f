//! The software architecture model.
//!
//! This module contains the element and relationship types that make up a
//! workspace model, plus the [`Model`] graph that owns them. Elements and
//! relationships are stored in arena-style vectors and addressed through the
//! copyable [`ElementId`] and [`RelationshipId`] handles, so callers can hold
//! on to references cheaply while the graph keeps growing.
//!
//! # Organization
//!
//! - [`element`] - [`Element`], [`ElementKind`], [`Perspective`]
//! - [`relationship`] - [`Relationship`]
//! - [`graph`] - the [`Model`] container and its add/query operations
//! - [`implied`] - pluggable implied-relationship strategies

pub mod element;
pub mod graph;
pub mod implied;
pub mod relationship;

pub use element::{Element, ElementId, ElementKind, InstanceData, Perspective};
pub use graph::{DEFAULT_DEPLOYMENT_GROUP, Model};
pub use implied::{
    CreateImpliedRelationshipsUnlessAnyExist, CreateImpliedRelationshipsUnlessSameExists,
    ImpliedRelationshipsStrategy, NoImpliedRelationships,
};
pub use relationship::{Relationship, RelationshipId};
