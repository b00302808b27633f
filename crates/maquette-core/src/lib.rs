//! Maquette Core Types and Definitions
//!
//! This crate provides the foundational types for Maquette software
//! architecture workspaces. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Model**: The mutable element/relationship graph ([`model`] module)
//! - **Views**: View definitions and visual styling ([`views`] module)
//! - **Workspace**: The workspace root object ([`workspace`] module)
//!
//! The model is handle-based: elements and relationships are owned by
//! [`model::Model`] and referenced everywhere else through the `Copy` index
//! types [`model::ElementId`] and [`model::RelationshipId`].

pub mod color;
pub mod documentation;
pub mod error;
pub mod identifier;
pub mod model;
pub mod views;
pub mod workspace;

pub use error::ModelError;
pub use workspace::Workspace;
