//! Per-context statement handlers, grouped by the part of the workspace
//! they build. All of them are `impl Parser` blocks; the dispatch match
//! lives in the parent module.

pub(super) mod deployment;
pub(super) mod directives;
pub(super) mod model;
pub(super) mod relationship;
pub(super) mod styles;
pub(super) mod views;
pub(super) mod workspace;
