//! Workspace export backends.

pub mod text;
