//! Parser for the Maquette architecture description language.
//!
//! The DSL is line oriented: every statement lives on one logical line,
//! blocks are delimited by braces and the meaning of a statement depends
//! on the block it appears in. [`Parser`] drives the whole pipeline, from
//! tokenization and `${name}` substitution through context dispatch to the
//! [`maquette_core::Workspace`] it accumulates.
//!
//! # Examples
//!
//! ```
//! use maquette_parser::Parser;
//!
//! let source = r#"
//! workspace "Shop" {
//!     model {
//!         customer = person "Customer"
//!         shop = softwareSystem "Web Shop"
//!         customer -> shop "Places orders"
//!     }
//! }
//! "#;
//!
//! let mut parser = Parser::new();
//! parser.parse_str(source).unwrap();
//! let workspace = parser.into_workspace().unwrap();
//! assert_eq!(workspace.name(), "Shop");
//! ```
//!
//! Hosts extend the language through [`Extensions`]: script engines,
//! plugins, component finders and implied-relationship strategies, all
//! invoked by `!`-prefixed directives. Untrusted input can be parsed with
//! [`Parser::set_restricted`], which confines the parser to its input and
//! HTTPS includes.

pub mod error;

mod archetypes;
mod context;
mod expression;
mod features;
mod identifiers;
mod includes;
mod parser;
mod plugins;
mod preprocess;
mod remote;
mod substitution;
mod tokenizer;

#[cfg(test)]
mod parser_tests;

pub use error::{ErrorCode, ParserError, SourceLocation};
pub use features::Feature;
pub use parser::Parser;
pub use plugins::{
    ComponentFinder, DslPlugin, ExtensionBindings, ExtensionError, Extensions, ScriptEngine,
};
#[cfg(feature = "http")]
pub use remote::HttpFetcher;
pub use remote::{FetchedContent, UrlFetcher};
