//! Reference resolution and symbol documentation for JavaScript and TypeScript.
//!
//! A reference such as `./sample.js:TestClass.create` or `node:Math.max` is
//! parsed, its module located, the symbol (and member) found through a type
//! system oracle, and the result projected into a [`types::SymbolInfo`] or,
//! for a bare module, a [`types::FileInfo`]. Every failure is an
//! [`error::Error`] carrying one of six stable codes.

pub mod cache;
pub mod commands;
pub mod commonjs;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod hasher;
pub mod info;
pub mod member;
pub mod module_locator;
pub mod oracle;
pub mod overview;
pub mod projector;
pub mod reference;
pub mod render;
pub mod scanner;
pub mod symbol_locator;
pub mod types;
pub mod watch;

use std::path::Path;

use crate::engine::Engine;
use crate::error::Error;
use crate::oracle::ts::TsOracle;
use crate::types::{Docs, ModuleLocation};

/// Resolve `reference` in the project at `root` with the tree-sitter oracle.
///
/// # Errors
///
/// Returns the typed failure of whichever stage rejected the reference.
pub fn resolve_docs(root: &Path, reference: &str) -> Result<Docs, Error> {
    return Engine::new(TsOracle, root)?.resolve_docs(reference);
}

/// Resolve the module of `reference` in the project at `root` to its file.
///
/// # Errors
///
/// Returns `Error::InvalidRequest` for `node:` references and the locator's
/// failures otherwise.
pub fn resolve_location(root: &Path, reference: &str) -> Result<ModuleLocation, Error> {
    return Engine::new(TsOracle, root)?.resolve_location(reference);
}
