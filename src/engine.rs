//! The two public operations, generic over the oracle.
//!
//! Reference parser → module locator → symbol locator → member descender →
//! projector, or module locator → overview when the reference names no symbol.

use std::path::{Path, PathBuf};

use crate::cache::ResolutionCache;
use crate::config::Config;
use crate::error::Error;
use crate::member;
use crate::module_locator::{ModuleHandle, ModuleLocator, module_format};
use crate::oracle::{CompilerOptions, Oracle, SymbolId};
use crate::overview;
use crate::projector;
use crate::reference;
use crate::symbol_locator;
use crate::types::{Docs, ModuleLocation, SymbolInfo};

/// Resolution engine for one project root. `.symdoc.toml` and the project
/// config are read again for every request, so edits between requests apply.
pub struct Engine<O> {
    /// Oracle every request builds contexts with.
    oracle: O,
    /// Canonical project root.
    root: PathBuf,
}

impl<O: Oracle> Engine<O> {
    /// Engine over `root`. The configuration is loaded once up front so a
    /// broken project fails here rather than on the first request.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the root does not exist, or the config and
    /// project-config errors of the loaders.
    pub fn new(oracle: O, root: &Path) -> Result<Self, Error> {
        let engine = Self {
            oracle,
            root: root.canonicalize()?,
        };
        let _ = engine.options()?;
        tracing::debug!(root = %engine.root.display(), "engine ready");
        return Ok(engine);
    }

    /// Compiler options currently in effect: `.symdoc.toml`, then the
    /// discovered or configured tsconfig/jsconfig.
    ///
    /// # Errors
    ///
    /// Returns the config and project-config errors of the loaders.
    pub fn options(&self) -> Result<CompilerOptions, Error> {
        let config = Config::load(&self.root)?;
        return self.oracle.find_project_config(&self.root, config.tsconfig());
    }

    /// Resolve a reference to its documentation record or file overview.
    ///
    /// # Errors
    ///
    /// Returns the typed failure of whichever stage rejected the reference.
    pub fn resolve_docs(&self, reference: &str) -> Result<Docs, Error> {
        return self.docs(reference, None);
    }

    /// [`Engine::resolve_docs`] with specifier resolution answered from `cache`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::resolve_docs`].
    pub fn resolve_docs_cached(
        &self,
        reference: &str,
        cache: &mut ResolutionCache,
    ) -> Result<Docs, Error> {
        return self.docs(reference, Some(cache));
    }

    /// Resolve a reference's module to its file and module format.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` for malformed or `node:` references and
    /// `Error::ModuleNotFound` when the module does not resolve.
    pub fn resolve_location(&self, reference: &str) -> Result<ModuleLocation, Error> {
        return self.location(reference, None);
    }

    /// [`Engine::resolve_location`] with specifier resolution answered from `cache`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::resolve_location`].
    pub fn resolve_location_cached(
        &self,
        reference: &str,
        cache: &mut ResolutionCache,
    ) -> Result<ModuleLocation, Error> {
        return self.location(reference, Some(cache));
    }

    /// Canonical project root.
    pub fn root(&self) -> &Path {
        return &self.root;
    }

    /// Shared body of the docs operations.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure.
    fn docs(&self, raw: &str, cache: Option<&mut ResolutionCache>) -> Result<Docs, Error> {
        let reference = reference::parse(raw)?;
        let options = self.options()?;
        let locator = ModuleLocator::new(&self.oracle, &options, &self.root);

        if reference.is_global() {
            let name = reference.symbol.as_deref().unwrap_or_default();
            let path = reference::split_member(name)?;
            let handle = locator.locate_global(name)?;
            let symbol = symbol_locator::locate(&handle, &reference.module, &path.base)?;
            let info = self.symbol_info(
                &handle,
                symbol,
                &path.base,
                path.member.as_deref(),
                path.is_static,
            )?;
            return Ok(Docs::Symbol(info));
        }

        let handle = locator.locate(&reference.module, cache)?;
        let Some(name) = reference.symbol.as_deref() else {
            return Ok(Docs::File(overview::extract(&handle.context, handle.unit, &self.root)));
        };
        let symbol = symbol_locator::locate(&handle, &reference.module, name)?;
        let info = self.symbol_info(
            &handle,
            symbol,
            name,
            reference.member.as_deref(),
            reference.is_static,
        )?;
        return Ok(Docs::Symbol(info));
    }

    /// Shared body of the location operations.
    ///
    /// # Errors
    ///
    /// Returns the parse or resolution failure.
    fn location(
        &self,
        raw: &str,
        cache: Option<&mut ResolutionCache>,
    ) -> Result<ModuleLocation, Error> {
        let reference = reference::parse(raw)?;
        if reference.is_global() {
            return Err(Error::invalid(format!(
                "'{}' is a runtime global and has no source file",
                reference.module
            )));
        }
        let options = self.options()?;
        let locator = ModuleLocator::new(&self.oracle, &options, &self.root);
        let path = locator.resolve_path(&reference.module, cache)?;
        return Ok(ModuleLocation {
            format: module_format(&path),
            path: path.display().to_string(),
        });
    }

    /// Descend into the member when one is requested, then project.
    ///
    /// # Errors
    ///
    /// Returns the member descender's failure.
    fn symbol_info(
        &self,
        handle: &ModuleHandle<O::Context>,
        symbol: SymbolId,
        base: &str,
        member: Option<&str>,
        is_static: Option<bool>,
    ) -> Result<SymbolInfo, Error> {
        let Some(member) = member else {
            return Ok(projector::project(&handle.context, symbol, base, &self.root));
        };
        let found =
            member::descend(&handle.context, symbol, base, member, is_static.unwrap_or(false))?;
        return Ok(projector::project(
            &handle.context,
            found.symbol,
            &found.display_name,
            &self.root,
        ));
    }
}
