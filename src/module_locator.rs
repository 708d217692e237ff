//! Module location: specifier → file → fresh checking context.
//!
//! Strategies run in a fixed order: an exact local path, then the oracle's
//! project module resolution. `node:` references take the builtin/global
//! strategy instead, which type-checks a one-line virtual unit against the
//! ambient globals.

use std::path::{Path, PathBuf};

use crate::cache::ResolutionCache;
use crate::error::Error;
use crate::grammar;
use crate::oracle::resolution::normalize_path;
use crate::oracle::{Checker, CompilerOptions, Oracle, SourceInput, UnitId};
use crate::types::ModuleFormat;

/// Globals a `node:` reference may name.
pub const GLOBAL_NAMES: [&str; 32] = [
    "Array",
    "ArrayBuffer",
    "BigInt",
    "Boolean",
    "Date",
    "Error",
    "Function",
    "Intl",
    "JSON",
    "Map",
    "Math",
    "Number",
    "Object",
    "Promise",
    "Proxy",
    "Reflect",
    "RegExp",
    "Set",
    "String",
    "Symbol",
    "WeakMap",
    "WeakSet",
    "clearInterval",
    "clearTimeout",
    "console",
    "globalThis",
    "parseFloat",
    "parseInt",
    "queueMicrotask",
    "setInterval",
    "setTimeout",
    "structuredClone",
];

/// Variable the global probe unit declares.
pub const GLOBAL_PROBE: &str = "__symdoc_global__";

/// File name of the global probe unit, under the project root.
const GLOBAL_PROBE_FILE: &str = "__symdoc_global__.ts";

/// Synthetic containing file for project resolution, under the project root.
const ROOT_CONTAINING_FILE: &str = "__symdoc_root__.ts";

/// A located module with the checking context built for it. Owned by one request.
pub struct ModuleHandle<C> {
    /// Context holding the module's unit.
    pub context: C,
    /// Built from the global probe rather than a file.
    pub is_global: bool,
    /// Resolved file, or the probe's synthetic path.
    pub path: PathBuf,
    /// The module's unit in `context`.
    pub unit: UnitId,
}

/// Runs the location strategies for one project.
pub struct ModuleLocator<'a, O> {
    /// Discovered compiler options.
    options: &'a CompilerOptions,
    /// Oracle building contexts and resolving specifiers.
    oracle: &'a O,
    /// Canonical project root.
    root: &'a Path,
}

impl<'a, O: Oracle> ModuleLocator<'a, O> {
    /// Locator over a project.
    pub const fn new(oracle: &'a O, options: &'a CompilerOptions, root: &'a Path) -> Self {
        return Self { options, oracle, root };
    }

    /// Locate a file module and build a context over it.
    ///
    /// # Errors
    ///
    /// Returns `Error::ModuleNotFound` when no strategy finds the file, or the
    /// oracle's error if the file cannot be parsed.
    pub fn locate(
        &self,
        specifier: &str,
        cache: Option<&mut ResolutionCache>,
    ) -> Result<ModuleHandle<O::Context>, Error> {
        let path = self.resolve_path(specifier, cache)?;
        let context = self
            .oracle
            .create_checking_context(&[SourceInput::File(path.clone())], self.options)?;
        let unit = first_root(&context, specifier)?;
        return Ok(ModuleHandle {
            context,
            is_global: false,
            path,
            unit,
        });
    }

    /// Builtin/global strategy: `name` is the part after `node:`. Its leading
    /// identifier must be an allow-listed global.
    ///
    /// # Errors
    ///
    /// Returns `Error::ModuleNotFound` for names outside the allow-list.
    pub fn locate_global(&self, name: &str) -> Result<ModuleHandle<O::Context>, Error> {
        let leading = global_leading_name(name);
        if !GLOBAL_NAMES.contains(&leading) {
            tracing::debug!(name, "not an allow-listed global");
            return Err(Error::ModuleNotFound {
                specifier: format!("{}{name}", crate::reference::GLOBAL_PREFIX),
            });
        }

        let path = self.root.join(GLOBAL_PROBE_FILE);
        let probe = SourceInput::Virtual {
            path: path.clone(),
            text: format!("const {GLOBAL_PROBE} = {leading};\n"),
        };
        tracing::debug!(global = leading, "built global probe");
        let context = self.oracle.create_checking_context(&[probe], self.options)?;
        let unit = first_root(&context, name)?;
        return Ok(ModuleHandle {
            context,
            is_global: true,
            path,
            unit,
        });
    }

    /// Specifier → file without building a context. Exact local paths win;
    /// otherwise project resolution runs from a synthetic file at the root,
    /// answered from `cache` when one is given.
    ///
    /// # Errors
    ///
    /// Returns `Error::ModuleNotFound` when no strategy finds the file.
    pub fn resolve_path(
        &self,
        specifier: &str,
        cache: Option<&mut ResolutionCache>,
    ) -> Result<PathBuf, Error> {
        if let Some(path) = self.exact_local_path(specifier) {
            tracing::debug!(specifier, path = %path.display(), "exact local path");
            return Ok(path);
        }

        let containing = self.root.join(ROOT_CONTAINING_FILE);
        let mut cache = cache;
        if let Some(cache) = cache.as_deref_mut()
            && let Some(path) = cache.get(specifier, &containing, self.options)
        {
            tracing::debug!(specifier, path = %path.display(), "resolved from cache");
            return Ok(path);
        }

        let resolution = self.oracle.resolve_module_name(specifier, &containing, self.options);
        let Some(path) = resolution.resolved.clone() else {
            tracing::debug!(specifier, "project resolution found nothing");
            return Err(Error::ModuleNotFound {
                specifier: specifier.to_string(),
            });
        };
        tracing::debug!(specifier, path = %path.display(), "project resolution");
        if let Some(cache) = cache {
            cache.insert(specifier, &containing, self.options, &resolution);
        }
        return Ok(path);
    }

    /// Strategy 1: the literal file, when the specifier looks like a path.
    fn exact_local_path(&self, specifier: &str) -> Option<PathBuf> {
        let looks_like_path = specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier.starts_with('/')
            || grammar::is_source_path(Path::new(specifier));
        if !looks_like_path {
            return None;
        }
        let candidate = Path::new(specifier);
        let path = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };
        if !path.is_file() {
            return None;
        }
        return Some(normalize_path(&path));
    }
}

/// Leading identifier of a global name: `Math.max` → `Math`.
pub fn global_leading_name(name: &str) -> &str {
    return name.split(['.', '#']).next().unwrap_or(name);
}

/// Module system a resolved file uses.
pub fn module_format(path: &Path) -> ModuleFormat {
    let name = path.file_name().map(|n| return n.to_string_lossy().to_string()).unwrap_or_default();
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");
    if name.ends_with(".d.ts") {
        return ModuleFormat::TypeScript;
    }
    return match ext {
        "cjs" => ModuleFormat::CommonJs,
        "cts" | "mts" | "ts" | "tsx" => ModuleFormat::TypeScript,
        "mjs" => ModuleFormat::Module,
        _ => package_module_type(path),
    };
}

/// The first root unit of a freshly built context.
///
/// # Errors
///
/// Returns `Error::ModuleNotFound` if the context holds no root.
fn first_root<C: Checker>(context: &C, specifier: &str) -> Result<UnitId, Error> {
    return context.root_units().first().copied().ok_or_else(|| {
        return Error::ModuleNotFound {
            specifier: specifier.to_string(),
        };
    });
}

/// `module` when the nearest `package.json` declares `"type": "module"`.
fn package_module_type(path: &Path) -> ModuleFormat {
    for dir in path.ancestors().skip(1) {
        let manifest = dir.join("package.json");
        let Ok(content) = std::fs::read_to_string(&manifest) else {
            continue;
        };
        let declared = serde_json::from_str::<serde_json::Value>(&content)
            .ok()
            .and_then(|json| {
                return json.get("type").and_then(|t| return t.as_str()).map(str::to_string);
            });
        return if declared.as_deref() == Some("module") {
            ModuleFormat::Module
        } else {
            ModuleFormat::CommonJs
        };
    }
    return ModuleFormat::CommonJs;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ts::TsOracle;

    #[test]
    fn format_by_extension() {
        assert_eq!(module_format(Path::new("/x/a.d.ts")), ModuleFormat::TypeScript);
        assert_eq!(module_format(Path::new("/x/a.mts")), ModuleFormat::TypeScript);
        assert_eq!(module_format(Path::new("/x/a.mjs")), ModuleFormat::Module);
        assert_eq!(module_format(Path::new("/x/a.cjs")), ModuleFormat::CommonJs);
    }

    #[test]
    fn js_format_follows_package_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{ "type": "module" }"#).unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        assert_eq!(module_format(&dir.path().join("src/a.js")), ModuleFormat::Module);

        let other = tempfile::tempdir().unwrap();
        std::fs::write(other.path().join("package.json"), "{}").unwrap();
        assert_eq!(module_format(&other.path().join("a.js")), ModuleFormat::CommonJs);
    }

    #[test]
    fn exact_path_then_project_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("util.ts"), "export const a = 1;").unwrap();
        let options = CompilerOptions::default();
        let locator = ModuleLocator::new(&TsOracle, &options, &root);

        assert_eq!(locator.resolve_path("./util.ts", None).unwrap(), root.join("util.ts"));
        assert_eq!(locator.resolve_path("./util", None).unwrap(), root.join("util.ts"));
        let err = locator.resolve_path("./missing.ts", None).unwrap_err();
        assert_eq!(err.to_string(), "Cannot find module './missing.ts'");
    }

    #[test]
    fn unknown_global_is_module_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let options = CompilerOptions::default();
        let locator = ModuleLocator::new(&TsOracle, &options, dir.path());
        let Err(err) = locator.locate_global("process.env") else {
            panic!("expected failure");
        };
        assert_eq!(err.to_string(), "Cannot find module 'node:process.env'");
        assert!(locator.locate_global("Math.max").unwrap().is_global);
    }

    #[test]
    fn cache_answers_project_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("util.ts"), "export const a = 1;").unwrap();
        let options = CompilerOptions::default();
        let locator = ModuleLocator::new(&TsOracle, &options, &root);

        let mut cache = ResolutionCache::default();
        locator.resolve_path("./util", Some(&mut cache)).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(locator.resolve_path("./util", Some(&mut cache)).unwrap(), root.join("util.ts"));
    }
}
