//! Project config discovery: `tsconfig.json` / `jsconfig.json` parsed as JSONC,
//! `extends` chains merged child-over-parent.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

/// Config file names probed in each directory, in priority order.
const CONFIG_NAMES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];

/// Compiler options the resolver and binder consume, with every path made absolute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompilerOptions {
    /// JavaScript sources participate in resolution.
    pub allow_js: bool,
    /// Absolute `baseUrl`.
    pub base_url: Option<PathBuf>,
    /// Config file the options came from, `None` for defaults.
    pub config_path: Option<PathBuf>,
    /// Declaration emit requested.
    pub declaration: bool,
    /// `moduleResolution`, lowercased.
    pub module_resolution: String,
    /// `paths` patterns and their substitutions.
    pub paths: BTreeMap<String, Vec<String>>,
    /// Directory `paths` substitutions are relative to.
    pub paths_base: Option<PathBuf>,
    /// `target`, uppercased.
    pub target: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        return Self {
            allow_js: true,
            base_url: None,
            config_path: None,
            declaration: true,
            module_resolution: "node".to_string(),
            paths: BTreeMap::new(),
            paths_base: None,
            target: "ES2022".to_string(),
        };
    }
}

/// `extends` is a string or, since TS 5.0, an array applied in order.
#[derive(Deserialize)]
#[serde(untagged)]
enum Extends {
    /// `"extends": ["./a.json", "./b.json"]`.
    Many(Vec<String>),
    /// `"extends": "./base.json"`.
    One(String),
}

/// Raw `compilerOptions` block.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    /// `allowJs`.
    allow_js: Option<bool>,
    /// `baseUrl`, relative to the declaring config.
    base_url: Option<String>,
    /// `declaration`.
    declaration: Option<bool>,
    /// `moduleResolution`.
    module_resolution: Option<String>,
    /// `paths`, relative to `baseUrl` or the declaring config.
    paths: Option<BTreeMap<String, Vec<String>>>,
    /// `target`.
    target: Option<String>,
}

/// Raw config file.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    /// `compilerOptions`.
    #[serde(default)]
    compiler_options: RawCompilerOptions,
    /// `extends`.
    extends: Option<Extends>,
}

/// Options accumulated across an `extends` chain, paths already absolute.
#[derive(Default)]
struct Layer {
    /// `allowJs`.
    allow_js: Option<bool>,
    /// Absolute `baseUrl`.
    base_url: Option<PathBuf>,
    /// `declaration`.
    declaration: Option<bool>,
    /// `moduleResolution`.
    module_resolution: Option<String>,
    /// `paths` plus the directory of the config that declared them.
    paths: Option<(BTreeMap<String, Vec<String>>, PathBuf)>,
    /// `target`.
    target: Option<String>,
}

impl Layer {
    /// Overlay `child` on top of `self`.
    fn merge(self, child: Self) -> Self {
        return Self {
            allow_js: child.allow_js.or(self.allow_js),
            base_url: child.base_url.or(self.base_url),
            declaration: child.declaration.or(self.declaration),
            module_resolution: child.module_resolution.or(self.module_resolution),
            paths: child.paths.or(self.paths),
            target: child.target.or(self.target),
        };
    }
}

/// Find the project config for `root` and load it, or fall back to defaults
/// when none exists. An explicit path must exist.
///
/// # Errors
///
/// Returns `Error::ProjectConfig` if the explicit path is missing or any file
/// in the chain is malformed.
pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<CompilerOptions, Error> {
    if let Some(path) = explicit {
        let path = if path.is_absolute() { path.to_path_buf() } else { root.join(path) };
        if !path.is_file() {
            return Err(Error::ProjectConfig {
                path,
                reason: "configured project file does not exist".to_string(),
            });
        }
        return load(&path);
    }

    let Some(path) = find_config_file(root) else {
        tracing::debug!(root = %root.display(), "no tsconfig/jsconfig found, using defaults");
        return Ok(CompilerOptions::default());
    };
    return load(&path);
}

/// Walk up from `start` to the first directory holding a config file.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        for name in CONFIG_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    return None;
}

/// Load one config file and its `extends` chain.
///
/// # Errors
///
/// Returns `Error::ProjectConfig` on malformed JSONC, a missing extends
/// target, or a circular chain.
pub fn load(path: &Path) -> Result<CompilerOptions, Error> {
    let mut visiting = Vec::new();
    let layer = load_layer(path, &mut visiting)?;
    let defaults = CompilerOptions::default();

    let (paths, paths_base) = match layer.paths {
        Some((paths, declared_in)) => {
            let base = layer.base_url.clone().unwrap_or(declared_in);
            (paths, Some(base))
        },
        None => (BTreeMap::new(), layer.base_url.clone()),
    };

    tracing::debug!(config = %path.display(), "loaded project config");
    return Ok(CompilerOptions {
        allow_js: layer.allow_js.unwrap_or(defaults.allow_js),
        base_url: layer.base_url,
        config_path: Some(path.to_path_buf()),
        declaration: layer.declaration.unwrap_or(defaults.declaration),
        module_resolution: layer
            .module_resolution
            .map_or(defaults.module_resolution, |m| return m.to_lowercase()),
        paths,
        paths_base,
        target: layer.target.map_or(defaults.target, |t| return t.to_uppercase()),
    });
}

/// Parse JSONC text into the raw config shape.
///
/// # Errors
///
/// Returns `Error::ProjectConfig` with the json5 message.
fn parse_raw(path: &Path, content: &str) -> Result<RawConfig, Error> {
    if content.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    return json5::from_str(content).map_err(|e| {
        return Error::ProjectConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
    });
}

/// Recursive worker for [`load`]. `visiting` is the active chain, used both
/// for cycle detection and for the error message.
///
/// # Errors
///
/// See [`load`].
fn load_layer(path: &Path, visiting: &mut Vec<PathBuf>) -> Result<Layer, Error> {
    let canonical = path.canonicalize().map_err(|e| {
        return Error::ProjectConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
    })?;

    if visiting.contains(&canonical) {
        let mut chain: Vec<String> =
            visiting.iter().map(|p| return p.display().to_string()).collect();
        chain.push(canonical.display().to_string());
        return Err(Error::ProjectConfig {
            path: canonical,
            reason: format!("circular extends chain: {}", chain.join(" -> ")),
        });
    }
    visiting.push(canonical.clone());

    let content = std::fs::read_to_string(&canonical).map_err(|e| {
        return Error::ProjectConfig {
            path: canonical.clone(),
            reason: e.to_string(),
        };
    })?;
    let raw = parse_raw(&canonical, &content)?;
    let dir = canonical.parent().map_or_else(PathBuf::new, Path::to_path_buf);

    let parents = match raw.extends {
        Some(Extends::Many(list)) => list,
        Some(Extends::One(single)) => vec![single],
        None => Vec::new(),
    };

    let mut merged = Layer::default();
    for parent in &parents {
        let Some(parent_path) = resolve_extends(&dir, parent) else {
            return Err(Error::ProjectConfig {
                path: canonical.clone(),
                reason: format!("extended config '{parent}' not found"),
            });
        };
        let parent_layer = load_layer(&parent_path, visiting)?;
        merged = merged.merge(parent_layer);
    }

    let options = raw.compiler_options;
    let own = Layer {
        allow_js: options.allow_js,
        base_url: options.base_url.map(|b| return super::resolution::normalize_path(&dir.join(b))),
        declaration: options.declaration,
        module_resolution: options.module_resolution,
        paths: options.paths.map(|p| return (p, dir.clone())),
        target: options.target,
    };

    visiting.pop();
    return Ok(merged.merge(own));
}

/// Locate an `extends` target: relative or absolute file paths (with `.json`
/// appended when missing), or a package path under `node_modules`.
fn resolve_extends(dir: &Path, target: &str) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = if target.starts_with('.') || Path::new(target).is_absolute() {
        vec![dir.join(target)]
    } else {
        dir.ancestors()
            .map(|ancestor| return ancestor.join("node_modules").join(target))
            .collect()
    };

    for candidate in candidates {
        if candidate.is_file() {
            return Some(candidate);
        }
        let with_json = PathBuf::from(format!("{}.json", candidate.display()));
        if with_json.is_file() {
            return Some(with_json);
        }
        let nested = candidate.join("tsconfig.json");
        if nested.is_file() {
            return Some(nested);
        }
    }
    return None;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        return path;
    }

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let options = discover(dir.path(), None).unwrap();
        assert!(options.allow_js);
        assert_eq!(options.module_resolution, "node");
        assert!(options.paths.is_empty());
    }

    #[test]
    fn jsonc_with_comments_and_trailing_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "tsconfig.json",
            r#"{
                // comment
                "compilerOptions": {
                    "baseUrl": "./src",
                    "paths": { "@lib/*": ["lib/*"], },
                },
            }"#,
        );
        let options = load(&path).unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(options.base_url, Some(canonical.join("src")));
        assert_eq!(options.paths_base, Some(canonical.join("src")));
        assert_eq!(options.paths["@lib/*"], vec!["lib/*".to_string()]);
    }

    #[test]
    fn extends_merges_child_over_parent() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "base.json",
            r#"{ "compilerOptions": { "target": "es5", "allowJs": false } }"#,
        );
        let child = write(
            dir.path(),
            "tsconfig.json",
            r#"{ "extends": "./base", "compilerOptions": { "allowJs": true } }"#,
        );
        let options = load(&child).unwrap();
        assert_eq!(options.target, "ES5");
        assert!(options.allow_js);
    }

    #[test]
    fn circular_extends_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{ "extends": "./b.json" }"#);
        let b = write(dir.path(), "b.json", r#"{ "extends": "./a.json" }"#);
        let err = load(&b).unwrap_err();
        assert!(err.to_string().contains("circular extends chain"), "{err}");
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tsconfig.json", "{ not json");
        assert!(discover(dir.path(), None).is_err());
    }

    #[test]
    fn discovery_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "jsconfig.json", "{}");
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        let found = find_config_file(&nested).unwrap();
        assert!(found.ends_with("jsconfig.json"));
    }
}
