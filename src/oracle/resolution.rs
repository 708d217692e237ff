//! Node-style module resolution: relative paths, `paths`/`baseUrl` aliases,
//! and packages under `node_modules` (including `@types`).
use std::path::{Component, Path, PathBuf};

use regex::Regex;

use super::ModuleResolution;
use super::project::CompilerOptions;

/// Extensions probed when a specifier names a file without one, in priority order.
const TS_EXTENSIONS: [&str; 5] = [".ts", ".tsx", ".d.ts", ".mts", ".cts"];

/// JavaScript extensions probed after the TypeScript ones when `allowJs` is on.
const JS_EXTENSIONS: [&str; 4] = [".js", ".jsx", ".mjs", ".cjs"];

/// `package.json` fields that may point at a package entry, in priority order.
const PACKAGE_ENTRY_FIELDS: [&str; 4] = ["types", "typings", "module", "main"];

/// Package entries pointing back into their own directory stop after this many hops.
const MAX_PACKAGE_HOPS: u8 = 4;

/// Candidates probed during one resolution that did not exist.
#[derive(Debug, Default)]
struct Lookups {
    /// Missing paths in probe order.
    failed: Vec<PathBuf>,
}

impl Lookups {
    /// `path` is a directory; records it when nothing exists there.
    fn is_dir(&mut self, path: &Path) -> bool {
        if path.is_dir() {
            return true;
        }
        self.miss(path);
        return false;
    }

    /// `path` is a file; records it when nothing exists there.
    fn is_file(&mut self, path: &Path) -> bool {
        if path.is_file() {
            return true;
        }
        self.miss(path);
        return false;
    }

    /// Record `path` unless something occupies it.
    fn miss(&mut self, path: &Path) {
        if !path.exists() {
            self.failed.push(path.to_path_buf());
        }
        return;
    }
}

/// A `paths` pattern compiled to a regex, e.g. `@lib/*` -> `^@lib/(.*)$`.
struct PathRule {
    /// Compiled pattern.
    regex: Regex,
    /// Substitutions, `*` replaced by the captured text.
    targets: Vec<String>,
}

impl PathRule {
    /// Compile one `paths` entry. Returns `None` for patterns regex rejects.
    fn new(pattern: &str, targets: &[String]) -> Option<Self> {
        let escaped = regex::escape(pattern).replace("\\*", "(.*)");
        let regex = Regex::new(&format!("^{escaped}$")).ok()?;
        return Some(Self {
            regex,
            targets: targets.to_vec(),
        });
    }

    /// Substitutions for `specifier`, empty when the pattern does not match.
    fn substitute(&self, specifier: &str) -> Vec<String> {
        let Some(captures) = self.regex.captures(specifier) else {
            return Vec::new();
        };
        let wildcard = captures.get(1).map_or("", |m| return m.as_str());
        return self
            .targets
            .iter()
            .map(|t| return t.replacen('*', wildcard, 1))
            .collect();
    }
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                let can_pop = matches!(
                    components.last(),
                    Some(c) if !matches!(c, Component::ParentDir | Component::RootDir)
                );
                if can_pop {
                    components.pop();
                } else if !matches!(components.last(), Some(Component::RootDir)) {
                    components.push(component);
                }
            },
            other => components.push(other),
        }
    }
    return components.iter().collect();
}

/// Whether a specifier is a relative or absolute path rather than a bare name.
pub fn is_path_specifier(specifier: &str) -> bool {
    return specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute();
}

/// Resolve `specifier` as an import written in `containing_file`. The
/// failed lookups are every missing candidate tried before the answer.
pub fn resolve_module_name(
    specifier: &str,
    containing_file: &Path,
    options: &CompilerOptions,
) -> ModuleResolution {
    let mut lookups = Lookups::default();
    let resolved = resolve(specifier, containing_file, options, &mut lookups);
    return ModuleResolution {
        failed_lookups: lookups.failed,
        resolved,
    };
}

/// Body of [`resolve_module_name`].
fn resolve(
    specifier: &str,
    containing_file: &Path,
    options: &CompilerOptions,
    lookups: &mut Lookups,
) -> Option<PathBuf> {
    let dir = containing_file.parent().unwrap_or_else(|| return Path::new(""));

    if is_path_specifier(specifier) {
        return load_file_or_directory(&normalize_path(&dir.join(specifier)), options, lookups);
    }

    if let Some(found) = resolve_through_paths(specifier, options, lookups) {
        tracing::trace!(specifier, path = %found.display(), "resolved through paths");
        return Some(found);
    }

    if let Some(base) = &options.base_url
        && let Some(found) =
            load_file_or_directory(&normalize_path(&base.join(specifier)), options, lookups)
    {
        return Some(found);
    }

    return resolve_from_node_modules(specifier, dir, options, lookups);
}

/// Packages under `node_modules`, walking up from `dir`, then `@types`.
fn resolve_from_node_modules(
    specifier: &str,
    dir: &Path,
    options: &CompilerOptions,
    lookups: &mut Lookups,
) -> Option<PathBuf> {
    let types_name = types_package_name(specifier);
    for ancestor in dir.ancestors() {
        let modules = ancestor.join("node_modules");
        if !lookups.is_dir(&modules) {
            continue;
        }
        if let Some(found) = load_file_or_directory(&modules.join(specifier), options, lookups) {
            return Some(found);
        }
        let types = modules.join("@types").join(&types_name);
        if let Some(found) = load_file_or_directory(&types, options, lookups) {
            return Some(found);
        }
    }
    return None;
}

/// Try every `paths` rule whose pattern matches, first hit wins.
fn resolve_through_paths(
    specifier: &str,
    options: &CompilerOptions,
    lookups: &mut Lookups,
) -> Option<PathBuf> {
    let base = options.paths_base.as_ref()?;
    for (pattern, targets) in &options.paths {
        let Some(rule) = PathRule::new(pattern, targets) else {
            tracing::warn!(pattern, "ignoring invalid paths pattern");
            continue;
        };
        for target in rule.substitute(specifier) {
            let candidate = normalize_path(&base.join(target));
            if let Some(found) = load_file_or_directory(&candidate, options, lookups) {
                return Some(found);
            }
        }
    }
    return None;
}

/// `@scope/name` maps to `@types/scope__name`.
fn types_package_name(specifier: &str) -> String {
    let package = package_name(specifier);
    return match package.strip_prefix('@') {
        Some(scoped) => scoped.replacen('/', "__", 1) + &specifier[package.len()..],
        None => specifier.to_string(),
    };
}

/// Package part of a bare specifier: `lodash/fp` -> `lodash`, `@a/b/c` -> `@a/b`.
fn package_name(specifier: &str) -> &str {
    let mut slashes = specifier.match_indices('/');
    let first = slashes.next().map(|(i, _)| return i);
    let cut = if specifier.starts_with('@') {
        slashes.next().map(|(i, _)| return i)
    } else {
        first
    };
    return cut.map_or(specifier, |i| return &specifier[..i]);
}

/// Resolve a candidate path as a file, then as a directory.
fn load_file_or_directory(
    path: &Path,
    options: &CompilerOptions,
    lookups: &mut Lookups,
) -> Option<PathBuf> {
    if let Some(found) = load_as_file(path, options, lookups) {
        return Some(found);
    }
    return load_as_directory(path, options, 0, lookups);
}

/// Extensions probed for this project, TypeScript first.
fn probe_extensions(options: &CompilerOptions) -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = TS_EXTENSIONS.to_vec();
    if options.allow_js {
        extensions.extend(JS_EXTENSIONS);
    }
    return extensions;
}

/// The literal path, a `.js` specifier mapped to its TypeScript source, or the
/// path with each extension appended.
fn load_as_file(path: &Path, options: &CompilerOptions, lookups: &mut Lookups) -> Option<PathBuf> {
    let text = path.to_string_lossy();

    // `./x.js` written in TypeScript sources refers to `./x.ts`.
    for (js, replacements) in [
        (".js", &[".ts", ".tsx", ".d.ts"][..]),
        (".jsx", &[".tsx"][..]),
        (".mjs", &[".mts", ".d.mts"][..]),
        (".cjs", &[".cts", ".d.cts"][..]),
    ] {
        if let Some(stem) = text.strip_suffix(js) {
            for replacement in replacements {
                let candidate = PathBuf::from(format!("{stem}{replacement}"));
                if lookups.is_file(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }

    if lookups.is_file(path) && crate::grammar::is_source_path(path) {
        return Some(path.to_path_buf());
    }

    for ext in probe_extensions(options) {
        let candidate = PathBuf::from(format!("{text}{ext}"));
        if lookups.is_file(&candidate) {
            return Some(candidate);
        }
    }
    return None;
}

/// `package.json` entry fields, then `index.*`.
fn load_as_directory(
    dir: &Path,
    options: &CompilerOptions,
    hops: u8,
    lookups: &mut Lookups,
) -> Option<PathBuf> {
    if !lookups.is_dir(dir) {
        return None;
    }

    let manifest = dir.join("package.json");
    if hops < MAX_PACKAGE_HOPS
        && lookups.is_file(&manifest)
        && let Some(entries) = package_entries(&manifest)
    {
        for entry in entries {
            let target = normalize_path(&dir.join(&entry));
            if let Some(found) = load_as_file(&target, options, lookups) {
                return Some(found);
            }
            if target != dir
                && let Some(found) =
                    load_as_directory(&target, options, hops.saturating_add(1), lookups)
            {
                return Some(found);
            }
        }
    }

    return load_as_file(&dir.join("index"), options, lookups);
}

/// Entry candidates declared by a `package.json`, in priority order.
fn package_entries(manifest: &Path) -> Option<Vec<String>> {
    let content = std::fs::read_to_string(manifest).ok()?;
    let json: serde_json::Value = serde_json::from_str(&content).ok()?;
    let mut entries = Vec::new();

    for field in &PACKAGE_ENTRY_FIELDS[..2] {
        if let Some(value) = json.get(field).and_then(serde_json::Value::as_str) {
            entries.push(value.to_string());
        }
    }

    if let Some(exports) = json.get("exports") {
        let root = exports.get(".").unwrap_or(exports);
        collect_export_conditions(root, &mut entries);
    }

    for field in &PACKAGE_ENTRY_FIELDS[2..] {
        if let Some(value) = json.get(field).and_then(serde_json::Value::as_str) {
            entries.push(value.to_string());
        }
    }
    return Some(entries);
}

/// Flatten an `exports` condition tree, preferring `types`, then `import`,
/// `require`, and `default`.
fn collect_export_conditions(value: &serde_json::Value, entries: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => entries.push(s.clone()),
        serde_json::Value::Object(map) => {
            for key in ["types", "import", "require", "node", "default"] {
                if let Some(inner) = map.get(key) {
                    collect_export_conditions(inner, entries);
                }
            }
        },
        serde_json::Value::Array(items) => {
            for item in items {
                collect_export_conditions(item, entries);
            }
        },
        _ => {},
    }
    return;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn normalizes_dots() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn relative_probes_extensions_and_index() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/util.ts", "export const a = 1;");
        touch(dir.path(), "src/lib/index.js", "module.exports = {};");
        let from = dir.path().join("main.ts");
        let options = CompilerOptions::default();

        let util = resolve_module_name("./src/util", &from, &options).resolved.unwrap();
        assert!(util.ends_with("src/util.ts"));
        let lib = resolve_module_name("./src/lib", &from, &options).resolved.unwrap();
        assert!(lib.ends_with("src/lib/index.js"));
        assert!(resolve_module_name("./nope", &from, &options).resolved.is_none());
    }

    #[test]
    fn failed_lookups_list_missing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "util.js", "module.exports = {};");
        let containing = dir.path().join("main.ts");
        let resolution = resolve_module_name("./util", &containing, &CompilerOptions::default());
        assert!(resolution.resolved.unwrap().ends_with("util.js"));
        assert!(resolution.failed_lookups.contains(&dir.path().join("util.ts")));
        assert!(!resolution.failed_lookups.iter().any(|p| p.exists()));
    }

    #[test]
    fn js_specifier_maps_to_ts_source() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.ts", "export {};");
        let containing = dir.path().join("b.ts");
        let found = resolve_module_name("./a.js", &containing, &CompilerOptions::default());
        let found = found.resolved.unwrap();
        assert!(found.ends_with("a.ts"));
    }

    #[test]
    fn node_modules_package_types_field() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            "node_modules/pkg/package.json",
            r#"{ "types": "dist/index.d.ts", "main": "dist/index.js" }"#,
        );
        touch(dir.path(), "node_modules/pkg/dist/index.d.ts", "export declare const x: number;");
        let containing = dir.path().join("src/main.ts");
        let found = resolve_module_name("pkg", &containing, &CompilerOptions::default());
        let found = found.resolved.unwrap();
        assert!(found.ends_with("dist/index.d.ts"));
    }

    #[test]
    fn scoped_types_package() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "node_modules/@types/scope__pkg/index.d.ts", "export {};");
        let containing = dir.path().join("a.ts");
        let found = resolve_module_name("@scope/pkg", &containing, &CompilerOptions::default());
        let found = found.resolved.unwrap();
        assert!(found.ends_with("@types/scope__pkg/index.d.ts"));
    }

    #[test]
    fn paths_alias() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/components/button.tsx", "export const Button = 1;");
        let mut options = CompilerOptions::default();
        options.paths.insert("@components/*".to_string(), vec!["src/components/*".to_string()]);
        options.paths_base = Some(dir.path().to_path_buf());
        let containing = dir.path().join("a.ts");
        let found = resolve_module_name("@components/button", &containing, &options);
        let found = found.resolved.unwrap();
        assert!(found.ends_with("src/components/button.tsx"));
    }

    #[test]
    fn package_names() {
        assert_eq!(package_name("lodash/fp"), "lodash");
        assert_eq!(package_name("@a/b/c"), "@a/b");
        assert_eq!(types_package_name("@a/b"), "a__b");
    }
}
