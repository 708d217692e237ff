use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::grammar;

/// Directory never descended into.
const DEPENDENCY_DIR: &str = "node_modules";

/// Walk `root` and collect every source module, relative to the root and sorted.
/// Skips `node_modules` and dot-directories, then applies the config's
/// include/exclude filters.
pub fn scan(root: &Path, config: &Config) -> Vec<PathBuf> {
    let mut modules: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| return e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file() && grammar::is_source_path(e.path()))
        .filter_map(|e| {
            let relative = e.path().strip_prefix(root).ok()?.to_path_buf();
            let relative_str = to_slash(&relative);
            if !config.should_scan(&relative_str) {
                tracing::trace!(module = relative_str, "filtered by config");
                return None;
            }
            return Some(relative);
        })
        .collect();
    modules.sort();
    tracing::debug!(count = modules.len(), "scanned modules");
    return modules;
}

/// Relative path with `/` separators, as references spell it.
pub fn to_slash(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .map(|c| return c.as_os_str().to_string_lossy().to_string())
        .collect();
    return parts.join("/");
}

/// Dependency and hidden directories.
fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    return name == DEPENDENCY_DIR || name.starts_with('.');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "export {};").unwrap();
    }

    #[test]
    fn skips_dependencies_hidden_dirs_and_non_sources() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/a.ts");
        touch(dir.path(), "src/b.cjs");
        touch(dir.path(), "README.md");
        touch(dir.path(), "node_modules/pkg/index.js");
        touch(dir.path(), ".cache/x.js");

        let modules = scan(dir.path(), &Config::default());
        let names: Vec<String> = modules.iter().map(|p| to_slash(p)).collect();
        assert_eq!(names, ["src/a.ts", "src/b.cjs"]);
    }

    #[test]
    fn applies_config_filters() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/a.ts");
        touch(dir.path(), "src/gen/b.ts");
        touch(dir.path(), "scripts/c.js");
        std::fs::write(
            dir.path().join(crate::config::CONFIG_FILE),
            "include = [\"src/\"]\nexclude = [\"src/gen/\"]\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        let names: Vec<String> = scan(dir.path(), &config).iter().map(|p| to_slash(p)).collect();
        assert_eq!(names, ["src/a.ts"]);
    }
}
