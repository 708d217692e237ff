//! Explicit specifier-resolution cache with content-hash invalidation.
//!
//! The host constructs one and passes it by `&mut` into the `*_cached` engine
//! operations. Only the specifier → file step is cached; checking contexts are
//! always built fresh. Entries are keyed by the compiler options in effect and
//! remember the candidates that were missing when they were recorded.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash as _, Hasher as _};
use std::path::{Path, PathBuf};

use crate::hasher;
use crate::oracle::{CompilerOptions, ModuleResolution};
use crate::types::ContentHash;

/// One cached resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry {
    /// Missing candidates that outranked `path`.
    failed_lookups: Vec<PathBuf>,
    /// Hash of the resolved file when the entry was recorded.
    hash: ContentHash,
    /// Resolved file.
    path: PathBuf,
}

/// Cache key: the specifier as written, the file it was resolved from, and
/// the fingerprint of the compiler options.
type CacheKey = (String, PathBuf, u64);

/// Specifier resolutions keyed by `(specifier, containing file, options)`.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    /// Live entries.
    entries: HashMap<CacheKey, CacheEntry>,
}

impl ResolutionCache {
    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        return;
    }

    /// Look up a resolution made under `options`. The resolved file is
    /// re-hashed; an entry whose file vanished or changed, or one of whose
    /// failed lookups now exists, is dropped and reported as a miss.
    pub fn get(
        &mut self,
        specifier: &str,
        containing_file: &Path,
        options: &CompilerOptions,
    ) -> Option<PathBuf> {
        let key = cache_key(specifier, containing_file, options);
        let entry = self.entries.get(&key)?;

        if let Some(appeared) = entry.failed_lookups.iter().find(|p| return p.exists()) {
            let candidate = appeared.display();
            tracing::debug!(specifier, candidate = %candidate, "candidate appeared, evicting");
            self.entries.remove(&key);
            return None;
        }

        let current = match hasher::hash_file(&entry.path) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::debug!(
                    specifier,
                    path = %entry.path.display(),
                    error = %e,
                    "cached file vanished, evicting"
                );
                self.entries.remove(&key);
                return None;
            },
        };
        if current != entry.hash {
            let path = entry.path.display();
            tracing::debug!(specifier, path = %path, "cached file changed, evicting");
            self.entries.remove(&key);
            return None;
        }

        tracing::trace!(specifier, path = %entry.path.display(), "resolution cache hit");
        return Some(entry.path.clone());
    }

    /// Record a successful resolution made under `options`. Unresolved
    /// specifiers and unreadable files are not cached.
    pub fn insert(
        &mut self,
        specifier: &str,
        containing_file: &Path,
        options: &CompilerOptions,
        resolution: &ModuleResolution,
    ) {
        let Some(resolved) = &resolution.resolved else {
            return;
        };
        let hash = match hasher::hash_file(resolved) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::debug!(
                    specifier,
                    path = %resolved.display(),
                    error = %e,
                    "not caching unreadable file"
                );
                return;
            },
        };
        let entry = CacheEntry {
            failed_lookups: resolution.failed_lookups.clone(),
            hash,
            path: resolved.clone(),
        };
        self.entries.insert(cache_key(specifier, containing_file, options), entry);
        return;
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        return self.entries.len();
    }
}

/// Key for a lookup under `options`.
fn cache_key(specifier: &str, containing_file: &Path, options: &CompilerOptions) -> CacheKey {
    let mut hasher = DefaultHasher::new();
    options.hash(&mut hasher);
    return (specifier.to_string(), containing_file.to_path_buf(), hasher.finish());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(path: &Path) -> ModuleResolution {
        return ModuleResolution {
            failed_lookups: Vec::new(),
            resolved: Some(path.to_path_buf()),
        };
    }

    #[test]
    fn hit_while_content_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "export const a = 1;").unwrap();
        let containing = dir.path().join("__root__.ts");
        let options = CompilerOptions::default();

        let mut cache = ResolutionCache::default();
        cache.insert("a", &containing, &options, &resolved(&file));
        assert_eq!(cache.get("a", &containing, &options), Some(file));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_content_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "export const a = 1;").unwrap();
        let containing = dir.path().join("__root__.ts");
        let options = CompilerOptions::default();

        let mut cache = ResolutionCache::default();
        cache.insert("a", &containing, &options, &resolved(&file));
        std::fs::write(&file, "export const a = 2;").unwrap();
        assert!(cache.get("a", &containing, &options).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn vanished_file_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "export const a = 1;").unwrap();
        let containing = dir.path().join("__root__.ts");
        let options = CompilerOptions::default();

        let mut cache = ResolutionCache::default();
        cache.insert("a", &containing, &options, &resolved(&file));
        std::fs::remove_file(&file).unwrap();
        assert!(cache.get("a", &containing, &options).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_include_containing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "export const a = 1;").unwrap();
        let options = CompilerOptions::default();

        let mut cache = ResolutionCache::default();
        cache.insert("a", &dir.path().join("one.ts"), &options, &resolved(&file));
        assert!(cache.get("a", &dir.path().join("two.ts"), &options).is_none());
    }

    #[test]
    fn keys_include_compiler_options() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "export const a = 1;").unwrap();
        let containing = dir.path().join("__root__.ts");
        let options = CompilerOptions::default();
        let mut changed = CompilerOptions::default();
        changed.paths.insert("@x/*".to_string(), vec!["b/*".to_string()]);

        let mut cache = ResolutionCache::default();
        cache.insert("a", &containing, &options, &resolved(&file));
        assert!(cache.get("a", &containing, &changed).is_none());
        assert!(cache.get("a", &containing, &options).is_some());
    }

    #[test]
    fn appearing_candidate_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let js = dir.path().join("util.js");
        let ts = dir.path().join("util.ts");
        std::fs::write(&js, "module.exports = {};").unwrap();
        let containing = dir.path().join("__root__.ts");
        let options = CompilerOptions::default();
        let resolution = ModuleResolution {
            failed_lookups: vec![ts.clone()],
            resolved: Some(js.clone()),
        };

        let mut cache = ResolutionCache::default();
        cache.insert("./util", &containing, &options, &resolution);
        assert_eq!(cache.get("./util", &containing, &options), Some(js));
        std::fs::write(&ts, "export {};").unwrap();
        assert!(cache.get("./util", &containing, &options).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn unresolved_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ResolutionCache::default();
        let containing = dir.path().join("x.ts");
        let options = CompilerOptions::default();
        cache.insert("a", &containing, &options, &ModuleResolution::default());
        assert!(cache.is_empty());
    }
}
